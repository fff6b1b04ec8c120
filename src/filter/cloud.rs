//! Particle storage and the multi-buffer publish/checkout pool.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::filter::particle::Particle;

/// Fixed-capacity particle buffer with an adjustable logical size.
///
/// Slots are allocated once and reused generation after generation. Shrink
/// and regrow never reallocate, and slots beyond the logical size keep
/// stale contents until a later generation overwrites them.
#[derive(Debug, Clone)]
pub struct ParticleCloud {
    slots: Vec<Particle>,
    len: usize,
}

impl ParticleCloud {
    /// Cloud with `capacity` preallocated particles and logical size 0.
    pub fn preallocated(capacity: usize, beam_count: usize) -> Self {
        Self { slots: (0..capacity).map(|_| Particle::zeroed(beam_count)).collect(), len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live particles, the first `len` slots.
    pub fn particles(&self) -> &[Particle] {
        &self.slots[..self.len]
    }

    /// Sets the logical size.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity.
    pub fn set_len(&mut self, len: usize) {
        assert!(
            len <= self.slots.len(),
            "cloud size {len} exceeds capacity {}",
            self.slots.len()
        );
        self.len = len;
    }

    /// Slot access independent of the logical size. Generation code writes
    /// slots first and sets the size last.
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.slots[index]
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        let len = self.len;
        &mut self.slots[..len]
    }
}

/// Shared state guarded by the pool mutex.
#[derive(Debug)]
struct Published {
    /// Buffer index readers currently see.
    active: usize,
    /// Rotation cursor advanced by checkout.
    cursor: usize,
    /// Highest-weight pose captured at publish time.
    estimate: Option<Particle>,
}

/// Rotating set of particle buffers shared between one writer and any
/// number of readers.
///
/// The writer borrows a spare buffer with [`CloudPool::checkout`], fills
/// it, and swaps it in with [`CloudPool::publish`]. Readers borrow the
/// published buffer through [`CloudPool::active`]. Publication moves an
/// index, never particle data, so it is O(1) regardless of cloud size.
///
/// Lock order: the pool mutex is never held while a buffer lock is taken,
/// and no buffer guard is held while the mutex is taken. `checkout` picks
/// the spare index under the mutex and releases it before write-locking
/// the buffer; `publish` drops the buffer guard before taking the mutex.
#[derive(Debug)]
pub struct CloudPool {
    buffers: Vec<RwLock<ParticleCloud>>,
    published: Mutex<Published>,
}

impl CloudPool {
    /// Pool of `buffers` clouds, each with `capacity` particle slots.
    ///
    /// # Panics
    ///
    /// Panics if `buffers < 2`. The writer always needs a spare buffer
    /// while readers hold the active one.
    pub fn new(buffers: usize, capacity: usize, beam_count: usize) -> Arc<Self> {
        assert!(buffers >= 2, "pool needs at least two buffers, got {buffers}");
        Arc::new(Self {
            buffers: (0..buffers)
                .map(|_| RwLock::new(ParticleCloud::preallocated(capacity, beam_count)))
                .collect(),
            published: Mutex::new(Published { active: 0, cursor: 0, estimate: None }),
        })
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Read access to the published cloud.
    ///
    /// The view holds a read lock on the buffer until dropped. The writer
    /// never touches the active buffer, so long-lived views do not delay
    /// the next publication; they only delay reuse of this buffer two
    /// generations later.
    pub fn active(&self) -> CloudView<'_> {
        let index = self.published.lock().active;
        CloudView { guard: self.buffers[index].read() }
    }

    /// Logical size of the published cloud.
    pub fn active_len(&self) -> usize {
        self.active().len()
    }

    /// Highest-weight pose published with the active cloud, if the last
    /// publication carried one.
    ///
    /// Independent of [`CloudPool::active`]: a publication may slip in
    /// between the two calls.
    pub fn estimate(&self) -> Option<Particle> {
        self.published.lock().estimate.clone()
    }

    /// Borrows the next spare buffer for writing, skipping the active one.
    ///
    /// Blocks until readers of that spare buffer are done. With two
    /// buffers, one writer may be outstanding; with three, a second
    /// checkout while the first is still held returns a third, distinct
    /// buffer, which resampling uses for its copy pass.
    pub fn checkout(&self) -> CloudWriter<'_> {
        let index = {
            let mut shared = self.published.lock();
            shared.cursor = (shared.cursor + 1) % self.buffers.len();
            if shared.cursor == shared.active {
                shared.cursor = (shared.cursor + 1) % self.buffers.len();
            }
            shared.cursor
        };
        CloudWriter { index, guard: self.buffers[index].write() }
    }

    /// Publishes the written buffer as the active cloud, together with the
    /// estimate readers should associate with it.
    ///
    /// The estimate is captured by value; the caller keeps ownership of
    /// its scratch particle.
    pub fn publish(&self, writer: CloudWriter<'_>, estimate: Option<&Particle>) {
        let CloudWriter { index, guard } = writer;
        drop(guard);
        let mut shared = self.published.lock();
        shared.active = index;
        match (estimate, &mut shared.estimate) {
            (Some(source), Some(slot)) => slot.clone_from(source),
            (Some(source), slot @ None) => *slot = Some(source.clone()),
            (None, slot) => *slot = None,
        }
    }
}

/// Shared read access to the published cloud.
pub struct CloudView<'a> {
    guard: RwLockReadGuard<'a, ParticleCloud>,
}

impl Deref for CloudView<'_> {
    type Target = ParticleCloud;

    fn deref(&self) -> &ParticleCloud {
        &self.guard
    }
}

/// Exclusive access to a spare buffer between checkout and publish.
pub struct CloudWriter<'a> {
    index: usize,
    guard: RwLockWriteGuard<'a, ParticleCloud>,
}

impl Deref for CloudWriter<'_> {
    type Target = ParticleCloud;

    fn deref(&self) -> &ParticleCloud {
        &self.guard
    }
}

impl DerefMut for CloudWriter<'_> {
    fn deref_mut(&mut self) -> &mut ParticleCloud {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RobotGeometry;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn fill(cloud: &mut ParticleCloud, count: usize, weight: f64) {
        let geom = RobotGeometry::default();
        for i in 0..count {
            cloud.slot_mut(i).place(weight, i as f64, 0.0, 0.0, 0.0, &geom);
        }
        cloud.set_len(count);
    }

    #[test]
    fn test_preallocated_shape() {
        let cloud = ParticleCloud::preallocated(8, 3);
        assert_eq!(cloud.capacity(), 8);
        assert_eq!(cloud.len(), 0);
        assert!(cloud.is_empty());
        assert!(cloud.particles().is_empty());
    }

    #[test]
    fn test_set_len_within_capacity() {
        let mut cloud = ParticleCloud::preallocated(4, 0);
        cloud.set_len(4);
        assert_eq!(cloud.particles().len(), 4);
        cloud.set_len(1);
        assert_eq!(cloud.particles().len(), 1);
    }

    #[test]
    #[should_panic(expected = "exceeds capacity")]
    fn test_set_len_over_capacity_panics() {
        let mut cloud = ParticleCloud::preallocated(4, 0);
        cloud.set_len(5);
    }

    #[test]
    #[should_panic(expected = "at least two buffers")]
    fn test_pool_rejects_single_buffer() {
        let _ = CloudPool::new(1, 8, 0);
    }

    #[test]
    fn test_checkout_skips_active() {
        let pool = CloudPool::new(2, 8, 0);
        let writer = pool.checkout();
        assert_ne!(writer.index, pool.published.lock().active);
    }

    #[test]
    fn test_publish_rotates_and_exposes() {
        let pool = CloudPool::new(2, 8, 0);
        assert_eq!(pool.active_len(), 0);
        assert!(pool.estimate().is_none());

        let mut writer = pool.checkout();
        fill(&mut writer, 5, 0.2);
        let estimate = writer.particles()[2].clone();
        pool.publish(writer, Some(&estimate));

        assert_eq!(pool.active_len(), 5);
        let published = pool.estimate().unwrap();
        assert_eq!(published.x, 2.0);

        let mut writer = pool.checkout();
        fill(&mut writer, 3, 0.5);
        pool.publish(writer, None);

        assert_eq!(pool.active_len(), 3);
        assert!(pool.estimate().is_none());
        assert_eq!(pool.active().particles()[0].weight, 0.5);
    }

    #[test]
    fn test_double_checkout_distinct_buffers() {
        let pool = CloudPool::new(3, 4, 0);
        let first = pool.checkout();
        let second = pool.checkout();
        let active = pool.published.lock().active;
        assert_ne!(first.index, second.index);
        assert_ne!(first.index, active);
        assert_ne!(second.index, active);
    }

    #[test]
    fn test_reader_does_not_block_publication() {
        let pool = CloudPool::new(2, 4, 0);
        let mut writer = pool.checkout();
        fill(&mut writer, 2, 1.0);
        pool.publish(writer, None);

        let view = pool.active();
        assert_eq!(view.len(), 2);

        // Publishing the other buffer must succeed while the view is held.
        let mut writer = pool.checkout();
        fill(&mut writer, 4, 1.0);
        pool.publish(writer, None);

        assert_eq!(view.len(), 2);
        assert_eq!(pool.active_len(), 4);
    }

    #[test]
    fn test_concurrent_readers_see_whole_generations() {
        let pool = CloudPool::new(3, 16, 0);
        let stop = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                while !stop.load(Ordering::Relaxed) {
                    let view = pool.active();
                    let len = view.len();
                    // Every published generation carries a uniform marker
                    // weight; a torn read would mix generations.
                    if len > 0 {
                        let first = view.particles()[0].weight;
                        assert!(view.particles().iter().all(|p| p.weight == first));
                        assert_eq!(len, (first * 16.0).round() as usize);
                    }
                }
            });

            for generation in 1..=200usize {
                let count = generation % 16 + 1;
                let mut writer = pool.checkout();
                fill(&mut writer, count, count as f64 / 16.0);
                pool.publish(writer, None);
            }
            stop.store(true, Ordering::Relaxed);
        });
    }
}
