//! Ancestor-selection tables and deterministic resampling.

use crate::filter::cloud::ParticleCloud;

/// Cumulative weight table mapping a uniform draw to an ancestor index.
///
/// Entry `i` holds the running weight total through particle `i`. After
/// [`CumulativeWeightTable::normalize`] the final entry is pinned to
/// exactly 1.0, so every draw in `[0, 1)` maps to a valid index with no
/// dependence on floating-point summation error.
#[derive(Debug, Clone, Default)]
pub struct CumulativeWeightTable {
    sums: Vec<f64>,
}

impl CumulativeWeightTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { sums: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    pub fn clear(&mut self) {
        self.sums.clear();
    }

    /// Appends the running total after one more particle.
    pub fn push(&mut self, cumulative: f64) {
        self.sums.push(cumulative);
    }

    /// Rebuilds the table as a uniform distribution over `count` entries.
    pub fn reset_uniform(&mut self, count: usize) {
        self.sums.clear();
        for i in 0..count {
            self.sums.push((i + 1) as f64 / count as f64);
        }
        if let Some(last) = self.sums.last_mut() {
            *last = 1.0;
        }
    }

    /// Divides every entry by `total` and pins the last to exactly 1.0.
    pub fn normalize(&mut self, total: f64) {
        for sum in &mut self.sums {
            *sum /= total;
        }
        if let Some(last) = self.sums.last_mut() {
            *last = 1.0;
        }
    }

    /// Index of the ancestor owning the weight interval that contains `u`.
    ///
    /// Returns the first index whose cumulative sum exceeds `u`, for `u` in
    /// `[0, 1)`. Zero-weight particles own empty intervals and are never
    /// selected; `u = 0.0` selects the first particle with nonzero weight.
    pub fn ancestor(&self, u: f64) -> usize {
        debug_assert!(!self.sums.is_empty(), "ancestor lookup on empty table");
        let index = self.sums.partition_point(|&sum| sum <= u);
        index.min(self.sums.len() - 1)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.sums
    }
}

/// Deterministic systematic resampling from `source` into `target`.
///
/// Walks a comb of `n` equally spaced thresholds, starting at `0.5 / n`
/// and stepping by `1 / n`, through the source weight distribution, and
/// copies each selected ancestor into `target` with uniform weight
/// `1 / n`. No randomness is consumed: the same source cloud always
/// produces the same target cloud.
///
/// # Panics
///
/// Panics if `source` is empty or `target` cannot hold `source.len()`
/// particles.
pub fn systematic_resample(source: &ParticleCloud, target: &mut ParticleCloud) {
    let n = source.len();
    assert!(n > 0, "cannot resample an empty cloud");
    assert!(
        n <= target.capacity(),
        "resample target capacity {} is smaller than source size {n}",
        target.capacity()
    );

    let particles = source.particles();
    let uniform = 1.0 / n as f64;
    let mut index = 0usize;
    let mut cumulative = particles[0].weight;
    let mut threshold = 0.5 * uniform;

    for slot in 0..n {
        while cumulative < threshold && index < n - 1 {
            index += 1;
            cumulative += particles[index].weight;
        }
        let child = target.slot_mut(slot);
        child.clone_from(&particles[index]);
        child.weight = uniform;
        threshold += uniform;
    }
    target.set_len(n);
}
