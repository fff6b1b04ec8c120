//! Cloud seeding: floor-wide grid search and uniform scatter helpers.

use std::cmp::Ordering;
use std::f64::consts::{PI, TAU};

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::math::{sample_gaussian, sample_uniform};
use crate::core::multimap::SortedMultiMap;
use crate::core::types::{Pose, RobotGeometry};
use crate::filter::cloud::ParticleCloud;
use crate::filter::sensor::{pose_weight, under_any_obstruction, RangeModel};
use crate::scene::SceneModel;

/// Spacing and tie-breaking of the relocalization grid sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSearchConfig {
    /// Scan spacing along x and y, millimeters.
    pub xy_step: f64,
    /// Heading spacing, radians.
    pub yaw_step: f64,
    /// Standard deviation of the Gaussian salt added to each candidate
    /// score before ranking. Orders candidates with equal likelihood.
    pub weight_salt: f64,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self { xy_step: 20.0, yaw_step: 10.0_f64.to_radians(), weight_salt: 1e-15 }
    }
}

/// Candidate score ordered by `f64::total_cmp`. Scores are densities plus
/// salt and are never NaN.
#[derive(Debug, Clone, Copy)]
struct ScoreKey(f64);

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct CandidateSeed {
    x: f64,
    y: f64,
    yaw: f64,
}

/// Sweeps the whole floor and seeds `cloud` with the best-scoring poses.
///
/// Every grid cell not under a listed obstruction is scored at each
/// heading step against the current readings, all candidates sharing the
/// measured pitch. The `cloud.capacity()` highest-scoring candidates are
/// retained through a bounded ordered multimap and placed with uniform
/// weight `1 / retained`.
///
/// One salt draw is consumed per scored candidate whether or not it is
/// retained, so a fixed seed replays the identical sweep.
///
/// Returns the number of particles seeded. Zero means no scorable cell
/// exists, e.g. every cell sits under an obstruction.
#[allow(clippy::too_many_arguments)]
pub fn grid_search_seed<S: SceneModel + ?Sized, R: Rng>(
    scene: &S,
    low_obstructions: &[usize],
    model: &RangeModel,
    config: &GridSearchConfig,
    geometry: &RobotGeometry,
    pitch: f64,
    readings: &[f64],
    cloud: &mut ParticleCloud,
    rng: &mut R,
) -> usize {
    let capacity = cloud.capacity();
    let (width, height) = scene.floor_size();
    let yaw_count = (TAU / config.yaw_step).round().max(1.0) as usize;
    let mut retained: SortedMultiMap<ScoreKey, CandidateSeed> = SortedMultiMap::new();
    let mut scored = 0usize;

    let mut x = config.xy_step;
    while x < width {
        let mut y = config.xy_step;
        while y < height {
            if under_any_obstruction(scene, low_obstructions, x, y) {
                y += config.xy_step;
                continue;
            }
            for step in 0..yaw_count {
                let yaw = TAU * step as f64 / yaw_count as f64;
                let pose = Pose::new(x, y, pitch, yaw);
                let score = pose_weight(scene, low_obstructions, model, &pose, readings, None, None)
                    + sample_gaussian(rng, 0.0, config.weight_salt);
                scored += 1;
                let key = ScoreKey(score);
                if retained.len() < capacity {
                    retained.insert(key, CandidateSeed { x, y, yaw });
                } else if retained.min_key().is_some_and(|min| *min < key) {
                    retained.pop_min();
                    retained.insert(key, CandidateSeed { x, y, yaw });
                }
            }
            y += config.xy_step;
        }
        x += config.xy_step;
    }

    let count = retained.len();
    info!("grid sweep scored {scored} candidate poses, retained {count}");
    let uniform = if count > 0 { 1.0 / count as f64 } else { 0.0 };
    for (slot, (_, seed)) in retained.iter().enumerate() {
        cloud.slot_mut(slot).place(uniform, seed.x, seed.y, pitch, seed.yaw, geometry);
    }
    cloud.set_len(count);
    count
}

/// Fills `cloud` with up to `count` particles drawn uniformly over free
/// floor, rejecting draws under the listed obstructions.
///
/// Yaw is uniform over `[-PI, PI)` and pitch uniform within
/// `pitch_spread` of level. Weights are uniform over the placed count.
/// The rejection budget is bounded, so a floor that is almost entirely
/// obstructed may place fewer than `count`; returns the number placed.
pub fn seed_uniform_free<S: SceneModel + ?Sized, R: Rng>(
    scene: &S,
    low_obstructions: &[usize],
    geometry: &RobotGeometry,
    pitch_spread: f64,
    count: usize,
    cloud: &mut ParticleCloud,
    rng: &mut R,
) -> usize {
    assert!(count <= cloud.capacity(), "seed count exceeds cloud capacity");
    let (width, height) = scene.floor_size();
    let budget = count.saturating_mul(100).max(1000);
    let mut placed = 0;

    for _ in 0..budget {
        if placed == count {
            break;
        }
        let x = sample_uniform(rng, 0.0, width);
        let y = sample_uniform(rng, 0.0, height);
        let pitch = sample_uniform(rng, -pitch_spread, pitch_spread);
        let yaw = sample_uniform(rng, -PI, PI);
        if under_any_obstruction(scene, low_obstructions, x, y) {
            continue;
        }
        cloud.slot_mut(placed).place(0.0, x, y, pitch, yaw, geometry);
        placed += 1;
    }

    if placed > 0 {
        let uniform = 1.0 / placed as f64;
        for slot in 0..placed {
            cloud.slot_mut(slot).weight = uniform;
        }
    }
    cloud.set_len(placed);
    placed
}

/// Fills `cloud` with `count` particles scattered around a known point,
/// all level and facing `yaw`.
///
/// Used when the start pose is known up to a small offset, e.g. pulling
/// away from a charging dock.
pub fn seed_around_point<R: Rng>(
    center: (f64, f64),
    yaw: f64,
    spread: f64,
    count: usize,
    geometry: &RobotGeometry,
    cloud: &mut ParticleCloud,
    rng: &mut R,
) -> usize {
    assert!(count <= cloud.capacity(), "seed count exceeds cloud capacity");
    if count == 0 {
        cloud.set_len(0);
        return 0;
    }
    let uniform = 1.0 / count as f64;
    for slot in 0..count {
        let x = sample_uniform(rng, center.0 - spread, center.0 + spread);
        let y = sample_uniform(rng, center.1 - spread, center.1 + spread);
        cloud.slot_mut(slot).place(uniform, x, y, 0.0, yaw, geometry);
    }
    cloud.set_len(count);
    count
}
