//! Particle-filter machinery and the localization engines built from it.
//!
//! # Contents
//!
//! - [`Particle`], [`ParticleCloud`], [`CloudPool`]: storage and sharing
//! - [`MotionNoise`], [`propagate_into`]: odometry propagation
//! - [`RangeModel`], [`pose_weight`]: range likelihood
//! - [`CumulativeWeightTable`], [`systematic_resample`]: ancestor selection
//! - [`BinSet`]: pose-space occupancy behind the adaptive size bound
//! - [`grid_search_seed`] and friends: cloud seeding
//! - [`KldFilter`]: adaptively sized global localizer
//! - [`StandardFilter`]: fixed-size tracker with Neff-gated resampling
//!
//! # Example
//!
//! ```ignore
//! let scene = Arc::new(PlanarScene::new(2000.0, 2000.0, beams));
//! let mut filter = KldFilter::new(KldConfig::default(), RobotGeometry::default(), scene)?;
//! filter.init(frame.pitch, &frame.ranges);
//! loop {
//!     let frame = sensors.next_frame();
//!     filter.track(&frame);
//!     let estimate = filter.pool().estimate();
//! }
//! ```

mod bins;
mod cloud;
mod kld;
mod motion;
mod particle;
mod resample;
mod seed;
mod sensor;
mod standard;

pub use bins::{BinConfig, BinSet};
pub use cloud::{CloudPool, CloudView, CloudWriter, ParticleCloud};
pub use kld::{KldConfig, KldFilter, KldState};
pub use motion::{propagate_into, MotionNoise};
pub use particle::Particle;
pub use resample::{systematic_resample, CumulativeWeightTable};
pub use seed::{grid_search_seed, seed_around_point, seed_uniform_free, GridSearchConfig};
pub use sensor::{pose_weight, RangeModel};
pub use standard::{StandardConfig, StandardFilter, StandardState};

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::core::types::{RobotGeometry, SensorFrame};
use crate::scene::SceneModel;

/// Construction failures of the localization engines.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("particle capacity must be at least 1")]
    NoCapacity,
    #[error("KLD epsilon must be positive, got {0}")]
    InvalidEpsilon(f64),
    #[error("effective-sample ratio must be in (0, 1], got {0}")]
    InvalidNeffRatio(f64),
    #[error("range gate is empty: use_min {use_min} is not below use_max {use_max}")]
    InvalidGate { use_min: f64, use_max: f64 },
    #[error("scene reports no range-sensor beams")]
    NoBeams,
    #[error("floor must have positive extent, got {width} x {height} mm")]
    InvalidFloor { width: f64, height: f64 },
    #[error("wheel radius and track width must be positive")]
    InvalidGeometry,
}

/// Outcome of one tracking step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// A new generation was published, with its particle count.
    Updated { particles: usize },
    /// Accumulated wheel motion is under the engine threshold; the
    /// published cloud was left untouched.
    Stationary,
    /// Every hypothesis weighed zero; the published cloud was left
    /// untouched.
    Degenerate,
}

/// Common surface of the localization engines.
pub trait Localizer {
    /// Discards the published cloud and reseeds from the given readings.
    fn init(&mut self, pitch: f64, ranges: &[f64]) -> TrackOutcome;

    /// Consumes one frame and regenerates the cloud.
    fn track(&mut self, frame: &SensorFrame) -> TrackOutcome;

    /// Buffer pool the engine publishes into.
    fn pool(&self) -> &Arc<CloudPool>;
}

/// Engine RNG from a config seed; seed 0 asks the operating system.
pub(crate) fn seed_rng(seed: u64) -> StdRng {
    if seed == 0 {
        StdRng::from_os_rng()
    } else {
        StdRng::seed_from_u64(seed)
    }
}

/// Indices of obstructions low enough to collide with the body.
pub(crate) fn select_low_obstructions<S: SceneModel + ?Sized>(
    scene: &S,
    geometry: &RobotGeometry,
) -> Vec<usize> {
    let clearance = geometry.clearance_height();
    (0..scene.obstruction_count())
        .filter(|&index| scene.obstruction_elevation(index) <= clearance)
        .collect()
}

/// Construction-time checks shared by the engines.
pub(crate) fn validate_platform<S: SceneModel + ?Sized>(
    scene: &S,
    geometry: &RobotGeometry,
) -> Result<(), BuildError> {
    if geometry.wheel_radius <= 0.0 || geometry.track_width <= 0.0 {
        return Err(BuildError::InvalidGeometry);
    }
    let (width, height) = scene.floor_size();
    if !(width > 0.0 && height > 0.0) {
        return Err(BuildError::InvalidFloor { width, height });
    }
    if scene.beams().is_empty() {
        return Err(BuildError::NoBeams);
    }
    Ok(())
}
