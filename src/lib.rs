//! # Tula Localization
//!
//! Monte Carlo localization for a self-balancing differential-drive robot.
//! A cloud of weighted pose hypotheses (particles) is propagated through a
//! noisy wheel-odometry model and reweighted against range-sensor readings
//! ray cast into a scene model. The flagship engine resizes the cloud every
//! generation with a KLD bound, so a converged robot runs a small cloud and
//! a lost robot automatically spreads back out.
//!
//! ## Architecture
//!
//! The crate is organized in three layers with strictly downward
//! dependencies:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         filter                           │
//! │   particle clouds, cloud pool, motion + sensor models,   │
//! │   resampling, KLD + fixed-size engines                   │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//! ┌──────────────────────────────────────────────────────────┐
//! │                          scene                           │
//! │   world-model trait: floor, obstructions, beam raycasts  │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//! ┌──────────────────────────────────────────────────────────┐
//! │                          core                            │
//! │   angle math, sampling helpers, ordered multimap, types  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Engine lifecycle
//!
//! 1. **Seed**: an empty cloud is filled either by a weighted grid sweep of
//!    the whole floor ([`KldFilter`]) or uniformly over free floor
//!    ([`StandardFilter`]).
//! 2. **Track**: each call consumes one odometry + range frame, regenerates
//!    the cloud into a spare buffer, and publishes it atomically together
//!    with the highest-weight pose.
//! 3. **Read**: any number of consumer threads borrow the published cloud
//!    through [`CloudPool::active`] while the engine writes the next one.
//!
//! Units are millimeters and radians throughout.

// ============================================================================
// Core: math, containers, shared types
// ============================================================================

pub mod core;

// ============================================================================
// Scene: world-model abstraction and a flat test scene
// ============================================================================

pub mod scene;

// ============================================================================
// Filter: particle machinery and localization engines
// ============================================================================

pub mod filter;

// Re-export the main public API at the crate root.
pub use crate::core::multimap::SortedMultiMap;
pub use crate::core::types::{Pose, RobotGeometry, SensorFrame};
pub use crate::scene::{
    BeamConfig, PlanarScene, RangeSample, SceneBox, SceneCarpet, SceneModel,
};
pub use crate::filter::{
    grid_search_seed, pose_weight, propagate_into, seed_around_point, seed_uniform_free,
    systematic_resample, BinConfig, BinSet, BuildError, CloudPool, CloudView, CloudWriter,
    CumulativeWeightTable, GridSearchConfig, KldConfig, KldFilter, KldState, Localizer,
    MotionNoise, Particle, ParticleCloud, RangeModel, StandardConfig, StandardFilter,
    StandardState, TrackOutcome,
};
