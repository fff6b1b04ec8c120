//! World-model abstraction consumed by the localization engines.
//!
//! # Contents
//!
//! - [`SceneModel`]: the queries engines make against the world
//! - [`BeamConfig`]: mounting pose and limit of one range-sensor beam
//! - [`RangeSample`]: result of a predicted-range raycast
//! - [`PlanarScene`]: axis-aligned flat-world implementation
//!
//! Engines never assume anything about how the world is represented beyond
//! this trait, so a mesh-based scene, an occupancy grid, or the bundled
//! [`PlanarScene`] are interchangeable.

mod planar;

pub use planar::{PlanarScene, SceneBox, SceneCarpet};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::Pose;

/// Mounting pose and range limit of one distance-sensor beam.
///
/// Offsets are in the body frame: x forward, y left, z up from the axle
/// midpoint, millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamConfig {
    /// Sensor position relative to the axle midpoint.
    pub offset: [f64; 3],
    /// Beam tilt relative to the body, radians, positive downward.
    pub pitch: f64,
    /// Beam heading relative to the body, radians.
    pub yaw: f64,
    /// Largest distance the sensor reports, millimeters.
    pub max_range: f64,
}

impl BeamConfig {
    /// Level beam pointing `yaw` radians off the body heading.
    pub fn level(offset: [f64; 3], yaw: f64, max_range: f64) -> Self {
        Self { offset, pitch: 0.0, yaw, max_range }
    }
}

/// Outcome of casting one beam from a hypothetical pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    /// Distance to the first surface, clamped to the beam maximum, mm.
    pub distance: f64,
    /// Planar hit location, absent when the beam ran out at max range.
    pub hit_point: Option<(f64, f64)>,
    /// Index of the obstruction that was hit, `None` for walls and
    /// max-range misses.
    pub hit_object: Option<usize>,
}

impl RangeSample {
    /// Sample for a beam that reached its maximum range unobstructed.
    pub fn miss(max_range: f64) -> Self {
        Self { distance: max_range, hit_point: None, hit_object: None }
    }
}

/// Queries the localization engines make against the world model.
///
/// Implementations must be cheap: the adaptive engine calls
/// [`SceneModel::predicted_range`] once per beam for every particle it
/// generates, which during a floor-wide seeding sweep means hundreds of
/// thousands of casts.
pub trait SceneModel {
    /// Floor extent `(width, height)` in millimeters.
    fn floor_size(&self) -> (f64, f64);

    /// Whether the planar point lies on the floor, boundary inclusive.
    fn is_on_floor(&self, x: f64, y: f64) -> bool;

    /// Number of elevated obstructions in the scene.
    fn obstruction_count(&self) -> usize;

    /// Height of the obstruction's underside above the floor, millimeters.
    fn obstruction_elevation(&self, index: usize) -> f64;

    /// Whether the planar point lies inside the obstruction's footprint.
    fn is_under_obstruction(&self, index: usize, x: f64, y: f64) -> bool;

    /// Mounted range-sensor beams, in `SensorFrame::ranges` order.
    fn beams(&self) -> &[BeamConfig];

    /// Predicted reading of `beam` as seen from `pose`.
    fn predicted_range(&self, beam: &BeamConfig, pose: &Pose) -> RangeSample;
}

impl<S: SceneModel + ?Sized> SceneModel for &S {
    fn floor_size(&self) -> (f64, f64) {
        (**self).floor_size()
    }

    fn is_on_floor(&self, x: f64, y: f64) -> bool {
        (**self).is_on_floor(x, y)
    }

    fn obstruction_count(&self) -> usize {
        (**self).obstruction_count()
    }

    fn obstruction_elevation(&self, index: usize) -> f64 {
        (**self).obstruction_elevation(index)
    }

    fn is_under_obstruction(&self, index: usize, x: f64, y: f64) -> bool {
        (**self).is_under_obstruction(index, x, y)
    }

    fn beams(&self) -> &[BeamConfig] {
        (**self).beams()
    }

    fn predicted_range(&self, beam: &BeamConfig, pose: &Pose) -> RangeSample {
        (**self).predicted_range(beam, pose)
    }
}

impl<S: SceneModel + ?Sized> SceneModel for Arc<S> {
    fn floor_size(&self) -> (f64, f64) {
        (**self).floor_size()
    }

    fn is_on_floor(&self, x: f64, y: f64) -> bool {
        (**self).is_on_floor(x, y)
    }

    fn obstruction_count(&self) -> usize {
        (**self).obstruction_count()
    }

    fn obstruction_elevation(&self, index: usize) -> f64 {
        (**self).obstruction_elevation(index)
    }

    fn is_under_obstruction(&self, index: usize, x: f64, y: f64) -> bool {
        (**self).is_under_obstruction(index, x, y)
    }

    fn beams(&self) -> &[BeamConfig] {
        (**self).beams()
    }

    fn predicted_range(&self, beam: &BeamConfig, pose: &Pose) -> RangeSample {
        (**self).predicted_range(beam, pose)
    }
}
