//! Shared fixtures for the localization integration tests.

#![allow(dead_code)]

use std::f64::consts::FRAC_PI_2;

use tula_loc::{BeamConfig, CloudPool, PlanarScene, RobotGeometry, SceneBox, SensorFrame};

/// Rectangular floor with forward, left, and right level beams mounted at
/// the body origin.
pub fn three_beam_scene(width: f64, height: f64, max_range: f64) -> PlanarScene {
    PlanarScene::new(
        width,
        height,
        vec![
            BeamConfig::level([0.0, 0.0, 0.0], 0.0, max_range),
            BeamConfig::level([0.0, 0.0, 0.0], FRAC_PI_2, max_range),
            BeamConfig::level([0.0, 0.0, 0.0], -FRAC_PI_2, max_range),
        ],
    )
}

/// 2000 x 1000 corridor with a floor-standing crate near the west end.
///
/// A bare corridor is symmetric under a half-turn, so range readings alone
/// cannot separate a pose from its mirror image. The crate truncates the
/// westward beam at the mirror pose, draining that mode. Corner poses and
/// poses reading off the crate's east face still come close to the same
/// readings, so the posterior stays multi-modal.
pub fn corridor_with_landmark() -> PlanarScene {
    let crate_box = SceneBox {
        x: 150.0,
        y: 600.0,
        size_x: 100.0,
        size_y: 200.0,
        elevation: 0.0,
        height: 300.0,
    };
    three_beam_scene(2000.0, 1000.0, 800.0).with_box(crate_box)
}

/// Frame driving both wheels straight ahead by `distance` millimeters.
pub fn drive_frame(geometry: &RobotGeometry, distance: f64, ranges: Vec<f64>) -> SensorFrame {
    let wheel = distance / geometry.wheel_radius;
    SensorFrame::new(0.0, wheel, wheel, ranges)
}

/// Weight sum of the published cloud.
pub fn published_weight_sum(pool: &CloudPool) -> f64 {
    pool.active().particles().iter().map(|p| p.weight).sum()
}
