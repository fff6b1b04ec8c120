//! Axis-aligned flat-world scene.
//!
//! A rectangular floor with vertical boundary walls, box obstructions
//! standing on legs, and one optional carpet patch that raises the sensor
//! plane. Raycasts are planar: the beam travels at a fixed height and a box
//! only blocks it when its vertical span contains that height. Beam tilt is
//! ignored, which is accurate for level beams and short ranges.

use serde::{Deserialize, Serialize};

use crate::core::types::Pose;
use crate::scene::{BeamConfig, RangeSample, SceneModel};

/// Box obstruction standing above the floor, axis aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBox {
    /// Minimum-corner x of the footprint, millimeters.
    pub x: f64,
    /// Minimum-corner y of the footprint, millimeters.
    pub y: f64,
    /// Footprint extent along x, millimeters.
    pub size_x: f64,
    /// Footprint extent along y, millimeters.
    pub size_y: f64,
    /// Height of the underside above the floor, millimeters.
    pub elevation: f64,
    /// Vertical extent of the body, millimeters.
    pub height: f64,
}

impl SceneBox {
    /// Whether the planar point lies inside the footprint, edges inclusive.
    pub fn footprint_contains(&self, x: f64, y: f64) -> bool {
        self.x <= x && x <= self.x + self.size_x && self.y <= y && y <= self.y + self.size_y
    }

    fn spans_height(&self, z: f64) -> bool {
        self.elevation <= z && z <= self.elevation + self.height
    }
}

/// Carpet rectangle that lifts the robot, and with it the sensor plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneCarpet {
    pub x: f64,
    pub y: f64,
    pub size_x: f64,
    pub size_y: f64,
    /// Pile height, millimeters.
    pub height: f64,
}

impl SceneCarpet {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x <= x && x <= self.x + self.size_x && self.y <= y && y <= self.y + self.size_y
    }
}

/// Flat rectangular world with walls, boxes, and an optional carpet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanarScene {
    /// Floor extent along x, millimeters.
    pub floor_width: f64,
    /// Floor extent along y, millimeters.
    pub floor_height: f64,
    /// Height of the beam origin plane above the floor, millimeters.
    /// Matches the axle height of the platform the beams are mounted on.
    pub axle_height: f64,
    pub boxes: Vec<SceneBox>,
    pub carpet: Option<SceneCarpet>,
    pub beams: Vec<BeamConfig>,
}

impl PlanarScene {
    pub fn new(floor_width: f64, floor_height: f64, beams: Vec<BeamConfig>) -> Self {
        Self {
            floor_width,
            floor_height,
            axle_height: 26.0,
            boxes: Vec::new(),
            carpet: None,
            beams,
        }
    }

    pub fn with_box(mut self, obstruction: SceneBox) -> Self {
        self.boxes.push(obstruction);
        self
    }

    pub fn with_carpet(mut self, carpet: SceneCarpet) -> Self {
        self.carpet = Some(carpet);
        self
    }

    /// Distance along `(dx, dy)` from an on-floor origin to the boundary.
    ///
    /// Origins off the floor see no walls and return `None`.
    fn boundary_distance(&self, ox: f64, oy: f64, dx: f64, dy: f64) -> Option<f64> {
        if !self.is_on_floor(ox, oy) {
            return None;
        }
        let mut t = f64::INFINITY;
        if dx.abs() > 1e-12 {
            let wall = if dx > 0.0 { self.floor_width } else { 0.0 };
            t = t.min((wall - ox) / dx);
        }
        if dy.abs() > 1e-12 {
            let wall = if dy > 0.0 { self.floor_height } else { 0.0 };
            t = t.min((wall - oy) / dy);
        }
        t.is_finite().then_some(t.max(0.0))
    }
}

/// Entry distance of a planar ray into an axis-aligned footprint.
fn ray_box_distance(ox: f64, oy: f64, dx: f64, dy: f64, obstruction: &SceneBox) -> Option<f64> {
    let mut t_near = f64::NEG_INFINITY;
    let mut t_far = f64::INFINITY;
    let axes = [
        (ox, dx, obstruction.x, obstruction.x + obstruction.size_x),
        (oy, dy, obstruction.y, obstruction.y + obstruction.size_y),
    ];
    for (origin, dir, lo, hi) in axes {
        if dir.abs() < 1e-12 {
            if origin < lo || origin > hi {
                return None;
            }
        } else {
            let mut t0 = (lo - origin) / dir;
            let mut t1 = (hi - origin) / dir;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
        }
    }
    (t_near <= t_far && t_far > 0.0).then(|| t_near.max(0.0))
}

impl SceneModel for PlanarScene {
    fn floor_size(&self) -> (f64, f64) {
        (self.floor_width, self.floor_height)
    }

    fn is_on_floor(&self, x: f64, y: f64) -> bool {
        0.0 <= x && x <= self.floor_width && 0.0 <= y && y <= self.floor_height
    }

    fn obstruction_count(&self) -> usize {
        self.boxes.len()
    }

    fn obstruction_elevation(&self, index: usize) -> f64 {
        self.boxes[index].elevation
    }

    fn is_under_obstruction(&self, index: usize, x: f64, y: f64) -> bool {
        self.boxes[index].footprint_contains(x, y)
    }

    fn beams(&self) -> &[BeamConfig] {
        &self.beams
    }

    fn predicted_range(&self, beam: &BeamConfig, pose: &Pose) -> RangeSample {
        let (sin_yaw, cos_yaw) = pose.yaw.sin_cos();
        let ox = pose.x + beam.offset[0] * cos_yaw - beam.offset[1] * sin_yaw;
        let oy = pose.y + beam.offset[0] * sin_yaw + beam.offset[1] * cos_yaw;
        let (dy, dx) = (pose.yaw + beam.yaw).sin_cos();

        let carpet_lift = match &self.carpet {
            Some(c) if c.contains(pose.x, pose.y) => c.height,
            _ => 0.0,
        };
        let beam_z = self.axle_height + beam.offset[2] + carpet_lift;

        let mut sample = RangeSample::miss(beam.max_range);
        if let Some(t) = self.boundary_distance(ox, oy, dx, dy) {
            if t < sample.distance {
                sample.distance = t;
                sample.hit_point = Some((ox + t * dx, oy + t * dy));
                sample.hit_object = None;
            }
        }
        for (index, obstruction) in self.boxes.iter().enumerate() {
            if !obstruction.spans_height(beam_z) {
                continue;
            }
            if let Some(t) = ray_box_distance(ox, oy, dx, dy, obstruction) {
                if t < sample.distance {
                    sample.distance = t;
                    sample.hit_point = Some((ox + t * dx, oy + t * dy));
                    sample.hit_object = Some(index);
                }
            }
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn east_beam(max_range: f64) -> BeamConfig {
        BeamConfig::level([0.0, 0.0, 0.0], 0.0, max_range)
    }

    #[test]
    fn test_floor_bounds_inclusive() {
        let scene = PlanarScene::new(2000.0, 1000.0, vec![]);
        assert!(scene.is_on_floor(0.0, 0.0));
        assert!(scene.is_on_floor(2000.0, 1000.0));
        assert!(!scene.is_on_floor(-0.001, 500.0));
        assert!(!scene.is_on_floor(500.0, 1000.001));
    }

    #[test]
    fn test_beam_hits_wall() {
        let scene = PlanarScene::new(2000.0, 2000.0, vec![east_beam(1500.0)]);
        let pose = Pose::new(1000.0, 1000.0, 0.0, 0.0);
        let sample = scene.predicted_range(&scene.beams[0], &pose);
        assert_relative_eq!(sample.distance, 1000.0, epsilon = 1e-9);
        let (hx, hy) = sample.hit_point.unwrap();
        assert_relative_eq!(hx, 2000.0, epsilon = 1e-9);
        assert_relative_eq!(hy, 1000.0, epsilon = 1e-9);
        assert_eq!(sample.hit_object, None);
    }

    #[test]
    fn test_beam_miss_at_max_range() {
        let scene = PlanarScene::new(2000.0, 2000.0, vec![east_beam(800.0)]);
        let pose = Pose::new(1000.0, 1000.0, 0.0, 0.0);
        let sample = scene.predicted_range(&scene.beams[0], &pose);
        assert_relative_eq!(sample.distance, 800.0);
        assert_eq!(sample.hit_point, None);
        assert_eq!(sample.hit_object, None);
    }

    #[test]
    fn test_beam_offset_rotates_with_pose() {
        let beam = BeamConfig::level([50.0, 30.0, 0.0], 0.0, 1500.0);
        let scene = PlanarScene::new(2000.0, 2000.0, vec![beam]);
        // Facing +y: the forward offset points along +y, the left offset
        // along -x, and the beam flies toward the y = 2000 wall.
        let pose = Pose::new(1000.0, 1000.0, 0.0, FRAC_PI_2);
        let sample = scene.predicted_range(&scene.beams[0], &pose);
        assert_relative_eq!(sample.distance, 950.0, epsilon = 1e-9);
        let (hx, hy) = sample.hit_point.unwrap();
        assert_relative_eq!(hx, 970.0, epsilon = 1e-9);
        assert_relative_eq!(hy, 2000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_box_blocks_beam() {
        let obstruction = SceneBox {
            x: 1400.0,
            y: 900.0,
            size_x: 200.0,
            size_y: 200.0,
            elevation: 0.0,
            height: 300.0,
        };
        let scene =
            PlanarScene::new(2000.0, 2000.0, vec![east_beam(1500.0)]).with_box(obstruction);
        let pose = Pose::new(1000.0, 1000.0, 0.0, 0.0);
        let sample = scene.predicted_range(&scene.beams[0], &pose);
        assert_relative_eq!(sample.distance, 400.0, epsilon = 1e-9);
        assert_eq!(sample.hit_object, Some(0));
    }

    #[test]
    fn test_elevated_box_passes_under_beamless() {
        let obstruction = SceneBox {
            x: 1400.0,
            y: 900.0,
            size_x: 200.0,
            size_y: 200.0,
            elevation: 200.0,
            height: 300.0,
        };
        let scene =
            PlanarScene::new(2000.0, 2000.0, vec![east_beam(1500.0)]).with_box(obstruction);
        let pose = Pose::new(1000.0, 1000.0, 0.0, 0.0);
        // The beam plane sits at 26 mm, well under the raised box.
        let sample = scene.predicted_range(&scene.beams[0], &pose);
        assert_relative_eq!(sample.distance, 1000.0, epsilon = 1e-9);
        assert_eq!(sample.hit_object, None);
    }

    #[test]
    fn test_carpet_lifts_beam_into_box() {
        let obstruction = SceneBox {
            x: 1400.0,
            y: 900.0,
            size_x: 200.0,
            size_y: 200.0,
            elevation: 40.0,
            height: 300.0,
        };
        let carpet = SceneCarpet { x: 0.0, y: 0.0, size_x: 1200.0, size_y: 2000.0, height: 20.0 };
        let bare = PlanarScene::new(2000.0, 2000.0, vec![east_beam(1500.0)])
            .with_box(obstruction);
        let carpeted = bare.clone().with_carpet(carpet);
        let pose = Pose::new(1000.0, 1000.0, 0.0, 0.0);

        // Off carpet the beam plane is 26 mm and slides under the box.
        let low = bare.predicted_range(&bare.beams[0], &pose);
        assert_eq!(low.hit_object, None);

        // On carpet the plane rises to 46 mm and the box blocks the beam.
        let lifted = carpeted.predicted_range(&carpeted.beams[0], &pose);
        assert_eq!(lifted.hit_object, Some(0));
        assert_relative_eq!(lifted.distance, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_off_floor_origin_sees_no_walls() {
        let beam = BeamConfig::level([100.0, 0.0, 0.0], 0.0, 900.0);
        let scene = PlanarScene::new(2000.0, 2000.0, vec![beam]);
        // The sensor origin pokes past the east wall.
        let pose = Pose::new(1950.0, 1000.0, 0.0, 0.0);
        let sample = scene.predicted_range(&scene.beams[0], &pose);
        assert_relative_eq!(sample.distance, 900.0);
        assert_eq!(sample.hit_point, None);
    }

    #[test]
    fn test_under_obstruction_queries() {
        let obstruction = SceneBox {
            x: 100.0,
            y: 100.0,
            size_x: 50.0,
            size_y: 80.0,
            elevation: 120.0,
            height: 40.0,
        };
        let scene = PlanarScene::new(500.0, 500.0, vec![]).with_box(obstruction);
        assert_eq!(scene.obstruction_count(), 1);
        assert_relative_eq!(scene.obstruction_elevation(0), 120.0);
        assert!(scene.is_under_obstruction(0, 125.0, 150.0));
        assert!(scene.is_under_obstruction(0, 100.0, 100.0));
        assert!(!scene.is_under_obstruction(0, 151.0, 150.0));
    }
}
