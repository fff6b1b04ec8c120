//! Shared pose, platform-geometry, and sensor-frame types.

use serde::{Deserialize, Serialize};

/// Planar robot pose plus body pitch.
///
/// `x` and `y` are millimeters in the scene frame. `pitch` is the body lean
/// angle and `yaw` the heading, both radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, pitch: f64, yaw: f64) -> Self {
        Self { x, y, pitch, yaw }
    }
}

/// Physical constants of the two-wheeled platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotGeometry {
    /// Wheel radius, millimeters.
    pub wheel_radius: f64,
    /// Distance between the wheel contact points, millimeters.
    pub track_width: f64,
    /// Body extent above the axle, millimeters.
    pub body_height: f64,
}

impl RobotGeometry {
    /// Heading implied by a pair of accumulated wheel angles.
    ///
    /// Spinning the right wheel forward by `dr` and the left by `dl` turns
    /// the body by `(dr - dl) * wheel_radius / track_width` radians.
    #[inline]
    pub fn yaw_from_wheels(&self, theta_left: f64, theta_right: f64) -> f64 {
        (theta_right - theta_left) * self.wheel_radius / self.track_width
    }

    /// Height of the top of the body above the floor.
    ///
    /// Obstructions whose underside sits above this height cannot collide
    /// with the robot and are ignored by pose validity checks.
    #[inline]
    pub fn clearance_height(&self) -> f64 {
        self.body_height + self.wheel_radius
    }
}

impl Default for RobotGeometry {
    fn default() -> Self {
        Self { wheel_radius: 26.0, track_width: 160.0, body_height: 240.0 }
    }
}

/// One odometry + range input frame for a tracking step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Measured body pitch, radians.
    pub pitch: f64,
    /// Left wheel rotation since the previous frame, radians.
    pub wheel_left: f64,
    /// Right wheel rotation since the previous frame, radians.
    pub wheel_right: f64,
    /// Range readings in millimeters, one per scene beam. The driver clamps
    /// readings to each beam's maximum range before handing them over.
    pub ranges: Vec<f64>,
}

impl SensorFrame {
    pub fn new(pitch: f64, wheel_left: f64, wheel_right: f64, ranges: Vec<f64>) -> Self {
        Self { pitch, wheel_left, wheel_right, ranges }
    }

    /// Frame with no wheel motion, used to reweight a freshly seeded cloud.
    pub fn stationary(pitch: f64, ranges: Vec<f64>) -> Self {
        Self::new(pitch, 0.0, 0.0, ranges)
    }
}
