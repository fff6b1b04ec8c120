//! Weighted pose hypothesis.

use serde::{Deserialize, Serialize};

use crate::core::types::{Pose, RobotGeometry};

/// One pose hypothesis with its importance weight.
///
/// Heading is not stored directly. The accumulated wheel angles
/// `theta_left` and `theta_right` encode it, and [`Particle::yaw`] recovers
/// it through the drive geometry. Motion propagation perturbs the wheel
/// angles and the heading follows from the same formula the platform obeys.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Position, millimeters.
    pub x: f64,
    pub y: f64,
    /// Body pitch, radians.
    pub pitch: f64,
    /// Accumulated left-wheel angle, radians.
    pub theta_left: f64,
    /// Accumulated right-wheel angle, radians.
    pub theta_right: f64,
    /// Importance weight. Normalized to sum 1 within a published cloud.
    pub weight: f64,
    /// Predicted beam distances from the most recent weighting pass that
    /// cast this particle's beams, millimeters.
    pub predicted: Vec<f64>,
}

impl Particle {
    /// Particle at the origin with `beam_count` predicted-distance slots.
    pub fn zeroed(beam_count: usize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            pitch: 0.0,
            theta_left: 0.0,
            theta_right: 0.0,
            weight: 0.0,
            predicted: vec![0.0; beam_count],
        }
    }

    /// Heading encoded by the wheel angles.
    #[inline]
    pub fn yaw(&self, geometry: &RobotGeometry) -> f64 {
        geometry.yaw_from_wheels(self.theta_left, self.theta_right)
    }

    /// Full pose of this particle.
    pub fn pose(&self, geometry: &RobotGeometry) -> Pose {
        Pose::new(self.x, self.y, self.pitch, self.yaw(geometry))
    }

    /// Overwrites this particle with the given pose and weight.
    ///
    /// The yaw is split into a symmetric wheel-angle pair, so
    /// [`Particle::yaw`] recovers it exactly. Predicted distances are left
    /// for the next weighting pass to fill.
    pub fn place(
        &mut self,
        weight: f64,
        x: f64,
        y: f64,
        pitch: f64,
        yaw: f64,
        geometry: &RobotGeometry,
    ) {
        let half_arc = yaw * geometry.track_width / (2.0 * geometry.wheel_radius);
        self.x = x;
        self.y = y;
        self.pitch = pitch;
        self.theta_left = -half_arc;
        self.theta_right = half_arc;
        self.weight = weight;
    }
}

impl Clone for Particle {
    fn clone(&self) -> Self {
        Self {
            x: self.x,
            y: self.y,
            pitch: self.pitch,
            theta_left: self.theta_left,
            theta_right: self.theta_right,
            weight: self.weight,
            predicted: self.predicted.clone(),
        }
    }

    // Keeps the predicted buffer's allocation when lengths match.
    fn clone_from(&mut self, source: &Self) {
        self.x = source.x;
        self.y = source.y;
        self.pitch = source.pitch;
        self.theta_left = source.theta_left;
        self.theta_right = source.theta_right;
        self.weight = source.weight;
        self.predicted.clone_from(&source.predicted);
    }
}
