//! Differential-drive motion model with wheel-space noise.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::math::sample_gaussian;
use crate::core::types::RobotGeometry;
use crate::filter::particle::Particle;

/// Standard deviations of the odometry noise model.
///
/// Noise is injected in wheel space rather than pose space: a shared
/// `drive` term nudges both wheels together and a differential `steer`
/// term nudges them apart, so position and heading spread stay coupled
/// exactly the way the drive train couples them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionNoise {
    /// Pitch measurement noise, radians.
    pub pitch_std: f64,
    /// Shared forward noise added to both wheel deltas, radians.
    pub drive_std: f64,
    /// Differential noise, subtracted from the left wheel delta and added
    /// to the right, radians.
    pub steer_std: f64,
}

impl MotionNoise {
    /// Tight spread for a pose that is already well constrained.
    pub fn tracking() -> Self {
        Self { pitch_std: 0.01, drive_std: 0.25, steer_std: 0.1 }
    }

    /// No noise at all. Propagation becomes pure dead reckoning.
    pub fn none() -> Self {
        Self { pitch_std: 0.0, drive_std: 0.0, steer_std: 0.0 }
    }
}

impl Default for MotionNoise {
    /// Wide spread suited to global relocalization.
    fn default() -> Self {
        Self { pitch_std: 0.01, drive_std: 0.4, steer_std: 0.2 }
    }
}

/// Propagates `parent` through one odometry step into `child`.
///
/// The child starts as a copy of the parent, then receives a fresh pitch
/// drawn around `measured_pitch` and noisy wheel deltas derived from
/// `wheel_left`/`wheel_right`. Heading is recomputed from the perturbed
/// wheel angles and the position advances along the new heading.
///
/// Exactly three Gaussian draws are consumed, in pitch, drive, steer
/// order, so a seeded engine replays identically. The child's weight is
/// left for the caller's weighting pass.
///
/// Returns the child's new heading.
pub fn propagate_into<R: Rng>(
    child: &mut Particle,
    parent: &Particle,
    measured_pitch: f64,
    wheel_left: f64,
    wheel_right: f64,
    noise: &MotionNoise,
    geometry: &RobotGeometry,
    rng: &mut R,
) -> f64 {
    child.clone_from(parent);
    child.pitch = sample_gaussian(rng, measured_pitch, noise.pitch_std);

    let drive = sample_gaussian(rng, 0.0, noise.drive_std);
    let steer = sample_gaussian(rng, 0.0, noise.steer_std);
    let delta_left = wheel_left + drive - steer;
    let delta_right = wheel_right + drive + steer;

    child.theta_left += delta_left;
    child.theta_right += delta_right;
    let yaw = child.yaw(geometry);

    let forward = 0.5 * geometry.wheel_radius * (delta_left + delta_right);
    child.x += forward * yaw.cos();
    child.y += forward * yaw.sin();
    yaw
}
