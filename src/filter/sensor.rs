//! Range-sensor likelihood model.

use serde::{Deserialize, Serialize};

use crate::core::types::Pose;
use crate::scene::SceneModel;

/// Per-beam Gaussian range likelihood.
///
/// Weights are products over beams, so the density is floored at
/// `min_density`: one wild reading scales a particle down by up to ten
/// orders of magnitude but never erases it outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeModel {
    /// Reading noise, millimeters.
    pub sigma: f64,
    /// Lower bound on the per-beam density.
    pub min_density: f64,
}

impl Default for RangeModel {
    fn default() -> Self {
        Self { sigma: 50.0, min_density: 1e-10 }
    }
}

impl RangeModel {
    /// Unnormalized Gaussian density of `measured` around `predicted`.
    #[inline]
    pub fn density(&self, measured: f64, predicted: f64) -> f64 {
        let z = (measured - predicted) / self.sigma;
        ((-0.5 * z * z).exp() / self.sigma).max(self.min_density)
    }
}

/// Whether the point lies under any of the listed obstructions.
pub(crate) fn under_any_obstruction<S: SceneModel + ?Sized>(
    scene: &S,
    obstructions: &[usize],
    x: f64,
    y: f64,
) -> bool {
    obstructions.iter().any(|&index| scene.is_under_obstruction(index, x, y))
}

/// Weight of a pose hypothesis against one frame of range readings.
///
/// A pose off the floor, or under any obstruction listed in
/// `low_obstructions`, weighs exactly zero and no beams are cast.
/// Otherwise the weight is the product over beams of the density between
/// each reading and the range the scene predicts from this pose.
///
/// `gate`, when present, marks which beams participate; skipped beams are
/// not cast. `predicted`, when present, receives the predicted distance of
/// every beam that was cast, and keeps its old value for beams that were
/// not.
pub fn pose_weight<S: SceneModel + ?Sized>(
    scene: &S,
    low_obstructions: &[usize],
    model: &RangeModel,
    pose: &Pose,
    readings: &[f64],
    gate: Option<&[bool]>,
    mut predicted: Option<&mut [f64]>,
) -> f64 {
    if !scene.is_on_floor(pose.x, pose.y) {
        return 0.0;
    }
    if under_any_obstruction(scene, low_obstructions, pose.x, pose.y) {
        return 0.0;
    }

    let beams = scene.beams();
    debug_assert_eq!(readings.len(), beams.len(), "one reading per beam");

    let mut weight = 1.0;
    for (index, beam) in beams.iter().enumerate() {
        if gate.is_some_and(|g| !g[index]) {
            continue;
        }
        let sample = scene.predicted_range(beam, pose);
        if let Some(out) = predicted.as_deref_mut() {
            out[index] = sample.distance;
        }
        weight *= model.density(readings[index], sample.distance);
    }
    weight
}
