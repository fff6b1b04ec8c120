//! Fixed-size bootstrap localization with Neff-gated resampling.
//!
//! The cloud keeps a constant particle count. Each frame propagates every
//! particle through the odometry model, multiplies its prior weight by the
//! range likelihood, and publishes. When the effective sample size
//! `1 / sum(w^2)` falls under the configured fraction of the cloud, a
//! deterministic systematic resample into a third buffer restores uniform
//! weights before publication.
//!
//! Short readings carry no information near the sensor dead zone and long
//! ones saturate, so readings are gated below `use_min` and clamped at
//! `use_max` before weighting. The adaptive engine has no such gate; this
//! engine trades its floor-wide relocalization sweep for cheap fixed-cost
//! steps and is meant for tracking from a roughly known start.

use std::sync::Arc;

use log::{debug, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::core::types::{Pose, RobotGeometry, SensorFrame};
use crate::filter::cloud::CloudPool;
use crate::filter::motion::{propagate_into, MotionNoise};
use crate::filter::particle::Particle;
use crate::filter::resample::systematic_resample;
use crate::filter::seed::seed_uniform_free;
use crate::filter::sensor::{pose_weight, RangeModel};
use crate::filter::{
    seed_rng, select_low_obstructions, validate_platform, BuildError, Localizer, TrackOutcome,
};
use crate::scene::SceneModel;

/// Tuning of the fixed-size engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardConfig {
    /// Cloud size, constant across generations.
    pub particles: usize,
    /// Resample once the effective sample size drops below this fraction
    /// of the cloud size.
    pub neff_ratio: f64,
    /// Readings at or below this distance are ignored, millimeters.
    pub use_min: f64,
    /// Readings are clamped to this distance before weighting,
    /// millimeters.
    pub use_max: f64,
    /// Pitch spread of the uniform seeding, radians.
    pub seed_pitch_spread: f64,
    pub noise: MotionNoise,
    pub range_model: RangeModel,
    /// RNG seed. Zero draws one from the operating system.
    pub seed: u64,
}

impl Default for StandardConfig {
    fn default() -> Self {
        Self {
            particles: 2000,
            neff_ratio: 0.2,
            use_min: 70.0,
            use_max: 350.0,
            seed_pitch_spread: 0.1,
            noise: MotionNoise::tracking(),
            range_model: RangeModel::default(),
            seed: 0,
        }
    }
}

/// Diagnostics of the engine's most recent activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardState {
    /// Effective sample size of the last generation.
    pub neff: f64,
    /// Whether the last generation was resampled before publication.
    pub resampled: bool,
    /// Raw weight sum of the last generation, before normalization.
    pub weight_sum: f64,
    /// Generations published since construction.
    pub generations: u64,
    /// Generations discarded because every hypothesis weighed zero.
    pub degenerate_frames: u64,
}

/// Fixed-size bootstrap localization engine.
pub struct StandardFilter<S> {
    config: StandardConfig,
    geometry: RobotGeometry,
    scene: S,
    pool: Arc<CloudPool>,
    rng: StdRng,
    low_obstructions: Vec<usize>,
    /// Per-beam participation of the current frame.
    gate: Vec<bool>,
    /// Current readings clamped to `use_max`.
    clamped: Vec<f64>,
    estimate_scratch: Particle,
    state: StandardState,
}

impl<S: SceneModel> StandardFilter<S> {
    /// Builds the engine and preallocates its three cloud buffers, the
    /// third serving the resample copy pass.
    pub fn new(
        config: StandardConfig,
        geometry: RobotGeometry,
        scene: S,
    ) -> Result<Self, BuildError> {
        if config.particles == 0 {
            return Err(BuildError::NoCapacity);
        }
        if !(config.neff_ratio > 0.0 && config.neff_ratio <= 1.0) {
            return Err(BuildError::InvalidNeffRatio(config.neff_ratio));
        }
        if !(config.use_min < config.use_max) {
            return Err(BuildError::InvalidGate {
                use_min: config.use_min,
                use_max: config.use_max,
            });
        }
        validate_platform(&scene, &geometry)?;

        let beam_count = scene.beams().len();
        debug!(
            "fixed engine: {} particles, neff ratio {}, gate {}..{} mm",
            config.particles, config.neff_ratio, config.use_min, config.use_max
        );
        Ok(Self {
            pool: CloudPool::new(3, config.particles, beam_count),
            rng: seed_rng(config.seed),
            low_obstructions: select_low_obstructions(&scene, &geometry),
            gate: vec![false; beam_count],
            clamped: vec![0.0; beam_count],
            estimate_scratch: Particle::zeroed(beam_count),
            state: StandardState::default(),
            config,
            geometry,
            scene,
        })
    }

    pub fn config(&self) -> &StandardConfig {
        &self.config
    }

    pub fn state(&self) -> &StandardState {
        &self.state
    }

    pub fn pool(&self) -> &Arc<CloudPool> {
        &self.pool
    }

    /// Scatters the cloud uniformly over free floor, publishes it, then
    /// runs one stationary weighting pass against the given readings.
    pub fn init(&mut self, pitch: f64, ranges: &[f64]) -> TrackOutcome {
        self.init_impl(pitch, ranges)
    }

    /// Consumes one frame: propagate every particle, weigh, optionally
    /// resample, publish.
    ///
    /// Delegates to [`StandardFilter::init`] when the published cloud is
    /// empty.
    pub fn track(&mut self, frame: &SensorFrame) -> TrackOutcome {
        self.track_impl(frame)
    }

    fn init_impl(&mut self, pitch: f64, ranges: &[f64]) -> TrackOutcome {
        let mut target = self.pool.checkout();
        let placed = seed_uniform_free(
            &self.scene,
            &self.low_obstructions,
            &self.geometry,
            self.config.seed_pitch_spread,
            self.config.particles,
            &mut target,
            &mut self.rng,
        );

        if placed == 0 {
            drop(target);
            warn!("uniform seeding found no free floor, keeping previous cloud");
            self.state.degenerate_frames += 1;
            return TrackOutcome::Degenerate;
        }
        self.pool.publish(target, None);

        // Weigh the scatter in place so the first published estimate
        // already reflects the readings.
        self.track_impl(&SensorFrame::stationary(pitch, ranges.to_vec()))
    }

    fn track_impl(&mut self, frame: &SensorFrame) -> TrackOutcome {
        if self.pool.active_len() == 0 {
            return self.init_impl(frame.pitch, &frame.ranges);
        }

        debug_assert_eq!(frame.ranges.len(), self.gate.len(), "one reading per beam");
        for (index, &reading) in frame.ranges.iter().enumerate() {
            self.gate[index] = reading > self.config.use_min;
            self.clamped[index] = reading.min(self.config.use_max);
        }

        let source = self.pool.active();
        let mut target = self.pool.checkout();

        let count = source.len();
        let mut weight_sum = 0.0;
        for index in 0..count {
            let parent = &source.particles()[index];
            let child = target.slot_mut(index);
            let yaw = propagate_into(
                child,
                parent,
                frame.pitch,
                frame.wheel_left,
                frame.wheel_right,
                &self.config.noise,
                &self.geometry,
                &mut self.rng,
            );
            let pose = Pose::new(child.x, child.y, child.pitch, yaw);
            let likelihood = pose_weight(
                &self.scene,
                &self.low_obstructions,
                &self.config.range_model,
                &pose,
                &self.clamped,
                Some(&self.gate),
                Some(&mut child.predicted),
            );
            child.weight = parent.weight * likelihood;
            weight_sum += child.weight;
        }
        target.set_len(count);

        if weight_sum <= 0.0 {
            drop(source);
            drop(target);
            warn!("cloud of {count} particles weighed zero, keeping previous cloud");
            self.state.degenerate_frames += 1;
            return TrackOutcome::Degenerate;
        }

        let mut best = 0usize;
        let mut best_weight = f64::NEG_INFINITY;
        let mut square_sum = 0.0;
        for (index, particle) in target.particles_mut().iter_mut().enumerate() {
            particle.weight /= weight_sum;
            square_sum += particle.weight * particle.weight;
            if particle.weight > best_weight {
                best_weight = particle.weight;
                best = index;
            }
        }
        let neff = 1.0 / square_sum;
        self.estimate_scratch.clone_from(&target.particles()[best]);

        self.state.neff = neff;
        self.state.weight_sum = weight_sum;
        self.state.generations += 1;
        let resample = neff < self.config.neff_ratio * count as f64;
        self.state.resampled = resample;

        drop(source);
        if resample {
            let mut fresh = self.pool.checkout();
            systematic_resample(&target, &mut fresh);
            drop(target);
            self.pool.publish(fresh, Some(&self.estimate_scratch));
        } else {
            self.pool.publish(target, Some(&self.estimate_scratch));
        }
        debug!("generation {}: neff {neff:.1} of {count}", self.state.generations);
        TrackOutcome::Updated { particles: count }
    }
}

impl<S: SceneModel> Localizer for StandardFilter<S> {
    fn init(&mut self, pitch: f64, ranges: &[f64]) -> TrackOutcome {
        self.init_impl(pitch, ranges)
    }

    fn track(&mut self, frame: &SensorFrame) -> TrackOutcome {
        self.track_impl(frame)
    }

    fn pool(&self) -> &Arc<CloudPool> {
        &self.pool
    }
}
