//! Adaptively sized Monte Carlo localization.
//!
//! Each tracking step regenerates the cloud by sequential importance
//! resampling: ancestors are drawn from the published generation through a
//! cumulative weight table, propagated through the odometry model, and
//! weighed against the range readings. Generation stops as soon as the
//! sample count covers the pose-space spread of what has been generated so
//! far, per the KLD criterion: after `n` samples occupying `k` distinct
//! bins, generation continues only while `n < k / epsilon` and
//! `n < max_particles`. A converged cloud occupies a handful of bins and
//! stops within a few dozen samples; a dispersed one keeps going until the
//! hard cap.
//!
//! The engine owns two cloud buffers. Readers always see the last
//! published generation while the next one is written into the spare, and
//! publication is a buffer-index swap. When the published cloud is empty,
//! or on an explicit [`KldFilter::init`], the engine relocalizes from
//! scratch by sweeping a pose grid over the whole floor and keeping the
//! best-scoring candidates.
//!
//! Wheel motion is accumulated across frames and applied in one step once
//! it crosses the configured threshold, so a robot balancing in place does
//! not erode its cloud with pure noise.

use std::sync::Arc;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{Pose, RobotGeometry, SensorFrame};
use crate::filter::bins::{BinConfig, BinSet};
use crate::filter::cloud::CloudPool;
use crate::filter::motion::{propagate_into, MotionNoise};
use crate::filter::particle::Particle;
use crate::filter::resample::CumulativeWeightTable;
use crate::filter::seed::{grid_search_seed, GridSearchConfig};
use crate::filter::sensor::{pose_weight, RangeModel};
use crate::filter::{
    seed_rng, select_low_obstructions, validate_platform, BuildError, Localizer, TrackOutcome,
};
use crate::scene::SceneModel;

/// Tuning of the adaptive engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KldConfig {
    /// Hard upper bound on the generation size.
    pub max_particles: usize,
    /// KLD error bound. A generation stops once its size reaches
    /// `distinct_bins / epsilon`.
    pub epsilon: f64,
    /// Wheel travel below which frames accumulate instead of tracking,
    /// millimeters at the wheel rim.
    pub min_wheel_travel: f64,
    pub noise: MotionNoise,
    pub range_model: RangeModel,
    pub bins: BinConfig,
    pub grid: GridSearchConfig,
    /// RNG seed. Zero draws one from the operating system.
    pub seed: u64,
}

impl Default for KldConfig {
    fn default() -> Self {
        Self {
            max_particles: 10_000,
            epsilon: 0.015,
            min_wheel_travel: 0.0,
            noise: MotionNoise::default(),
            range_model: RangeModel::default(),
            bins: BinConfig::default(),
            grid: GridSearchConfig::default(),
            seed: 0,
        }
    }
}

/// Diagnostics of the engine's most recent activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct KldState {
    /// Size of the last published generation.
    pub generation_size: usize,
    /// Distinct pose bins occupied by the last tracked generation.
    pub distinct_bins: usize,
    /// Raw weight sum of the last tracked generation, before
    /// normalization.
    pub weight_sum: f64,
    /// Generations published since construction.
    pub generations: u64,
    /// Frames absorbed into the motion accumulator without tracking.
    pub stationary_frames: u64,
    /// Generations discarded because every hypothesis weighed zero.
    pub degenerate_frames: u64,
}

/// KLD-adaptive Monte Carlo localization engine.
///
/// Generic over the scene model; share a scene by passing an
/// `Arc<PlanarScene>` or any other [`SceneModel`] implementation.
pub struct KldFilter<S> {
    config: KldConfig,
    geometry: RobotGeometry,
    scene: S,
    pool: Arc<CloudPool>,
    rng: StdRng,
    /// Cumulative weights of the published generation.
    table: CumulativeWeightTable,
    /// Cumulative weights of the generation being built.
    next_table: CumulativeWeightTable,
    bins: BinSet,
    low_obstructions: Vec<usize>,
    /// Wheel motion accumulated across stationary frames, radians.
    acc_left: f64,
    acc_right: f64,
    /// Stationary threshold converted to wheel radians.
    min_wheel_rad: f64,
    estimate_scratch: Particle,
    state: KldState,
}

impl<S: SceneModel> KldFilter<S> {
    /// Builds the engine and preallocates its two cloud buffers.
    pub fn new(config: KldConfig, geometry: RobotGeometry, scene: S) -> Result<Self, BuildError> {
        if config.max_particles == 0 {
            return Err(BuildError::NoCapacity);
        }
        if !(config.epsilon > 0.0) {
            return Err(BuildError::InvalidEpsilon(config.epsilon));
        }
        validate_platform(&scene, &geometry)?;

        let beam_count = scene.beams().len();
        let (floor_width, _) = scene.floor_size();
        debug!(
            "adaptive engine: cap {} particles, epsilon {}, {beam_count} beams",
            config.max_particles, config.epsilon
        );
        Ok(Self {
            pool: CloudPool::new(2, config.max_particles, beam_count),
            rng: seed_rng(config.seed),
            table: CumulativeWeightTable::with_capacity(config.max_particles),
            next_table: CumulativeWeightTable::with_capacity(config.max_particles),
            bins: BinSet::new(config.bins, floor_width),
            low_obstructions: select_low_obstructions(&scene, &geometry),
            acc_left: 0.0,
            acc_right: 0.0,
            min_wheel_rad: config.min_wheel_travel / geometry.wheel_radius,
            estimate_scratch: Particle::zeroed(beam_count),
            state: KldState::default(),
            config,
            geometry,
            scene,
        })
    }

    pub fn config(&self) -> &KldConfig {
        &self.config
    }

    pub fn geometry(&self) -> &RobotGeometry {
        &self.geometry
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn state(&self) -> &KldState {
        &self.state
    }

    pub fn pool(&self) -> &Arc<CloudPool> {
        &self.pool
    }

    /// Discards the published cloud and relocalizes from scratch with a
    /// floor-wide grid sweep against the given readings.
    ///
    /// The seeded cloud is published with uniform weights and no estimate;
    /// the first subsequent track produces one. Returns
    /// [`TrackOutcome::Degenerate`] without publishing when no habitable
    /// grid cell exists.
    pub fn init(&mut self, pitch: f64, ranges: &[f64]) -> TrackOutcome {
        self.init_impl(pitch, ranges)
    }

    /// Consumes one frame: accumulate motion, then propagate, weigh, and
    /// publish an adaptively sized generation.
    ///
    /// Delegates to [`KldFilter::init`] when the published cloud is empty.
    pub fn track(&mut self, frame: &SensorFrame) -> TrackOutcome {
        self.track_impl(frame)
    }

    fn init_impl(&mut self, pitch: f64, ranges: &[f64]) -> TrackOutcome {
        let mut target = self.pool.checkout();
        let retained = grid_search_seed(
            &self.scene,
            &self.low_obstructions,
            &self.config.range_model,
            &self.config.grid,
            &self.geometry,
            pitch,
            ranges,
            &mut target,
            &mut self.rng,
        );

        if retained == 0 {
            drop(target);
            warn!("relocalization sweep found no habitable cell, keeping previous cloud");
            self.state.degenerate_frames += 1;
            return TrackOutcome::Degenerate;
        }

        self.table.reset_uniform(retained);
        self.acc_left = 0.0;
        self.acc_right = 0.0;
        self.state.generation_size = retained;
        self.state.distinct_bins = 0;
        self.state.weight_sum = 0.0;
        self.state.generations += 1;

        self.pool.publish(target, None);
        TrackOutcome::Updated { particles: retained }
    }

    fn track_impl(&mut self, frame: &SensorFrame) -> TrackOutcome {
        if self.pool.active_len() == 0 {
            return self.init_impl(frame.pitch, &frame.ranges);
        }

        self.acc_left += frame.wheel_left;
        self.acc_right += frame.wheel_right;
        if self.acc_left.abs() < self.min_wheel_rad && self.acc_right.abs() < self.min_wheel_rad {
            self.state.stationary_frames += 1;
            return TrackOutcome::Stationary;
        }

        self.bins.clear();
        self.next_table.clear();

        let source = self.pool.active();
        let mut target = self.pool.checkout();
        debug_assert_eq!(self.table.len(), source.len(), "table tracks the published cloud");

        let capacity = target.capacity();
        let mut generated = 0usize;
        let mut weight_sum = 0.0;

        loop {
            let draw: f64 = self.rng.random();
            let ancestor = &source.particles()[self.table.ancestor(draw)];
            let child = target.slot_mut(generated);

            let yaw = propagate_into(
                child,
                ancestor,
                frame.pitch,
                self.acc_left,
                self.acc_right,
                &self.config.noise,
                &self.geometry,
                &mut self.rng,
            );
            let pose = Pose::new(child.x, child.y, child.pitch, yaw);
            let weight = pose_weight(
                &self.scene,
                &self.low_obstructions,
                &self.config.range_model,
                &pose,
                &frame.ranges,
                None,
                Some(&mut child.predicted),
            );
            child.weight = weight;
            weight_sum += weight;
            self.next_table.push(weight_sum);
            self.bins.insert(child.pitch, yaw, child.x, child.y);
            generated += 1;

            let bound = self.bins.distinct() as f64 / self.config.epsilon;
            if generated >= capacity || generated as f64 >= bound {
                break;
            }
        }
        target.set_len(generated);

        if weight_sum <= 0.0 {
            drop(source);
            drop(target);
            warn!("generation of {generated} particles weighed zero, keeping previous cloud");
            self.state.degenerate_frames += 1;
            return TrackOutcome::Degenerate;
        }

        // Normalize in place; ties on the maximum keep the earliest.
        let mut best = 0usize;
        let mut best_weight = f64::NEG_INFINITY;
        for (index, particle) in target.particles_mut().iter_mut().enumerate() {
            particle.weight /= weight_sum;
            if particle.weight > best_weight {
                best_weight = particle.weight;
                best = index;
            }
        }
        self.next_table.normalize(weight_sum);
        std::mem::swap(&mut self.table, &mut self.next_table);

        self.estimate_scratch.clone_from(&target.particles()[best]);
        self.acc_left = 0.0;
        self.acc_right = 0.0;
        self.state.generation_size = generated;
        self.state.distinct_bins = self.bins.distinct();
        self.state.weight_sum = weight_sum;
        self.state.generations += 1;

        drop(source);
        self.pool.publish(target, Some(&self.estimate_scratch));
        debug!(
            "generation {}: {generated} particles over {} bins",
            self.state.generations, self.state.distinct_bins
        );
        TrackOutcome::Updated { particles: generated }
    }
}

impl<S: SceneModel> Localizer for KldFilter<S> {
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
