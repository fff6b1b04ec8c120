//! Pose-space occupancy histogram behind the adaptive size bound.

use std::collections::HashSet;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::core::math::wrap_positive;

/// Bin widths of the pose-space histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinConfig {
    /// Pitch bin width, radians.
    pub pitch_width: f64,
    /// Yaw bin width, radians.
    pub yaw_width: f64,
    /// Position bin width along x and y, millimeters.
    pub xy_width: f64,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            pitch_width: 1.0_f64.to_radians(),
            yaw_width: 5.0_f64.to_radians(),
            xy_width: 5.0,
        }
    }
}

/// Set of pose-space bins occupied by one generation.
///
/// Each inserted pose is quantized along x, y, yaw, and pitch, and the four
/// indices are packed into one mixed-radix key. The count of distinct keys
/// is the `k` that bounds the generation size: a cloud spread over many
/// bins keeps generating, a cloud collapsed into a few stops early.
#[derive(Debug)]
pub struct BinSet {
    config: BinConfig,
    x_bins: i64,
    yaw_bins: i64,
    pitch_bins: i64,
    occupied: HashSet<i64>,
}

impl BinSet {
    /// Histogram for a floor `floor_width` millimeters wide. Angles wrap,
    /// so only the x radix depends on the scene.
    pub fn new(config: BinConfig, floor_width: f64) -> Self {
        let x_bins = (floor_width / config.xy_width).ceil() as i64 + 1;
        let yaw_bins = (TAU / config.yaw_width).ceil() as i64 + 1;
        let pitch_bins = (TAU / config.pitch_width).ceil() as i64 + 1;
        Self { config, x_bins, yaw_bins, pitch_bins, occupied: HashSet::new() }
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
    }

    /// Registers the bin containing the pose. Returns whether the bin was
    /// unoccupied before, i.e. whether the distinct count grew.
    pub fn insert(&mut self, pitch: f64, yaw: f64, x: f64, y: f64) -> bool {
        let key = self.key(pitch, yaw, x, y);
        self.occupied.insert(key)
    }

    /// Number of distinct occupied bins.
    pub fn distinct(&self) -> usize {
        self.occupied.len()
    }

    fn key(&self, pitch: f64, yaw: f64, x: f64, y: f64) -> i64 {
        let pitch_idx = (wrap_positive(pitch) / self.config.pitch_width) as i64;
        let yaw_idx = (wrap_positive(yaw) / self.config.yaw_width) as i64;
        let x_idx = (x / self.config.xy_width).floor() as i64;
        let y_idx = (y / self.config.xy_width).floor() as i64;
        ((y_idx * self.x_bins + x_idx) * self.yaw_bins + yaw_idx) * self.pitch_bins + pitch_idx
    }
}
