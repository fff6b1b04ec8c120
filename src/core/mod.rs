//! Foundation utilities shared by the scene and filter layers.
//!
//! # Contents
//!
//! - [`math`]: angle normalization and seeded noise sampling
//! - [`multimap`]: ordered multimap used for bounded best-K selection
//! - [`types`]: poses, robot geometry, and sensor frames

pub mod math;
pub mod multimap;
pub mod types;
