//! Index and simulation configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::SpatialError;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

impl Config {
    /// Load configuration from `path`, writing a default file if it is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpatialError> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

/// Subdivision policy shared by every node of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TreeConfig {
    /// Points a leaf holds before it considers subdividing.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Nodes whose smaller side is at or below this never subdivide. Must be positive.
    #[serde(default = "default_min_extent")]
    pub min_extent: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            min_extent: default_min_extent(),
        }
    }
}

impl TreeConfig {
    pub fn new(capacity: usize, min_extent: f32) -> Self {
        Self { capacity, min_extent }
    }

    /// Check the policy is usable for subdivision.
    pub fn validate(&self) -> Result<(), SpatialError> {
        if self.capacity == 0 {
            return Err(SpatialError::ZeroCapacity);
        }
        if !self.min_extent.is_finite() || self.min_extent <= 0.0 {
            return Err(SpatialError::InvalidMinExtent(self.min_extent));
        }
        Ok(())
    }
}

fn default_capacity() -> usize {
    4
}
fn default_min_extent() -> f32 {
    1.0
}

/// Simulated region. The origin is the top-left corner; y grows downward.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_size")]
    pub width: f32,
    #[serde(default = "default_world_size")]
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_size(),
            height: default_world_size(),
        }
    }
}

fn default_world_size() -> f32 {
    1000.0
}

/// Driver settings for the headless simulation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    /// Number of bodies spawned at start.
    #[serde(default = "default_bodies")]
    pub bodies: usize,
    #[serde(default = "default_min_radius")]
    pub min_radius: f32,
    #[serde(default = "default_max_radius")]
    pub max_radius: f32,
    /// Number of rebuild/resolve steps to run.
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// RNG seed for body placement.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Write an SVG trace of the final tree here (empty = disabled).
    #[serde(default)]
    pub svg_output: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bodies: default_bodies(),
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
            steps: default_steps(),
            seed: default_seed(),
            svg_output: String::new(),
        }
    }
}

fn default_bodies() -> usize {
    500
}
fn default_min_radius() -> f32 {
    2.0
}
fn default_max_radius() -> f32 {
    12.0
}
fn default_steps() -> u32 {
    60
}
fn default_seed() -> u64 {
    7
}
