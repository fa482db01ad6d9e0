//! Configuration loading for pole localization

use crate::error::{LocalizationError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocalizationConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub initiation: InitiationConfig,
    #[serde(default)]
    pub estimation: EstimationConfig,
    #[serde(default)]
    pub node: NodeConfig,
}

/// Pole extraction from raw scans
#[derive(Clone, Debug, Deserialize)]
pub struct ScanConfig {
    /// Minimum return intensity for a beam to count as reflective tape (default: 1000)
    #[serde(default = "default_intensity_threshold")]
    pub intensity_threshold: f64,

    /// Chord and radial separation below which points belong to one pole, meters (default: 0.2)
    #[serde(default = "default_cluster_distance")]
    pub cluster_distance: f64,
}

/// Map bootstrap window
#[derive(Clone, Debug, Deserialize)]
pub struct InitiationConfig {
    /// Length of the data gathering window in seconds (default: 2.0)
    #[serde(default = "default_window_secs")]
    pub window_secs: f64,

    /// Minimum scan cycles with observations inside one window (default: 25)
    #[serde(default = "default_min_cycles")]
    pub min_cycles: usize,
}

/// Pairwise triangulation parameters
#[derive(Clone, Debug, Deserialize)]
pub struct EstimationConfig {
    /// Range slack added per step when circles do not intersect, meters (default: 0.001)
    #[serde(default = "default_inflation_step")]
    pub inflation_step: f64,

    /// Maximum number of inflation steps (default: 10000)
    #[serde(default = "default_max_inflation_steps")]
    pub max_inflation_steps: usize,

    /// Convergence tolerance on successive heading iterates, radians (default: 0.001)
    #[serde(default = "default_newton_tolerance")]
    pub newton_tolerance: f64,

    /// Iteration budget for heading refinement (default: 100)
    #[serde(default = "default_newton_max_iterations")]
    pub newton_max_iterations: usize,

    /// Angular closure tolerance for the first pose, radians (default: 0.1)
    #[serde(default = "default_consistency_tolerance")]
    pub consistency_tolerance: f64,
}

/// Control loop and transport settings
#[derive(Clone, Debug, Deserialize)]
pub struct NodeConfig {
    /// Control loop rate in Hz (default: 25)
    #[serde(default = "default_loop_rate_hz")]
    pub loop_rate_hz: f64,

    #[serde(default = "default_scan_topic")]
    pub scan_topic: String,

    #[serde(default = "default_pose_topic")]
    pub pose_topic: String,

    #[serde(default = "default_landmark_topic")]
    pub landmark_topic: String,

    /// Frame id stamped on published messages
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            intensity_threshold: default_intensity_threshold(),
            cluster_distance: default_cluster_distance(),
        }
    }
}

impl Default for InitiationConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            min_cycles: default_min_cycles(),
        }
    }
}

impl InitiationConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_secs)
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            inflation_step: default_inflation_step(),
            max_inflation_steps: default_max_inflation_steps(),
            newton_tolerance: default_newton_tolerance(),
            newton_max_iterations: default_newton_max_iterations(),
            consistency_tolerance: default_consistency_tolerance(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            loop_rate_hz: default_loop_rate_hz(),
            scan_topic: default_scan_topic(),
            pose_topic: default_pose_topic(),
            landmark_topic: default_landmark_topic(),
            frame_id: default_frame_id(),
        }
    }
}

impl NodeConfig {
    pub fn loop_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.loop_rate_hz)
    }
}

// Default value functions
fn default_intensity_threshold() -> f64 {
    1000.0
}
fn default_cluster_distance() -> f64 {
    0.2
}
fn default_window_secs() -> f64 {
    2.0
}
fn default_min_cycles() -> usize {
    25
}
fn default_inflation_step() -> f64 {
    0.001
}
fn default_max_inflation_steps() -> usize {
    10_000
}
fn default_newton_tolerance() -> f64 {
    0.001
}
fn default_newton_max_iterations() -> usize {
    100
}
fn default_consistency_tolerance() -> f64 {
    0.1
}
fn default_loop_rate_hz() -> f64 {
    25.0
}
fn default_scan_topic() -> String {
    "scan".to_string()
}
fn default_pose_topic() -> String {
    "bot_pose".to_string()
}
fn default_landmark_topic() -> String {
    "pole_pos".to_string()
}
fn default_frame_id() -> String {
    "fixed_frame".to_string()
}

impl LocalizationConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: LocalizationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(LocalizationError::Config(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        }

        positive("scan.cluster_distance", self.scan.cluster_distance)?;
        positive("initiation.window_secs", self.initiation.window_secs)?;
        positive("estimation.inflation_step", self.estimation.inflation_step)?;
        positive("estimation.newton_tolerance", self.estimation.newton_tolerance)?;
        positive(
            "estimation.consistency_tolerance",
            self.estimation.consistency_tolerance,
        )?;
        positive("node.loop_rate_hz", self.node.loop_rate_hz)?;

        if !self.scan.intensity_threshold.is_finite() {
            return Err(LocalizationError::Config(
                "scan.intensity_threshold must be finite".to_string(),
            ));
        }
        if self.initiation.min_cycles == 0 {
            return Err(LocalizationError::Config(
                "initiation.min_cycles must be at least 1".to_string(),
            ));
        }
        if self.estimation.newton_max_iterations == 0 {
            return Err(LocalizationError::Config(
                "estimation.newton_max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
