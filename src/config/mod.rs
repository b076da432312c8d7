//! Configuration types for the LIDAR/radar pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or checking a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the two sensor files live and how they are delimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Headerless x,y,z point file
    #[serde(default = "default_lidar_path")]
    pub lidar_path: PathBuf,

    /// Detection file with an object_id,distance,velocity,angle header
    #[serde(default = "default_radar_path")]
    pub radar_path: PathBuf,

    /// Field separator shared by both files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_lidar_path() -> PathBuf {
    PathBuf::from("lidar_data.csv")
}

fn default_radar_path() -> PathBuf {
    PathBuf::from("radar_data.csv")
}

fn default_delimiter() -> char {
    ','
}

impl InputConfig {
    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            lidar_path: default_lidar_path(),
            radar_path: default_radar_path(),
            delimiter: default_delimiter(),
        }
    }
}

/// Parameters of the join/summary stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Detections strictly closer than this (meters) enter the velocity mean
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold_m: f64,

    /// Number of combined rows printed as a preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_distance_threshold() -> f64 {
    50.0
}

fn default_preview_rows() -> usize {
    5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            distance_threshold_m: default_distance_threshold(),
            preview_rows: default_preview_rows(),
        }
    }
}

/// Configuration for plot rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// Render plots at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directory receiving the PNG files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Maximum points drawn per plot (subsamples if exceeded)
    #[serde(default = "default_max_points")]
    pub max_points: usize,

    /// Marker radius in pixels
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    960
}

fn default_max_points() -> usize {
    1_000_000
}

fn default_point_radius() -> u32 {
    2
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            output_dir: default_output_dir(),
            width: default_width(),
            height: default_height(),
            max_points: default_max_points(),
            point_radius: default_point_radius(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub inputs: InputConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.analysis.distance_threshold_m.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "distance_threshold_m must be finite, got {}",
                self.analysis.distance_threshold_m
            )));
        }
        if !self.inputs.delimiter.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.inputs.delimiter
            )));
        }
        if self.visualization.width == 0 || self.visualization.height == 0 {
            return Err(ConfigError::Invalid(
                "plot width and height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
