//! Loading, plotting and positional joining of LIDAR and radar sensor files.
//!
//! This crate provides tools for:
//! - Loading headerless x,y,z LIDAR point files and headed radar detection files
//! - Rendering a 3D point scatter and a velocity-coloured detection scatter
//! - Joining the two data sets row by row and averaging the velocity of close detections
//!
//! The join is positional only: row `i` of one file is paired with row `i` of
//! the other, and nothing checks that the two rows describe the same object.
//!
//! # Example
//!
//! ```no_run
//! use lidar_radar_pipeline::{join_positional, load_detections, load_points, mean_velocity_within};
//!
//! let points = load_points("lidar_data.csv", b',').unwrap();
//! let detections = load_detections("radar_data.csv", b',').unwrap();
//! let combined = join_positional(&points, &detections);
//! println!("{:.2}", mean_velocity_within(&combined, 50.0));
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod processors;
pub mod visualization;

pub use crate::config::{AnalysisConfig, ConfigError, InputConfig, PipelineConfig, VisualizationConfig};
pub use crate::core::loaders::{load_detections, load_points, DetectionRecord, LoadError, PointSample};
pub use crate::pipeline::{run_pipeline, LoadOutcome, PipelineReport, Stage};
pub use crate::processors::combiner::{
    analyze, join_positional, mean_velocity_within, AnalysisReport, CombinedRecord,
};
pub use crate::visualization::{PlotRenderer, Renderer, VisualizationError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
