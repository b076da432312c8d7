//! Core data types and file loading.

pub mod loaders;

pub use loaders::{load_detections, load_points, DetectionRecord, LoadError, PointSample};
