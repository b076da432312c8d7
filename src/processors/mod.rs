//! Data processing modules.

pub mod combiner;

// Re-export key types for convenience
pub use combiner::{
    analyze, format_preview, join_positional, mean_velocity_within, within_distance,
    AnalysisReport, CombinedRecord,
};
