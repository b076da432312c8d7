//! End-to-end run: load both sensor files, render each one that loaded, and
//! summarise their positional join when both are present.
//!
//! A failed load never stops the run. It turns into [`LoadOutcome::Failed`]
//! and every stage that needs the missing data is skipped.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{AnalysisConfig, PipelineConfig};
use crate::core::loaders::{self, DetectionRecord, LoadError, PointSample};
use crate::processors::combiner::{self, AnalysisReport, CombinedRecord};
use crate::visualization::Renderer;

/// Which sensor a load stage reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lidar,
    Radar,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lidar => write!(f, "LIDAR"),
            Stage::Radar => write!(f, "Radar"),
        }
    }
}

/// Result of a load stage as seen by the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(Vec<T>),
    Failed { stage: Stage, reason: String },
}

impl<T> LoadOutcome<T> {
    /// Convert a loader result, printing the stage's status line.
    pub fn from_result(stage: Stage, result: Result<Vec<T>, LoadError>) -> Self {
        match result {
            Ok(rows) => {
                println!("{} data loaded successfully! ({} rows)", stage, rows.len());
                log::info!("{} data loaded successfully! ({} rows)", stage, rows.len());
                LoadOutcome::Loaded(rows)
            }
            Err(e) => {
                println!("Error loading {} data: {}", stage, e);
                log::error!("Error loading {} data: {}", stage, e);
                LoadOutcome::Failed {
                    stage,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The loaded rows, if the stage succeeded.
    pub fn loaded(&self) -> Option<&[T]> {
        match self {
            LoadOutcome::Loaded(rows) => Some(rows.as_slice()),
            LoadOutcome::Failed { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    /// Short status for summaries.
    pub fn describe(&self) -> String {
        match self {
            LoadOutcome::Loaded(rows) => format!("{} rows", rows.len()),
            LoadOutcome::Failed { reason, .. } => format!("failed ({})", reason),
        }
    }
}

/// Load the LIDAR point file as a pipeline stage.
pub fn load_lidar(path: &Path, delimiter: u8) -> LoadOutcome<PointSample> {
    log::debug!("Loading LIDAR points from {}", path.display());
    LoadOutcome::from_result(Stage::Lidar, loaders::load_points(path, delimiter))
}

/// Load the radar detection file as a pipeline stage.
pub fn load_radar(path: &Path, delimiter: u8) -> LoadOutcome<DetectionRecord> {
    log::debug!("Loading radar detections from {}", path.display());
    LoadOutcome::from_result(Stage::Radar, loaders::load_detections(path, delimiter))
}

/// Join both inputs, print the preview and the velocity line.
pub fn combine_and_analyze(
    points: &[PointSample],
    detections: &[DetectionRecord],
    config: &AnalysisConfig,
) -> (Vec<CombinedRecord>, AnalysisReport) {
    println!("Combining LIDAR and radar data...");
    if points.len() != detections.len() {
        log::info!(
            "Input lengths differ ({} points, {} detections); joining the first {} rows",
            points.len(),
            detections.len(),
            points.len().min(detections.len())
        );
    }

    let combined = combiner::join_positional(points, detections);
    println!(
        "Combined Data Head:\n{}",
        combiner::format_preview(&combined, config.preview_rows)
    );

    let report = combiner::analyze(&combined, config.distance_threshold_m);
    println!("{}", report.velocity_line());

    (combined, report)
}

/// Everything a pipeline run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub lidar: LoadOutcome<PointSample>,
    pub radar: LoadOutcome<DetectionRecord>,
    /// Artifacts written by the renderer, in render order.
    pub rendered: Vec<PathBuf>,
    /// Present only when both loads succeeded.
    pub combined: Option<Vec<CombinedRecord>>,
    pub analysis: Option<AnalysisReport>,
}

fn render_stage<F>(stage: Stage, rendered: &mut Vec<PathBuf>, render: F)
where
    F: FnOnce() -> crate::visualization::Result<PathBuf>,
{
    match render() {
        Ok(path) => {
            log::info!("{} plot written to {}", stage, path.display());
            rendered.push(path);
        }
        Err(e) => log::warn!("Skipping {} plot: {}", stage, e),
    }
}

/// Run the full pipeline.
///
/// Stages run in order: load LIDAR, render LIDAR, load radar, render radar,
/// combine. Rendering happens only when a renderer is given and the stage's
/// data loaded; combination only when both loads succeeded. A render failure
/// is logged and does not affect later stages.
pub fn run_pipeline(
    config: &PipelineConfig,
    mut renderer: Option<&mut dyn Renderer>,
) -> PipelineReport {
    let delimiter = config.inputs.delimiter_byte();
    let mut rendered = Vec::new();

    let lidar = load_lidar(&config.inputs.lidar_path, delimiter);
    if let (Some(points), Some(r)) = (lidar.loaded(), renderer.as_deref_mut()) {
        render_stage(Stage::Lidar, &mut rendered, || r.render_points(points));
    }

    let radar = load_radar(&config.inputs.radar_path, delimiter);
    if let (Some(detections), Some(r)) = (radar.loaded(), renderer.as_deref_mut()) {
        render_stage(Stage::Radar, &mut rendered, || r.render_detections(detections));
    }

    let (combined, analysis) = match (lidar.loaded(), radar.loaded()) {
        (Some(points), Some(detections)) => {
            let (combined, report) = combine_and_analyze(points, detections, &config.analysis);
            (Some(combined), Some(report))
        }
        _ => {
            log::info!("Skipping combination: both LIDAR and radar data are required");
            (None, None)
        }
    };

    PipelineReport {
        lidar,
        radar,
        rendered,
        combined,
        analysis,
    }
}
