//! End-to-end pipeline runs over real files with a recording renderer.

use std::fs;
use std::path::{Path, PathBuf};

use lidar_radar_pipeline::{
    run_pipeline, DetectionRecord, LoadOutcome, PipelineConfig, PlotRenderer, PointSample,
    Renderer, Stage, VisualizationError,
};
use tempfile::TempDir;

/// Remembers what it was asked to draw instead of drawing it.
#[derive(Default)]
struct RecordingRenderer {
    calls: Vec<String>,
    fail: bool,
}

impl Renderer for RecordingRenderer {
    fn render_points(&mut self, points: &[PointSample]) -> Result<PathBuf, VisualizationError> {
        self.calls.push(format!("points:{}", points.len()));
        if self.fail {
            return Err(VisualizationError::PlottingError("no backend".to_string()));
        }
        Ok(PathBuf::from("lidar_points.png"))
    }

    fn render_detections(
        &mut self,
        detections: &[DetectionRecord],
    ) -> Result<PathBuf, VisualizationError> {
        self.calls.push(format!("detections:{}", detections.len()));
        if self.fail {
            return Err(VisualizationError::PlottingError("no backend".to_string()));
        }
        Ok(PathBuf::from("radar_detections.png"))
    }
}

fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&path, content).unwrap();
    path
}

fn config_for(lidar: PathBuf, radar: PathBuf) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.inputs.lidar_path = lidar;
    config.inputs.radar_path = radar;
    config
}

#[test]
fn test_two_row_scenario() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(dir.path(), "lidar_data.csv", &["0,0,0", "1,1,1"]);
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id,distance,velocity,angle", "1,10,5,30", "2,60,8,45"],
    );

    let mut renderer = RecordingRenderer::default();
    let report = run_pipeline(&config_for(lidar, radar), Some(&mut renderer));

    assert_eq!(renderer.calls, vec!["points:2", "detections:2"]);
    assert_eq!(report.rendered.len(), 2);

    let combined = report.combined.expect("both inputs loaded");
    assert_eq!(combined.len(), 2);
    assert_eq!(combined[1].point, PointSample::new(1.0, 1.0, 1.0));
    assert_eq!(combined[1].detection.object_id, "2");

    let analysis = report.analysis.expect("analysis runs with both inputs");
    assert_eq!(analysis.within_threshold, 1);
    assert_eq!(format!("{:.2}", analysis.mean_velocity), "5.00");
}

#[test]
fn test_header_only_detections() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(dir.path(), "lidar_data.csv", &["0,0,0", "1,1,1", "2,2,2"]);
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id,distance,velocity,angle"],
    );

    let mut renderer = RecordingRenderer::default();
    let report = run_pipeline(&config_for(lidar, radar), Some(&mut renderer));

    assert_eq!(report.radar, LoadOutcome::Loaded(Vec::new()));
    assert_eq!(report.combined.map(|c| c.len()), Some(0));

    let analysis = report.analysis.expect("empty detections still combine");
    assert_eq!(analysis.combined_rows, 0);
    assert!(analysis.mean_velocity.is_nan());
}

#[test]
fn test_missing_points_file_skips_dependent_stages() {
    let dir = TempDir::new().unwrap();
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id,distance,velocity,angle", "1,10,5,30"],
    );

    let mut renderer = RecordingRenderer::default();
    let report = run_pipeline(
        &config_for(dir.path().join("lidar_data.csv"), radar),
        Some(&mut renderer),
    );

    assert!(matches!(
        report.lidar,
        LoadOutcome::Failed {
            stage: Stage::Lidar,
            ..
        }
    ));
    assert!(report.radar.is_loaded());
    assert_eq!(renderer.calls, vec!["detections:1"]);
    assert!(report.combined.is_none());
    assert!(report.analysis.is_none());
}

#[test]
fn test_malformed_radar_file_skips_combination() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(dir.path(), "lidar_data.csv", &["0,0,0"]);
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id,distance,velocity,angle", "1,close,5,30"],
    );

    let mut renderer = RecordingRenderer::default();
    let report = run_pipeline(&config_for(lidar, radar), Some(&mut renderer));

    assert!(report.lidar.is_loaded());
    match &report.radar {
        LoadOutcome::Failed { stage, reason } => {
            assert_eq!(*stage, Stage::Radar);
            assert!(reason.contains("distance"));
        }
        LoadOutcome::Loaded(_) => panic!("Expected radar load to fail"),
    }
    assert_eq!(renderer.calls, vec!["points:1"]);
    assert!(report.analysis.is_none());
}

#[test]
fn test_both_files_missing_completes() {
    let dir = TempDir::new().unwrap();

    let mut renderer = RecordingRenderer::default();
    let report = run_pipeline(
        &config_for(dir.path().join("a.csv"), dir.path().join("b.csv")),
        Some(&mut renderer),
    );

    assert!(!report.lidar.is_loaded());
    assert!(!report.radar.is_loaded());
    assert!(renderer.calls.is_empty());
    assert!(report.rendered.is_empty());
    assert!(report.combined.is_none());
}

#[test]
fn test_render_failure_does_not_stop_combination() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(dir.path(), "lidar_data.csv", &["0,0,0", "1,1,1"]);
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id,distance,velocity,angle", "1,10,5,30", "2,20,7,45"],
    );

    let mut renderer = RecordingRenderer {
        fail: true,
        ..RecordingRenderer::default()
    };
    let report = run_pipeline(&config_for(lidar, radar), Some(&mut renderer));

    assert_eq!(renderer.calls.len(), 2);
    assert!(report.rendered.is_empty());
    assert_eq!(report.analysis.map(|a| a.mean_velocity), Some(6.0));
}

#[test]
fn test_unequal_lengths_truncate_and_no_renderer() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(
        dir.path(),
        "lidar_data.csv",
        &["0,0,0", "1,1,1", "2,2,2", "3,3,3"],
    );
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["velocity,angle,distance,object_id", "-4,10,12,a", "2,20,80,b"],
    );

    let report = run_pipeline(&config_for(lidar, radar), None);

    assert!(report.rendered.is_empty());
    let combined = report.combined.expect("both inputs loaded");
    assert_eq!(combined.len(), 2);
    assert_eq!(combined[0].detection, DetectionRecord::new("a", 12.0, -4.0, 10.0));
    assert_eq!(report.analysis.map(|a| a.mean_velocity), Some(-4.0));
}

#[test]
fn test_semicolon_delimited_inputs() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(dir.path(), "lidar_data.csv", &["0;0;0"]);
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id;distance;velocity;angle", "1;10;5;30"],
    );

    let mut config = config_for(lidar, radar);
    config.inputs.delimiter = ';';
    config.analysis.distance_threshold_m = 5.0;

    let report = run_pipeline(&config, None);

    let analysis = report.analysis.expect("both inputs loaded");
    assert_eq!(analysis.combined_rows, 1);
    assert_eq!(analysis.within_threshold, 0);
    assert!(analysis.mean_velocity.is_nan());
}

#[test]
fn test_extreme_values_skip_plot_and_still_combine() {
    let dir = TempDir::new().unwrap();
    let lidar = write_lines(dir.path(), "lidar_data.csv", &["1e308,0,0", "-1e308,1,1"]);
    let radar = write_lines(
        dir.path(),
        "radar_data.csv",
        &["object_id,distance,velocity,angle", "1,10,5,30", "2,60,8,45"],
    );

    let mut config = config_for(lidar, radar);
    config.visualization.output_dir = dir.path().join("plots");
    config.visualization.width = 320;
    config.visualization.height = 240;

    let mut renderer = PlotRenderer::new(config.visualization.clone());
    let report = run_pipeline(&config, Some(&mut renderer));

    assert_eq!(
        report.rendered,
        vec![dir.path().join("plots").join("radar_detections.png")]
    );
    let analysis = report.analysis.expect("both inputs loaded");
    assert_eq!(analysis.combined_rows, 2);
    assert_eq!(format!("{:.2}", analysis.mean_velocity), "5.00");
}
