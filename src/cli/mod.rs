//! Command-line interface for the LIDAR/radar pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::core::loaders::{DetectionRecord, PointSample};
use crate::pipeline::{self, LoadOutcome};
use crate::visualization::{self, PlotRenderer, Renderer};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "lidar-radar-pipeline")]
#[command(about = "Load, plot and summarise LIDAR point samples and radar detections", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Field delimiter of the input files
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// Directory receiving the PNG plots
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Do not render any plots
    #[arg(long, global = true)]
    no_plots: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both files, plot them, and summarise their positional join (default)
    Run {
        /// LIDAR point file (x,y,z rows, no header)
        #[arg(long)]
        lidar: Option<PathBuf>,
        /// Radar detection file (object_id,distance,velocity,angle header)
        #[arg(long)]
        radar: Option<PathBuf>,
        /// Distance threshold in meters for the velocity mean
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Number of combined rows to preview
        #[arg(long)]
        preview_rows: Option<usize>,
    },

    /// Load and plot a LIDAR point file
    Points {
        /// LIDAR point file (x,y,z rows, no header)
        file: PathBuf,
    },

    /// Load and plot a radar detection file
    Detections {
        /// Radar detection file
        file: PathBuf,
    },

    /// Load both files and summarise their positional join without plotting
    Combine {
        /// LIDAR point file
        lidar: PathBuf,
        /// Radar detection file
        radar: PathBuf,
        /// Distance threshold in meters for the velocity mean
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Number of combined rows to preview
        #[arg(long)]
        preview_rows: Option<usize>,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Renderer wrapper that shows a spinner while each plot is drawn.
struct SpinnerRenderer<R> {
    inner: R,
}

impl<R: Renderer> Renderer for SpinnerRenderer<R> {
    fn render_points(&mut self, points: &[PointSample]) -> visualization::Result<PathBuf> {
        let spinner = create_spinner("Rendering LIDAR point cloud...");
        let result = self.inner.render_points(points);
        spinner.finish_and_clear();
        result
    }

    fn render_detections(
        &mut self,
        detections: &[DetectionRecord],
    ) -> visualization::Result<PathBuf> {
        let spinner = create_spinner("Rendering radar detections...");
        let result = self.inner.render_detections(detections);
        spinner.finish_and_clear();
        result
    }
}

fn load_config(cli: &Cli) -> PipelineConfig {
    let mut config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    if let Some(delimiter) = cli.delimiter {
        if delimiter.is_ascii() {
            config.inputs.delimiter = delimiter;
        } else {
            warn!("Ignoring non-ASCII delimiter '{}'", delimiter);
        }
    }
    if let Some(dir) = &cli.output_dir {
        config.visualization.output_dir = dir.clone();
    }
    if cli.no_plots {
        config.visualization.enabled = false;
    }

    config
}

fn apply_analysis_overrides(
    config: &mut PipelineConfig,
    threshold: Option<f64>,
    preview_rows: Option<usize>,
) {
    if let Some(t) = threshold {
        if t.is_finite() {
            config.analysis.distance_threshold_m = t;
        } else {
            warn!("Ignoring non-finite threshold {}", t);
        }
    }
    if let Some(rows) = preview_rows {
        config.analysis.preview_rows = rows;
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let mut config = load_config(&cli);

    // No subcommand runs the full pipeline with the configured paths
    match cli.command {
        None => cmd_run(&config),
        Some(Commands::Run {
            lidar,
            radar,
            threshold,
            preview_rows,
        }) => {
            if let Some(path) = lidar {
                config.inputs.lidar_path = path;
            }
            if let Some(path) = radar {
                config.inputs.radar_path = path;
            }
            apply_analysis_overrides(&mut config, threshold, preview_rows);
            cmd_run(&config);
        }
        Some(Commands::Points { file }) => {
            config.inputs.lidar_path = file;
            cmd_points(&config);
        }
        Some(Commands::Detections { file }) => {
            config.inputs.radar_path = file;
            cmd_detections(&config);
        }
        Some(Commands::Combine {
            lidar,
            radar,
            threshold,
            preview_rows,
        }) => {
            config.inputs.lidar_path = lidar;
            config.inputs.radar_path = radar;
            apply_analysis_overrides(&mut config, threshold, preview_rows);
            cmd_combine(&config);
        }
    }
}

fn plot_renderer(config: &PipelineConfig) -> Option<SpinnerRenderer<PlotRenderer>> {
    if config.visualization.enabled {
        Some(SpinnerRenderer {
            inner: PlotRenderer::new(config.visualization.clone()),
        })
    } else {
        info!("Plotting disabled");
        None
    }
}

fn rendered_list(rendered: &[PathBuf]) -> String {
    if rendered.is_empty() {
        "none".to_string()
    } else {
        rendered
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn cmd_run(config: &PipelineConfig) {
    let start = Instant::now();

    let mut renderer = plot_renderer(config);
    let report = pipeline::run_pipeline(
        config,
        renderer.as_mut().map(|r| r as &mut dyn Renderer),
    );

    let mean_velocity = report
        .analysis
        .as_ref()
        .map_or_else(|| "skipped".to_string(), |a| format!("{:.2} m/s", a.mean_velocity));
    let combined_rows = report
        .combined
        .as_ref()
        .map_or_else(|| "skipped".to_string(), |c| c.len().to_string());

    print_summary(
        "Pipeline Complete",
        &[
            ("LIDAR file", config.inputs.lidar_path.display().to_string()),
            ("LIDAR", report.lidar.describe()),
            ("Radar file", config.inputs.radar_path.display().to_string()),
            ("Radar", report.radar.describe()),
            ("Combined rows", combined_rows),
            (
                "Threshold",
                format!("{} m", config.analysis.distance_threshold_m),
            ),
            ("Mean velocity", mean_velocity),
            ("Plots", rendered_list(&report.rendered)),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_points(config: &PipelineConfig) {
    let start = Instant::now();
    let path = &config.inputs.lidar_path;

    let outcome = pipeline::load_lidar(path, config.inputs.delimiter_byte());
    let mut rendered = Vec::new();
    if let (LoadOutcome::Loaded(points), Some(mut renderer)) = (&outcome, plot_renderer(config)) {
        match renderer.render_points(points) {
            Ok(png) => rendered.push(png),
            Err(e) => warn!("Skipping LIDAR plot: {}", e),
        }
    }

    print_summary(
        "LIDAR Points",
        &[
            ("Input file", path.display().to_string()),
            ("Status", outcome.describe()),
            ("Plots", rendered_list(&rendered)),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_detections(config: &PipelineConfig) {
    let start = Instant::now();
    let path = &config.inputs.radar_path;

    let outcome = pipeline::load_radar(path, config.inputs.delimiter_byte());
    let mut rendered = Vec::new();
    if let (LoadOutcome::Loaded(detections), Some(mut renderer)) = (&outcome, plot_renderer(config))
    {
        match renderer.render_detections(detections) {
            Ok(png) => rendered.push(png),
            Err(e) => warn!("Skipping radar plot: {}", e),
        }
    }

    print_summary(
        "Radar Detections",
        &[
            ("Input file", path.display().to_string()),
            ("Status", outcome.describe()),
            ("Plots", rendered_list(&rendered)),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_combine(config: &PipelineConfig) {
    let start = Instant::now();

    let report = pipeline::run_pipeline(config, None);

    let mut items = vec![
        ("LIDAR", report.lidar.describe()),
        ("Radar", report.radar.describe()),
    ];
    if let Some(analysis) = &report.analysis {
        items.push(("Combined rows", analysis.combined_rows.to_string()));
        items.push(("Within threshold", analysis.within_threshold.to_string()));
        items.push(("Mean velocity", format!("{:.2} m/s", analysis.mean_velocity)));
    } else {
        items.push(("Combined rows", "skipped".to_string()));
    }
    items.push(("Duration", format!("{:.2?}", start.elapsed())));

    print_summary("Combine Complete", &items);
}
