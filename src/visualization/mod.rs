//! Visualization of LIDAR point samples and radar detections.
//!
//! Rendering is a terminal side effect: nothing drawn here flows back into
//! the pipeline. The pipeline talks to a [`Renderer`]; [`PlotRenderer`] is the
//! plotters-backed implementation that writes PNG files.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::VisualizationConfig;
use crate::core::loaders::{DetectionRecord, PointSample};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Nothing to plot: {0} is empty")]
    EmptyInput(&'static str),
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// File name of the 3D point plot inside the output directory.
pub const POINTS_FILE_NAME: &str = "lidar_points.png";

/// File name of the detection scatter inside the output directory.
pub const DETECTIONS_FILE_NAME: &str = "radar_detections.png";

/// Width in pixels reserved for the velocity colour bar.
const COLORBAR_WIDTH: u32 = 110;

/// Widest axis span the plots are drawn with.
const MAX_AXIS_SPAN: f64 = 1e300;

/// Number of bands the colour bar is drawn with.
const COLORBAR_STEPS: usize = 64;

/// Point colour of the 3D scatter.
const POINT_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Colour of detections with no velocity.
const MISSING_COLOR: RGBColor = RGBColor(128, 128, 128);

/// Viridis ramp sampled at nine evenly spaced stops.
const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

/// Consumer of loaded sensor data. Implementations must not alter the data.
pub trait Renderer {
    /// Render a point set, returning where the result went.
    fn render_points(&mut self, points: &[PointSample]) -> Result<PathBuf>;

    /// Render a detection set, returning where the result went.
    fn render_detections(&mut self, detections: &[DetectionRecord]) -> Result<PathBuf>;
}

/// Renderer writing PNG plots with plotters.
#[derive(Debug, Clone)]
pub struct PlotRenderer {
    config: VisualizationConfig,
}

impl PlotRenderer {
    pub fn new(config: VisualizationConfig) -> Self {
        Self { config }
    }

    fn output_path(&self, file_name: &str) -> Result<PathBuf> {
        let dir = &self.config.output_dir;
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(dir.join(file_name))
    }
}

impl Renderer for PlotRenderer {
    fn render_points(&mut self, points: &[PointSample]) -> Result<PathBuf> {
        if points.is_empty() {
            return Err(VisualizationError::EmptyInput("point set"));
        }
        let path = self.output_path(POINTS_FILE_NAME)?;
        plot_point_cloud_3d(&path, points, &self.config)?;
        Ok(path)
    }

    fn render_detections(&mut self, detections: &[DetectionRecord]) -> Result<PathBuf> {
        if detections.is_empty() {
            return Err(VisualizationError::EmptyInput("detection set"));
        }
        let path = self.output_path(DETECTIONS_FILE_NAME)?;
        plot_detections(&path, detections, &self.config)?;
        Ok(path)
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// Step that keeps at most `max_points` of `n` items.
fn subsample_step(n: usize, max_points: usize) -> usize {
    if max_points > 0 && n > max_points {
        n.div_ceil(max_points)
    } else {
        1
    }
}

/// Min/max of the finite values, widened when the span is degenerate.
fn finite_range<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (mut min, mut max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return (-1.0, 1.0);
    }
    if max - min < f64::EPSILON {
        let half = (min.abs() * 0.05).max(1.0);
        min -= half;
        max += half;
    }
    (min, max)
}

/// Fail when `start..end` is wider than plotters can lay out.
fn check_span(start: f64, end: f64, axis: &str) -> Result<()> {
    let span = end - start;
    if span.is_nan() || span > MAX_AXIS_SPAN {
        return Err(VisualizationError::PlottingError(format!(
            "{} range {:e}..{:e} is too wide to plot",
            axis, start, end
        )));
    }
    Ok(())
}

/// Range padded by 5% on both sides.
fn padded(range: (f64, f64), axis: &str) -> Result<std::ops::Range<f64>> {
    check_span(range.0, range.1, axis)?;
    let pad = (range.1 - range.0) * 0.05;
    let (start, end) = (range.0 - pad, range.1 + pad);
    check_span(start, end, axis)?;
    Ok(start..end)
}

/// Map a value in `[0, 1]` onto the viridis ramp.
pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = VIRIDIS[lower];
    let (r1, g1, b1) = VIRIDIS[lower + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Plot a point set as a 3D scatter and save it as PNG.
///
/// The sensor's z axis is drawn vertically. Points with a non-finite
/// coordinate are left out.
pub fn plot_point_cloud_3d(
    output_path: &Path,
    points: &[PointSample],
    config: &VisualizationConfig,
) -> Result<()> {
    if points.is_empty() {
        return Err(VisualizationError::EmptyInput("point set"));
    }

    let step = subsample_step(points.len(), config.max_points);
    let drawn: Vec<(f64, f64, f64)> = points
        .iter()
        .step_by(step)
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        // plotters draws its second axis vertically
        .map(|p| (p.x, p.z, p.y))
        .collect();

    let x_range = padded(finite_range(drawn.iter().map(|p| p.0)), "x")?;
    let z_range = padded(finite_range(drawn.iter().map(|p| p.1)), "z")?;
    let y_range = padded(finite_range(drawn.iter().map(|p| p.2)), "y")?;

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("LIDAR Point Cloud", ("sans-serif", 28))
        .margin(20)
        .build_cartesian_3d(x_range, z_range, y_range)
        .map_err(plot_err)?;

    chart.with_projection(|mut pb| {
        pb.pitch = 0.5;
        pb.yaw = 0.6;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(4)
        .draw()
        .map_err(plot_err)?;

    let radius = config.point_radius as i32;
    chart
        .draw_series(
            drawn
                .iter()
                .map(|&(x, z, y)| Circle::new((x, z, y), radius, POINT_COLOR.mix(0.7).filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;

    log::info!("Wrote {} points to {}", drawn.len(), output_path.display());
    Ok(())
}

/// Plot detections as a 2D scatter of angle against distance, coloured by
/// velocity, with a velocity colour bar on the right. Saved as PNG.
pub fn plot_detections(
    output_path: &Path,
    detections: &[DetectionRecord],
    config: &VisualizationConfig,
) -> Result<()> {
    if detections.is_empty() {
        return Err(VisualizationError::EmptyInput("detection set"));
    }

    let step = subsample_step(detections.len(), config.max_points);
    let drawn: Vec<&DetectionRecord> = detections
        .iter()
        .step_by(step)
        .filter(|d| d.angle.is_finite() && d.distance.is_finite())
        .collect();

    let angle_range = padded(finite_range(drawn.iter().map(|d| d.angle)), "angle")?;
    let distance_range = padded(finite_range(drawn.iter().map(|d| d.distance)), "distance")?;
    let (v_min, v_max) = finite_range(drawn.iter().map(|d| d.velocity));
    check_span(v_min, v_max, "velocity")?;

    let velocity_color = |v: f64| {
        if v.is_finite() {
            viridis((v - v_min) / (v_max - v_min))
        } else {
            MISSING_COLOR
        }
    };

    let root = BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let (plot_area, bar_area) =
        root.split_horizontally(config.width.saturating_sub(COLORBAR_WIDTH) as i32);

    let mut chart = ChartBuilder::on(&plot_area)
        .caption("Radar Data Visualization", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(angle_range, distance_range)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Angle (degrees)")
        .y_desc("Distance (m)")
        .light_line_style(BLACK.mix(0.08))
        .draw()
        .map_err(plot_err)?;

    let radius = config.point_radius as i32 + 2;
    chart
        .draw_series(drawn.iter().map(|d| {
            Circle::new((d.angle, d.distance), radius, velocity_color(d.velocity).filled())
        }))
        .map_err(plot_err)?;

    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(60)
        .margin_bottom(60)
        .margin_right(15)
        .y_label_area_size(65)
        .build_cartesian_2d(0.0..1.0, v_min..v_max)
        .map_err(plot_err)?;

    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc("Velocity (m/s)")
        .draw()
        .map_err(plot_err)?;

    let band = (v_max - v_min) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let lo = v_min + band * i as f64;
        let t = i as f64 / (COLORBAR_STEPS - 1) as f64;
        Rectangle::new([(0.0, lo), (1.0, lo + band)], viridis(t).filled())
    }))
    .map_err(plot_err)?;

    root.present().map_err(plot_err)?;

    log::info!(
        "Wrote {} detections to {}",
        drawn.len(),
        output_path.display()
    );
    Ok(())
}
