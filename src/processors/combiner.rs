//! Positional join of LIDAR samples with radar detections and the
//! distance-gated velocity summary computed over it.
//!
//! The join pairs rows by index only. Row `i` of the point file is placed next
//! to row `i` of the detection file whether or not the two describe the same
//! object; rows past the end of the shorter input are dropped.

use crate::core::loaders::{DetectionRecord, PointSample};

/// Headers of the combined preview table, in print order.
pub const COMBINED_COLUMNS: [&str; 7] = [
    "x",
    "y",
    "z",
    "object_id",
    "distance",
    "velocity",
    "angle",
];

/// A point sample and a detection that share a row index.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub point: PointSample,
    pub detection: DetectionRecord,
}

impl CombinedRecord {
    #[inline]
    pub fn distance(&self) -> f64 {
        self.detection.distance
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.detection.velocity
    }

    fn cells(&self) -> [String; 7] {
        [
            self.point.x.to_string(),
            self.point.y.to_string(),
            self.point.z.to_string(),
            self.detection.object_id.clone(),
            self.detection.distance.to_string(),
            self.detection.velocity.to_string(),
            self.detection.angle.to_string(),
        ]
    }
}

/// Summary of the combined data set for one distance threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Number of rows produced by the join.
    pub combined_rows: usize,
    /// Rows whose distance is strictly below the threshold.
    pub within_threshold: usize,
    pub threshold_m: f64,
    /// Mean velocity of the rows within the threshold, NaN if there are none.
    pub mean_velocity: f64,
}

impl AnalysisReport {
    /// The line printed for the velocity result.
    pub fn velocity_line(&self) -> String {
        format!(
            "Average velocity of objects within {} meters: {:.2} m/s",
            self.threshold_m, self.mean_velocity
        )
    }
}

/// Pair point samples and detections by row index.
///
/// The result has `min(points.len(), detections.len())` rows. No key matching
/// or deduplication is performed.
pub fn join_positional(points: &[PointSample], detections: &[DetectionRecord]) -> Vec<CombinedRecord> {
    points
        .iter()
        .zip(detections)
        .map(|(point, detection)| CombinedRecord {
            point: *point,
            detection: detection.clone(),
        })
        .collect()
}

/// Records whose detection lies strictly closer than `threshold_m`.
///
/// A NaN distance never qualifies.
pub fn within_distance(
    records: &[CombinedRecord],
    threshold_m: f64,
) -> impl Iterator<Item = &CombinedRecord> {
    records
        .iter()
        .filter(move |record| record.distance() < threshold_m)
}

/// Mean velocity over the records closer than `threshold_m`.
///
/// Missing (NaN) velocities are skipped. Returns NaN when no velocity is left
/// to average, including when `records` is empty.
pub fn mean_velocity_within(records: &[CombinedRecord], threshold_m: f64) -> f64 {
    let (sum, count) = within_distance(records, threshold_m)
        .map(CombinedRecord::velocity)
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Compute the distance-gated velocity summary for a combined data set.
pub fn analyze(records: &[CombinedRecord], threshold_m: f64) -> AnalysisReport {
    let within_threshold = within_distance(records, threshold_m).count();
    let mean_velocity = mean_velocity_within(records, threshold_m);

    log::debug!(
        "{} of {} combined rows within {} m",
        within_threshold,
        records.len(),
        threshold_m
    );

    AnalysisReport {
        combined_rows: records.len(),
        within_threshold,
        threshold_m,
        mean_velocity,
    }
}

/// One right-aligned preview row, columns separated by two spaces.
fn preview_line<'a>(
    index: &str,
    cells: impl Iterator<Item = &'a str>,
    index_width: usize,
    widths: &[usize],
) -> String {
    let mut line = format!("{:>w$}", index, w = index_width);
    for (cell, width) in cells.zip(widths) {
        line.push_str(&format!("  {:>w$}", cell, w = *width));
    }
    line
}

/// Render the first `rows` combined records as a right-aligned text table.
pub fn format_preview(records: &[CombinedRecord], rows: usize) -> String {
    if records.is_empty() {
        return format!("Empty combined data set (columns: {})", COMBINED_COLUMNS.join(", "));
    }

    let shown = &records[..rows.min(records.len())];
    let body: Vec<(String, [String; 7])> = shown
        .iter()
        .enumerate()
        .map(|(i, record)| (i.to_string(), record.cells()))
        .collect();

    let index_width = body.iter().map(|(idx, _)| idx.len()).max().unwrap_or(0);
    let mut widths: Vec<usize> = COMBINED_COLUMNS.iter().map(|name| name.len()).collect();
    for (_, cells) in &body {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = preview_line("", COMBINED_COLUMNS.iter().copied(), index_width, &widths);
    for (idx, cells) in &body {
        out.push('\n');
        out.push_str(&preview_line(
            idx,
            cells.iter().map(String::as_str),
            index_width,
            &widths,
        ));
    }

    out
}
