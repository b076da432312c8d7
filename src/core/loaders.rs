//! Data loaders for LIDAR point sample and radar detection CSV files.
//!
//! This module provides parsers for:
//! - LIDAR point files (no header, three numeric columns read as x, y, z)
//! - Radar detection files (header row, columns located by name)
//!
//! Both loaders read the whole file into memory and hand back plain vectors in
//! file order. Any problem with the file is returned as a [`LoadError`]; the
//! caller decides what a failed load means for the rest of the run.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

/// Column names assigned, by position, to the LIDAR point file.
pub const POINT_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// Column names the radar detection header must provide.
pub const DETECTION_COLUMNS: [&str; 4] = ["object_id", "distance", "velocity", "angle"];

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid {column} value '{value}'")]
    Parse {
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// One 3D coordinate from the point-cloud sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PointSample {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the sample as an `[x, y, z]` array.
    #[inline]
    pub fn to_coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// One object observation from the radar sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    /// Identifier as written in the file. Never interpreted.
    pub object_id: String,
    /// Range to the object in meters.
    pub distance: f64,
    /// Signed radial velocity in m/s.
    pub velocity: f64,
    /// Bearing in degrees.
    pub angle: f64,
}

impl DetectionRecord {
    pub fn new(object_id: impl Into<String>, distance: f64, velocity: f64, angle: f64) -> Self {
        Self {
            object_id: object_id.into(),
            distance,
            velocity,
            angle,
        }
    }
}

/// Line number of a record for error messages (1-based, 0 when unknown).
fn record_line(record: &StringRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

/// Parse one numeric cell. An empty cell is a missing value and reads as NaN.
fn parse_cell(record: &StringRecord, idx: usize, column: &'static str) -> Result<f64> {
    let raw = record.get(idx).unwrap_or_default();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse().map_err(|_| LoadError::Parse {
        line: record_line(record),
        column,
        value: raw.to_string(),
    })
}

fn check_field_count(record: &StringRecord, expected: usize) -> Result<()> {
    if record.len() != expected {
        return Err(LoadError::FieldCount {
            line: record_line(record),
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

/// Load LIDAR point samples from a headerless CSV file.
///
/// Every row must hold exactly three numeric fields, read positionally as
/// x, y, z. Surrounding whitespace is ignored and blank lines are skipped.
///
/// # Arguments
///
/// * `path` - Path to the point file
/// * `delimiter` - Field separator byte (usually `b','`)
///
/// # Errors
///
/// Returns an error if the file is missing, has no rows, contains a row with
/// the wrong number of fields, or holds a non-numeric value.
pub fn load_points<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<PointSample>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let mut points = Vec::new();

    for result in reader.records() {
        let record = result?;
        check_field_count(&record, POINT_COLUMNS.len())?;

        let x = parse_cell(&record, 0, POINT_COLUMNS[0])?;
        let y = parse_cell(&record, 1, POINT_COLUMNS[1])?;
        let z = parse_cell(&record, 2, POINT_COLUMNS[2])?;

        points.push(PointSample::new(x, y, z));
    }

    if points.is_empty() {
        return Err(LoadError::EmptyFile(path.to_path_buf()));
    }

    Ok(points)
}

/// Load radar detections from a CSV file with a header row.
///
/// The header must name `object_id`, `distance`, `velocity` and `angle`; the
/// order is free and extra columns are ignored. A header with no data rows is
/// a valid, empty detection set.
///
/// # Errors
///
/// Returns an error if the file is missing or completely empty, a required
/// column is absent, a row's field count differs from the header, or a
/// numeric column holds something that is not a number.
pub fn load_detections<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<DetectionRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadError::EmptyFile(path.to_path_buf()));
    }

    // A repeated header name resolves to its first column
    let mut col_map: HashMap<&str, usize> = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        col_map.entry(name).or_insert(i);
    }

    let missing: Vec<&str> = DETECTION_COLUMNS
        .iter()
        .copied()
        .filter(|name| !col_map.contains_key(name))
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing.join(", ")));
    }

    let id_idx = col_map["object_id"];
    let distance_idx = col_map["distance"];
    let velocity_idx = col_map["velocity"];
    let angle_idx = col_map["angle"];

    let mut detections = Vec::new();

    for result in reader.records() {
        let record = result?;
        check_field_count(&record, headers.len())?;

        detections.push(DetectionRecord {
            object_id: record.get(id_idx).unwrap_or_default().to_string(),
            distance: parse_cell(&record, distance_idx, "distance")?,
            velocity: parse_cell(&record, velocity_idx, "velocity")?,
            angle: parse_cell(&record, angle_idx, "angle")?,
        });
    }

    Ok(detections)
}
