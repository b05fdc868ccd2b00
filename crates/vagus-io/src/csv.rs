//! CSV readers for traces, markers and morphology tables.
//!
//! Tracing exports store coordinates as `z, y, x` in columns 1 to 3
//! after a header row; points are returned as `(x, y, z)`.

use std::path::Path;

use vagus_stitch::Point;
use vagus_stitch::markers::resolve_marker_name;
use vagus_stitch::morphology::MorphologySample;
use vagus_stitch::types::Marker;

use crate::error::IoError;

/// Parse a trace table into points.
///
/// # Errors
///
/// Returns [`IoError::Parse`] for a row with fewer than four columns or
/// a non-numeric coordinate.
pub fn parse_trace_csv(path: &Path, text: &str) -> Result<Vec<Point>, IoError> {
    data_rows(text)
        .map(|(line, fields)| zyx_point(path, line, &fields))
        .collect()
}

/// Parse a marker table, keeping only approved marker names.
///
/// Column 0 holds the name. A repeated name replaces the earlier
/// marker's position.
///
/// # Errors
///
/// Returns [`IoError::Parse`] for a malformed row.
pub fn parse_marker_csv(path: &Path, text: &str) -> Result<Vec<Marker>, IoError> {
    let mut markers: Vec<Marker> = Vec::new();
    for (line, fields) in data_rows(text) {
        let raw_name = fields.first().map_or("", String::as_str);
        let Some(name) = resolve_marker_name(raw_name) else {
            log::debug!("{}:{line}: ignoring unapproved marker {raw_name:?}", path.display());
            continue;
        };
        let point = zyx_point(path, line, &fields)?;
        if let Some(existing) = markers.iter_mut().find(|m| m.name == name) {
            existing.point = point;
        } else {
            markers.push(Marker { name, point });
        }
    }
    Ok(markers)
}

/// Parse a morphology table into cross-section samples.
///
/// Columns are `index, area, perimeter, eq_diameter, center_x,
/// center_y, …`. Rows with an empty area are skipped. Each sample sits
/// at `(center_x, center_y, index)` with half the equivalent diameter
/// as its radius.
///
/// # Errors
///
/// Returns [`IoError::Parse`] for a malformed row.
pub fn parse_morphology_csv(path: &Path, text: &str) -> Result<Vec<MorphologySample>, IoError> {
    let mut samples = Vec::new();
    for (line, fields) in data_rows(text) {
        if fields.get(1).is_none_or(|area| area.is_empty()) {
            continue;
        }
        let number = |column: usize| number_at(path, line, &fields, column);
        samples.push(MorphologySample {
            point: Point::new(number(4)?, number(5)?, number(0)?),
            radius: number(3)? / 2.0,
        });
    }
    Ok(samples)
}

/// Read and parse a trace file.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, or
/// [`IoError::Parse`] if a row is malformed.
pub fn read_trace_csv(path: &Path) -> Result<Vec<Point>, IoError> {
    parse_trace_csv(path, &read_text(path)?)
}

/// Read and parse a marker file.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, or
/// [`IoError::Parse`] if a row is malformed.
pub fn read_marker_csv(path: &Path) -> Result<Vec<Marker>, IoError> {
    parse_marker_csv(path, &read_text(path)?)
}

/// Read and parse a morphology file.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, or
/// [`IoError::Parse`] if a row is malformed.
pub fn read_morphology_csv(path: &Path) -> Result<Vec<MorphologySample>, IoError> {
    parse_morphology_csv(path, &read_text(path)?)
}

fn read_text(path: &Path) -> Result<String, IoError> {
    std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))
}

/// Non-blank rows after the header, with one-based line numbers.
fn data_rows(text: &str) -> impl Iterator<Item = (usize, Vec<String>)> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, row)| !row.trim().is_empty())
        .map(|(i, row)| (i + 1, split_row(row)))
}

/// Split one row into trimmed fields.
///
/// A double-quoted field may contain commas, and `""` inside it stands
/// for a literal quote. Quoted fields never span lines.
fn split_row(row: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = row.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

fn zyx_point(path: &Path, line: usize, fields: &[String]) -> Result<Point, IoError> {
    let z = number_at(path, line, fields, 1)?;
    let y = number_at(path, line, fields, 2)?;
    let x = number_at(path, line, fields, 3)?;
    Ok(Point::new(x, y, z))
}

fn number_at(path: &Path, line: usize, fields: &[String], column: usize) -> Result<f64, IoError> {
    let parse_error = |message: String| IoError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };
    let field = fields.get(column).ok_or_else(|| {
        parse_error(format!(
            "expected at least {} columns, found {}",
            column + 1,
            fields.len()
        ))
    })?;
    field
        .parse()
        .map_err(|_| parse_error(format!("column {column}: {field:?} is not a number")))
}
