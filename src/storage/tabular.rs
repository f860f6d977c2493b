//! CSV reading and writing of storm observations.
//!
//! One row per observation. Required columns are `ID`, `time`,
//! `longitude`, `latitude`, `A` and the five type flag columns; any other
//! column (such as a pandas index) is ignored on read.

use crate::collection::StormCollection;
use crate::compute::validation::validate_storm_point;
use crate::error::{Result, StormError};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::{Read, Write};
use stormtrack_types::crs::Crs;
use stormtrack_types::point::{StormPoint, TypeFlags};

pub const COL_ID: &str = "ID";
pub const COL_TIME: &str = "time";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_AREA: &str = "A";
pub const COL_RAINSTORM: &str = "w_rainstorm";
pub const COL_SEVERE_RAINSTORM: &str = "s_rainstorm";
pub const COL_HAILSTORM: &str = "w_hailstorm";
pub const COL_SEVERE_HAILSTORM: &str = "s_hailstorm";
pub const COL_SUPERCELL: &str = "supercell";

/// Column order used when writing.
pub const COLUMNS: [&str; 10] = [
    COL_ID,
    COL_TIME,
    COL_LONGITUDE,
    COL_LATITUDE,
    COL_AREA,
    COL_RAINSTORM,
    COL_SEVERE_RAINSTORM,
    COL_HAILSTORM,
    COL_SEVERE_HAILSTORM,
    COL_SUPERCELL,
];

const NAIVE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Positions of the required columns within a header row.
struct ColumnMap {
    positions: [usize; 10],
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut positions = [0usize; 10];
        for (slot, name) in positions.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| StormError::Parse(format!("missing required column '{}'", name)))?;
        }
        Ok(Self { positions })
    }

    fn field<'r>(&self, record: &'r StringRecord, column: usize, line: u64) -> Result<&'r str> {
        record
            .get(self.positions[column])
            .map(str::trim)
            .ok_or_else(|| {
                StormError::Parse(format!(
                    "line {}: missing value for column '{}'",
                    line, COLUMNS[column]
                ))
            })
    }

    fn number(&self, record: &StringRecord, column: usize, line: u64) -> Result<f64> {
        let raw = self.field(record, column, line)?;
        raw.parse::<f64>().map_err(|_| {
            StormError::Parse(format!(
                "line {}: column '{}' is not numeric: '{}'",
                line, COLUMNS[column], raw
            ))
        })
    }

    fn flag(&self, record: &StringRecord, column: usize, line: u64) -> Result<bool> {
        let raw = self.field(record, column, line)?;
        parse_flag(raw).ok_or_else(|| {
            StormError::Parse(format!(
                "line {}: column '{}' is not a boolean: '{}'",
                line, COLUMNS[column], raw
            ))
        })
    }

    fn point(&self, record: &StringRecord, line: u64) -> Result<StormPoint> {
        let id = self.field(record, 0, line)?;
        if id.is_empty() {
            return Err(StormError::Parse(format!("line {}: empty storm id", line)));
        }

        let raw_time = self.field(record, 1, line)?;
        let timestamp = parse_time(raw_time).map_err(|_| {
            StormError::Parse(format!(
                "line {}: unrecognized time value '{}'",
                line, raw_time
            ))
        })?;

        let flags = TypeFlags {
            rainstorm: self.flag(record, 5, line)?,
            severe_rainstorm: self.flag(record, 6, line)?,
            hailstorm: self.flag(record, 7, line)?,
            severe_hailstorm: self.flag(record, 8, line)?,
            supercell: self.flag(record, 9, line)?,
        };

        Ok(StormPoint::new(
            id,
            timestamp,
            self.number(record, 2, line)?,
            self.number(record, 3, line)?,
            self.number(record, 4, line)?,
            flags,
        ))
    }
}

/// Parse a storm timestamp.
///
/// Accepts RFC 3339, ISO-8601 without offset (taken as UTC, `T` or space
/// separated, seconds optional) and the compact `yyyymmddHHMM` form.
///
/// # Examples
///
/// ```rust
/// use stormtrack::storage::tabular::parse_time;
///
/// let compact = parse_time("202106281230").unwrap();
/// let iso = parse_time("2021-06-28T12:30:00+00:00").unwrap();
/// assert_eq!(compact, iso);
/// ```
pub fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }

    // pandas writes "2021-06-28 12:30:00+00:00"
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(t.with_timezone(&Utc));
    }

    if raw.len() == 12
        && raw.bytes().all(|b| b.is_ascii_digit())
        && let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M")
    {
        return Ok(t.and_utc());
    }

    for format in NAIVE_TIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(t.and_utc());
        }
    }

    Err(StormError::Parse(format!("unrecognized time value '{}'", raw)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

fn flag_value(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

/// Read observations from CSV and group them into a collection.
///
/// Fails on the first missing column or malformed value; rows are never
/// silently dropped.
pub fn read_csv<R: Read>(reader: R, delimiter: u8, crs: Crs) -> Result<StormCollection> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;

    let mut points = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let point = columns.point(&record, line)?;
        validate_storm_point(&point, crs).map_err(|e| match e {
            StormError::InvalidInput(msg) => StormError::Parse(format!("line {}: {}", line, msg)),
            other => other,
        })?;
        points.push(point);
    }

    log::debug!("Read {} storm observations from CSV", points.len());
    StormCollection::from_points(points, crs)
}

/// Write one row per observation, storms in id order.
pub fn write_csv<W: Write>(collection: &StormCollection, writer: W, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);

    wtr.write_record(COLUMNS)?;
    for p in collection.points() {
        wtr.write_record([
            p.storm_id.clone(),
            p.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            p.longitude.to_string(),
            p.latitude.to_string(),
            p.area.to_string(),
            flag_value(p.flags.rainstorm).to_string(),
            flag_value(p.flags.severe_rainstorm).to_string(),
            flag_value(p.flags.hailstorm).to_string(),
            flag_value(p.flags.severe_hailstorm).to_string(),
            flag_value(p.flags.supercell).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
