//! Loading and saving storm collections.
//!
//! Two persisted formats are supported: CSV (one row per observation) and a
//! binary snapshot, which also answers to the `pkl`/`pickle` names used by
//! older storm catalogues.

pub mod tabular;

#[cfg(feature = "snapshot")]
pub mod snapshot;

use crate::collection::StormCollection;
use crate::config::Config;
use crate::error::{Result, StormError};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

/// Persisted storm data formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StormFormat {
    Csv,
    Binary,
}

impl StormFormat {
    /// Infer the format from a file extension.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stormtrack::StormFormat;
    ///
    /// assert_eq!(StormFormat::from_path("storms.csv").unwrap(), StormFormat::Csv);
    /// assert_eq!(StormFormat::from_path("storms.pkl").unwrap(), StormFormat::Binary);
    /// assert!(StormFormat::from_path("storms.nc").is_err());
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                StormError::InvalidFormat(format!("no file extension on {}", path.display()))
            })?
            .parse()
    }
}

impl FromStr for StormFormat {
    type Err = StormError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(StormFormat::Csv),
            "pkl" | "pickle" | "bin" | "snapshot" => Ok(StormFormat::Binary),
            other => Err(StormError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for StormFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StormFormat::Csv => f.write_str("csv"),
            StormFormat::Binary => f.write_str("snapshot"),
        }
    }
}

/// Load a collection using the default configuration.
pub fn load<P: AsRef<Path>>(path: P, format: StormFormat) -> Result<StormCollection> {
    load_with_config(path, format, &Config::default())
}

/// Load a collection; CSV coordinates are read in `config.storm_crs`.
pub fn load_with_config<P: AsRef<Path>>(
    path: P,
    format: StormFormat,
    config: &Config,
) -> Result<StormCollection> {
    let path = path.as_ref();
    let collection = match format {
        StormFormat::Csv => {
            let file = File::open(path)?;
            tabular::read_csv(
                BufReader::new(file),
                config.csv_delimiter_byte()?,
                config.storm_crs,
            )?
        }
        StormFormat::Binary => load_snapshot(path)?,
    };

    log::debug!(
        "Loaded {} storms ({} observations) from {}",
        collection.len(),
        collection.num_points(),
        path.display()
    );
    Ok(collection)
}

/// Save a collection using the default configuration.
pub fn save<P: AsRef<Path>>(
    collection: &StormCollection,
    path: P,
    format: StormFormat,
) -> Result<()> {
    save_with_config(collection, path, format, &Config::default())
}

/// Save a collection.
///
/// CSV files carry no CRS, so a CSV save requires the collection to be in
/// `config.storm_crs`, the CRS the matching load reads it back in.
pub fn save_with_config<P: AsRef<Path>>(
    collection: &StormCollection,
    path: P,
    format: StormFormat,
    config: &Config,
) -> Result<()> {
    let path = path.as_ref();
    match format {
        StormFormat::Csv => {
            if collection.crs() != config.storm_crs {
                return Err(StormError::InvalidInput(format!(
                    "CSV storms are read as {}, collection is in {}",
                    config.storm_crs,
                    collection.crs()
                )));
            }
            let file = File::create(path)?;
            tabular::write_csv(
                collection,
                BufWriter::new(file),
                config.csv_delimiter_byte()?,
            )?;
        }
        StormFormat::Binary => save_snapshot(collection, path)?,
    }

    log::debug!(
        "Saved {} storms as {} to {}",
        collection.len(),
        format,
        path.display()
    );
    Ok(())
}

#[cfg(feature = "snapshot")]
fn load_snapshot(path: &Path) -> Result<StormCollection> {
    snapshot::SnapshotFile::new(path).load()
}

#[cfg(not(feature = "snapshot"))]
fn load_snapshot(_path: &Path) -> Result<StormCollection> {
    Err(StormError::InvalidFormat(
        "binary snapshots require the `snapshot` feature".to_string(),
    ))
}

#[cfg(feature = "snapshot")]
fn save_snapshot(collection: &StormCollection, path: &Path) -> Result<()> {
    snapshot::SnapshotFile::new(path).save(collection)
}

#[cfg(not(feature = "snapshot"))]
fn save_snapshot(_collection: &StormCollection, _path: &Path) -> Result<()> {
    Err(StormError::InvalidFormat(
        "binary snapshots require the `snapshot` feature".to_string(),
    ))
}
