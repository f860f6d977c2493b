//! Loader builder for storm files.
//!
//! Collects the options that vary between storm catalogues (delimiter,
//! coordinate system, explicit format) before reading a file.

use crate::collection::StormCollection;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{self, StormFormat};
use std::path::Path;
use stormtrack_types::crs::Crs;

/// Builder for loading storm collections with custom settings.
///
/// # Examples
///
/// ```rust,no_run
/// use stormtrack::{Crs, StormLoader};
///
/// let storms = StormLoader::new()
///     .delimiter(';')
///     .crs(Crs::Wgs84)
///     .load("CH_severe_storms_2016_2021.csv")?;
/// # Ok::<(), stormtrack::StormError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StormLoader {
    config: Config,
    format: Option<StormFormat>,
}

impl StormLoader {
    /// Create a loader with the default configuration; the format is
    /// inferred from the file extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Force a format instead of inferring it from the extension.
    pub fn format(mut self, format: StormFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// CSV field delimiter.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.csv_delimiter = delimiter;
        self
    }

    /// Reference system of coordinates in CSV files.
    pub fn crs(mut self, crs: Crs) -> Self {
        self.config.storm_crs = crs;
        self
    }

    /// Read and group the file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<StormCollection> {
        let path = path.as_ref();
        self.config.validate()?;
        let format = match self.format {
            Some(format) => format,
            None => StormFormat::from_path(path)?,
        };
        storage::load_with_config(path, format, &self.config)
    }

    /// Write `collection` with the same settings.
    pub fn save<P: AsRef<Path>>(&self, collection: &StormCollection, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = match self.format {
            Some(format) => format,
            None => StormFormat::from_path(path)?,
        };
        storage::save_with_config(collection, path, format, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StormError;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_builder_default() {
        let loader = StormLoader::new();
        assert!(loader.format.is_none());
        assert_eq!(loader.config, Config::default());
    }

    #[test]
    fn test_semicolon_file_with_forced_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storms.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "ID;time;longitude;latitude;A;w_rainstorm;s_rainstorm;w_hailstorm;s_hailstorm;supercell"
        )
        .unwrap();
        writeln!(file, "S1;202106281200;7.0;46.0;100;0;0;1;0;0").unwrap();
        drop(file);

        assert!(matches!(
            StormLoader::new().delimiter(';').load(&path),
            Err(StormError::InvalidFormat(_))
        ));

        let storms = StormLoader::new()
            .delimiter(';')
            .format(StormFormat::Csv)
            .load(&path)
            .unwrap();
        assert!(storms.get("S1").unwrap().first().flags.hailstorm);
    }

    #[test]
    fn test_planar_crs_applies_to_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storms.csv");
        std::fs::write(
            &path,
            "ID,time,longitude,latitude,A,w_rainstorm,s_rainstorm,w_hailstorm,s_hailstorm,supercell\n\
             S1,202106281200,600000,200000,100,0,0,0,0,0\n",
        )
        .unwrap();

        let storms = StormLoader::new().crs(Crs::Lv03).load(&path).unwrap();
        assert_eq!(storms.crs(), Crs::Lv03);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let loader = StormLoader::new().config(Config::default().with_window_minutes(0));
        assert!(loader.load("storms.csv").is_err());
    }
}
