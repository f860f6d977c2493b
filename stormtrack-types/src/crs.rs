use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coordinate reference systems understood by stormtrack.
///
/// Planar systems are expressed in metres, geographic ones in degrees with
/// x = longitude and y = latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Crs {
    /// WGS84 longitude/latitude (EPSG:4326)
    #[default]
    Wgs84,
    /// Swiss LV03 easting/northing in metres (EPSG:21781)
    Lv03,
    /// Swiss LV95 easting/northing in metres (EPSG:2056)
    Lv95,
}

impl Crs {
    /// EPSG code of this reference system.
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Lv03 => 21781,
            Crs::Lv95 => 2056,
        }
    }

    /// Whether coordinates are angular degrees rather than metres.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }

    pub fn is_planar(&self) -> bool {
        !self.is_geographic()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Error returned when a CRS name cannot be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCrsError(pub String);

impl fmt::Display for ParseCrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown coordinate reference system: {}", self.0)
    }
}

impl std::error::Error for ParseCrsError {}

impl FromStr for Crs {
    type Err = ParseCrsError;

    /// Accepts EPSG codes (`EPSG:21781`) and common names (`WGS84`, `LV03`, `LV95`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EPSG:4326" | "WGS84" | "WGS 84" | "4326" => Ok(Crs::Wgs84),
            "EPSG:21781" | "LV03" | "CH1903" | "21781" => Ok(Crs::Lv03),
            "EPSG:2056" | "LV95" | "CH1903+" | "2056" => Ok(Crs::Lv95),
            _ => Err(ParseCrsError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("EPSG:21781".parse::<Crs>().unwrap(), Crs::Lv03);
        assert_eq!("lv95".parse::<Crs>().unwrap(), Crs::Lv95);
        assert_eq!("WGS84".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert!("EPSG:3857".parse::<Crs>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for crs in [Crs::Wgs84, Crs::Lv03, Crs::Lv95] {
            assert_eq!(crs.to_string().parse::<Crs>().unwrap(), crs);
        }
    }

    #[test]
    fn test_planar() {
        assert!(Crs::Wgs84.is_geographic());
        assert!(Crs::Lv03.is_planar());
        assert!(Crs::Lv95.is_planar());
    }
}
