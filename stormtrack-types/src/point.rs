use chrono::{DateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity classification flags attached to a storm observation.
///
/// The field names follow the column names of the storm catalogue
/// (`w_rainstorm`, `s_rainstorm`, `w_hailstorm`, `s_hailstorm`, `supercell`).
/// A point with every flag unset is classified as "other".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TypeFlags {
    pub rainstorm: bool,
    pub severe_rainstorm: bool,
    pub hailstorm: bool,
    pub severe_hailstorm: bool,
    pub supercell: bool,
}

impl TypeFlags {
    /// True when no severity flag is set.
    pub fn is_other(&self) -> bool {
        !(self.rainstorm
            || self.severe_rainstorm
            || self.hailstorm
            || self.severe_hailstorm
            || self.supercell)
    }

    /// Whether this observation belongs to the given storm type.
    ///
    /// # Examples
    ///
    /// ```
    /// use stormtrack_types::point::{StormType, TypeFlags};
    ///
    /// let flags = TypeFlags { hailstorm: true, ..TypeFlags::default() };
    /// assert!(flags.has(StormType::Hailstorm));
    /// assert!(!flags.has(StormType::Other));
    /// ```
    pub fn has(&self, storm_type: StormType) -> bool {
        match storm_type {
            StormType::Rainstorm => self.rainstorm,
            StormType::SevereRainstorm => self.severe_rainstorm,
            StormType::Hailstorm => self.hailstorm,
            StormType::SevereHailstorm => self.severe_hailstorm,
            StormType::Supercell => self.supercell,
            StormType::Other => self.is_other(),
        }
    }
}

/// Storm categories used for filtering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StormType {
    /// `RS`
    Rainstorm,
    /// `SRS`
    SevereRainstorm,
    /// `HS`
    Hailstorm,
    /// `SHS`
    SevereHailstorm,
    /// `SC`
    Supercell,
    /// `OR`, no flag set
    Other,
}

impl StormType {
    pub const ALL: [StormType; 6] = [
        StormType::Rainstorm,
        StormType::SevereRainstorm,
        StormType::Hailstorm,
        StormType::SevereHailstorm,
        StormType::Supercell,
        StormType::Other,
    ];

    /// Short catalogue code (`RS`, `SRS`, `HS`, `SHS`, `SC`, `OR`).
    pub fn code(&self) -> &'static str {
        match self {
            StormType::Rainstorm => "RS",
            StormType::SevereRainstorm => "SRS",
            StormType::Hailstorm => "HS",
            StormType::SevereHailstorm => "SHS",
            StormType::Supercell => "SC",
            StormType::Other => "OR",
        }
    }
}

impl fmt::Display for StormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned for an unknown storm type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStormTypeError(pub String);

impl fmt::Display for ParseStormTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid storm type '{}', expected one of RS, SRS, HS, SHS, SC, OR",
            self.0
        )
    }
}

impl std::error::Error for ParseStormTypeError {}

impl FromStr for StormType {
    type Err = ParseStormTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StormType::ALL
            .into_iter()
            .find(|t| t.code() == s.trim())
            .ok_or_else(|| ParseStormTypeError(s.to_string()))
    }
}

/// A single geolocated, sized observation of a storm.
///
/// Coordinates are stored as x = longitude (or easting) and y = latitude
/// (or northing); the reference system is carried by the owning collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormPoint {
    pub storm_id: String,
    pub timestamp: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
    /// Storm area in square kilometres
    pub area: f64,
    pub flags: TypeFlags,
}

impl StormPoint {
    pub fn new(
        storm_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        longitude: f64,
        latitude: f64,
        area: f64,
        flags: TypeFlags,
    ) -> Self {
        Self {
            storm_id: storm_id.into(),
            timestamp,
            longitude,
            latitude,
            area,
            flags,
        }
    }

    /// Position as a `geo::Point`.
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Copy of this observation moved to a new position.
    pub fn with_position(&self, position: Point<f64>) -> Self {
        Self {
            longitude: position.x(),
            latitude: position.y(),
            ..self.clone()
        }
    }
}
