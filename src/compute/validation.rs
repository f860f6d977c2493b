//! Validation for storm observations.

use crate::error::{Result, StormError};
use stormtrack_types::crs::Crs;
use stormtrack_types::point::StormPoint;

/// Longitude and latitude limits in degrees.
const LONGITUDE_LIMIT: f64 = 180.0;
const LATITUDE_LIMIT: f64 = 90.0;

fn invalid(point: &StormPoint, problem: String) -> StormError {
    StormError::InvalidInput(format!(
        "Storm '{}' at {}: {}",
        point.storm_id, point.timestamp, problem
    ))
}

/// Validates a storm observation expressed in `crs`.
///
/// The id must be non-empty, the area strictly positive, and both
/// coordinates finite. Geographic coordinates must also lie within
/// ±180° longitude and ±90° latitude.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stormtrack::compute::validation::validate_storm_point;
/// use stormtrack::{Crs, StormPoint, TypeFlags};
///
/// let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
/// let bern = StormPoint::new("S1", t, 7.44, 46.95, 10.0, TypeFlags::default());
/// assert!(validate_storm_point(&bern, Crs::Wgs84).is_ok());
///
/// let off_globe = StormPoint::new("S1", t, 7.0, 95.0, 10.0, TypeFlags::default());
/// assert!(validate_storm_point(&off_globe, Crs::Wgs84).is_err());
/// assert!(validate_storm_point(&off_globe, Crs::Lv03).is_ok());
/// ```
pub fn validate_storm_point(point: &StormPoint, crs: Crs) -> Result<()> {
    if point.storm_id.trim().is_empty() {
        return Err(StormError::InvalidInput(
            "Storm id must not be empty".to_string(),
        ));
    }

    // NaN fails the comparison as well
    if !(point.area > 0.0 && point.area.is_finite()) {
        return Err(invalid(point, format!("non-positive area {}", point.area)));
    }

    for (axis, value, limit) in [
        ("longitude", point.longitude, LONGITUDE_LIMIT),
        ("latitude", point.latitude, LATITUDE_LIMIT),
    ] {
        if !value.is_finite() {
            return Err(invalid(point, format!("non-finite {} {}", axis, value)));
        }
        if crs.is_geographic() && value.abs() > limit {
            return Err(invalid(
                point,
                format!("{} {} outside ±{}°", axis, value, limit),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stormtrack_types::point::TypeFlags;

    fn point(lon: f64, lat: f64, area: f64) -> StormPoint {
        let time = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
        StormPoint::new("S1", time, lon, lat, area, TypeFlags::default())
    }

    #[test]
    fn test_valid_point() {
        assert!(validate_storm_point(&point(7.0, 46.0, 10.0), Crs::Wgs84).is_ok());
    }

    #[test]
    fn test_area_must_be_positive() {
        assert!(validate_storm_point(&point(7.0, 46.0, 0.0), Crs::Wgs84).is_err());
        assert!(validate_storm_point(&point(7.0, 46.0, -3.0), Crs::Wgs84).is_err());
        assert!(validate_storm_point(&point(7.0, 46.0, f64::NAN), Crs::Wgs84).is_err());
    }

    #[test]
    fn test_planar_coordinates_skip_range_check() {
        let planar = point(600_000.0, 200_000.0, 10.0);
        assert!(validate_storm_point(&planar, Crs::Lv03).is_ok());
        assert!(validate_storm_point(&planar, Crs::Wgs84).is_err());
    }

    #[test]
    fn test_geographic_limits_inclusive() {
        assert!(validate_storm_point(&point(180.0, -90.0, 1.0), Crs::Wgs84).is_ok());
        assert!(validate_storm_point(&point(-180.5, 0.0, 1.0), Crs::Wgs84).is_err());
        assert!(validate_storm_point(&point(0.0, f64::INFINITY, 1.0), Crs::Lv95).is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut p = point(7.0, 46.0, 10.0);
        p.storm_id = "  ".to_string();
        assert!(validate_storm_point(&p, Crs::Wgs84).is_err());
    }
}
