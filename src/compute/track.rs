//! Storm track geometries.
//!
//! A track reduces a storm to one geometry: a point for storms observed once,
//! otherwise the polyline through all observations in time order. Tracks can
//! be exchanged as GeoJSON feature collections with an `ID` property per
//! feature.

use crate::collection::{Storm, StormCollection};
use crate::error::{Result, StormError};
use crate::projection::Projector;
use geo::{Distance, Euclidean, Haversine, LineString, Point};
use std::collections::BTreeMap;
use stormtrack_types::crs::Crs;
use stormtrack_types::track::{Track, TrackGeometry};

const METRES_PER_KM: f64 = 1000.0;

/// Reduce a storm to its track.
pub fn build_track(storm: &Storm, crs: Crs) -> Track {
    let geometry = if storm.len() == 1 {
        TrackGeometry::Point(storm.first().point())
    } else {
        TrackGeometry::LineString(storm.points().iter().map(|p| p.point()).collect())
    };
    Track::new(storm.id(), geometry, crs)
}

/// Tracks of every storm, keyed by storm id.
///
/// # Examples
///
/// ```rust
/// use stormtrack::{build_tracks, Crs, StormCollection, StormPoint, TypeFlags};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
/// let storms = StormCollection::from_points(vec![
///     StormPoint::new("A", t, 7.0, 46.0, 10.0, TypeFlags::default()),
///     StormPoint::new("A", t + Duration::minutes(5), 7.1, 46.1, 10.0, TypeFlags::default()),
///     StormPoint::new("B", t, 8.0, 47.0, 10.0, TypeFlags::default()),
/// ], Crs::Wgs84).unwrap();
///
/// let tracks = build_tracks(&storms);
/// assert_eq!(tracks["A"].geometry.num_points(), 2);
/// assert!(tracks["B"].geometry.is_point());
/// ```
pub fn build_tracks(collection: &StormCollection) -> BTreeMap<String, Track> {
    collection
        .iter()
        .map(|(id, storm)| (id.clone(), build_track(storm, collection.crs())))
        .collect()
}

/// Planar length of a track in kilometres, measured in `planar_crs`.
///
/// Single-point tracks have length zero.
pub fn track_length_km(track: &Track, projector: &dyn Projector, planar_crs: Crs) -> Result<f64> {
    if planar_crs.is_geographic() {
        return Err(StormError::InvalidInput(format!(
            "Track lengths need a planar CRS, got: {}",
            planar_crs
        )));
    }

    let vertices = projector.project_all(&track.geometry.points(), track.crs, planar_crs)?;
    let metres: f64 = vertices
        .windows(2)
        .map(|pair| Euclidean.distance(pair[0], pair[1]))
        .sum();
    Ok(metres / METRES_PER_KM)
}

/// Great-circle length of a geographic track in kilometres.
pub fn haversine_length_km(track: &Track) -> Result<f64> {
    if !track.crs.is_geographic() {
        return Err(StormError::InvalidInput(format!(
            "Haversine length needs geographic coordinates, got: {}",
            track.crs
        )));
    }

    let vertices = track.geometry.points();
    let metres: f64 = vertices
        .windows(2)
        .map(|pair| Haversine.distance(pair[0], pair[1]))
        .sum();
    Ok(metres / METRES_PER_KM)
}

#[cfg(feature = "geojson")]
pub use self::geojson_io::{load_tracks, save_tracks, tracks_from_geojson, tracks_to_geojson};

#[cfg(feature = "geojson")]
mod geojson_io {
    use super::*;
    use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
    use std::path::Path;

    const ID_PROPERTY: &str = "ID";
    const CRS_MEMBER: &str = "crs";

    fn position(point: &Point) -> Vec<f64> {
        vec![point.x(), point.y()]
    }

    fn to_point(coords: &[f64]) -> Result<Point> {
        if coords.len() < 2 {
            return Err(StormError::InvalidFormat(
                "Position must have at least 2 coordinates".to_string(),
            ));
        }
        Ok(Point::new(coords[0], coords[1]))
    }

    fn to_feature(track: &Track) -> Feature {
        let value = match &track.geometry {
            TrackGeometry::Point(p) => Value::Point(position(p)),
            TrackGeometry::LineString(line) => {
                Value::LineString(line.points().map(|p| position(&p)).collect())
            }
        };

        let mut properties = JsonObject::new();
        properties.insert(
            ID_PROPERTY.to_string(),
            serde_json::Value::String(track.storm_id.clone()),
        );

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    fn from_feature(feature: Feature, crs: Crs) -> Result<Track> {
        let storm_id = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(ID_PROPERTY))
            .and_then(|id| match id {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                StormError::InvalidFormat(format!("Track feature without '{}' property", ID_PROPERTY))
            })?;

        let geometry = feature.geometry.ok_or_else(|| {
            StormError::InvalidFormat(format!("Track '{}' has no geometry", storm_id))
        })?;

        let geometry = match geometry.value {
            Value::Point(coords) => TrackGeometry::Point(to_point(&coords)?),
            Value::LineString(positions) => {
                if positions.len() < 2 {
                    return Err(StormError::InvalidFormat(format!(
                        "Track '{}' LineString needs at least 2 positions, got {}",
                        storm_id,
                        positions.len()
                    )));
                }
                let points = positions
                    .iter()
                    .map(|coords| to_point(coords))
                    .collect::<Result<Vec<_>>>()?;
                TrackGeometry::LineString(LineString::from(points))
            }
            _ => {
                return Err(StormError::InvalidFormat(format!(
                    "Track '{}' is neither a Point nor a LineString",
                    storm_id
                )));
            }
        };

        Ok(Track::new(storm_id, geometry, crs))
    }

    /// Serialize tracks as a GeoJSON FeatureCollection, in storm id order.
    pub fn tracks_to_geojson(tracks: &BTreeMap<String, Track>) -> Result<String> {
        let crs = tracks.values().next().map(|t| t.crs).unwrap_or_default();
        if let Some(other) = tracks.values().find(|t| t.crs != crs) {
            return Err(StormError::InvalidInput(format!(
                "Track '{}' is in {} while others are in {}",
                other.storm_id, other.crs, crs
            )));
        }

        let mut members = JsonObject::new();
        members.insert(
            CRS_MEMBER.to_string(),
            serde_json::Value::String(crs.to_string()),
        );

        let collection = FeatureCollection {
            bbox: None,
            features: tracks.values().map(to_feature).collect(),
            foreign_members: Some(members),
        };

        serde_json::to_string(&collection).map_err(|e| {
            StormError::Serialization(format!("Failed to serialize tracks: {}", e))
        })
    }

    /// Parse a GeoJSON FeatureCollection of tracks.
    ///
    /// Coordinates are taken as WGS84 unless the collection carries a `crs`
    /// member naming another supported system.
    pub fn tracks_from_geojson(geojson: &str) -> Result<BTreeMap<String, Track>> {
        let collection: FeatureCollection = serde_json::from_str(geojson)
            .map_err(|e| StormError::InvalidFormat(format!("Failed to parse GeoJSON: {}", e)))?;

        let crs = match collection
            .foreign_members
            .as_ref()
            .and_then(|members| members.get(CRS_MEMBER))
        {
            Some(serde_json::Value::String(name)) => name
                .parse::<Crs>()
                .map_err(|e| StormError::InvalidFormat(e.to_string()))?,
            Some(other) => {
                return Err(StormError::InvalidFormat(format!(
                    "Unsupported crs member: {}",
                    other
                )));
            }
            None => Crs::Wgs84,
        };

        let mut tracks = BTreeMap::new();
        for feature in collection.features {
            let track = from_feature(feature, crs)?;
            if tracks.contains_key(&track.storm_id) {
                return Err(StormError::InvalidFormat(format!(
                    "Duplicate track id '{}'",
                    track.storm_id
                )));
            }
            tracks.insert(track.storm_id.clone(), track);
        }
        Ok(tracks)
    }

    pub fn save_tracks<P: AsRef<Path>>(tracks: &BTreeMap<String, Track>, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, tracks_to_geojson(tracks)?)?;
        log::debug!("Saved {} tracks to {}", tracks.len(), path.display());
        Ok(())
    }

    pub fn load_tracks<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, Track>> {
        let path = path.as_ref();
        let tracks = tracks_from_geojson(&std::fs::read_to_string(path)?)?;
        log::debug!("Loaded {} tracks from {}", tracks.len(), path.display());
        Ok(tracks)
    }
}
