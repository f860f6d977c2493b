use crate::crs::Crs;
use geo::{Geometry, LineString, Point};
use serde::{Deserialize, Serialize};

/// Shape of a storm track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackGeometry {
    /// Storm observed only once
    Point(Point<f64>),
    /// Ordered path through two or more observations
    LineString(LineString<f64>),
}

impl TrackGeometry {
    /// Vertices of the geometry in path order.
    pub fn points(&self) -> Vec<Point<f64>> {
        match self {
            TrackGeometry::Point(p) => vec![*p],
            TrackGeometry::LineString(line) => line.points().collect(),
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, TrackGeometry::Point(_))
    }

    pub fn num_points(&self) -> usize {
        match self {
            TrackGeometry::Point(_) => 1,
            TrackGeometry::LineString(line) => line.0.len(),
        }
    }
}

impl From<TrackGeometry> for Geometry<f64> {
    fn from(geometry: TrackGeometry) -> Self {
        match geometry {
            TrackGeometry::Point(p) => Geometry::Point(p),
            TrackGeometry::LineString(line) => Geometry::LineString(line),
        }
    }
}

/// Reduced trajectory of a single storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub storm_id: String,
    pub geometry: TrackGeometry,
    pub crs: Crs,
}

impl Track {
    pub fn new(storm_id: impl Into<String>, geometry: TrackGeometry, crs: Crs) -> Self {
        Self {
            storm_id: storm_id.into(),
            geometry,
            crs,
        }
    }
}
