//! Storms and storm collections.
//!
//! A `StormCollection` is an ordered map from storm id to an owned `Storm`,
//! each storm being the time-ordered observations sharing that id. Filtering
//! and reprojection always return a new collection.

use crate::compute::validation::validate_storm_point;
use crate::error::{Result, StormError};
use crate::projection::Projector;
use chrono::{DateTime, Duration, Utc};
use geo::Rect;
use std::collections::BTreeMap;
use std::collections::btree_map;
use stormtrack_types::crs::Crs;
use stormtrack_types::point::StormPoint;

/// Time-ordered observations of a single storm.
///
/// Never empty; every point carries the storm's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Storm {
    id: String,
    points: Vec<StormPoint>,
}

impl Storm {
    /// Create a storm from its observations.
    ///
    /// Points are sorted by timestamp; observations sharing a timestamp keep
    /// their input order.
    pub fn new(id: impl Into<String>, mut points: Vec<StormPoint>) -> Result<Self> {
        let id = id.into();

        if points.is_empty() {
            return Err(StormError::InvalidInput(format!(
                "Storm '{}' has no observations",
                id
            )));
        }

        if let Some(stray) = points.iter().find(|p| p.storm_id != id) {
            return Err(StormError::InvalidInput(format!(
                "Observation of storm '{}' found in storm '{}'",
                stray.storm_id, id
            )));
        }

        points.sort_by_key(|p| p.timestamp);
        Ok(Self { id, points })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[StormPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &StormPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &StormPoint {
        &self.points[self.points.len() - 1]
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.first().timestamp
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.last().timestamp
    }

    pub fn duration(&self) -> Duration {
        self.end() - self.start()
    }

    /// Largest observed area in square kilometres.
    pub fn max_area(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.area)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Extent of all observations.
    pub fn bounds(&self) -> Rect {
        let first = self.first();
        let (mut min_x, mut min_y) = (first.longitude, first.latitude);
        let (mut max_x, mut max_y) = (min_x, min_y);

        for p in &self.points[1..] {
            min_x = min_x.min(p.longitude);
            min_y = min_y.min(p.latitude);
            max_x = max_x.max(p.longitude);
            max_y = max_y.max(p.latitude);
        }

        Rect::new(
            geo::coord! { x: min_x, y: min_y },
            geo::coord! { x: max_x, y: max_y },
        )
    }

    /// Observations with `after < timestamp <= until`.
    pub fn points_in_window(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> impl Iterator<Item = &StormPoint> {
        // Points are sorted, so the window is a contiguous slice.
        let start = self.points.partition_point(|p| p.timestamp <= after);
        let end = self.points.partition_point(|p| p.timestamp <= until);
        self.points[start..end.max(start)].iter()
    }
}

/// Collection of storms keyed by storm id.
///
/// Iteration is in ascending id order; this order also decides ties in the
/// nearest-storm matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct StormCollection {
    crs: Crs,
    storms: BTreeMap<String, Storm>,
}

impl StormCollection {
    /// Empty collection in the given reference system.
    pub fn new(crs: Crs) -> Self {
        Self {
            crs,
            storms: BTreeMap::new(),
        }
    }

    /// Group flat observations into storms.
    ///
    /// Every point is validated; the first invalid one aborts the build.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stormtrack::{Crs, StormCollection, StormPoint, TypeFlags};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
    /// let points = vec![
    ///     StormPoint::new("A", t, 7.0, 46.0, 10.0, TypeFlags::default()),
    ///     StormPoint::new("B", t, 8.0, 47.0, 20.0, TypeFlags::default()),
    ///     StormPoint::new("A", t, 7.1, 46.1, 12.0, TypeFlags::default()),
    /// ];
    /// let storms = StormCollection::from_points(points, Crs::Wgs84).unwrap();
    /// assert_eq!(storms.len(), 2);
    /// assert_eq!(storms.get("A").unwrap().len(), 2);
    /// ```
    pub fn from_points(points: impl IntoIterator<Item = StormPoint>, crs: Crs) -> Result<Self> {
        let mut groups: BTreeMap<String, Vec<StormPoint>> = BTreeMap::new();
        for point in points {
            validate_storm_point(&point, crs)?;
            groups
                .entry(point.storm_id.clone())
                .or_default()
                .push(point);
        }

        let mut storms = BTreeMap::new();
        for (id, points) in groups {
            let storm = Storm::new(id.clone(), points)?;
            storms.insert(id, storm);
        }

        Ok(Self { crs, storms })
    }

    /// Build a collection from already grouped storms.
    pub fn from_storms(storms: impl IntoIterator<Item = Storm>, crs: Crs) -> Result<Self> {
        let mut collection = Self::new(crs);
        for storm in storms {
            if collection.storms.contains_key(storm.id()) {
                return Err(StormError::InvalidInput(format!(
                    "Duplicate storm id '{}'",
                    storm.id()
                )));
            }
            collection.storms.insert(storm.id.clone(), storm);
        }
        Ok(collection)
    }

    /// Reference system of the stored coordinates.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn len(&self) -> usize {
        self.storms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storms.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Storm> {
        self.storms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.storms.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.storms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Storm> {
        self.storms.iter()
    }

    pub fn storms(&self) -> impl Iterator<Item = &Storm> {
        self.storms.values()
    }

    /// Total number of observations across all storms.
    pub fn num_points(&self) -> usize {
        self.storms.values().map(Storm::len).sum()
    }

    /// All observations, storms in id order and points in time order.
    pub fn points(&self) -> impl Iterator<Item = &StormPoint> {
        self.storms.values().flat_map(|s| s.points.iter())
    }

    pub fn into_points(self) -> Vec<StormPoint> {
        self.storms
            .into_values()
            .flat_map(|s| s.points.into_iter())
            .collect()
    }

    /// New collection holding clones of the storms accepted by `keep`.
    pub fn select(&self, mut keep: impl FnMut(&Storm) -> bool) -> Self {
        let storms = self
            .storms
            .iter()
            .filter(|(_, storm)| keep(storm))
            .map(|(id, storm)| (id.clone(), storm.clone()))
            .collect();

        Self {
            crs: self.crs,
            storms,
        }
    }

    /// New collection with every observation projected into `to`.
    pub fn reproject(&self, projector: &dyn Projector, to: Crs) -> Result<Self> {
        if to == self.crs {
            return Ok(self.clone());
        }

        let mut storms = BTreeMap::new();
        for (id, storm) in &self.storms {
            let mut points = Vec::with_capacity(storm.len());
            for p in &storm.points {
                let projected = projector.project(p.point(), self.crs, to)?;
                points.push(p.with_position(projected));
            }
            storms.insert(
                id.clone(),
                Storm {
                    id: id.clone(),
                    points,
                },
            );
        }

        log::debug!(
            "Reprojected {} storms from {} to {}",
            storms.len(),
            self.crs,
            to
        );

        Ok(Self { crs: to, storms })
    }
}

impl<'a> IntoIterator for &'a StormCollection {
    type Item = (&'a String, &'a Storm);
    type IntoIter = btree_map::Iter<'a, String, Storm>;

    fn into_iter(self) -> Self::IntoIter {
        self.storms.iter()
    }
}
