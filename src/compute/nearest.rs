//! Area-normalized nearest-storm matching.
//!
//! For every query point the matcher finds the storm observation that
//! minimizes `squared planar distance / storm area` among the storms active
//! during the query hour, looking back over a trailing window. Large storms
//! therefore "reach" further than small ones at the same raw distance.

use crate::collection::StormCollection;
use crate::config::Config;
use crate::error::{Result, StormError};
use crate::index::TemporalIndex;
use crate::projection::{Projector, SwissProjector};
use chrono::{DateTime, Duration, Utc};
use geo::Point;
use stormtrack_types::crs::Crs;

const METRES_PER_KM: f64 = 1000.0;

/// Best storm per query point at one instant.
///
/// `ids[i]` and `distances_km[i]` belong to the i-th query point. A point
/// with no storm in range has `None` and `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
    pub instant: DateTime<Utc>,
    pub ids: Vec<Option<String>>,
    pub distances_km: Vec<f64>,
}

/// One flattened (instant, query point, storm, distance) record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRow<'a> {
    pub instant: DateTime<Utc>,
    pub station: usize,
    pub storm_id: Option<&'a str>,
    pub distance_km: f64,
}

impl NearestMatch {
    /// Result for `len` query points with no storm in range.
    pub fn unmatched(instant: DateTime<Utc>, len: usize) -> Self {
        Self {
            instant,
            ids: vec![None; len],
            distances_km: vec![f64::INFINITY; len],
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Storm id and distance for query point `station`.
    pub fn get(&self, station: usize) -> Option<(Option<&str>, f64)> {
        let id = self.ids.get(station)?;
        let distance = *self.distances_km.get(station)?;
        Some((id.as_deref(), distance))
    }

    /// Number of query points that found a storm.
    pub fn matched(&self) -> usize {
        self.ids.iter().filter(|id| id.is_some()).count()
    }

    /// Records in query point order.
    pub fn rows(&self) -> impl Iterator<Item = MatchRow<'_>> {
        self.ids
            .iter()
            .zip(&self.distances_km)
            .enumerate()
            .map(move |(station, (id, &distance_km))| MatchRow {
                instant: self.instant,
                station,
                storm_id: id.as_deref(),
                distance_km,
            })
    }
}

/// Nearest-storm matcher over a collection and its temporal index.
///
/// Candidates are visited in ascending storm id and their points in
/// timestamp order; a pair only replaces the running best when it is
/// strictly smaller, so exact ties go to the smallest storm id (and its
/// earliest point in the window).
///
/// # Examples
///
/// ```rust
/// use stormtrack::{Crs, NearestStormMatcher, Point, StormCollection, StormPoint,
///                  SwissProjector, TemporalIndex, TypeFlags};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
/// let storms = StormCollection::from_points(
///     vec![StormPoint::new("S1", t, 7.0, 46.0, 100.0, TypeFlags::default())],
///     Crs::Wgs84,
/// ).unwrap();
/// let index = TemporalIndex::build(&storms);
///
/// let matcher = NearestStormMatcher::new(
///     &storms, &index, &SwissProjector, Crs::Lv03, Duration::hours(1),
/// ).unwrap();
/// let result = matcher
///     .nearest(&[Point::new(7.0, 46.0)], t + Duration::minutes(10), Crs::Wgs84)
///     .unwrap();
/// assert_eq!(result.ids[0].as_deref(), Some("S1"));
/// ```
pub struct NearestStormMatcher<'a> {
    collection: &'a StormCollection,
    index: &'a TemporalIndex,
    projector: &'a dyn Projector,
    working_crs: Crs,
    window: Duration,
}

impl<'a> NearestStormMatcher<'a> {
    pub fn new(
        collection: &'a StormCollection,
        index: &'a TemporalIndex,
        projector: &'a dyn Projector,
        working_crs: Crs,
        window: Duration,
    ) -> Result<Self> {
        if working_crs.is_geographic() {
            return Err(StormError::InvalidInput(format!(
                "Distances need a planar working CRS, got: {}",
                working_crs
            )));
        }
        if window <= Duration::zero() {
            return Err(StormError::InvalidInput(format!(
                "Matching window must be positive, got {} minutes",
                window.num_minutes()
            )));
        }

        Ok(Self {
            collection,
            index,
            projector,
            working_crs,
            window,
        })
    }

    /// Matcher using the working CRS and window of `config`.
    pub fn from_config(
        collection: &'a StormCollection,
        index: &'a TemporalIndex,
        projector: &'a dyn Projector,
        config: &Config,
    ) -> Result<Self> {
        Self::new(
            collection,
            index,
            projector,
            config.working_crs,
            config.window(),
        )
    }

    pub fn working_crs(&self) -> Crs {
        self.working_crs
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Match every query point (given in `source_crs`) at `instant`.
    ///
    /// Candidate storms come from the index bucket of `instant`'s hour; their
    /// points with `instant - window < timestamp <= instant` are compared.
    pub fn nearest(
        &self,
        points: &[Point],
        instant: DateTime<Utc>,
        source_crs: Crs,
    ) -> Result<NearestMatch> {
        if points.is_empty() {
            return Ok(NearestMatch::unmatched(instant, 0));
        }

        let stations = self
            .projector
            .project_all(points, source_crs, self.working_crs)?;

        let candidates = self.index.active_at(instant);
        if candidates.is_empty() {
            return Ok(NearestMatch::unmatched(instant, points.len()));
        }

        let mut best = vec![f64::INFINITY; stations.len()];
        let mut best_ids: Vec<Option<&str>> = vec![None; stations.len()];
        let after = instant.checked_sub_signed(self.window).ok_or_else(|| {
            StormError::InvalidInput(format!("Window start before {} is out of range", instant))
        })?;

        for id in candidates {
            let Some(storm) = self.collection.get(id) else {
                log::warn!("Storm '{}' is indexed but missing from the collection", id);
                continue;
            };

            for observation in storm.points_in_window(after, instant) {
                let position = self.projector.project(
                    observation.point(),
                    self.collection.crs(),
                    self.working_crs,
                )?;

                for (i, station) in stations.iter().enumerate() {
                    let dx = station.x() - position.x();
                    let dy = station.y() - position.y();
                    let normalized = (dx * dx + dy * dy) / observation.area;
                    if normalized < best[i] {
                        best[i] = normalized;
                        best_ids[i] = Some(storm.id());
                    }
                }
            }
        }

        Ok(NearestMatch {
            instant,
            ids: best_ids
                .into_iter()
                .map(|id| id.map(str::to_owned))
                .collect(),
            distances_km: best
                .into_iter()
                .map(|value| value.sqrt() / METRES_PER_KM)
                .collect(),
        })
    }
}

/// Match with the built-in Swiss projector and the default configuration.
pub fn nearest(
    collection: &StormCollection,
    index: &TemporalIndex,
    points: &[Point],
    instant: DateTime<Utc>,
    source_crs: Crs,
) -> Result<NearestMatch> {
    let config = Config::default();
    NearestStormMatcher::from_config(collection, index, &SwissProjector, &config)?
        .nearest(points, instant, source_crs)
}
