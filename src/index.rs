//! Hour-bucketed index of active storms.
//!
//! Answers "which storms were observed during hour H" in O(1) average time.
//! The index holds storm ids only and must be rebuilt whenever its source
//! collection changes.

use crate::collection::StormCollection;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

static NO_STORMS: BTreeSet<String> = BTreeSet::new();

const SECONDS_PER_HOUR: i64 = 3600;

/// Truncate a timestamp to the start of its hour.
///
/// # Examples
///
/// ```rust
/// use stormtrack::index::floor_hour;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 47, 13).unwrap();
/// assert_eq!(floor_hour(t), Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap());
/// ```
pub fn floor_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let secs = timestamp.timestamp();
    let floored = secs - secs.rem_euclid(SECONDS_PER_HOUR);
    DateTime::from_timestamp(floored, 0).unwrap_or(timestamp)
}

/// Mapping from whole hours to the ids of storms observed in that hour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalIndex {
    hours: FxHashMap<DateTime<Utc>, BTreeSet<String>>,
}

impl TemporalIndex {
    /// Index every observation of `collection` under its floored hour.
    ///
    /// A storm spanning several hours appears under each hour it touches.
    pub fn build(collection: &StormCollection) -> Self {
        let mut hours: FxHashMap<DateTime<Utc>, BTreeSet<String>> = FxHashMap::default();

        for (id, storm) in collection {
            for point in storm.points() {
                let bucket = hours.entry(floor_hour(point.timestamp)).or_default();
                if !bucket.contains(id) {
                    bucket.insert(id.clone());
                }
            }
        }

        log::debug!(
            "Built temporal index over {} storms spanning {} hours",
            collection.len(),
            hours.len()
        );

        Self { hours }
    }

    /// Storm ids active during the hour containing `hour`.
    ///
    /// Unknown hours yield an empty set.
    pub fn active_at(&self, hour: DateTime<Utc>) -> &BTreeSet<String> {
        self.hours.get(&floor_hour(hour)).unwrap_or(&NO_STORMS)
    }

    /// Indexed hours in ascending order.
    pub fn hours(&self) -> Vec<DateTime<Utc>> {
        let mut hours: Vec<_> = self.hours.keys().copied().collect();
        hours.sort_unstable();
        hours
    }

    /// Number of indexed hours.
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stormtrack_types::crs::Crs;
    use stormtrack_types::point::{StormPoint, TypeFlags};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 28, hour, minute, 0).unwrap()
    }

    fn obs(id: &str, time: DateTime<Utc>) -> StormPoint {
        StormPoint::new(id, time, 7.0, 46.0, 10.0, TypeFlags::default())
    }

    fn sample() -> StormCollection {
        StormCollection::from_points(
            vec![
                obs("S1", at(12, 0)),
                obs("S1", at(12, 30)),
                obs("S1", at(13, 5)),
                obs("S2", at(13, 55)),
            ],
            Crs::Wgs84,
        )
        .unwrap()
    }

    #[test]
    fn test_floor_hour_before_epoch() {
        let t = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 0).unwrap();
        assert_eq!(floor_hour(t), Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_multi_hour_storm_in_every_hour() {
        let index = TemporalIndex::build(&sample());
        assert!(index.active_at(at(12, 0)).contains("S1"));
        assert!(index.active_at(at(13, 0)).contains("S1"));
        assert!(index.active_at(at(13, 0)).contains("S2"));
        assert!(!index.active_at(at(12, 0)).contains("S2"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_active_at_floors_query() {
        let index = TemporalIndex::build(&sample());
        assert_eq!(index.active_at(at(12, 59)).len(), 1);
    }

    #[test]
    fn test_absent_hour_is_empty() {
        let index = TemporalIndex::build(&sample());
        assert!(index.active_at(at(14, 0)).is_empty());
    }

    #[test]
    fn test_coverage_of_every_point() {
        let storms = sample();
        let index = TemporalIndex::build(&storms);
        for p in storms.points() {
            assert!(index.active_at(floor_hour(p.timestamp)).contains(&p.storm_id));
        }
    }

    #[test]
    fn test_hours_sorted() {
        let index = TemporalIndex::build(&sample());
        assert_eq!(index.hours(), vec![at(12, 0), at(13, 0)]);
    }

    #[test]
    fn test_empty_collection() {
        let index = TemporalIndex::build(&StormCollection::new(Crs::Wgs84));
        assert!(index.is_empty());
        assert!(index.active_at(at(12, 0)).is_empty());
    }
}
