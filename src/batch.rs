//! Matching a fixed station list over many instants.

use crate::compute::nearest::{MatchRow, NearestMatch, NearestStormMatcher};
use crate::error::{Result, StormError};
use chrono::{DateTime, Duration, Utc};
use geo::Point;
use stormtrack_types::crs::Crs;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Runs a matcher for the same query points at a series of instants.
///
/// Each instant is independent, so with the `parallel` feature instants are
/// matched on the rayon thread pool. Results keep input order either way.
pub struct BatchMatcher<'a> {
    matcher: NearestStormMatcher<'a>,
    stations: Vec<Point>,
    source_crs: Crs,
}

impl<'a> BatchMatcher<'a> {
    pub fn new(matcher: NearestStormMatcher<'a>, stations: Vec<Point>, source_crs: Crs) -> Self {
        Self {
            matcher,
            stations,
            source_crs,
        }
    }

    pub fn stations(&self) -> &[Point] {
        &self.stations
    }

    /// One result per instant, in input order.
    ///
    /// The first failing instant aborts the batch.
    pub fn run(&self, instants: &[DateTime<Utc>]) -> Result<Vec<NearestMatch>> {
        log::debug!(
            "Matching {} stations at {} instants",
            self.stations.len(),
            instants.len()
        );

        #[cfg(feature = "parallel")]
        let results = instants
            .par_iter()
            .map(|instant| self.match_at(*instant))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results = instants
            .iter()
            .map(|instant| self.match_at(*instant))
            .collect();

        results
    }

    fn match_at(&self, instant: DateTime<Utc>) -> Result<NearestMatch> {
        self.matcher
            .nearest(&self.stations, instant, self.source_crs)
    }
}

/// Instants from `start` to `end` inclusive, every `step`.
pub fn instants_between(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<Vec<DateTime<Utc>>> {
    if step <= Duration::zero() {
        return Err(StormError::InvalidInput(format!(
            "Step must be positive, got {} minutes",
            step.num_minutes()
        )));
    }

    let mut instants = Vec::new();
    let mut current = start;
    while current <= end {
        instants.push(current);
        current = current.checked_add_signed(step).ok_or_else(|| {
            StormError::InvalidInput(format!("Instant after {} is out of range", current))
        })?;
    }
    Ok(instants)
}

/// Flatten batch results into (instant, station, storm, distance) rows.
pub fn rows(results: &[NearestMatch]) -> Vec<MatchRow<'_>> {
    let total = results.iter().map(NearestMatch::len).sum();
    let mut rows = Vec::with_capacity(total);
    for result in results {
        rows.extend(result.rows());
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::StormCollection;
    use crate::index::TemporalIndex;
    use crate::projection::IdentityProjector;
    use chrono::TimeZone;
    use stormtrack_types::point::{StormPoint, TypeFlags};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 28, hour, minute, 0).unwrap()
    }

    fn sample() -> StormCollection {
        StormCollection::from_points(
            vec![
                StormPoint::new("A", at(12, 0), 600_000.0, 200_000.0, 10.0, TypeFlags::default()),
                StormPoint::new("B", at(13, 0), 650_000.0, 200_000.0, 10.0, TypeFlags::default()),
            ],
            Crs::Lv03,
        )
        .unwrap()
    }

    #[test]
    fn test_results_in_instant_order() {
        let storms = sample();
        let index = TemporalIndex::build(&storms);
        let matcher =
            NearestStormMatcher::new(&storms, &index, &IdentityProjector, Crs::Lv03, Duration::hours(1))
                .unwrap();
        let batch = BatchMatcher::new(
            matcher,
            vec![Point::new(600_000.0, 200_000.0), Point::new(650_000.0, 200_000.0)],
            Crs::Lv03,
        );

        let instants = vec![at(13, 30), at(12, 30), at(14, 0)];
        let results = batch.run(&instants).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].instant, at(13, 30));
        assert_eq!(results[0].ids[0].as_deref(), Some("B"));
        assert_eq!(results[1].ids[0].as_deref(), Some("A"));
        assert_eq!(results[2].matched(), 0);
    }

    #[test]
    fn test_rows_are_flattened() {
        let storms = sample();
        let index = TemporalIndex::build(&storms);
        let matcher =
            NearestStormMatcher::new(&storms, &index, &IdentityProjector, Crs::Lv03, Duration::hours(1))
                .unwrap();
        let batch = BatchMatcher::new(matcher, vec![Point::new(600_000.0, 200_000.0)], Crs::Lv03);

        let results = batch
            .run(&instants_between(at(12, 0), at(13, 0), Duration::minutes(30)).unwrap())
            .unwrap();
        let flat = rows(&results);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[1].instant, at(12, 30));
        assert_eq!(flat[1].station, 0);
        assert_eq!(flat[1].storm_id, Some("A"));
    }

    #[test]
    fn test_instants_between() {
        let instants = instants_between(at(12, 0), at(14, 0), Duration::hours(1)).unwrap();
        assert_eq!(instants, vec![at(12, 0), at(13, 0), at(14, 0)]);
        assert!(instants_between(at(14, 0), at(12, 0), Duration::hours(1)).unwrap().is_empty());
        assert!(instants_between(at(12, 0), at(14, 0), Duration::zero()).is_err());
    }

    #[test]
    fn test_instants_past_max_time_rejected() {
        let last = DateTime::<Utc>::MAX_UTC;
        let result = instants_between(last - Duration::hours(1), last, Duration::hours(2));
        assert!(matches!(result, Err(StormError::InvalidInput(_))));
    }
}
