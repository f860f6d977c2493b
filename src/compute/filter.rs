//! Per-storm attribute and bounding-box filtering.
//!
//! Predicates are evaluated against a storm's aggregate (earliest/latest
//! date, coordinate extremes, flags over all points) and combined
//! conjunctively. A kept storm keeps all of its points.
//!
//! Bounds are asymmetric throughout: lower bounds are inclusive, upper
//! bounds exclusive, for dates and coordinates alike.

use crate::collection::{Storm, StormCollection};
use crate::error::{Result, StormError};
use chrono::{NaiveDate, NaiveDateTime};
use stormtrack_types::point::StormType;

/// A single storm-level condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// Earliest observation date is on or after this date
    MinDate(NaiveDate),
    /// Latest observation date is strictly before this date
    MaxDate(NaiveDate),
    /// Westernmost observation is at or east of this longitude
    MinLon(f64),
    /// Easternmost observation is strictly west of this longitude
    MaxLon(f64),
    /// Southernmost observation is at or north of this latitude
    MinLat(f64),
    /// Northernmost observation is strictly south of this latitude
    MaxLat(f64),
    /// Every observation belongs to this type
    StormType(StormType),
}

impl Predicate {
    /// Parse a `key = value` filter condition.
    ///
    /// Keys are `min_date`, `max_date`, `min_lon`, `max_lon`, `min_lat`,
    /// `max_lat` and `storm_type`; the underscore is optional.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().replace('_', "").as_str() {
            "mindate" => Ok(Predicate::MinDate(parse_date(key, value)?)),
            "maxdate" => Ok(Predicate::MaxDate(parse_date(key, value)?)),
            "minlon" => Ok(Predicate::MinLon(parse_bound(key, value)?)),
            "maxlon" => Ok(Predicate::MaxLon(parse_bound(key, value)?)),
            "minlat" => Ok(Predicate::MinLat(parse_bound(key, value)?)),
            "maxlat" => Ok(Predicate::MaxLat(parse_bound(key, value)?)),
            "stormtype" => value
                .parse::<StormType>()
                .map(Predicate::StormType)
                .map_err(|e| StormError::InvalidFilter(e.to_string())),
            _ => Err(StormError::InvalidFilter(format!(
                "unknown filter key '{}'",
                key
            ))),
        }
    }

    /// Whether `storm` satisfies this condition.
    pub fn matches(&self, storm: &Storm) -> bool {
        match *self {
            Predicate::MinDate(date) => storm.start().date_naive() >= date,
            Predicate::MaxDate(date) => storm.end().date_naive() < date,
            Predicate::MinLon(bound) => storm.bounds().min().x >= bound,
            Predicate::MaxLon(bound) => storm.bounds().max().x < bound,
            Predicate::MinLat(bound) => storm.bounds().min().y >= bound,
            Predicate::MaxLat(bound) => storm.bounds().max().y < bound,
            Predicate::StormType(storm_type) => {
                storm.points().iter().all(|p| p.flags.has(storm_type))
            }
        }
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime.date());
    }
    Err(StormError::InvalidFilter(format!(
        "'{}' expects a date (YYYY-MM-DD), got '{}'",
        key, value
    )))
}

fn parse_bound(key: &str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(bound) if bound.is_finite() => Ok(bound),
        _ => Err(StormError::InvalidFilter(format!(
            "'{}' expects a finite number, got '{}'",
            key, value
        ))),
    }
}

/// Conjunction of storm predicates.
///
/// # Examples
///
/// ```rust
/// use stormtrack::{StormFilter, StormType};
/// use chrono::NaiveDate;
///
/// let filter = StormFilter::new()
///     .min_date(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
///     .max_lon(10.49)
///     .storm_type(StormType::Hailstorm);
/// assert_eq!(filter.len(), 3);
///
/// let parsed = StormFilter::from_pairs([("minlat", "45.8"), ("storm_type", "SC")]).unwrap();
/// assert_eq!(parsed.len(), 2);
/// assert!(StormFilter::from_pairs([("colour", "red")]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StormFilter {
    predicates: Vec<Predicate>,
}

impl StormFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from textual key/value conditions.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::new();
        for (key, value) in pairs {
            filter = filter.with(Predicate::parse(key.as_ref(), value.as_ref())?);
        }
        Ok(filter)
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn min_date(self, date: NaiveDate) -> Self {
        self.with(Predicate::MinDate(date))
    }

    pub fn max_date(self, date: NaiveDate) -> Self {
        self.with(Predicate::MaxDate(date))
    }

    pub fn min_lon(self, bound: f64) -> Self {
        self.with(Predicate::MinLon(bound))
    }

    pub fn max_lon(self, bound: f64) -> Self {
        self.with(Predicate::MaxLon(bound))
    }

    pub fn min_lat(self, bound: f64) -> Self {
        self.with(Predicate::MinLat(bound))
    }

    pub fn max_lat(self, bound: f64) -> Self {
        self.with(Predicate::MaxLat(bound))
    }

    /// Lower-inclusive, upper-exclusive longitude/latitude box.
    pub fn within(self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        self.min_lon(min_lon)
            .min_lat(min_lat)
            .max_lon(max_lon)
            .max_lat(max_lat)
    }

    pub fn storm_type(self, storm_type: StormType) -> Self {
        self.with(Predicate::StormType(storm_type))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether every predicate holds for `storm`.
    pub fn matches(&self, storm: &Storm) -> bool {
        self.predicates.iter().all(|p| p.matches(storm))
    }

    /// New collection holding the storms that satisfy every predicate.
    pub fn apply(&self, collection: &StormCollection) -> StormCollection {
        let kept = collection.select(|storm| self.matches(storm));
        log::debug!(
            "Filter kept {} of {} storms",
            kept.len(),
            collection.len()
        );
        kept
    }
}

/// Filter a collection; the input is left untouched.
pub fn filter(collection: &StormCollection, filter: &StormFilter) -> StormCollection {
    filter.apply(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use stormtrack_types::crs::Crs;
    use stormtrack_types::point::{StormPoint, TypeFlags};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, day).unwrap()
    }

    fn obs(id: &str, time: DateTime<Utc>, lon: f64, lat: f64, flags: TypeFlags) -> StormPoint {
        StormPoint::new(id, time, lon, lat, 20.0, flags)
    }

    fn hail() -> TypeFlags {
        TypeFlags {
            hailstorm: true,
            ..TypeFlags::default()
        }
    }

    fn sample() -> StormCollection {
        StormCollection::from_points(
            vec![
                // spans two days
                obs("A", at(10, 22), 7.0, 46.0, hail()),
                obs("A", at(11, 1), 7.5, 46.5, hail()),
                // hail only at one point
                obs("B", at(12, 12), 8.0, 47.0, hail()),
                obs("B", at(12, 13), 8.2, 47.1, TypeFlags::default()),
                // unclassified
                obs("C", at(15, 12), 9.0, 45.9, TypeFlags::default()),
            ],
            Crs::Wgs84,
        )
        .unwrap()
    }

    fn ids(collection: &StormCollection) -> Vec<&str> {
        collection.ids().collect()
    }

    #[test]
    fn test_min_date_uses_earliest_point() {
        let kept = StormFilter::new().min_date(date(11)).apply(&sample());
        assert_eq!(ids(&kept), vec!["B", "C"]);
        let kept = StormFilter::new().min_date(date(10)).apply(&sample());
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_max_date_is_exclusive() {
        let kept = StormFilter::new().max_date(date(12)).apply(&sample());
        assert_eq!(ids(&kept), vec!["A"]);
        let kept = StormFilter::new().max_date(date(11)).apply(&sample());
        assert!(kept.is_empty());
    }

    #[test]
    fn test_coordinate_bounds_are_asymmetric() {
        // A's westernmost point sits exactly on the lower bound: kept.
        let kept = StormFilter::new().min_lon(7.0).apply(&sample());
        assert_eq!(ids(&kept), vec!["A", "B", "C"]);

        // C's easternmost point sits exactly on the upper bound: dropped.
        let kept = StormFilter::new().max_lon(9.0).apply(&sample());
        assert_eq!(ids(&kept), vec!["A", "B"]);

        let kept = StormFilter::new().min_lat(46.0).max_lat(47.1).apply(&sample());
        assert_eq!(ids(&kept), vec!["A"]);
    }

    #[test]
    fn test_storm_type_requires_all_points() {
        let kept = StormFilter::new()
            .storm_type(StormType::Hailstorm)
            .apply(&sample());
        assert_eq!(ids(&kept), vec!["A"]);
    }

    #[test]
    fn test_other_type_requires_no_flags() {
        let kept = StormFilter::new().storm_type(StormType::Other).apply(&sample());
        assert_eq!(ids(&kept), vec!["C"]);
    }

    #[test]
    fn test_kept_storms_are_complete() {
        let kept = StormFilter::new().min_lon(7.9).apply(&sample());
        assert_eq!(kept.get("B").unwrap().len(), 2);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        assert_eq!(StormFilter::new().apply(&sample()), sample());
    }

    #[test]
    fn test_idempotent() {
        let filter = StormFilter::new().within(6.9, 45.0, 8.5, 48.0);
        let once = filter.apply(&sample());
        let twice = filter.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_independent() {
        let a = StormFilter::new()
            .min_date(date(11))
            .max_lat(47.05)
            .apply(&sample());
        let b = StormFilter::new()
            .max_lat(47.05)
            .min_date(date(11))
            .apply(&sample());
        assert_eq!(a, b);
        assert_eq!(ids(&a), vec!["C"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let storms = sample();
        let _ = filter(&storms, &StormFilter::new().max_lon(0.0));
        assert_eq!(storms, sample());
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(
            Predicate::parse("mindate", "2021-06-11").unwrap(),
            Predicate::MinDate(date(11))
        );
        assert_eq!(
            Predicate::parse("max_date", "2021-06-11T08:00:00").unwrap(),
            Predicate::MaxDate(date(11))
        );
        assert_eq!(
            Predicate::parse("min_lon", "5.9").unwrap(),
            Predicate::MinLon(5.9)
        );
        assert_eq!(
            Predicate::parse("storm_type", "SHS").unwrap(),
            Predicate::StormType(StormType::SevereHailstorm)
        );
    }

    #[test]
    fn test_parse_errors() {
        for (key, value) in [
            ("agg", "true"),
            ("storm_type", "tornado"),
            ("min_lon", "west"),
            ("max_lat", "inf"),
            ("min_date", "June"),
        ] {
            assert!(
                matches!(Predicate::parse(key, value), Err(StormError::InvalidFilter(_))),
                "{} = {}",
                key,
                value
            );
        }
    }
}
