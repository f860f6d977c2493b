//! Descriptive statistics over storm collections.

use crate::collection::StormCollection;
use crate::compute::filter::StormFilter;
use crate::config::Config;
use crate::compute::track::track_length_km;
use crate::error::{Result, StormError};
use crate::projection::Projector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stormtrack_types::crs::Crs;
use stormtrack_types::point::StormType;
use stormtrack_types::track::Track;

/// Swiss radar extent as (min_lon, min_lat, max_lon, max_lat).
pub const SWISS_EXTENT: (f64, f64, f64, f64) = (5.57, 45.49, 10.29, 47.48);
/// Extended domain the clipping boxes grow towards.
pub const EXTENDED_EXTENT: (f64, f64, f64, f64) = (3.60, 44.17, 12.13, 49.12);

/// Lifetime of each storm in hours.
pub fn durations_hours(collection: &StormCollection) -> BTreeMap<String, f64> {
    collection
        .iter()
        .map(|(id, storm)| (id.clone(), storm.duration().num_seconds() as f64 / 3600.0))
        .collect()
}

/// Largest observed area of each storm in km².
pub fn max_areas(collection: &StormCollection) -> BTreeMap<String, f64> {
    collection
        .iter()
        .map(|(id, storm)| (id.clone(), storm.max_area()))
        .collect()
}

/// Length of each track in kilometres, measured in `planar_crs`.
pub fn track_lengths_km(
    tracks: &BTreeMap<String, Track>,
    projector: &dyn Projector,
    planar_crs: Crs,
) -> Result<BTreeMap<String, f64>> {
    let mut lengths = BTreeMap::new();
    for (id, track) in tracks {
        lengths.insert(id.clone(), track_length_km(track, projector, planar_crs)?);
    }
    Ok(lengths)
}

/// Track lengths measured in `config.track_length_crs`.
pub fn track_lengths_km_with_config(
    tracks: &BTreeMap<String, Track>,
    projector: &dyn Projector,
    config: &Config,
) -> Result<BTreeMap<String, f64>> {
    track_lengths_km(tracks, projector, config.track_length_crs)
}

/// Number of storms of each type.
///
/// A storm counts towards a type only when every one of its observations
/// carries that type, so the per-type counts need not add up to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StormCounts {
    pub rainstorm: usize,
    pub severe_rainstorm: usize,
    pub hailstorm: usize,
    pub severe_hailstorm: usize,
    pub supercell: usize,
    pub other: usize,
    pub total: usize,
}

impl StormCounts {
    pub fn of(collection: &StormCollection) -> Self {
        let mut counts = Self {
            total: collection.len(),
            ..Self::default()
        };

        for storm in collection.storms() {
            for storm_type in StormType::ALL {
                if storm.points().iter().all(|p| p.flags.has(storm_type)) {
                    *counts.slot(storm_type) += 1;
                }
            }
        }
        counts
    }

    fn slot(&mut self, storm_type: StormType) -> &mut usize {
        match storm_type {
            StormType::Rainstorm => &mut self.rainstorm,
            StormType::SevereRainstorm => &mut self.severe_rainstorm,
            StormType::Hailstorm => &mut self.hailstorm,
            StormType::SevereHailstorm => &mut self.severe_hailstorm,
            StormType::Supercell => &mut self.supercell,
            StormType::Other => &mut self.other,
        }
    }

    pub fn get(&self, storm_type: StormType) -> usize {
        match storm_type {
            StormType::Rainstorm => self.rainstorm,
            StormType::SevereRainstorm => self.severe_rainstorm,
            StormType::Hailstorm => self.hailstorm,
            StormType::SevereHailstorm => self.severe_hailstorm,
            StormType::Supercell => self.supercell,
            StormType::Other => self.other,
        }
    }
}

/// Storm counts inside one clipping box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippingRow {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    pub counts: StormCounts,
}

fn lerp(from: f64, to: f64, step: usize, steps: usize) -> f64 {
    if steps == 1 {
        return from;
    }
    from + (to - from) * step as f64 / (steps - 1) as f64
}

/// Count storms under `steps` boxes growing linearly from the Swiss extent
/// to the extended extent.
///
/// Storms are kept by the same rule as [`StormFilter::within`]: every
/// observation inside the box, lower bounds inclusive.
pub fn clipping_counts(collection: &StormCollection, steps: usize) -> Result<Vec<ClippingRow>> {
    if steps == 0 {
        return Err(StormError::InvalidInput(
            "Clipping needs at least one step".to_string(),
        ));
    }
    if !collection.crs().is_geographic() {
        return Err(StormError::InvalidInput(format!(
            "Clipping boxes are in degrees, collection is in {}",
            collection.crs()
        )));
    }

    let (s_min_lon, s_min_lat, s_max_lon, s_max_lat) = SWISS_EXTENT;
    let (e_min_lon, e_min_lat, e_max_lon, e_max_lat) = EXTENDED_EXTENT;

    let rows = (0..steps)
        .map(|step| {
            let min_lon = lerp(s_min_lon, e_min_lon, step, steps);
            let min_lat = lerp(s_min_lat, e_min_lat, step, steps);
            let max_lon = lerp(s_max_lon, e_max_lon, step, steps);
            let max_lat = lerp(s_max_lat, e_max_lat, step, steps);

            let clipped = StormFilter::new()
                .within(min_lon, min_lat, max_lon, max_lat)
                .apply(collection);

            ClippingRow {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
                counts: StormCounts::of(&clipped),
            }
        })
        .collect();
    Ok(rows)
}

/// Quantile `q` in `[0, 1]` with linear interpolation between closest ranks.
///
/// NaN values are ignored. Returns `None` for an empty input or an invalid
/// `q`.
///
/// # Examples
///
/// ```rust
/// use stormtrack::compute::stats::quantile;
///
/// assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5), Some(2.5));
/// assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.75), Some(4.0));
/// assert_eq!(quantile(&[], 0.5), None);
/// ```
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
