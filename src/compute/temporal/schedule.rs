//! Forecast initialisation schedule.
//!
//! A forecast run started at `init` with lead time `L` is valid at
//! `init + L`. To have a forecast valid at every hour a storm was observed,
//! each storm hour `h` requires a run at `h - L` for every lead time `L`.

use crate::collection::StormCollection;
use crate::error::{Result, StormError};
use crate::index::floor_hour;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const INIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Required initialisation times and the lead times each one serves.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSchedule {
    lead_times: Vec<Duration>,
    rows: BTreeMap<DateTime<Utc>, Vec<bool>>,
}

impl ForecastSchedule {
    /// Compute the schedule for `collection`.
    ///
    /// Lead times must be non-negative and distinct; their order fixes the
    /// column order of every row.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stormtrack::{Crs, StormCollection, StormPoint, TypeFlags};
    /// use stormtrack::compute::temporal::ForecastSchedule;
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 40, 0).unwrap();
    /// let storms = StormCollection::from_points(
    ///     vec![StormPoint::new("S1", t, 7.0, 46.0, 10.0, TypeFlags::default())],
    ///     Crs::Wgs84,
    /// ).unwrap();
    ///
    /// let schedule = ForecastSchedule::build(&storms, &[Duration::hours(6)]).unwrap();
    /// let first = schedule.init_times().next().unwrap();
    /// assert_eq!(first, Utc.with_ymd_and_hms(2021, 6, 28, 6, 0, 0).unwrap());
    /// ```
    pub fn build(collection: &StormCollection, lead_times: &[Duration]) -> Result<Self> {
        if let Some(negative) = lead_times.iter().find(|l| **l < Duration::zero()) {
            return Err(StormError::InvalidInput(format!(
                "Lead times must be non-negative, got {} minutes",
                negative.num_minutes()
            )));
        }
        let distinct: BTreeSet<_> = lead_times.iter().collect();
        if distinct.len() != lead_times.len() {
            return Err(StormError::InvalidInput(
                "Lead times must be distinct".to_string(),
            ));
        }

        let storm_hours: BTreeSet<DateTime<Utc>> =
            collection.points().map(|p| floor_hour(p.timestamp)).collect();

        let mut rows: BTreeMap<DateTime<Utc>, Vec<bool>> = BTreeMap::new();
        for (column, lead_time) in lead_times.iter().enumerate() {
            for hour in &storm_hours {
                let init = hour.checked_sub_signed(*lead_time).ok_or_else(|| {
                    StormError::InvalidInput(format!(
                        "Lead time of {} minutes before {} is out of range",
                        lead_time.num_minutes(),
                        hour
                    ))
                })?;
                rows.entry(init)
                    .or_insert_with(|| vec![false; lead_times.len()])[column] = true;
            }
        }

        log::debug!(
            "Forecast schedule: {} storm hours, {} lead times, {} init times",
            storm_hours.len(),
            lead_times.len(),
            rows.len()
        );

        Ok(Self {
            lead_times: lead_times.to_vec(),
            rows,
        })
    }

    pub fn lead_times(&self) -> &[Duration] {
        &self.lead_times
    }

    /// Initialisation times in ascending order.
    pub fn init_times(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.rows.keys().copied()
    }

    /// One flag per lead time for `init`, or `None` if no run is needed then.
    pub fn row(&self, init: DateTime<Utc>) -> Option<&[bool]> {
        self.rows.get(&init).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &BTreeMap<DateTime<Utc>, Vec<bool>> {
        &self.rows
    }

    /// Whether a run at `init` is needed for `lead_time`.
    pub fn is_required(&self, init: DateTime<Utc>, lead_time: Duration) -> bool {
        let Some(column) = self.lead_times.iter().position(|l| *l == lead_time) else {
            return false;
        };
        self.row(init).is_some_and(|flags| flags[column])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the init times, one per line, without a header.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for init in self.init_times() {
            writer.write_record([init.format(INIT_TIME_FORMAT).to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.write_csv(BufWriter::new(File::create(path)?))?;
        log::debug!("Saved {} init times to {}", self.len(), path.display());
        Ok(())
    }
}
