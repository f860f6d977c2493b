//! Time-based planning over storm collections.
//!
//! - `schedule`: forecast initialisation times needed to cover every storm
//!   hour at a set of lead times

pub mod schedule;

pub use schedule::ForecastSchedule;
