//! # stormtrack-types
//!
//! Core storm observation and track types for the stormtrack crate.
//!
//! - **Observation types**: `StormPoint`, `TypeFlags`, `StormType`
//! - **Track types**: `Track`, `TrackGeometry`
//! - **Reference systems**: `Crs`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use stormtrack_types::point::{StormPoint, TypeFlags};
//! use chrono::{TimeZone, Utc};
//!
//! let time = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
//! let point = StormPoint::new("S1", time, 7.0, 46.0, 100.0, TypeFlags::default());
//! assert!(point.flags.is_other());
//! ```

pub mod crs;
pub mod point;
pub mod track;
