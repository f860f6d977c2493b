//! Query and aggregation over storm collections.
//!
//! Everything here is a pure function of its inputs:
//! - `validation`: observation checks applied on load
//! - `filter`: storm-level date, extent and type predicates
//! - `nearest`: area-normalized nearest-storm matching
//! - `track`: per-storm track geometries and GeoJSON exchange
//! - `stats`: durations, areas, lengths and type counts
//! - `temporal`: forecast initialisation scheduling

pub mod filter;
pub mod nearest;
pub mod stats;
pub mod temporal;
pub mod track;
pub mod validation;
