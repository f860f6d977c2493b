//! Severe-storm tracks: loading, filtering, indexing and nearest-storm
//! matching for point observations such as weather stations.
//!
//! ```rust
//! use stormtrack::{nearest, Crs, Point, StormCollection, StormPoint, TemporalIndex, TypeFlags};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let t = Utc.with_ymd_and_hms(2021, 6, 28, 12, 0, 0).unwrap();
//! let storms = StormCollection::from_points(vec![
//!     StormPoint::new("S1", t, 7.0, 46.0, 100.0, TypeFlags::default()),
//!     StormPoint::new("S1", t + Duration::minutes(30), 7.01, 46.01, 100.0, TypeFlags::default()),
//! ], Crs::Wgs84)?;
//! let index = TemporalIndex::build(&storms);
//!
//! let station = Point::new(7.0, 46.0);
//! let result = nearest(&storms, &index, &[station], t + Duration::minutes(30), Crs::Wgs84)?;
//! assert_eq!(result.ids[0].as_deref(), Some("S1"));
//! # Ok::<(), stormtrack::StormError>(())
//! ```

pub mod batch;
pub mod builder;
pub mod collection;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod projection;
pub mod storage;

pub use builder::StormLoader;
pub use collection::{Storm, StormCollection};
pub use config::Config;
pub use error::{Result, StormError};
pub use index::TemporalIndex;
pub use projection::{IdentityProjector, Projector, SwissProjector};
pub use storage::StormFormat;

pub use geo::{LineString, Point, Rect};

pub use stormtrack_types::crs::Crs;
pub use stormtrack_types::point::{StormPoint, StormType, TypeFlags};
pub use stormtrack_types::track::{Track, TrackGeometry};

pub use compute::filter::{Predicate, StormFilter, filter};
pub use compute::nearest::{MatchRow, NearestMatch, NearestStormMatcher, nearest};
pub use compute::track::{build_track, build_tracks, track_length_km};

#[cfg(feature = "geojson")]
pub use compute::track::{load_tracks, save_tracks, tracks_from_geojson, tracks_to_geojson};

pub use batch::BatchMatcher;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, Result, StormError, StormFormat, StormLoader};

    pub use crate::{Crs, Storm, StormCollection, StormPoint, StormType, TypeFlags};

    pub use crate::{NearestMatch, NearestStormMatcher, StormFilter, TemporalIndex, nearest};

    pub use crate::{Projector, SwissProjector};

    pub use crate::{Track, build_tracks};

    pub use geo::Point;

    pub use chrono::{DateTime, Duration, Utc};
}
