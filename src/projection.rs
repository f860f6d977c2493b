//! Coordinate reprojection between WGS84 and the Swiss planar grids.
//!
//! The matcher only needs locally accurate metric distances over
//! Switzerland, so the built-in projector uses the swisstopo approximate
//! formulas (accuracy on the order of one metre). Callers needing other
//! reference systems plug in their own `Projector`.

use crate::error::{Result, StormError};
use geo::Point;
use stormtrack_types::crs::Crs;

/// Offset between the LV95 and LV03 easting.
const LV95_EASTING_OFFSET: f64 = 2_000_000.0;
/// Offset between the LV95 and LV03 northing.
const LV95_NORTHING_OFFSET: f64 = 1_000_000.0;

/// Transforms points between coordinate reference systems.
///
/// Points are always `x = longitude/easting`, `y = latitude/northing`.
pub trait Projector: Send + Sync {
    fn project(&self, point: Point, from: Crs, to: Crs) -> Result<Point>;

    /// Project a slice of points, preserving order.
    fn project_all(&self, points: &[Point], from: Crs, to: Crs) -> Result<Vec<Point>> {
        let mut projected = Vec::with_capacity(points.len());
        for point in points {
            projected.push(self.project(*point, from, to)?);
        }
        Ok(projected)
    }
}

/// Projector covering WGS84, LV03 and LV95.
///
/// # Examples
///
/// ```rust
/// use stormtrack::{Crs, Point, Projector, SwissProjector};
///
/// let bern = Point::new(7.438632, 46.951083);
/// let lv03 = SwissProjector.project(bern, Crs::Wgs84, Crs::Lv03).unwrap();
/// assert!((lv03.x() - 600_000.0).abs() < 5.0);
/// assert!((lv03.y() - 200_000.0).abs() < 5.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SwissProjector;

impl Projector for SwissProjector {
    fn project(&self, point: Point, from: Crs, to: Crs) -> Result<Point> {
        if !point.x().is_finite() || !point.y().is_finite() {
            return Err(StormError::Projection(format!(
                "Cannot project non-finite coordinates ({}, {})",
                point.x(),
                point.y()
            )));
        }

        if from == to {
            return Ok(point);
        }

        let wgs84 = match from {
            Crs::Wgs84 => point,
            Crs::Lv03 => lv03_to_wgs84(point),
            Crs::Lv95 => lv03_to_wgs84(lv95_to_lv03(point)),
        };

        Ok(match to {
            Crs::Wgs84 => wgs84,
            Crs::Lv03 => wgs84_to_lv03(wgs84),
            Crs::Lv95 => lv03_to_lv95(wgs84_to_lv03(wgs84)),
        })
    }
}

/// Projector that returns its input unchanged.
///
/// Useful when storms and stations are already expressed in the working CRS.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjector;

impl Projector for IdentityProjector {
    fn project(&self, point: Point, _from: Crs, _to: Crs) -> Result<Point> {
        Ok(point)
    }
}

fn wgs84_to_lv03(point: Point) -> Point {
    // Auxiliary values in units of 10000 arc seconds relative to Bern.
    let phi = (point.y() * 3600.0 - 169_028.66) / 10_000.0;
    let lambda = (point.x() * 3600.0 - 26_782.5) / 10_000.0;

    let easting = 600_072.37 + 211_455.93 * lambda
        - 10_938.51 * lambda * phi
        - 0.36 * lambda * phi.powi(2)
        - 44.54 * lambda.powi(3);

    let northing = 200_147.07 + 308_807.95 * phi + 3_745.25 * lambda.powi(2) + 76.63 * phi.powi(2)
        - 194.56 * lambda.powi(2) * phi
        + 119.79 * phi.powi(3);

    Point::new(easting, northing)
}

fn lv03_to_wgs84(point: Point) -> Point {
    let y = (point.x() - 600_000.0) / 1_000_000.0;
    let x = (point.y() - 200_000.0) / 1_000_000.0;

    let lambda = 2.677_909_4 + 4.728_982 * y + 0.791_484 * y * x + 0.130_6 * y * x.powi(2)
        - 0.043_6 * y.powi(3);

    let phi = 16.902_389_2 + 3.238_272 * x
        - 0.270_978 * y.powi(2)
        - 0.002_528 * x.powi(2)
        - 0.044_7 * y.powi(2) * x
        - 0.014_0 * x.powi(3);

    // Results are in units of 10000 arc seconds.
    Point::new(lambda * 100.0 / 36.0, phi * 100.0 / 36.0)
}

fn lv03_to_lv95(point: Point) -> Point {
    Point::new(
        point.x() + LV95_EASTING_OFFSET,
        point.y() + LV95_NORTHING_OFFSET,
    )
}

fn lv95_to_lv03(point: Point) -> Point {
    Point::new(
        point.x() - LV95_EASTING_OFFSET,
        point.y() - LV95_NORTHING_OFFSET,
    )
}
