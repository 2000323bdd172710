//! World geometry constants, coordinate hygiene, and spherical distance.

use geo::{Point, Rect, coord};

use crate::error::{GeoTermError, Result};

/// Mean Earth radius in meters for haversine distance calculations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Equatorial circumference in meters, used by the precision tables.
pub const EARTH_EQUATOR_METERS: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_METERS;

pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// The full WGS84 lat/lon plane.
pub fn world_rect() -> Rect<f64> {
    Rect::new(
        coord! { x: MIN_LON, y: MIN_LAT },
        coord! { x: MAX_LON, y: MAX_LAT },
    )
}

/// Reduce a longitude into `[-180, 180)`. `180` wraps to `-180`.
pub fn normalize_lon(lon: f64) -> f64 {
    if (MIN_LON..MAX_LON).contains(&lon) {
        return lon;
    }
    let shifted = (lon - MIN_LON).rem_euclid(360.0);
    MIN_LON + shifted
}

/// Clamp a latitude into `[-90, 90]`.
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(MIN_LAT, MAX_LAT)
}

/// Validate that a point carries finite, in-range geographic coordinates.
pub fn validate_point(point: &Point<f64>) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() || !y.is_finite() {
        return Err(GeoTermError::InvalidShape(format!(
            "coordinates must be finite, got ({}, {})",
            x, y
        )));
    }

    if !(MIN_LON..=MAX_LON).contains(&x) {
        return Err(GeoTermError::InvalidShape(format!(
            "longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(MIN_LAT..=MAX_LAT).contains(&y) {
        return Err(GeoTermError::InvalidShape(format!(
            "latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Great-circle distance between two lon/lat points, in meters.
#[inline]
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Interval-arithmetic intersection test between two rectangles.
#[inline]
pub fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

/// `true` when `inner` lies entirely inside `outer` (boundaries included).
#[inline]
pub fn rect_within(inner: &Rect<f64>, outer: &Rect<f64>) -> bool {
    inner.min().x >= outer.min().x
        && inner.max().x <= outer.max().x
        && inner.min().y >= outer.min().y
        && inner.max().y <= outer.max().y
}

/// Area of the overlap of two rectangles, zero when disjoint.
pub fn rect_intersection_area(a: &Rect<f64>, b: &Rect<f64>) -> f64 {
    let w = (a.max().x.min(b.max().x) - a.min().x.max(b.min().x)).max(0.0);
    let h = (a.max().y.min(b.max().y) - a.min().y.max(b.min().y)).max(0.0);
    w * h
}
