//! Two-phase acceptors over Morton-coded point terms.
//!
//! The index stores point fields as Morton codes, so a spatial predicate
//! becomes: seek the enumerator into the code range of the query's
//! bounding box (Z-order keeps every contained point inside the corner
//! range), test candidate cells cheaply, then refine each surviving term
//! by decoding it back to a point. The cell tests are exposed for
//! enumerators that walk cell prefixes; [`FilteredTermIter`] drives the
//! range seek and point refinement over any sorted term iterator.

use geo::{Point, Rect, coord};

use crate::bits::{morton_decode_lat, morton_decode_lon, morton_encode};
use crate::error::Result;
use crate::geom::{self, haversine_distance};
use crate::relate::{QueryShape, circle_bbox, rect_crosses_circle, rect_within_circle};

/// The acceptor contract a spatial predicate exposes to the enumerator.
pub trait TermFilter {
    /// Phase 1: the inclusive Morton range to seek into.
    fn term_range(&self) -> (u64, u64);

    /// Phase 2: the cell lies entirely inside the predicate.
    fn cell_within(&self, rect: &Rect<f64>) -> bool;

    /// Phase 2: the cell touches the predicate at all.
    fn cell_crosses(&self, rect: &Rect<f64>) -> bool;

    /// Phase 3: exact membership for a decoded point.
    fn accept_point(&self, lon: f64, lat: f64) -> bool;
}

/// Morton-encode a range corner, keeping the top edges (`lon = 180`,
/// `lat = 90`) in their last buckets instead of wrapping.
fn morton_corner(lon: f64, lat: f64) -> u64 {
    morton_encode(lon.min(geom::MAX_LON - 1e-9), lat.min(geom::MAX_LAT - 1e-9))
}

/// Bounding-box predicate: pure interval tests.
#[derive(Debug, Clone)]
pub struct BBoxTermFilter {
    rect: Rect<f64>,
}

impl BBoxTermFilter {
    pub fn new(rect: Rect<f64>) -> Result<Self> {
        // Reuse the shape validation.
        QueryShape::rect(rect)?;
        Ok(BBoxTermFilter { rect })
    }

    pub fn rect(&self) -> &Rect<f64> {
        &self.rect
    }
}

impl TermFilter for BBoxTermFilter {
    fn term_range(&self) -> (u64, u64) {
        (
            morton_corner(self.rect.min().x, self.rect.min().y),
            morton_corner(self.rect.max().x, self.rect.max().y),
        )
    }

    fn cell_within(&self, rect: &Rect<f64>) -> bool {
        geom::rect_within(rect, &self.rect)
    }

    fn cell_crosses(&self, rect: &Rect<f64>) -> bool {
        geom::rects_intersect(rect, &self.rect)
    }

    fn accept_point(&self, lon: f64, lat: f64) -> bool {
        self.rect.min().x <= lon
            && lon <= self.rect.max().x
            && self.rect.min().y <= lat
            && lat <= self.rect.max().y
    }
}

/// Distance predicate: bbox range seek, corner-distance cell tests, and a
/// haversine refinement.
#[derive(Debug, Clone)]
pub struct DistanceTermFilter {
    center: Point<f64>,
    radius: f64,
    bbox: Rect<f64>,
}

impl DistanceTermFilter {
    fn new(center: Point<f64>, radius: f64, bbox: Rect<f64>) -> Self {
        DistanceTermFilter { center, radius, bbox }
    }

    pub fn center(&self) -> Point<f64> {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn bbox(&self) -> &Rect<f64> {
        &self.bbox
    }
}

impl TermFilter for DistanceTermFilter {
    fn term_range(&self) -> (u64, u64) {
        (
            morton_corner(self.bbox.min().x, self.bbox.min().y),
            morton_corner(self.bbox.max().x, self.bbox.max().y),
        )
    }

    fn cell_within(&self, rect: &Rect<f64>) -> bool {
        rect_within_circle(rect, &self.center, self.radius)
    }

    fn cell_crosses(&self, rect: &Rect<f64>) -> bool {
        rect_crosses_circle(rect, &self.center, self.radius)
    }

    fn accept_point(&self, lon: f64, lat: f64) -> bool {
        // The bbox bound keeps the two halves of a dateline split
        // disjoint; haversine alone wraps around the antimeridian and
        // would accept a near point through both enumerations.
        self.bbox.min().x <= lon
            && lon <= self.bbox.max().x
            && self.bbox.min().y <= lat
            && lat <= self.bbox.max().y
            && haversine_distance(self.center.x(), self.center.y(), lon, lat) <= self.radius
    }
}

/// Build the distance filters for a centre and radius in meters.
///
/// A bounding box that crosses the antimeridian splits into two filters,
/// OR-combined by the caller: one ending at `lon = 180`, one starting at
/// `lon = -180`.
///
/// # Examples
///
/// ```rust
/// use geo::Point;
/// use geoterm::distance_filters;
///
/// // 200 miles around a point near the antimeridian.
/// let filters = distance_filters(Point::new(179.0, 0.0), 321_869.0).unwrap();
/// assert_eq!(filters.len(), 2);
/// assert_eq!(filters[0].bbox().max().x, 180.0);
/// assert_eq!(filters[1].bbox().min().x, -180.0);
/// ```
pub fn distance_filters(center: Point<f64>, radius: f64) -> Result<Vec<DistanceTermFilter>> {
    // Validates centre and radius.
    QueryShape::circle(center, radius)?;
    let bbox = circle_bbox(&center, radius);
    let (min_lon, max_lon) = (bbox.min().x, bbox.max().x);

    // A radius wide enough to lap the globe needs no split.
    if max_lon - min_lon >= 360.0 {
        let whole = Rect::new(
            coord! { x: geom::MIN_LON, y: bbox.min().y },
            coord! { x: geom::MAX_LON, y: bbox.max().y },
        );
        return Ok(vec![DistanceTermFilter::new(center, radius, whole)]);
    }

    if min_lon < geom::MIN_LON {
        log::debug!("distance query at ({}, {}) splits across the antimeridian", center.x(), center.y());
        let eastern = Rect::new(
            coord! { x: min_lon + 360.0, y: bbox.min().y },
            coord! { x: geom::MAX_LON, y: bbox.max().y },
        );
        let western = Rect::new(
            coord! { x: geom::MIN_LON, y: bbox.min().y },
            coord! { x: max_lon, y: bbox.max().y },
        );
        return Ok(vec![
            DistanceTermFilter::new(center, radius, eastern),
            DistanceTermFilter::new(center, radius, western),
        ]);
    }

    if max_lon > geom::MAX_LON {
        log::debug!("distance query at ({}, {}) splits across the antimeridian", center.x(), center.y());
        let eastern = Rect::new(
            coord! { x: min_lon, y: bbox.min().y },
            coord! { x: geom::MAX_LON, y: bbox.max().y },
        );
        let western = Rect::new(
            coord! { x: geom::MIN_LON, y: bbox.min().y },
            coord! { x: max_lon - 360.0, y: bbox.max().y },
        );
        return Ok(vec![
            DistanceTermFilter::new(center, radius, eastern),
            DistanceTermFilter::new(center, radius, western),
        ]);
    }

    Ok(vec![DistanceTermFilter::new(center, radius, bbox)])
}

/// Applies a [`TermFilter`] to a sorted stream of Morton terms: seeks past
/// the range start, stops at the range end, and point-refines the rest.
pub struct FilteredTermIter<I, F> {
    terms: I,
    filter: F,
    min_term: u64,
    max_term: u64,
}

impl<I, F> FilteredTermIter<I, F>
where
    I: Iterator<Item = u64>,
    F: TermFilter,
{
    pub fn new(terms: I, filter: F) -> Self {
        let (min_term, max_term) = filter.term_range();
        FilteredTermIter {
            terms,
            filter,
            min_term,
            max_term,
        }
    }
}

impl<I, F> Iterator for FilteredTermIter<I, F>
where
    I: Iterator<Item = u64>,
    F: TermFilter,
{
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let term = self.terms.next()?;
            if term < self.min_term {
                continue;
            }
            if term > self.max_term {
                // Sorted input: nothing further can match.
                return None;
            }
            let lon = morton_decode_lon(term);
            let lat = morton_decode_lat(term);
            if self.filter.accept_point(lon, lat) {
                return Some(term);
            }
        }
    }
}
