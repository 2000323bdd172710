//! Shape-to-rectangle relation: the narrow seam between the prefix trees
//! and whatever planar-geometry engine surrounds them.
//!
//! The iterators only ever ask one question: how does this cell rectangle
//! relate to the query shape? [`ShapeRelationOracle`] is that question as
//! a trait; [`QueryShape`] answers it for the `geo` geometries this crate
//! works with natively.

use geo::{BoundingRect, Point, Polygon, Rect, Relate, Validation, coord};

use crate::cell::Relation;
use crate::error::{GeoTermError, Result};
use crate::geom::{self, haversine_distance};

/// Computes the relation of a cell rectangle to the query shape.
///
/// `Relation::Within` means the rectangle is entirely inside the shape;
/// `Relation::Contains` means the rectangle contains the whole shape.
/// An oracle that cannot relate (its geometry library rejects the shape)
/// returns `InvalidShape`, which aborts iteration.
pub trait ShapeRelationOracle {
    fn relate(&self, rect: &Rect<f64>) -> Result<Relation>;
}

/// A validated query shape with a built-in relation oracle.
#[derive(Debug, Clone)]
pub enum QueryShape {
    Rect(Rect<f64>),
    Polygon(Polygon<f64>),
    /// A great-circle disc: centre plus radius in meters.
    Circle { center: Point<f64>, radius: f64 },
}

impl QueryShape {
    /// A rectangle query. Corners must be finite and in range.
    pub fn rect(rect: Rect<f64>) -> Result<Self> {
        geom::validate_point(&Point::from(rect.min()))?;
        geom::validate_point(&Point::from(rect.max()))?;
        Ok(QueryShape::Rect(rect))
    }

    /// A polygon query. Coordinates must be in range and the ring
    /// structure valid under the geometry library's rules.
    pub fn polygon(polygon: Polygon<f64>) -> Result<Self> {
        for coord in polygon
            .exterior()
            .coords()
            .chain(polygon.interiors().iter().flat_map(|r| r.coords()))
        {
            geom::validate_point(&Point::from(*coord))?;
        }
        if !polygon.is_valid() {
            return Err(GeoTermError::InvalidShape(
                "polygon fails ring validity rules (self-intersection or open ring)".into(),
            ));
        }
        Ok(QueryShape::Polygon(polygon))
    }

    /// A distance query disc.
    pub fn circle(center: Point<f64>, radius: f64) -> Result<Self> {
        geom::validate_point(&center)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeoTermError::InvalidShape(format!(
                "circle radius must be finite and non-negative, got {}",
                radius
            )));
        }
        Ok(QueryShape::Circle { center, radius })
    }

    /// A bounding rectangle for detail-level calculations. Degenerate
    /// shapes fall back to a point-sized rectangle.
    pub fn bounding_rect(&self) -> Rect<f64> {
        match self {
            QueryShape::Rect(rect) => *rect,
            QueryShape::Polygon(polygon) => polygon
                .bounding_rect()
                .unwrap_or_else(|| Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 })),
            QueryShape::Circle { center, radius } => circle_bbox(center, *radius),
        }
    }
}

impl ShapeRelationOracle for QueryShape {
    fn relate(&self, rect: &Rect<f64>) -> Result<Relation> {
        Ok(match self {
            QueryShape::Rect(query) => relate_rects(rect, query),
            QueryShape::Polygon(query) => relate_polygon(rect, query),
            QueryShape::Circle { center, radius } => relate_circle(rect, center, *radius),
        })
    }
}

/// Relation of `rect` to a query rectangle, by interval arithmetic.
fn relate_rects(rect: &Rect<f64>, query: &Rect<f64>) -> Relation {
    if !geom::rects_intersect(rect, query) {
        Relation::Disjoint
    } else if geom::rect_within(rect, query) {
        Relation::Within
    } else if geom::rect_within(query, rect) {
        Relation::Contains
    } else {
        Relation::Intersects
    }
}

/// Relation of `rect` to a polygon, via the DE-9IM matrix.
fn relate_polygon(rect: &Rect<f64>, query: &Polygon<f64>) -> Relation {
    let cell = rect.to_polygon();
    let matrix = cell.relate(query);
    if !matrix.is_intersects() {
        Relation::Disjoint
    } else if matrix.is_within() {
        Relation::Within
    } else if matrix.is_contains() {
        Relation::Contains
    } else {
        Relation::Intersects
    }
}

/// Relation of `rect` to a distance-query disc, by corner distances.
fn relate_circle(rect: &Rect<f64>, center: &Point<f64>, radius: f64) -> Relation {
    if rect_within_circle(rect, center, radius) {
        Relation::Within
    } else if !rect_crosses_circle(rect, center, radius) {
        Relation::Disjoint
    } else if geom::rect_within(&circle_bbox(center, radius), rect) {
        Relation::Contains
    } else {
        Relation::Intersects
    }
}

/// `true` when every corner of `rect` lies within `radius` of `center`.
/// For a convex disc this puts the whole rectangle inside it.
pub fn rect_within_circle(rect: &Rect<f64>, center: &Point<f64>, radius: f64) -> bool {
    let corners = [
        (rect.min().x, rect.min().y),
        (rect.min().x, rect.max().y),
        (rect.max().x, rect.min().y),
        (rect.max().x, rect.max().y),
    ];
    corners
        .iter()
        .all(|&(lon, lat)| haversine_distance(center.x(), center.y(), lon, lat) <= radius)
}

/// `true` when the disc reaches `rect` at all: the distance from `center`
/// to the nearest point of the rectangle is within `radius`.
pub fn rect_crosses_circle(rect: &Rect<f64>, center: &Point<f64>, radius: f64) -> bool {
    let nearest_lon = center.x().clamp(rect.min().x, rect.max().x);
    let nearest_lat = center.y().clamp(rect.min().y, rect.max().y);
    haversine_distance(center.x(), center.y(), nearest_lon, nearest_lat) <= radius
}

/// The lat/lon bounding box of a disc, clamped to the world. The
/// longitude span may extend past ±180; callers that iterate terms split
/// it at the antimeridian first.
pub fn circle_bbox(center: &Point<f64>, radius: f64) -> Rect<f64> {
    // One degree of latitude is ~111.2 km; longitude shrinks by cos(lat).
    let meters_per_degree = geom::EARTH_EQUATOR_METERS / 360.0;
    let lat_delta = radius / meters_per_degree;
    let cos_lat = center.y().to_radians().cos().max(1e-9);
    let lon_delta = radius / (meters_per_degree * cos_lat);

    Rect::new(
        coord! {
            x: center.x() - lon_delta,
            y: geom::clamp_lat(center.y() - lat_delta),
        },
        coord! {
            x: center.x() + lon_delta,
            y: geom::clamp_lat(center.y() + lat_delta),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Rect<f64> {
        Rect::new(coord! { x: min_lon, y: min_lat }, coord! { x: max_lon, y: max_lat })
    }

    #[test]
    fn test_relate_rects() {
        let query = QueryShape::rect(rect(-10.0, -10.0, 10.0, 10.0)).unwrap();
        assert_eq!(query.relate(&rect(-5.0, -5.0, 5.0, 5.0)).unwrap(), Relation::Within);
        assert_eq!(query.relate(&rect(-90.0, -45.0, 90.0, 45.0)).unwrap(), Relation::Contains);
        assert_eq!(query.relate(&rect(5.0, 5.0, 20.0, 20.0)).unwrap(), Relation::Intersects);
        assert_eq!(query.relate(&rect(50.0, 50.0, 60.0, 60.0)).unwrap(), Relation::Disjoint);
        // The query rectangle relates to itself as Within (leaf behaviour).
        assert_eq!(query.relate(&rect(-10.0, -10.0, 10.0, 10.0)).unwrap(), Relation::Within);
    }

    #[test]
    fn test_relate_polygon() {
        let poly: Polygon<f64> = polygon![
            (x: -10.0, y: -10.0),
            (x: 10.0, y: -10.0),
            (x: 10.0, y: 10.0),
            (x: -10.0, y: 10.0),
            (x: -10.0, y: -10.0),
        ];
        let query = QueryShape::polygon(poly).unwrap();
        assert_eq!(query.relate(&rect(-5.0, -5.0, 5.0, 5.0)).unwrap(), Relation::Within);
        assert_eq!(query.relate(&rect(-90.0, -45.0, 90.0, 45.0)).unwrap(), Relation::Contains);
        assert_eq!(query.relate(&rect(5.0, 5.0, 20.0, 20.0)).unwrap(), Relation::Intersects);
        assert_eq!(query.relate(&rect(50.0, 50.0, 60.0, 60.0)).unwrap(), Relation::Disjoint);
    }

    #[test]
    fn test_invalid_polygon_rejected() {
        // A bowtie self-intersects.
        let bowtie: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 10.0, y: 0.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ];
        assert!(matches!(
            QueryShape::polygon(bowtie),
            Err(GeoTermError::InvalidShape(_))
        ));

        // Out-of-range coordinates are rejected before validity checks.
        let off_world: Polygon<f64> = polygon![
            (x: 170.0, y: 0.0),
            (x: 200.0, y: 0.0),
            (x: 200.0, y: 10.0),
            (x: 170.0, y: 0.0),
        ];
        assert!(QueryShape::polygon(off_world).is_err());
    }

    #[test]
    fn test_relate_circle() {
        // 500 km around Paris.
        let center = Point::new(2.3522, 48.8566);
        let query = QueryShape::circle(center, 500_000.0).unwrap();

        // A small cell at the centre is within the disc.
        assert_eq!(
            query.relate(&rect(2.0, 48.5, 2.7, 49.0)).unwrap(),
            Relation::Within
        );
        // A cell covering the whole disc swallows it.
        assert_eq!(
            query.relate(&rect(-90.0, 0.0, 90.0, 90.0)).unwrap(),
            Relation::Contains
        );
        // A cell clipping the disc's west side only intersects.
        assert_eq!(
            query.relate(&rect(0.0, 0.0, 90.0, 90.0)).unwrap(),
            Relation::Intersects
        );
        // A cell at the rim crosses it.
        assert_eq!(
            query.relate(&rect(6.0, 48.0, 12.0, 52.0)).unwrap(),
            Relation::Intersects
        );
        // Another continent is disjoint.
        assert_eq!(
            query.relate(&rect(-80.0, 30.0, -70.0, 45.0)).unwrap(),
            Relation::Disjoint
        );
    }

    #[test]
    fn test_circle_validation() {
        assert!(QueryShape::circle(Point::new(0.0, 0.0), -1.0).is_err());
        assert!(QueryShape::circle(Point::new(0.0, 0.0), f64::NAN).is_err());
        assert!(QueryShape::circle(Point::new(190.0, 0.0), 10.0).is_err());
    }

    #[test]
    fn test_circle_bbox_spans() {
        let center = Point::new(179.0, 0.0);
        let bbox = circle_bbox(&center, 321_869.0); // ~200 miles
        // The box overflows the antimeridian; the split happens downstream.
        assert!(bbox.max().x > 180.0);
        assert!(bbox.min().x < 180.0);
        assert!((bbox.max().y - -bbox.min().y).abs() < 1e-9);
    }

    #[test]
    fn test_corner_distance_helpers() {
        let center = Point::new(0.0, 0.0);
        let near = rect(-0.5, -0.5, 0.5, 0.5);
        let far = rect(10.0, 10.0, 11.0, 11.0);
        assert!(rect_within_circle(&near, &center, 200_000.0));
        assert!(!rect_within_circle(&near, &center, 10_000.0));
        assert!(rect_crosses_circle(&near, &center, 10_000.0));
        assert!(!rect_crosses_circle(&far, &center, 200_000.0));
    }
}
