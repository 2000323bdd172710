//! Streaming shape-to-terms iteration over the packed quad tree.
//!
//! Emits the cover of a shape as an ordered stream of cells, using only
//! [`PackedQuadCell::next_cell`] navigation: one cursor, one lookahead, no
//! materialised tree and no sorting. Because `next_cell` is strictly
//! ascending in term order, the emitted tokens arrive already sorted and
//! each cell is visited at most once.

use crate::cell::{GridCell, Relation};
use crate::error::Result;
use crate::relate::ShapeRelationOracle;
use crate::tree::{PackedQuadCell, PackedQuadTree};

/// Streams the cover of a shape in ascending term order.
///
/// The sequence is restart-safe: a fresh iterator over the same
/// `(shape, tree)` yields an identical sequence. An oracle failure
/// (`InvalidShape`) is yielded once, after which the iterator is fused.
pub struct StreamingShapeIterator<'t, O> {
    oracle: O,
    max_levels: u32,
    current: Option<PackedQuadCell<'t>>,
    lookahead: Option<PackedQuadCell<'t>>,
    failed: bool,
}

impl<'t, O: ShapeRelationOracle> StreamingShapeIterator<'t, O> {
    pub fn new(tree: &'t PackedQuadTree, oracle: O) -> Self {
        Self::with_detail_level(tree, oracle, tree.max_levels())
    }

    /// Stream with descent capped at `detail_level`, the hook for
    /// query-time slop (`distance_error_pct`).
    pub fn with_detail_level(tree: &'t PackedQuadTree, oracle: O, detail_level: u32) -> Self {
        StreamingShapeIterator {
            oracle,
            max_levels: detail_level.clamp(1, tree.max_levels()),
            // The NW root quadrant at level 1.
            current: tree.world_cell().next_cell(true),
            lookahead: None,
            failed: false,
        }
    }

    /// Walk the cursor forward until a cell belongs in the cover, parking
    /// it in the lookahead slot.
    fn advance(&mut self) -> Result<()> {
        while let Some(mut cell) = self.current.take() {
            let relation = self.oracle.relate(&cell.rectangle())?;
            match relation {
                Relation::Disjoint => {
                    // Nothing under this cell can match; skip the subtree.
                    self.current = cell.next_cell(false);
                }
                Relation::Within => {
                    cell.set_shape_relation(relation);
                    cell.set_leaf();
                    self.current = cell.next_cell(false);
                    self.lookahead = Some(cell);
                    return Ok(());
                }
                Relation::Intersects | Relation::Contains => {
                    cell.set_shape_relation(relation);
                    if cell.level() == self.max_levels {
                        cell.set_leaf();
                    }
                    self.current = cell.next_cell(true);
                    self.lookahead = Some(cell);
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

impl<'t, O: ShapeRelationOracle> Iterator for StreamingShapeIterator<'t, O> {
    type Item = Result<PackedQuadCell<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.lookahead.is_none() {
            if let Err(err) = self.advance() {
                log::trace!("streaming cover aborted: {err}");
                self.failed = true;
                self.current = None;
                return Some(Err(err));
            }
        }
        self.lookahead.take().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Token;
    use crate::error::GeoTermError;
    use crate::geom::{rect_intersection_area, rects_intersect};
    use crate::relate::QueryShape;
    use geo::{Point, Rect, coord, polygon};

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Rect<f64> {
        Rect::new(coord! { x: min_lon, y: min_lat }, coord! { x: max_lon, y: max_lat })
    }

    fn cover<'t>(
        tree: &'t PackedQuadTree,
        shape: &QueryShape,
    ) -> Vec<PackedQuadCell<'t>> {
        StreamingShapeIterator::new(tree, shape.clone())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_world_shape_yields_four_leaves() {
        let tree = PackedQuadTree::new(5).unwrap();
        let shape = QueryShape::rect(rect(-180.0, -90.0, 180.0, 90.0)).unwrap();
        let cells = cover(&tree, &shape);
        assert_eq!(cells.len(), 4);
        for cell in &cells {
            assert_eq!(cell.level(), 1);
            assert!(cell.is_leaf());
            assert_eq!(cell.shape_relation(), Some(Relation::Within));
        }
    }

    #[test]
    fn test_tokens_strictly_ascending() {
        let tree = PackedQuadTree::new(6).unwrap();
        let shape = QueryShape::rect(rect(-10.0, -10.0, 10.0, 10.0)).unwrap();
        let cells = cover(&tree, &shape);
        assert!(!cells.is_empty());
        let tokens: Vec<Token> = cells.iter().map(|c| c.token()).collect();
        for pair in tokens.windows(2) {
            assert!(pair[0] < pair[1], "tokens must strictly ascend");
        }
    }

    #[test]
    fn test_leaves_tile_the_query_rectangle() {
        // Indexing a 20 x 20 degree box: the leaf cells, clipped to the
        // box, tile it without gaps or double counting.
        let tree = PackedQuadTree::new(5).unwrap();
        let query = rect(-10.0, -10.0, 10.0, 10.0);
        let shape = QueryShape::rect(query).unwrap();
        let cells = cover(&tree, &shape);

        let mut covered = 0.0;
        for cell in &cells {
            let r = cell.rectangle();
            assert!(rects_intersect(&r, &query), "cover cell misses the query");
            if cell.is_leaf() {
                covered += rect_intersection_area(&r, &query);
            }
        }
        assert!((covered - 400.0).abs() < 1e-4, "covered {covered}");
    }

    #[test]
    fn test_sampled_points_are_covered() {
        let tree = PackedQuadTree::new(6).unwrap();
        let query = rect(2.0, 40.0, 9.5, 47.5);
        let shape = QueryShape::rect(query).unwrap();
        let cells = cover(&tree, &shape);

        for i in 0..20 {
            for j in 0..20 {
                let lon = 2.0 + (9.5 - 2.0) * (i as f64 + 0.5) / 20.0;
                let lat = 40.0 + (47.5 - 40.0) * (j as f64 + 0.5) / 20.0;
                let hit = cells.iter().any(|c| {
                    let r = c.rectangle();
                    r.min().x <= lon && lon < r.max().x && r.min().y <= lat && lat < r.max().y
                });
                assert!(hit, "point ({lon}, {lat}) not covered");
            }
        }
    }

    #[test]
    fn test_interior_cells_descend_boundary_stays() {
        let tree = PackedQuadTree::new(4).unwrap();
        let shape = QueryShape::rect(rect(-50.0, -50.0, 50.0, 50.0)).unwrap();
        let cells = cover(&tree, &shape);

        for cell in &cells {
            match cell.shape_relation().unwrap() {
                Relation::Within => assert!(cell.is_leaf()),
                Relation::Intersects | Relation::Contains => {
                    // Mid-tree boundary cells stay interior; only the
                    // deepest boundary cells are forced leaves.
                    if cell.level() < tree.max_levels() {
                        assert!(!cell.is_leaf());
                    } else {
                        assert!(cell.is_leaf());
                    }
                }
                Relation::Disjoint => panic!("disjoint cell emitted"),
            }
        }
    }

    #[test]
    fn test_no_cell_visited_twice() {
        let tree = PackedQuadTree::new(5).unwrap();
        let shape = QueryShape::circle(Point::new(12.5, 41.9), 400_000.0).unwrap();
        let cells = cover(&tree, &shape);
        let mut seen = std::collections::BTreeSet::new();
        for cell in &cells {
            assert!(seen.insert(cell.term() & !0x1));
        }
    }

    #[test]
    fn test_restart_yields_identical_sequence() {
        let tree = PackedQuadTree::new(5).unwrap();
        let shape = QueryShape::circle(Point::new(-74.0, 40.7), 250_000.0).unwrap();
        let first: Vec<u64> = cover(&tree, &shape).iter().map(|c| c.term()).collect();
        let second: Vec<u64> = cover(&tree, &shape).iter().map(|c| c.term()).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_polygon_cover() {
        let tree = PackedQuadTree::new(6).unwrap();
        let poly = polygon![
            (x: -5.0, y: -5.0),
            (x: 15.0, y: -5.0),
            (x: 15.0, y: 12.0),
            (x: -5.0, y: 12.0),
            (x: -5.0, y: -5.0),
        ];
        let shape = QueryShape::polygon(poly).unwrap();
        let cells = cover(&tree, &shape);
        assert!(!cells.is_empty());
        for pair in cells.windows(2) {
            assert!(pair[0].term() < pair[1].term());
        }
    }

    struct FailingOracle {
        calls: std::cell::Cell<u32>,
        fail_at: u32,
    }

    impl ShapeRelationOracle for FailingOracle {
        fn relate(&self, _rect: &Rect<f64>) -> Result<Relation> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n >= self.fail_at {
                Err(GeoTermError::InvalidShape("oracle rejected the shape".into()))
            } else {
                Ok(Relation::Intersects)
            }
        }
    }

    #[test]
    fn test_oracle_failure_aborts_and_fuses() {
        let tree = PackedQuadTree::new(4).unwrap();
        let oracle = FailingOracle {
            calls: std::cell::Cell::new(0),
            fail_at: 3,
        };
        let mut iter = StreamingShapeIterator::new(&tree, oracle);
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(
            iter.next().unwrap(),
            Err(GeoTermError::InvalidShape(_))
        ));
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }
}
