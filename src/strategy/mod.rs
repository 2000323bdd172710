//! Shape-to-terms strategies and the indexer facade that picks one.

pub mod recursive;
pub mod streaming;
pub mod term;

pub use recursive::RecursiveCoverIter;
pub use streaming::StreamingShapeIterator;
pub use term::LeafCoverIter;

use geo::Point;

use crate::cell::{GridCell, Token};
use crate::config::{IndexConfig, StrategyKind};
use crate::error::{GeoTermError, Result};
use crate::geohash::geohash_cell_size;
use crate::relate::QueryShape;
use crate::tree::SpatialPrefixTree;

/// Resolves a configuration into a tree plus a strategy and turns shapes
/// into token lists for the index writer.
#[derive(Debug)]
pub struct ShapeIndexer {
    tree: SpatialPrefixTree,
    strategy: StrategyKind,
    distance_error_pct: f64,
}

impl ShapeIndexer {
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let levels = config.resolved_levels();
        let tree = SpatialPrefixTree::new(config.tree, levels)?;
        log::debug!(
            "shape indexer: {} tree, {} levels, {} strategy",
            config.tree,
            levels,
            config.strategy
        );
        Ok(ShapeIndexer {
            tree,
            strategy: config.strategy,
            distance_error_pct: config.distance_error_pct,
        })
    }

    pub fn tree(&self) -> &SpatialPrefixTree {
        &self.tree
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// The descent depth for a query shape: full depth, trimmed by the
    /// configured slop fraction of the shape's extent.
    pub fn detail_level(&self, shape: &QueryShape) -> u32 {
        let max = self.tree.max_levels();
        if self.distance_error_pct <= 0.0 {
            return max;
        }
        let bbox = shape.bounding_rect();
        let err_degrees = bbox.width().max(bbox.height()) * self.distance_error_pct;
        if err_degrees <= 0.0 {
            return max;
        }
        // The first level whose cells drop below the tolerated error.
        for level in 1..max {
            let (w, h) = match &self.tree {
                SpatialPrefixTree::Quad(tree) => (tree.cell_width(level), tree.cell_height(level)),
                SpatialPrefixTree::Geohash(_) => geohash_cell_size(level),
            };
            if err_degrees > w && err_degrees > h {
                return level;
            }
        }
        max
    }

    /// The cover of `shape` as sorted token bytes.
    pub fn cover(&self, shape: &QueryShape) -> Result<Vec<Token>> {
        let detail = self.detail_level(shape);
        match (&self.tree, self.strategy) {
            (SpatialPrefixTree::Quad(tree), StrategyKind::Streaming) => {
                StreamingShapeIterator::with_detail_level(tree, shape.clone(), detail)
                    .map(|cell| cell.map(|c| c.token()))
                    .collect()
            }
            (SpatialPrefixTree::Quad(tree), StrategyKind::Recursive) => {
                RecursiveCoverIter::new(&tree.world_cell(), shape.clone(), detail)
                    .map(|cell| cell.map(|c| c.token()))
                    .collect()
            }
            (SpatialPrefixTree::Quad(tree), StrategyKind::Term) => {
                LeafCoverIter::new(&tree.world_cell(), shape.clone(), detail)
                    .map(|cell| cell.map(|c| c.token()))
                    .collect()
            }
            (SpatialPrefixTree::Geohash(tree), StrategyKind::Recursive) => {
                RecursiveCoverIter::new(&tree.world_cell(), shape.clone(), detail)
                    .map(|cell| cell.map(|c| c.token()))
                    .collect()
            }
            (SpatialPrefixTree::Geohash(tree), StrategyKind::Term) => {
                LeafCoverIter::new(&tree.world_cell(), shape.clone(), detail)
                    .map(|cell| cell.map(|c| c.token()))
                    .collect()
            }
            (SpatialPrefixTree::Geohash(_), StrategyKind::Streaming) => {
                Err(GeoTermError::InvalidConfiguration(
                    "the streaming strategy requires the quadtree".into(),
                ))
            }
        }
    }

    /// The single full-depth token for a point field.
    pub fn point_term(&self, point: &Point<f64>) -> Result<Token> {
        self.tree.point_token(point, self.tree.max_levels())
    }
}

/// Builder for [`ShapeIndexer`], for callers assembling options by hand.
#[derive(Debug, Default)]
pub struct IndexerBuilder {
    config: IndexConfig,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(mut self, tree: crate::config::TreeKind) -> Self {
        self.config.tree = tree;
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn tree_levels(mut self, levels: u32) -> Self {
        self.config.tree_levels = Some(levels);
        self
    }

    pub fn precision_meters(mut self, meters: f64) -> Self {
        self.config.precision_meters = Some(meters);
        self
    }

    pub fn distance_error_pct(mut self, pct: f64) -> Self {
        self.config.distance_error_pct = pct;
        self
    }

    pub fn orientation(mut self, orientation: crate::config::Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    /// Validate and build. Unknown names and out-of-range levels surface
    /// here as `InvalidConfiguration`.
    pub fn build(self) -> Result<ShapeIndexer> {
        ShapeIndexer::from_config(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeKind;
    use geo::{Rect, coord};

    fn shape(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> QueryShape {
        QueryShape::rect(Rect::new(
            coord! { x: min_lon, y: min_lat },
            coord! { x: max_lon, y: max_lat },
        ))
        .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let indexer = IndexerBuilder::new().build().unwrap();
        assert_eq!(indexer.strategy(), StrategyKind::Recursive);
        assert_eq!(indexer.tree().kind(), TreeKind::Quadtree);
    }

    #[test]
    fn test_builder_rejects_bad_combinations() {
        assert!(
            IndexerBuilder::new()
                .tree(TreeKind::Geohash)
                .strategy(StrategyKind::Streaming)
                .build()
                .is_err()
        );
        assert!(IndexerBuilder::new().tree_levels(40).build().is_err());
    }

    #[test]
    fn test_cover_strategies_agree_on_leaves() {
        let query = shape(-10.0, -10.0, 10.0, 10.0);
        let base = IndexConfig::default().with_tree_levels(5).with_distance_error_pct(0.0);

        let streaming = ShapeIndexer::from_config(
            &base.clone().with_strategy(StrategyKind::Streaming),
        )
        .unwrap()
        .cover(&query)
        .unwrap();
        let recursive = ShapeIndexer::from_config(
            &base.clone().with_strategy(StrategyKind::Recursive),
        )
        .unwrap()
        .cover(&query)
        .unwrap();
        let term = ShapeIndexer::from_config(&base.with_strategy(StrategyKind::Term))
            .unwrap()
            .cover(&query)
            .unwrap();

        assert_eq!(streaming, recursive);
        assert!(term.len() < recursive.len());
        // Leaf tokens are a subsequence of the full cover.
        let mut it = recursive.iter();
        for token in &term {
            assert!(it.any(|t| t == token));
        }
    }

    #[test]
    fn test_detail_level_scales_with_slop() {
        let sharp = IndexerBuilder::new()
            .tree_levels(20)
            .distance_error_pct(0.0)
            .build()
            .unwrap();
        let sloppy = IndexerBuilder::new()
            .tree_levels(20)
            .distance_error_pct(0.25)
            .build()
            .unwrap();
        let query = shape(-10.0, -10.0, 10.0, 10.0);
        assert_eq!(sharp.detail_level(&query), 20);
        assert!(sloppy.detail_level(&query) < 20);
        // Sloppier queries produce smaller covers.
        assert!(sloppy.cover(&query).unwrap().len() < sharp.cover(&query).unwrap().len());
    }

    #[test]
    fn test_geohash_cover_tokens_are_hashes() {
        let indexer = IndexerBuilder::new()
            .tree(TreeKind::Geohash)
            .tree_levels(3)
            .distance_error_pct(0.0)
            .build()
            .unwrap();
        let tokens = indexer.cover(&shape(-1.0, 50.0, 1.0, 52.0)).unwrap();
        assert!(!tokens.is_empty());
        for token in &tokens {
            assert!(token.len() <= 3);
            assert!(token.as_bytes().iter().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_point_term() {
        let indexer = IndexerBuilder::new().tree_levels(8).build().unwrap();
        let token = indexer.point_term(&Point::new(-122.4194, 37.7749)).unwrap();
        assert_eq!(token.len(), 8);

        let geohash = IndexerBuilder::new()
            .tree(TreeKind::Geohash)
            .tree_levels(9)
            .build()
            .unwrap();
        let token = geohash.point_term(&Point::new(-122.4194, 37.7749)).unwrap();
        assert_eq!(token.as_bytes(), b"9q8yyk8yt");
    }
}
