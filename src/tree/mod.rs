//! Prefix trees over the lat/lon plane.
//!
//! Two concrete grids share the [`GridCell`](crate::cell::GridCell)
//! capability set: the packed quad tree (64-bit integer terms) and the
//! geohash tree (base-32 string terms). [`SpatialPrefixTree`] is the
//! configuration-driven sum of the two.

pub mod geohash_grid;
pub mod quad;

use geo::Point;

use crate::cell::Token;
use crate::config::TreeKind;
use crate::error::Result;

pub use geohash_grid::{GeoHashCell, GeoHashTree};
pub use quad::{MAX_LEVELS_POSSIBLE, PackedQuadCell, PackedQuadTree, WORLD_TERM};

/// A configured prefix tree of either kind.
#[derive(Debug)]
pub enum SpatialPrefixTree {
    Quad(PackedQuadTree),
    Geohash(GeoHashTree),
}

impl SpatialPrefixTree {
    /// Build the tree named by `kind` at `max_levels` depth.
    pub fn new(kind: TreeKind, max_levels: u32) -> Result<Self> {
        match kind {
            TreeKind::Quadtree => Ok(SpatialPrefixTree::Quad(PackedQuadTree::new(max_levels)?)),
            TreeKind::Geohash => Ok(SpatialPrefixTree::Geohash(GeoHashTree::new(max_levels)?)),
        }
    }

    pub fn kind(&self) -> TreeKind {
        match self {
            SpatialPrefixTree::Quad(_) => TreeKind::Quadtree,
            SpatialPrefixTree::Geohash(_) => TreeKind::Geohash,
        }
    }

    pub fn max_levels(&self) -> u32 {
        match self {
            SpatialPrefixTree::Quad(tree) => tree.max_levels(),
            SpatialPrefixTree::Geohash(tree) => tree.max_levels(),
        }
    }

    /// The token of the cell containing `point` at `level`, whatever the
    /// tree kind.
    pub fn point_token(&self, point: &Point<f64>, level: u32) -> Result<Token> {
        use crate::cell::GridCell;
        match self {
            SpatialPrefixTree::Quad(tree) => Ok(tree.cell_for(point, level)?.token()),
            SpatialPrefixTree::Geohash(tree) => Ok(tree.cell_for(point, level)?.token()),
        }
    }
}
