//! Geospatial term-indexing core: packed quad prefix trees and
//! Morton/geohash codecs that turn shapes and points on the WGS84 sphere
//! into lexicographically ordered byte terms for an inverted index, plus
//! the acceptors that translate spatial predicates back into term
//! iteration plans.
//!
//! ```rust
//! use geoterm::prelude::*;
//! use geo::{Rect, coord};
//!
//! let indexer = IndexerBuilder::new()
//!     .strategy(StrategyKind::Streaming)
//!     .tree_levels(6)
//!     .build()?;
//!
//! let shape = QueryShape::rect(Rect::new(
//!     coord! { x: -10.0, y: -10.0 },
//!     coord! { x: 10.0, y: 10.0 },
//! ))?;
//! let tokens = indexer.cover(&shape)?;
//! assert!(tokens.windows(2).all(|w| w[0] < w[1]));
//! # Ok::<(), geoterm::GeoTermError>(())
//! ```

pub mod bits;
pub mod cell;
pub mod config;
pub mod crs;
pub mod error;
pub mod filter;
pub mod geohash;
pub mod geom;
pub mod relate;
pub mod strategy;
pub mod tree;

pub use cell::{GridCell, Relation, Token};
pub use config::{IndexConfig, Orientation, StrategyKind, TreeKind};
pub use crs::{CrsHandler, Wgs84Handler};
pub use error::{GeoTermError, Result};
pub use filter::{BBoxTermFilter, DistanceTermFilter, FilteredTermIter, TermFilter, distance_filters};
pub use relate::{QueryShape, ShapeRelationOracle};
pub use strategy::{IndexerBuilder, LeafCoverIter, RecursiveCoverIter, ShapeIndexer, StreamingShapeIterator};
pub use tree::{GeoHashCell, GeoHashTree, PackedQuadCell, PackedQuadTree, SpatialPrefixTree};

pub use geo::{Point, Polygon, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoTermError, Result};

    pub use crate::{GridCell, Relation, Token};

    pub use crate::{IndexConfig, Orientation, StrategyKind, TreeKind};

    pub use crate::{IndexerBuilder, ShapeIndexer, StreamingShapeIterator};

    pub use crate::{QueryShape, ShapeRelationOracle};

    pub use crate::{GeoHashTree, PackedQuadTree, SpatialPrefixTree};

    pub use crate::{BBoxTermFilter, DistanceTermFilter, TermFilter};

    pub use geo::{Point, Polygon, Rect};
}
