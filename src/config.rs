//! Indexer configuration.
//!
//! Serializable the same way the rest of the system's mappings are: every
//! field has a default, so a partial JSON document deserializes into a
//! usable config.
//!
//! ```rust
//! use geoterm::config::{IndexConfig, TreeKind};
//!
//! let config: IndexConfig = serde_json::from_str(
//!     r#"{ "tree": "quadtree", "precision_meters": 100.0 }"#,
//! ).unwrap();
//! assert_eq!(config.tree, TreeKind::Quadtree);
//! config.validate().unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GeoTermError, Result};
use crate::geohash::{MAX_STRING_PRECISION, geohash_levels_for_precision, quadtree_levels_for_precision};
use crate::tree::MAX_LEVELS_POSSIBLE;

/// Default indexing precision when neither levels nor meters are given.
pub const DEFAULT_PRECISION_METERS: f64 = 50.0;

/// Default slop fraction for query detail trimming.
pub const DEFAULT_DISTANCE_ERROR_PCT: f64 = 0.025;

/// Which prefix tree to index with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TreeKind {
    Geohash,
    #[default]
    Quadtree,
}

impl TreeKind {
    /// The deepest level this tree kind supports.
    pub fn max_levels(self) -> u32 {
        match self {
            TreeKind::Geohash => MAX_STRING_PRECISION,
            TreeKind::Quadtree => MAX_LEVELS_POSSIBLE,
        }
    }

    /// Smallest level whose cells resolve `meters`.
    pub fn levels_for_precision(self, meters: f64) -> u32 {
        match self {
            TreeKind::Geohash => geohash_levels_for_precision(meters),
            TreeKind::Quadtree => quadtree_levels_for_precision(meters),
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKind::Geohash => write!(f, "geohash"),
            TreeKind::Quadtree => write!(f, "quadtree"),
        }
    }
}

impl FromStr for TreeKind {
    type Err = GeoTermError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "geohash" => Ok(TreeKind::Geohash),
            "quadtree" => Ok(TreeKind::Quadtree),
            other => Err(GeoTermError::InvalidConfiguration(format!(
                "unknown tree {:?}, expected \"geohash\" or \"quadtree\"",
                other
            ))),
        }
    }
}

/// Which iterator turns a shape into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Emit exactly the leaf tokens of the cover.
    Term,
    /// Explore sub-cells on a stack, emitting parents and leaves.
    #[default]
    Recursive,
    /// Stream the minimal cover in term order without materialising the
    /// tree. Packed quad trees only.
    Streaming,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Term => write!(f, "term"),
            StrategyKind::Recursive => write!(f, "recursive"),
            StrategyKind::Streaming => write!(f, "streaming"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = GeoTermError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "term" => Ok(StrategyKind::Term),
            "recursive" => Ok(StrategyKind::Recursive),
            "streaming" => Ok(StrategyKind::Streaming),
            other => Err(GeoTermError::InvalidConfiguration(format!(
                "unknown strategy {:?}, expected \"term\", \"recursive\" or \"streaming\"",
                other
            ))),
        }
    }
}

/// Polygon winding interpretation, consumed by the external shape parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Clockwise outer rings.
    Left,
    /// Counter-clockwise outer rings.
    #[default]
    Right,
}

/// Configuration for a [`ShapeIndexer`](crate::strategy::ShapeIndexer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Which prefix tree to use.
    #[serde(default)]
    pub tree: TreeKind,

    /// Which iterator to instantiate.
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Max tree depth. When absent, derived from `precision_meters`.
    #[serde(default)]
    pub tree_levels: Option<u32>,

    /// Desired precision in meters; overrides `tree_levels` when present.
    #[serde(default)]
    pub precision_meters: Option<f64>,

    /// Fraction of the query extent tolerated as slop, in `[0, 0.5]`.
    #[serde(default = "IndexConfig::default_distance_error_pct")]
    pub distance_error_pct: f64,

    /// Polygon winding for the external parser.
    #[serde(default)]
    pub orientation: Orientation,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            tree: TreeKind::default(),
            strategy: StrategyKind::default(),
            tree_levels: None,
            precision_meters: None,
            distance_error_pct: Self::default_distance_error_pct(),
            orientation: Orientation::default(),
        }
    }
}

impl IndexConfig {
    const fn default_distance_error_pct() -> f64 {
        DEFAULT_DISTANCE_ERROR_PCT
    }

    pub fn with_tree(mut self, tree: TreeKind) -> Self {
        self.tree = tree;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_tree_levels(mut self, levels: u32) -> Self {
        self.tree_levels = Some(levels);
        self
    }

    pub fn with_precision_meters(mut self, meters: f64) -> Self {
        self.precision_meters = Some(meters);
        self
    }

    pub fn with_distance_error_pct(mut self, pct: f64) -> Self {
        self.distance_error_pct = pct;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// The tree depth this config resolves to: `precision_meters` wins
    /// over `tree_levels`, and the 50 m default backs both.
    pub fn resolved_levels(&self) -> u32 {
        if let Some(meters) = self.precision_meters {
            return self.tree.levels_for_precision(meters);
        }
        self.tree_levels
            .unwrap_or_else(|| self.tree.levels_for_precision(DEFAULT_PRECISION_METERS))
    }

    /// Check every range constraint.
    pub fn validate(&self) -> Result<()> {
        if let Some(levels) = self.tree_levels {
            let max = self.tree.max_levels();
            if levels == 0 || levels > max {
                return Err(GeoTermError::InvalidConfiguration(format!(
                    "tree_levels must be in 1..={} for {} trees, got {}",
                    max, self.tree, levels
                )));
            }
        }

        if let Some(meters) = self.precision_meters {
            if !meters.is_finite() || meters < 0.0 {
                return Err(GeoTermError::InvalidConfiguration(format!(
                    "precision_meters must be finite and non-negative, got {}",
                    meters
                )));
            }
        }

        if !self.distance_error_pct.is_finite()
            || !(0.0..=0.5).contains(&self.distance_error_pct)
        {
            return Err(GeoTermError::InvalidConfiguration(format!(
                "distance_error_pct must be in [0, 0.5], got {}",
                self.distance_error_pct
            )));
        }

        if self.strategy == StrategyKind::Streaming && self.tree != TreeKind::Quadtree {
            return Err(GeoTermError::InvalidConfiguration(
                "the streaming strategy requires the quadtree".into(),
            ));
        }

        Ok(())
    }
}
