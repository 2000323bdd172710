//! The geohash prefix tree: base-32 string cells, one character per level.
//!
//! Unlike the packed quad tree, tokens here are the geohash ASCII bytes;
//! prefix order is term order. The leaf flag travels out-of-band on the
//! cell (geohash terms have no spare bit), which the recursive indexing
//! strategy is built around.

use geo::{Point, Rect};
use smallvec::SmallVec;

use crate::cell::{GridCell, Relation, Token};
use crate::error::{GeoTermError, Result};
use crate::geohash::{self, BASE32, MAX_STRING_PRECISION};
use crate::geom::world_rect;

/// A geohash decomposition bounded at `max_levels` characters.
#[derive(Debug)]
pub struct GeoHashTree {
    max_levels: u32,
}

impl GeoHashTree {
    pub fn new(max_levels: u32) -> Result<Self> {
        if max_levels == 0 || max_levels > MAX_STRING_PRECISION {
            return Err(GeoTermError::InvalidConfiguration(format!(
                "geohash levels must be in 1..={}, got {}",
                MAX_STRING_PRECISION, max_levels
            )));
        }
        log::debug!("geohash tree: {} levels", max_levels);
        Ok(GeoHashTree { max_levels })
    }

    pub fn max_levels(&self) -> u32 {
        self.max_levels
    }

    /// The level-0 cell covering the whole plane (the empty hash).
    pub fn world_cell(&self) -> GeoHashCell<'_> {
        GeoHashCell {
            tree: self,
            hash: String::new(),
            leaf: false,
            relation: None,
        }
    }

    /// The cell containing `point` at `level`.
    pub fn cell_for(&self, point: &Point<f64>, level: u32) -> Result<GeoHashCell<'_>> {
        if level > self.max_levels {
            return Err(GeoTermError::InvalidConfiguration(format!(
                "cell level {} exceeds tree depth {}",
                level, self.max_levels
            )));
        }
        crate::geom::validate_point(point)?;
        let hash = if level == 0 {
            String::new()
        } else {
            geohash::string_encode(point.y(), point.x(), level)?
        };
        Ok(GeoHashCell {
            tree: self,
            hash,
            leaf: false,
            relation: None,
        })
    }

    /// Rebuild a cell from an externally supplied hash token.
    pub fn cell_from_hash(&self, hash: &str) -> Result<GeoHashCell<'_>> {
        if hash.len() as u32 > self.max_levels {
            return Err(GeoTermError::corrupt_term(
                0,
                format!(
                    "geohash {:?} is deeper than the tree's {} levels",
                    hash, self.max_levels
                ),
            ));
        }
        if !hash.is_empty() {
            // Validates the alphabet.
            geohash::bbox_of(hash)?;
        }
        Ok(GeoHashCell {
            tree: self,
            hash: hash.to_string(),
            leaf: false,
            relation: None,
        })
    }
}

/// A single geohash cell.
#[derive(Debug, Clone)]
pub struct GeoHashCell<'t> {
    tree: &'t GeoHashTree,
    hash: String,
    leaf: bool,
    relation: Option<Relation>,
}

impl PartialEq for GeoHashCell<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.leaf == other.leaf
    }
}

impl Eq for GeoHashCell<'_> {}

impl GeoHashCell<'_> {
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl GridCell for GeoHashCell<'_> {
    fn token(&self) -> Token {
        Token::from_hash(&self.hash)
    }

    fn token_no_leaf(&self) -> Token {
        Token::from_hash(&self.hash)
    }

    fn level(&self) -> u32 {
        self.hash.len() as u32
    }

    fn is_leaf(&self) -> bool {
        self.leaf || self.level() == self.tree.max_levels
    }

    fn set_leaf(&mut self) {
        self.leaf = true;
    }

    fn shape_relation(&self) -> Option<Relation> {
        self.relation
    }

    fn set_shape_relation(&mut self, relation: Relation) {
        self.relation = Some(relation);
    }

    fn rectangle(&self) -> Rect<f64> {
        if self.hash.is_empty() {
            return world_rect();
        }
        // The hash was validated on the way in.
        geohash::bbox_of(&self.hash).unwrap_or_else(|_| world_rect())
    }

    /// The thirty-two children in base-32 (term) order.
    fn sub_cells(&self) -> SmallVec<[Self; 4]> {
        let mut cells = SmallVec::new();
        if self.level() >= self.tree.max_levels {
            return cells;
        }
        for &c in BASE32.iter() {
            let mut hash = String::with_capacity(self.hash.len() + 1);
            hash.push_str(&self.hash);
            hash.push(c as char);
            cells.push(GeoHashCell {
                tree: self.tree,
                hash,
                leaf: false,
                relation: None,
            });
        }
        cells
    }
}
