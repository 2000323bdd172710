//! The packed quad prefix tree: quad-cell geometry plus the 64-bit term
//! encoding that lets the indexer walk the tree in term order without
//! materialising it.
//!
//! A term reads, from the most significant set bit down: a sentinel `1`
//! marking the top of the address, one two-bit quadrant per level, and the
//! leaf flag in the least significant bit. The world cell is `0x2`.
//! Quadrants follow Z-order: `00` NW, `01` NE, `10` SW, `11` SE, with the
//! origin at the cell centre.

use std::fmt;

use geo::{Point, Rect, coord};
use smallvec::SmallVec;

use crate::cell::{GridCell, Relation, Token};
use crate::error::{GeoTermError, Result};
use crate::geom::{MIN_LAT, MIN_LON, world_rect};

/// The packed term of the world cell: sentinel only, leaf clear.
pub const WORLD_TERM: u64 = 0x2;

/// Deepest tree supported by the 64-bit term layout
/// (`1 + 2 * 31 + 1 = 64` bits).
pub const MAX_LEVELS_POSSIBLE: u32 = 31;

/// Quadrant codes in term (Z) order.
const QUAD_NW: u64 = 0x0;
const QUAD_NE: u64 = 0x1;
const QUAD_SW: u64 = 0x2;
const QUAD_SE: u64 = 0x3;

/// A quad decomposition of the lat/lon plane with per-level metric tables.
///
/// Immutable after construction; share it freely across threads. Cells
/// borrow the tree for their geometry.
#[derive(Debug)]
pub struct PackedQuadTree {
    max_levels: u32,
    /// `level_w[l]` is the width in degrees of a cell at level `l`.
    level_w: Vec<f64>,
    /// `level_h[l]` is the height in degrees of a cell at level `l`.
    level_h: Vec<f64>,
}

impl PackedQuadTree {
    /// Build a tree `max_levels` deep. Levels outside `1..=31` are an
    /// invalid configuration: level 32 would push the sentinel bit out of
    /// the 64-bit term.
    pub fn new(max_levels: u32) -> Result<Self> {
        if max_levels == 0 || max_levels > MAX_LEVELS_POSSIBLE {
            return Err(GeoTermError::InvalidConfiguration(format!(
                "quadtree levels must be in 1..={}, got {}",
                MAX_LEVELS_POSSIBLE, max_levels
            )));
        }

        let mut level_w = Vec::with_capacity(max_levels as usize + 1);
        let mut level_h = Vec::with_capacity(max_levels as usize + 1);
        level_w.push(360.0);
        level_h.push(180.0);
        for l in 1..=max_levels as usize {
            level_w.push(level_w[l - 1] / 2.0);
            level_h.push(level_h[l - 1] / 2.0);
        }

        log::debug!(
            "packed quad tree: {} levels, finest cell {:.2e} x {:.2e} degrees",
            max_levels,
            level_w[max_levels as usize],
            level_h[max_levels as usize]
        );

        Ok(PackedQuadTree {
            max_levels,
            level_w,
            level_h,
        })
    }

    pub fn max_levels(&self) -> u32 {
        self.max_levels
    }

    /// Width in degrees of a cell at `level`.
    pub fn cell_width(&self, level: u32) -> f64 {
        self.level_w[level as usize]
    }

    /// Height in degrees of a cell at `level`.
    pub fn cell_height(&self, level: u32) -> f64 {
        self.level_h[level as usize]
    }

    /// The level-0 cell covering the whole plane.
    pub fn world_cell(&self) -> PackedQuadCell<'_> {
        PackedQuadCell {
            tree: self,
            term: WORLD_TERM,
            relation: None,
        }
    }

    /// The cell containing `point` at `level`.
    ///
    /// Points on shared cell edges resolve by the lower-left rule: each
    /// cell owns `x in [xmin, xmax)`, `y in [ymin, ymax)`. The world's top
    /// row and rightmost column additionally own their outer edge, so
    /// `lon = 180` and `lat = 90` land in the last column/row.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geo::Point;
    /// use geoterm::{GridCell, PackedQuadTree};
    ///
    /// let tree = PackedQuadTree::new(4).unwrap();
    /// // The origin goes east/north: the NE world quadrant, then its SW
    /// // child.
    /// let cell = tree.cell_for(&Point::new(0.0, 0.0), 2).unwrap();
    /// assert_eq!(cell.term(), 0x2C);
    /// assert_eq!(cell.rectangle().max().x, 90.0);
    /// ```
    pub fn cell_for(&self, point: &Point<f64>, level: u32) -> Result<PackedQuadCell<'_>> {
        if level > self.max_levels {
            return Err(GeoTermError::InvalidConfiguration(format!(
                "cell level {} exceeds tree depth {}",
                level, self.max_levels
            )));
        }
        crate::geom::validate_point(point)?;

        let mut term = WORLD_TERM;
        let (mut cx, mut cy) = (0.0f64, 0.0f64);
        for l in 1..=level {
            let east = point.x() >= cx;
            let south = point.y() < cy;
            let quad = ((south as u64) << 1) | east as u64;
            term = (term << 2) | (quad << 1);

            let qw = self.level_w[l as usize] / 2.0;
            let qh = self.level_h[l as usize] / 2.0;
            cx += if east { qw } else { -qw };
            cy += if south { -qh } else { qh };
        }

        Ok(PackedQuadCell {
            tree: self,
            term,
            relation: None,
        })
    }

    /// Rebuild a cell from an externally supplied token term, validating
    /// the sentinel and level invariants.
    pub fn cell_from_term(&self, term: u64) -> Result<PackedQuadCell<'_>> {
        if term == 0 {
            return Err(GeoTermError::corrupt_term(term, "no sentinel bit set"));
        }
        let significant = 64 - term.leading_zeros();
        if significant % 2 != 0 {
            return Err(GeoTermError::corrupt_term(
                term,
                "sentinel bit at an odd offset",
            ));
        }
        let level = (significant >> 1) - 1;
        if level > self.max_levels {
            return Err(GeoTermError::corrupt_term(
                term,
                format!("level {} exceeds tree depth {}", level, self.max_levels),
            ));
        }
        Ok(PackedQuadCell {
            tree: self,
            term,
            relation: None,
        })
    }
}

/// A single cell of a [`PackedQuadTree`], addressed by its packed term.
#[derive(Clone)]
pub struct PackedQuadCell<'t> {
    tree: &'t PackedQuadTree,
    term: u64,
    relation: Option<Relation>,
}

impl fmt::Debug for PackedQuadCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedQuadCell")
            .field("term", &format_args!("{:#x}", self.term))
            .field("level", &self.level())
            .field("relation", &self.relation)
            .finish()
    }
}

impl PartialEq for PackedQuadCell<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}

impl Eq for PackedQuadCell<'_> {}

impl<'t> PackedQuadCell<'t> {
    pub fn term(&self) -> u64 {
        self.term
    }

    /// `true` when this is the all-SE path at its level: the numerically
    /// last cell the traversal can reach there. The leaf flag does not
    /// change which cell this is, so it is stripped before comparing.
    pub fn is_end(&self) -> bool {
        let level = self.level();
        let shift = (level << 1) + 2;
        let end_term = if shift >= 64 {
            u64::MAX - 1
        } else {
            (1u64 << shift) - 2
        };
        let stripped = self.term & !0x1;
        stripped != WORLD_TERM && stripped == end_term
    }

    /// The next cell in term order, or `None` when the traversal is done.
    ///
    /// `descend = true` steps into the NW child where possible;
    /// `descend = false` skips the current subtree, moving to the next
    /// sibling or to the nearest ancestor's next sibling. Either way every
    /// returned term is strictly greater than the current one, so the
    /// emitted stream needs no sorting. The world cell always descends.
    pub fn next_cell(&self, descend: bool) -> Option<PackedQuadCell<'t>> {
        let term = self.term;
        let level = self.level();
        let max = self.tree.max_levels;
        let leaf_bit = term & 0x1 == 0x1;

        // Nothing follows the all-SE path once its subtree is out of play.
        if self.is_end() && (!descend || leaf_bit || level == max) {
            return None;
        }

        let next = if level == 0 || (descend && !leaf_bit && level != max) {
            // NW child: the appended quadrant pair is 00.
            term << 2
        } else {
            // Leaf-on-interior is allowed; strip the flag before sibling
            // arithmetic.
            let base = term & !0x1;
            let mut candidate = base + 0x2;
            if term & 0x6 == 0x6 {
                // Current was the SE sibling: the carry has rippled into
                // an ancestor pair. Realign the sentinel to hand back the
                // next sibling of the nearest ancestor that has one.
                let tz = candidate.trailing_zeros();
                let shift = if tz % 2 == 0 { tz - 2 } else { tz - 1 };
                candidate >>= shift;
            }
            candidate
        };

        Some(PackedQuadCell {
            tree: self.tree,
            term: next,
            relation: None,
        })
    }
}

impl GridCell for PackedQuadCell<'_> {
    fn token(&self) -> Token {
        Token::from_term(self.term)
    }

    fn token_no_leaf(&self) -> Token {
        Token::from_term(self.term & !0x1)
    }

    fn level(&self) -> u32 {
        ((64 - self.term.leading_zeros()) >> 1).saturating_sub(1)
    }

    fn is_leaf(&self) -> bool {
        self.term & 0x1 == 0x1 || self.level() == self.tree.max_levels
    }

    fn set_leaf(&mut self) {
        self.term |= 0x1;
    }

    fn shape_relation(&self) -> Option<Relation> {
        self.relation
    }

    fn set_shape_relation(&mut self, relation: Relation) {
        self.relation = Some(relation);
    }

    /// Materialise the cell envelope by walking the quadrant pairs from
    /// the highest level pair down, accumulating the per-level offsets.
    fn rectangle(&self) -> Rect<f64> {
        let level = self.level();
        if level == 0 {
            return world_rect();
        }

        let (mut xmin, mut ymin) = (MIN_LON, MIN_LAT);
        for l in 1..=level {
            let shift = ((level - l) << 1) + 1;
            let quad = (self.term >> shift) & 0x3;
            if quad & 0x1 == 0x1 {
                xmin += self.tree.level_w[l as usize];
            }
            if quad & 0x2 == 0x0 {
                ymin += self.tree.level_h[l as usize];
            }
        }

        let w = self.tree.level_w[level as usize];
        let h = self.tree.level_h[level as usize];
        Rect::new(coord! { x: xmin, y: ymin }, coord! { x: xmin + w, y: ymin + h })
    }

    /// The four children in Z-order (NW, NE, SW, SE), or nothing for a
    /// cell already at the deepest level.
    fn sub_cells(&self) -> SmallVec<[Self; 4]> {
        let mut cells = SmallVec::new();
        if self.level() >= self.tree.max_levels {
            return cells;
        }
        let base = self.term & !0x1;
        for quad in [QUAD_NW, QUAD_NE, QUAD_SW, QUAD_SE] {
            cells.push(PackedQuadCell {
                tree: self.tree,
                term: (base << 2) | (quad << 1),
                relation: None,
            });
        }
        cells
    }
}
