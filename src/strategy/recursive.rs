//! Recursive cover iteration: explicit-stack refinement that works over
//! any grid cell type, geohash cells included.
//!
//! Cells whose rectangle intersects the shape are emitted and split;
//! cells entirely within the shape, and intersecting cells at the detail
//! level, become leaves. Children are pushed in reverse Z-order so the
//! stack pops them in term order, which keeps the emitted stream sorted
//! for prefix-ordered tokens.

use smallvec::SmallVec;

use crate::cell::{GridCell, Relation};
use crate::error::Result;
use crate::relate::ShapeRelationOracle;

/// Stack-driven cover of a shape, generic over the cell type.
pub struct RecursiveCoverIter<C, O> {
    oracle: O,
    detail_level: u32,
    stack: Vec<C>,
    failed: bool,
}

impl<C: GridCell, O: ShapeRelationOracle> RecursiveCoverIter<C, O> {
    /// Cover the world under `world`'s grid, refining down to
    /// `detail_level`.
    pub fn new(world: &C, oracle: O, detail_level: u32) -> Self {
        let mut stack: Vec<C> = Vec::new();
        let children: SmallVec<[C; 4]> = world.sub_cells();
        stack.extend(children.into_iter().rev());
        RecursiveCoverIter {
            oracle,
            detail_level,
            stack,
            failed: false,
        }
    }

    fn step(&mut self) -> Result<Option<C>> {
        while let Some(mut cell) = self.stack.pop() {
            let relation = self.oracle.relate(&cell.rectangle())?;
            if relation == Relation::Disjoint {
                continue;
            }
            cell.set_shape_relation(relation);

            let children = if cell.level() >= self.detail_level {
                SmallVec::new()
            } else {
                cell.sub_cells()
            };

            if relation == Relation::Within || children.is_empty() {
                // Fully inside, at the detail level, or out of precision:
                // a leaf either way.
                cell.set_leaf();
            } else {
                self.stack.extend(children.into_iter().rev());
            }
            return Ok(Some(cell));
        }
        Ok(None)
    }
}

impl<C: GridCell, O: ShapeRelationOracle> Iterator for RecursiveCoverIter<C, O> {
    type Item = Result<C>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(cell) => cell.map(Ok),
            Err(err) => {
                self.failed = true;
                self.stack.clear();
                Some(Err(err))
            }
        }
    }
}
