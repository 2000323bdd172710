//! The term strategy: exactly the leaf tokens, nothing else.
//!
//! Point fields index one token per point at full depth; shapes index the
//! leaf cells of their cover with the interior parents dropped.

use crate::cell::GridCell;
use crate::error::Result;
use crate::relate::ShapeRelationOracle;
use crate::strategy::recursive::RecursiveCoverIter;

/// A cover filtered down to its leaf cells.
pub struct LeafCoverIter<C, O> {
    inner: RecursiveCoverIter<C, O>,
}

impl<C: GridCell, O: ShapeRelationOracle> LeafCoverIter<C, O> {
    pub fn new(world: &C, oracle: O, detail_level: u32) -> Self {
        LeafCoverIter {
            inner: RecursiveCoverIter::new(world, oracle, detail_level),
        }
    }
}

impl<C: GridCell, O: ShapeRelationOracle> Iterator for LeafCoverIter<C, O> {
    type Item = Result<C>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.inner.by_ref() {
            match item {
                Ok(cell) if !cell.is_leaf() => continue,
                other => return Some(other),
            }
        }
        None
    }
}
