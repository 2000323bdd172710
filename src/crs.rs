//! Coordinate-reference-system seam.
//!
//! The core works in WGS84 lon/lat and never reprojects on its own; the
//! surrounding pipeline hands coordinates through a [`CrsHandler`] before
//! they reach the trees. The trait is deliberately narrow: one reproject
//! call, no CRS metadata.

use crate::error::Result;

/// Reprojects a coordinate pair into the CRS the trees index in.
pub trait CrsHandler {
    fn reproject(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

/// The identity handler for data already in WGS84.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84Handler;

impl CrsHandler for Wgs84Handler {
    fn reproject(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok((x, y))
    }
}
