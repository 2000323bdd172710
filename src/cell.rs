//! The capability set an indexable tree cell exposes to the index writer.

use std::cmp::Ordering;
use std::fmt;

use geo::Rect;
use smallvec::SmallVec;

/// Relation of a cell rectangle to the query shape.
///
/// The direction matters: `Within` means the rectangle lies entirely
/// inside the shape (the cell becomes a leaf); `Contains` means the
/// rectangle contains the whole shape (descent continues).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Disjoint,
    Intersects,
    Within,
    Contains,
}

impl Relation {
    /// `true` for any relation that keeps the cell in the cover.
    pub fn matches(self) -> bool {
        self != Relation::Disjoint
    }
}

/// An encoded cell token: the byte string handed to the inverted index.
///
/// Packed quad cells encode as 8 big-endian bytes (byte order equals
/// numeric term order); geohash cells encode as base-32 ASCII. Tokens are
/// plain values; byte-wise comparison is the index term order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token {
    bytes: SmallVec<[u8; 24]>,
}

impl Token {
    /// Token for a 64-bit packed term, big-endian.
    pub fn from_term(term: u64) -> Self {
        Token {
            bytes: SmallVec::from_slice(&term.to_be_bytes()),
        }
    }

    /// Token for a base-32 hash string.
    pub fn from_hash(hash: &str) -> Self {
        Token {
            bytes: SmallVec::from_slice(hash.as_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads an 8-byte token back into its packed term.
    pub fn to_term(&self) -> Option<u64> {
        let arr: [u8; 8] = self.bytes.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(arr))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(term) = self.to_term() {
            write!(f, "{:#018x}", term)
        } else {
            write!(f, "{}", String::from_utf8_lossy(&self.bytes))
        }
    }
}

/// What a prefix-tree cell can do for the indexer and the query layer.
pub trait GridCell: Clone {
    /// Token bytes with the leaf flag folded in.
    fn token(&self) -> Token;

    /// Token bytes with the leaf flag stripped.
    fn token_no_leaf(&self) -> Token;

    fn level(&self) -> u32;

    fn is_leaf(&self) -> bool;

    fn set_leaf(&mut self);

    fn shape_relation(&self) -> Option<Relation>;

    fn set_shape_relation(&mut self, relation: Relation);

    /// The cell envelope as `(min_lon, min_lat, max_lon, max_lat)`.
    fn rectangle(&self) -> Rect<f64>;

    /// Child cells in term order (Z-order for quad cells, base-32 order
    /// for geohash cells).
    fn sub_cells(&self) -> SmallVec<[Self; 4]>;

    /// Total order over leaf-stripped tokens; equal stripped tokens
    /// compare equal.
    fn compare_no_leaf(&self, other: &Self) -> Ordering {
        self.token_no_leaf().cmp(&other.token_no_leaf())
    }
}
