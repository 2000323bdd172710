//! Bit-interleaving primitives and the Morton point codec.
//!
//! Everything here is an infallible function over 64-bit integers. Range
//! violations (`lat` outside `[-90, 90)`, `lon` outside `[-180, 180)`) are
//! caller contract, not runtime errors; callers range-reduce first.

/// Interleave masks for the magic-number spread/compact cascades.
const EVEN_BITS: u64 = 0x5555_5555_5555_5555;
const ODD_BITS: u64 = 0xAAAA_AAAA_AAAA_AAAA;

/// Bits carried per axis in a Morton code.
pub const BITS: u32 = 32;

/// Quantisation scale: 2^31 buckets across 360 degrees of longitude.
const LON_SCALE: f64 = (1u64 << 31) as f64 / 360.0;
/// Quantisation scale: 2^31 buckets across 180 degrees of latitude.
const LAT_SCALE: f64 = (1u64 << 31) as f64 / 180.0;

/// Spread the low 32 bits of `x` so each lands on an even bit position,
/// with a zero to its left.
#[inline]
pub const fn widen(x: u32) -> u64 {
    let mut v = x as u64;
    v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    v = (v | (v << 1)) & EVEN_BITS;
    v
}

/// Compact the even bits of `x` back into 32 contiguous bits. Bits outside
/// the even-bit mask are ignored.
#[inline]
pub const fn unwiden(x: u64) -> u32 {
    let mut v = x & EVEN_BITS;
    v = (v | (v >> 1)) & 0x3333_3333_3333_3333;
    v = (v | (v >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v >> 4)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v >> 8)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v >> 16)) & 0x0000_0000_FFFF_FFFF;
    v as u32
}

/// Interleave two 32-bit values: `even` occupies the even bit positions,
/// `odd` the odd ones.
#[inline]
pub const fn interleave(even: u32, odd: u32) -> u64 {
    widen(even) | (widen(odd) << 1)
}

/// Swap the two interleaved bit planes of a Morton code.
#[inline]
pub const fn flip_flop(x: u64) -> u64 {
    ((x & ODD_BITS) >> 1) | ((x & EVEN_BITS) << 1)
}

/// Quantise a longitude to its 31-bit bucket index.
#[inline]
pub fn scale_lon(lon: f64) -> u32 {
    (((lon + 180.0) * LON_SCALE) as i64 as u32) & 0x7FFF_FFFF
}

/// Quantise a latitude to its 31-bit bucket index.
#[inline]
pub fn scale_lat(lat: f64) -> u32 {
    (((lat + 90.0) * LAT_SCALE) as i64 as u32) & 0x7FFF_FFFF
}

/// Encode a point as a Morton code: longitude on the even bits, latitude
/// on the odd bits.
#[inline]
pub fn morton_encode(lon: f64, lat: f64) -> u64 {
    interleave(scale_lon(lon), scale_lat(lat))
}

/// Decode the longitude of a Morton code, as the centre of its
/// quantisation bucket (error at most half a bucket, 360 / 2^32 degrees).
#[inline]
pub fn morton_decode_lon(morton: u64) -> f64 {
    (unwiden(morton) as f64 + 0.5) / LON_SCALE - 180.0
}

/// Decode the latitude of a Morton code, as the centre of its
/// quantisation bucket.
#[inline]
pub fn morton_decode_lat(morton: u64) -> f64 {
    (unwiden(morton >> 1) as f64 + 0.5) / LAT_SCALE - 90.0
}
