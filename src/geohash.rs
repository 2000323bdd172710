//! Base-32 geohash codec: string form, packed 64-bit form, and the
//! precision tables shared with the prefix trees.
//!
//! The packed form carries `[60-bit interleaved hash][4-bit level]` and is
//! defined for precision 1..=12. The string form extends to 24 characters
//! by plain bisection, which is what the geohash prefix tree uses for its
//! deepest levels.

use geo::{Point, Rect, coord};
use once_cell::sync::Lazy;

use crate::bits::interleave;
use crate::error::{GeoTermError, Result};
use crate::geom::{self, EARTH_EQUATOR_METERS, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// The base-32 geohash alphabet, in term order.
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Deepest precision representable in the packed 64-bit form.
pub const MAX_PACKED_PRECISION: u32 = 12;

/// Deepest precision the string codec (and the geohash prefix tree) accepts.
pub const MAX_STRING_PRECISION: u32 = 24;

/// Reverse lookup from an ASCII byte to its 5-bit base-32 value.
static BASE32_REVERSE: Lazy<[i8; 256]> = Lazy::new(|| {
    let mut table = [-1i8; 256];
    for (i, &c) in BASE32.iter().enumerate() {
        table[c as usize] = i as i8;
    }
    table
});

/// A decoded geohash centre with the half-cell error on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedHash {
    pub lat: f64,
    pub lon: f64,
    pub lat_err: f64,
    pub lon_err: f64,
}

/// Compass directions for neighbor lookup, in ring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::Ne,
        Direction::E,
        Direction::Se,
        Direction::S,
        Direction::Sw,
        Direction::W,
        Direction::Nw,
    ];

    fn offsets(self) -> (i8, i8) {
        match self {
            Direction::N => (0, 1),
            Direction::Ne => (1, 1),
            Direction::E => (1, 0),
            Direction::Se => (1, -1),
            Direction::S => (0, -1),
            Direction::Sw => (-1, -1),
            Direction::W => (-1, 0),
            Direction::Nw => (-1, 1),
        }
    }
}

fn check_precision(precision: u32, max: u32) -> Result<()> {
    if precision == 0 || precision > max {
        return Err(GeoTermError::InvalidConfiguration(format!(
            "geohash precision must be in 1..={}, got {}",
            max, precision
        )));
    }
    Ok(())
}

/// Quantise both axes to 30 bits. `lon = 180` wraps to `-180`; `lat = 90`
/// clamps into the topmost row.
fn quantise(lat: f64, lon: f64) -> (u32, u32) {
    let lon = geom::normalize_lon(lon);
    let lat = geom::clamp_lat(lat);
    let lon_q = (((lon - MIN_LON) / 360.0 * (1u64 << 30) as f64) as u64).min((1 << 30) - 1) as u32;
    let lat_q = (((lat - MIN_LAT) / 180.0 * (1u64 << 30) as f64) as u64).min((1 << 30) - 1) as u32;
    (lat_q, lon_q)
}

/// Pack a point into the 64-bit geohash form `[hash << 4 | precision]`.
pub fn long_encode(lat: f64, lon: f64, precision: u32) -> Result<u64> {
    check_precision(precision, MAX_PACKED_PRECISION)?;
    let (lat_q, lon_q) = quantise(lat, lon);
    // Longitude occupies the odd plane so the most significant of the 60
    // bits is a longitude bisection, as the string form requires.
    let h60 = interleave(lat_q, lon_q);
    let hash = h60 >> ((MAX_PACKED_PRECISION - precision) * 5);
    Ok((hash << 4) | precision as u64)
}

/// Render a packed geohash as its base-32 string.
pub fn string_encode_from_long(packed: u64) -> Result<String> {
    let level = (packed & 0xF) as u32;
    if level == 0 || level > MAX_PACKED_PRECISION {
        return Err(GeoTermError::corrupt_term(
            packed,
            format!("packed geohash level {} out of 1..=12", level),
        ));
    }
    let hash = packed >> 4;
    let mut out = String::with_capacity(level as usize);
    for i in (0..level).rev() {
        let chunk = ((hash >> (i * 5)) & 0x1F) as usize;
        out.push(BASE32[chunk] as char);
    }
    Ok(out)
}

/// Parse a base-32 string back into the packed form.
pub fn long_encode_from_string(hash: &str) -> Result<u64> {
    check_precision(hash.len() as u32, MAX_PACKED_PRECISION)?;
    let mut acc = 0u64;
    for c in hash.bytes() {
        let v = BASE32_REVERSE[c as usize];
        if v < 0 {
            return Err(GeoTermError::corrupt_term(
                0,
                format!("invalid base-32 character {:?} in geohash {:?}", c as char, hash),
            ));
        }
        acc = (acc << 5) | v as u64;
    }
    Ok((acc << 4) | hash.len() as u64)
}

/// Encode a point as a base-32 geohash of `precision` characters.
///
/// Precisions up to 12 go through the packed form; deeper ones (the
/// geohash prefix tree allows up to 24) fall back to bisection.
///
/// # Examples
///
/// ```rust
/// let hash = geoterm::geohash::string_encode(37.7749, -122.4194, 9).unwrap();
/// assert_eq!(hash, "9q8yyk8yt");
/// ```
pub fn string_encode(lat: f64, lon: f64, precision: u32) -> Result<String> {
    check_precision(precision, MAX_STRING_PRECISION)?;
    if precision <= MAX_PACKED_PRECISION {
        return string_encode_from_long(long_encode(lat, lon, precision)?);
    }

    let lon = geom::normalize_lon(lon);
    let lat = geom::clamp_lat(lat);
    let mut out = String::with_capacity(precision as usize);
    let (mut min_lon, mut max_lon) = (MIN_LON, MAX_LON);
    let (mut min_lat, mut max_lat) = (MIN_LAT, MAX_LAT);
    let mut even_bit = true;
    let mut chunk = 0usize;
    let mut bits = 0u32;

    while out.len() < precision as usize {
        if even_bit {
            let mid = (min_lon + max_lon) / 2.0;
            if lon >= mid {
                chunk = (chunk << 1) | 1;
                min_lon = mid;
            } else {
                chunk <<= 1;
                max_lon = mid;
            }
        } else {
            let mid = (min_lat + max_lat) / 2.0;
            if lat >= mid {
                chunk = (chunk << 1) | 1;
                min_lat = mid;
            } else {
                chunk <<= 1;
                max_lat = mid;
            }
        }
        even_bit = !even_bit;
        bits += 1;
        if bits == 5 {
            out.push(BASE32[chunk] as char);
            bits = 0;
            chunk = 0;
        }
    }
    Ok(out)
}

/// The envelope of a geohash cell.
pub fn bbox_of(hash: &str) -> Result<Rect<f64>> {
    check_precision(hash.len() as u32, MAX_STRING_PRECISION)?;
    let (mut min_lon, mut max_lon) = (MIN_LON, MAX_LON);
    let (mut min_lat, mut max_lat) = (MIN_LAT, MAX_LAT);
    let mut even_bit = true;

    for c in hash.bytes() {
        let v = BASE32_REVERSE[c as usize];
        if v < 0 {
            return Err(GeoTermError::corrupt_term(
                0,
                format!("invalid base-32 character {:?} in geohash {:?}", c as char, hash),
            ));
        }
        for shift in (0..5).rev() {
            let bit = (v >> shift) & 1;
            if even_bit {
                let mid = (min_lon + max_lon) / 2.0;
                if bit == 1 {
                    min_lon = mid;
                } else {
                    max_lon = mid;
                }
            } else {
                let mid = (min_lat + max_lat) / 2.0;
                if bit == 1 {
                    min_lat = mid;
                } else {
                    max_lat = mid;
                }
            }
            even_bit = !even_bit;
        }
    }

    Ok(Rect::new(
        coord! { x: min_lon, y: min_lat },
        coord! { x: max_lon, y: max_lat },
    ))
}

/// Decode a geohash to its cell centre plus the per-axis half-cell error.
pub fn decode(hash: &str) -> Result<DecodedHash> {
    let bbox = bbox_of(hash)?;
    Ok(DecodedHash {
        lat: (bbox.min().y + bbox.max().y) / 2.0,
        lon: (bbox.min().x + bbox.max().x) / 2.0,
        lat_err: (bbox.max().y - bbox.min().y) / 2.0,
        lon_err: (bbox.max().x - bbox.min().x) / 2.0,
    })
}

/// Decode the centre point of a packed geohash.
pub fn decode_long(packed: u64) -> Result<Point<f64>> {
    let d = decode(&string_encode_from_long(packed)?)?;
    Ok(Point::new(d.lon, d.lat))
}

/// The adjacent geohash cell in `direction`, at the same precision.
/// Longitude wraps across the antimeridian; latitude clamps at the poles.
pub fn neighbor(hash: &str, direction: Direction) -> Result<String> {
    let d = decode(hash)?;
    let (dx, dy) = direction.offsets();
    let lon = geom::normalize_lon(d.lon + 2.0 * d.lon_err * dx as f64);
    let lat = geom::clamp_lat(d.lat + 2.0 * d.lat_err * dy as f64);
    string_encode(lat, lon, hash.len() as u32)
}

/// All eight adjacent cells, keyed by direction order `Direction::ALL`.
pub fn neighbors(hash: &str) -> Result<[String; 8]> {
    Ok([
        neighbor(hash, Direction::N)?,
        neighbor(hash, Direction::Ne)?,
        neighbor(hash, Direction::E)?,
        neighbor(hash, Direction::Se)?,
        neighbor(hash, Direction::S)?,
        neighbor(hash, Direction::Sw)?,
        neighbor(hash, Direction::W)?,
        neighbor(hash, Direction::Nw)?,
    ])
}

/// Geohash cell width/height in degrees at a given level.
pub fn geohash_cell_size(level: u32) -> (f64, f64) {
    // Odd characters split longitude 3 times and latitude 2; the split
    // counts per axis after `level` characters:
    let lon_bits = (5 * level).div_ceil(2);
    let lat_bits = (5 * level) / 2;
    (
        360.0 / (1u64 << lon_bits.min(62)) as f64,
        180.0 / (1u64 << lat_bits.min(62)) as f64,
    )
}

/// Quad-tree cell width/height in degrees at a given level.
pub fn quadtree_cell_size(level: u32) -> (f64, f64) {
    (
        360.0 / (1u64 << level.min(62)) as f64,
        180.0 / (1u64 << level.min(62)) as f64,
    )
}

fn cell_diagonal_meters(w_deg: f64, h_deg: f64) -> f64 {
    let w = w_deg / 360.0 * EARTH_EQUATOR_METERS;
    let h = h_deg / 360.0 * EARTH_EQUATOR_METERS;
    (w * w + h * h).sqrt()
}

/// Smallest geohash level whose cell diagonal is at most `meters`.
/// `meters <= 0` asks for the deepest available level.
pub fn geohash_levels_for_precision(meters: f64) -> u32 {
    if meters <= 0.0 {
        return MAX_STRING_PRECISION;
    }
    for level in 1..=MAX_STRING_PRECISION {
        let (w, h) = geohash_cell_size(level);
        if cell_diagonal_meters(w, h) <= meters {
            return level;
        }
    }
    MAX_STRING_PRECISION
}

/// Smallest quad-tree level whose cell diagonal is at most `meters`.
pub fn quadtree_levels_for_precision(meters: f64) -> u32 {
    const MAX: u32 = 31;
    if meters <= 0.0 {
        return MAX;
    }
    for level in 1..=MAX {
        let (w, h) = quadtree_cell_size(level);
        if cell_diagonal_meters(w, h) <= meters {
            return level;
        }
    }
    MAX
}
