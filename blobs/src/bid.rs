//! Arithmetic blob identity.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::blob::Blob;
use crate::compressed::CompressedBlob;
use crate::error::{BlobError, Result};

const COORD_BITS: u32 = 12;
const COORD_MASK: u32 = (1 << COORD_BITS) - 1;
const COUNT_MASK: u32 = 0xFF;
const X_OFFSET: u32 = 20;
const Y_OFFSET: u32 = 8;

/// A 32-bit blob identifier derived from the blob's first run and run count.
///
/// ```text
/// | avg x (12) | y0 (12) | run count (8) |
/// ```
///
/// The id is lossy: two blobs that share first-run centre, first row and run
/// count (mod 256) get the same id. Callers that need exact identity must keep
/// the blob itself.
///
/// Ordering is only defined between valid ids. `cmp` panics if either side is
/// [`Bid::INVALID`]; use [`Bid::try_cmp`] to get an error instead. Equality and
/// hashing compare the raw value and are always defined.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Bid(u32);

impl Bid {
    pub const INVALID: Bid = Bid(u32::MAX);

    /// Packs the identity from a first run `(x0, x1, y0)` and `n` runs.
    ///
    /// `x0`, `x1` and `y0` must fit in 12 bits and `x1 >= x0`; this is only
    /// checked in debug builds. `n` is truncated to its low 8 bits.
    ///
    /// `from_data(4095, 4095, 4095, 255)` packs to `u32::MAX` and is therefore
    /// indistinguishable from [`Bid::INVALID`].
    #[inline]
    pub fn from_data(x0: u32, x1: u32, y0: u32, n: usize) -> Bid {
        debug_assert!(x0 <= COORD_MASK, "x0={} does not fit in 12 bits", x0);
        debug_assert!(x1 <= COORD_MASK, "x1={} does not fit in 12 bits", x1);
        debug_assert!(y0 <= COORD_MASK, "y0={} does not fit in 12 bits", y0);
        debug_assert!(x1 >= x0, "x1={} is smaller than x0={}", x1, x0);

        let center = x0 + (x1 - x0) / 2;
        Bid(((center & COORD_MASK) << X_OFFSET)
            | ((y0 & COORD_MASK) << Y_OFFSET)
            | (n as u32 & COUNT_MASK))
    }

    /// Identity of a blob; invalid if the blob has no runs.
    ///
    /// The runs must already be sorted. [`Line32`](crate::hline::Line32) keeps
    /// both run ends within 12 bits, so any first run is accepted.
    pub fn from_blob(blob: &Blob) -> Bid {
        match blob.lines().first() {
            Some(first) => Self::from_data(first.x0(), first.x1(), first.y(), blob.lines().len()),
            None => Self::INVALID,
        }
    }

    /// Identity of a compressed blob; matches [`Bid::from_blob`] on the
    /// unpacked blob.
    pub fn from_compressed(blob: &CompressedBlob) -> Bid {
        match blob.lines().first() {
            Some(first) => Self::from_data(
                first.x0() as u32,
                first.x1() as u32,
                blob.start_y() as u32,
                blob.lines().len(),
            ),
            None => Self::INVALID,
        }
    }

    #[inline]
    pub const fn valid(&self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Approximate position encoded in the id: centre of the first run and
    /// its row.
    pub fn calc_position(&self) -> Vec2 {
        let x = (self.0 >> X_OFFSET) & COORD_MASK;
        let y = (self.0 >> Y_OFFSET) & COORD_MASK;
        Vec2::new(x as f32, y as f32)
    }

    /// Run count stored in the id (mod 256).
    #[inline]
    pub const fn run_count(&self) -> u32 {
        self.0 & COUNT_MASK
    }

    /// Compares two ids, failing if either is invalid.
    pub fn try_cmp(&self, other: &Bid) -> Result<Ordering> {
        if !self.valid() || !other.valid() {
            return Err(BlobError::InvalidBid);
        }
        Ok(self.0.cmp(&other.0))
    }
}

impl Default for Bid {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<u32> for Bid {
    fn from(value: u32) -> Self {
        Bid(value)
    }
}

impl From<Bid> for u32 {
    fn from(id: Bid) -> Self {
        id.0
    }
}

impl Ord for Bid {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.try_cmp(other) {
            Ok(ordering) => ordering,
            Err(_) => panic!(
                "comparing blob ids {} and {}: ordering is only defined between valid ids",
                self, other
            ),
        }
    }
}

impl PartialOrd for Bid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("null")
        }
    }
}

impl fmt::Debug for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bid({})", self)
    }
}

impl FromStr for Bid {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "null" {
            return Ok(Self::INVALID);
        }
        s.parse::<u32>()
            .map(Bid)
            .map_err(|_| BlobError::ParseBid(s.to_string()))
    }
}

impl Serialize for Bid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.valid() {
            serializer.serialize_u32(self.0)
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de> Deserialize<'de> for Bid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Option::<u32>::deserialize(deserializer)?;
        Ok(value.map_or(Self::INVALID, Bid))
    }
}
