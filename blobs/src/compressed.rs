//! Compact storage form of a blob.
//!
//! Runs are stored as `(x0, x1)` pairs of 16 bits each. Rows are implicit: the
//! blob's first row is stored once, and the top bit of `x1` marks the last run
//! of a row, so the following run is on the next row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bid::Bid;
use crate::blob::Blob;
use crate::bounds::Bounds;
use crate::error::{BlobError, Result};
use crate::hline::Line32;

const EOL_BIT: u16 = 0x8000;
const X_MASK: u16 = 0x7FFF;

/// A run without its row, 4 bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShortLine {
    x0: u16,
    /// `x1` in the low 15 bits, end-of-row flag in the top bit.
    x1: u16,
}

impl ShortLine {
    /// # Panics
    ///
    /// If `x1` does not fit in 15 bits.
    pub fn new(x0: u16, x1: u16, eol: bool) -> Self {
        assert!(x1 <= X_MASK, "x1={} does not fit in 15 bits", x1);
        Self {
            x0,
            x1: x1 | if eol { EOL_BIT } else { 0 },
        }
    }

    #[inline]
    pub const fn x0(&self) -> u16 {
        self.x0
    }

    #[inline]
    pub const fn x1(&self) -> u16 {
        self.x1 & X_MASK
    }

    /// True if this is the last run of its row.
    #[inline]
    pub const fn eol(&self) -> bool {
        self.x1 & EOL_BIT != 0
    }

    #[inline]
    pub fn set_eol(&mut self, eol: bool) {
        self.x1 = (self.x1 & X_MASK) | if eol { EOL_BIT } else { 0 };
    }

    /// Drops the rows of sorted runs, flagging the last run of every row.
    ///
    /// Consecutive runs must be on the same or the next row; blobs are
    /// connected, so their rows never skip.
    pub fn compress(lines: &[Line32]) -> Result<Vec<ShortLine>> {
        let mut compressed = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            if let Some(prev) = index.checked_sub(1).map(|i| lines[i]) {
                if line.y() == prev.y() + 1 {
                    if let Some(last) = compressed.last_mut() {
                        ShortLine::set_eol(last, true);
                    }
                } else if line.y() != prev.y() || line.x0() <= prev.x1() {
                    return Err(BlobError::InvalidCompressed {
                        index,
                        reason: "runs must be sorted, disjoint and on consecutive rows",
                    });
                }
            }
            // Line32 coordinates are 12 bits wide
            compressed.push(ShortLine::new(line.x0() as u16, line.x1() as u16, false));
        }
        Ok(compressed)
    }

    /// Restores full runs, starting on row `start_y`.
    pub fn uncompress(start_y: u16, compressed: &[ShortLine]) -> Result<Vec<Line32>> {
        let mut y = u32::from(start_y);
        let mut lines = Vec::with_capacity(compressed.len());
        for (index, short) in compressed.iter().enumerate() {
            if short.x1() < short.x0() {
                return Err(BlobError::InvalidCompressed {
                    index,
                    reason: "x1 is smaller than x0",
                });
            }
            lines.push(Line32::new(
                u32::from(short.x0()),
                u32::from(short.x1()),
                y,
            )?);
            if short.eol() {
                y += 1;
            }
        }
        Ok(lines)
    }
}

impl fmt::Display for ShortLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x0(), self.x1())?;
        if self.eol() {
            write!(f, "|")?;
        }
        Ok(())
    }
}

/// A blob reduced to its runs in [`ShortLine`] form, plus its identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressedBlob {
    /// Row of the first run; every other row is relative to it.
    start_y: u16,
    lines: Vec<ShortLine>,
    own_id: Bid,
}

impl CompressedBlob {
    /// Compresses the sorted runs of `blob` and records its id.
    pub fn from_blob(blob: &Blob) -> Result<Self> {
        let lines = ShortLine::compress(blob.lines())?;
        let start_y = blob.lines().first().map_or(0, |line| line.y() as u16);
        Ok(Self {
            start_y,
            lines,
            own_id: blob.blob_id(),
        })
    }

    #[inline]
    pub fn start_y(&self) -> u16 {
        self.start_y
    }

    #[inline]
    pub fn lines(&self) -> &[ShortLine] {
        &self.lines
    }

    /// Id recorded when the blob was compressed.
    #[inline]
    pub fn blob_id(&self) -> Bid {
        self.own_id
    }

    /// Recomputes the id from the stored runs.
    pub fn reset_id(&mut self) {
        self.own_id = Bid::from_compressed(self);
    }

    pub fn num_pixels(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.x1() - line.x0()) + 1)
            .sum()
    }

    /// Bounding box, without unpacking. Zero-sized for an empty blob.
    pub fn calculate_bounds(&self) -> Bounds {
        if self.lines.is_empty() {
            return Bounds::new(0, u32::from(self.start_y), 0, 0);
        }

        let mut x_min = u16::MAX;
        let mut x_max = 0u16;
        let mut rows = 1u32;
        for line in &self.lines {
            x_min = x_min.min(line.x0());
            x_max = x_max.max(line.x1());
            if line.eol() {
                rows += 1;
            }
        }
        // no row follows the last run
        if self.lines.last().is_some_and(ShortLine::eol) {
            rows -= 1;
        }

        let y_min = u32::from(self.start_y);
        Bounds::from_extents(u32::from(x_min), u32::from(x_max), y_min, y_min + rows - 1)
    }

    /// Rebuilds the full blob. Properties are not computed.
    pub fn unpack(&self) -> Result<Blob> {
        Ok(Blob::new(ShortLine::uncompress(self.start_y, &self.lines)?))
    }
}

impl fmt::Display for CompressedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompressedBlob<{} y:{} lines:{}>",
            self.own_id,
            self.start_y,
            self.lines.len()
        )
    }
}
