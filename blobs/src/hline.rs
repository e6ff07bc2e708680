//! Bit-packed horizontal runs.
//!
//! A run `(x0, x1, y)` is stored in a single integer word:
//!
//! ```text
//!  msb                                             lsb
//! |   y (BIG bits)   |   x0 (BIG bits)   | span (SMALL bits) |
//! ```
//!
//! The span is `x1 - x0`; `x1` itself is never stored. Because `y` sits above
//! `x0`, comparing the masked words orders runs top-to-bottom, left-to-right.
//! The layout is plain integer arithmetic, so the packed value is independent
//! of endianness and can be persisted as-is.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BlobError, Result};

/// Unpacked run record used to exchange runs with callers.
///
/// Ordering is by `y`, then `x0`, then `x1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HorizontalLine {
    pub x0: u32,
    pub x1: u32,
    pub y: u32,
}

impl HorizontalLine {
    pub const fn new(x0: u32, x1: u32, y: u32) -> Self {
        Self { x0, x1, y }
    }

    /// Number of pixels covered by the run; 0 for an inverted run.
    #[inline]
    pub const fn len(&self) -> u32 {
        if self.x1 < self.x0 {
            return 0;
        }
        (self.x1 - self.x0).saturating_add(1)
    }

    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        y == self.y && x >= self.x0 && x <= self.x1
    }

    /// True if the runs touch or overlap horizontally (8-connectivity).
    #[inline]
    pub const fn overlap_x(&self, other: &HorizontalLine) -> bool {
        other.x1.saturating_add(1) >= self.x0 && other.x0 <= self.x1.saturating_add(1)
    }
}

impl Ord for HorizontalLine {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x0, self.x1).cmp(&(other.y, other.x0, other.x1))
    }
}

impl PartialOrd for HorizontalLine {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HorizontalLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HL<y:{} x:{}-{}>", self.y, self.x0, self.x1)
    }
}

/// A run packed into one word with `BIG` bits for `x0` and `y` and `SMALL`
/// bits for the span.
///
/// Construction and mutation validate every field; values are never
/// truncated. Both ends of a run lie in `0..=MAX_COORD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HLine<const BIG: u32 = 12, const SMALL: u32 = 8> {
    packed: u64,
}

/// 12-bit coordinates, 8-bit span. Fits in 32 bits; this is the layout used
/// for stored runs.
pub type Line32 = HLine<12, 8>;
/// 24-bit coordinates, 16-bit span.
pub type Line64 = HLine<24, 16>;

impl<const BIG: u32, const SMALL: u32> HLine<BIG, SMALL> {
    const GEOMETRY: () = assert!(
        BIG > 0 && BIG <= 31 && SMALL > 0 && SMALL <= 31 && 2 * BIG + SMALL <= 64,
        "HLine fields must be 1..=31 bits wide and fit in 64 bits"
    );

    pub const OFFSET_SPAN: u32 = 0;
    pub const OFFSET_X0: u32 = SMALL;
    pub const OFFSET_Y: u32 = SMALL + BIG;

    /// Largest storable `x0`, `x1` and `y`.
    pub const MAX_COORD: u32 = ((1u64 << BIG) - 1) as u32;
    /// Largest storable `x1 - x0`.
    pub const MAX_SPAN: u32 = ((1u64 << SMALL) - 1) as u32;

    const MASK_SPAN: u64 = (Self::MAX_SPAN as u64) << Self::OFFSET_SPAN;
    const MASK_X0: u64 = (Self::MAX_COORD as u64) << Self::OFFSET_X0;
    const MASK_Y: u64 = (Self::MAX_COORD as u64) << Self::OFFSET_Y;
    const MASK_ORDER: u64 = Self::MASK_Y | Self::MASK_X0;
    const MASK_ALL: u64 = Self::MASK_Y | Self::MASK_X0 | Self::MASK_SPAN;

    /// Packs `(x0, x1, y)`.
    pub fn new(x0: u32, x1: u32, y: u32) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Self::GEOMETRY;

        if x1 < x0 {
            return Err(BlobError::InvertedRun { x0, x1 });
        }
        Self::check_coord_x0(x0)?;
        Self::check_coord_x1(x1)?;
        Self::check_coord_y(y)?;
        Self::check_span(x0, x1)?;

        let line = Self {
            packed: Self::pack(x0, x1 - x0, y),
        };
        debug_assert_eq!((line.x0(), line.x1(), line.y()), (x0, x1, y));
        Ok(line)
    }

    /// Rebuilds a run from its packed word.
    pub fn from_packed(packed: u64) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Self::GEOMETRY;

        if packed & !Self::MASK_ALL != 0 {
            return Err(BlobError::InvalidPacked { packed });
        }
        let line = Self { packed };
        if line.x0() as u64 + line.span() as u64 > Self::MAX_COORD as u64 {
            return Err(BlobError::InvalidPacked { packed });
        }
        Ok(line)
    }

    #[inline]
    const fn pack(x0: u32, span: u32, y: u32) -> u64 {
        ((y as u64) << Self::OFFSET_Y)
            | ((x0 as u64) << Self::OFFSET_X0)
            | ((span as u64) << Self::OFFSET_SPAN)
    }

    fn check_coord_x0(x0: u32) -> Result<()> {
        if x0 > Self::MAX_COORD {
            return Err(BlobError::X0OutOfRange { x0, bits: BIG });
        }
        Ok(())
    }

    fn check_coord_x1(x1: u32) -> Result<()> {
        if x1 > Self::MAX_COORD {
            return Err(BlobError::X1OutOfRange { x1, bits: BIG });
        }
        Ok(())
    }

    fn check_coord_y(y: u32) -> Result<()> {
        if y > Self::MAX_COORD {
            return Err(BlobError::YOutOfRange { y, bits: BIG });
        }
        Ok(())
    }

    fn check_span(x0: u32, x1: u32) -> Result<()> {
        let span = x1 - x0;
        if span > Self::MAX_SPAN {
            return Err(BlobError::SpanOutOfRange {
                x0,
                x1,
                span,
                bits: SMALL,
            });
        }
        Ok(())
    }

    #[inline]
    pub const fn packed(&self) -> u64 {
        self.packed
    }

    #[inline]
    pub const fn x0(&self) -> u32 {
        ((self.packed & Self::MASK_X0) >> Self::OFFSET_X0) as u32
    }

    #[inline]
    pub const fn span(&self) -> u32 {
        ((self.packed & Self::MASK_SPAN) >> Self::OFFSET_SPAN) as u32
    }

    #[inline]
    pub const fn x1(&self) -> u32 {
        self.x0() + self.span()
    }

    #[inline]
    pub const fn y(&self) -> u32 {
        ((self.packed & Self::MASK_Y) >> Self::OFFSET_Y) as u32
    }

    /// Number of pixels covered by the run.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.span() + 1
    }

    /// Moves the left end, keeping `x1` and `y`.
    pub fn set_x0(&mut self, x0: u32) -> Result<()> {
        Self::check_coord_x0(x0)?;
        let x1 = self.x1();
        if x0 > x1 {
            return Err(BlobError::InvertedRun { x0, x1 });
        }
        Self::check_span(x0, x1)?;
        self.packed = Self::pack(x0, x1 - x0, self.y());
        Ok(())
    }

    /// Moves the right end, keeping `x0` and `y`.
    pub fn set_x1(&mut self, x1: u32) -> Result<()> {
        let x0 = self.x0();
        if x1 < x0 {
            return Err(BlobError::InvertedRun { x0, x1 });
        }
        Self::check_coord_x1(x1)?;
        Self::check_span(x0, x1)?;
        self.packed = (self.packed & Self::MASK_ORDER) | ((x1 - x0) as u64) << Self::OFFSET_SPAN;
        Ok(())
    }

    pub fn set_y(&mut self, y: u32) -> Result<()> {
        Self::check_coord_y(y)?;
        self.packed = (self.packed & !Self::MASK_Y) | (y as u64) << Self::OFFSET_Y;
        Ok(())
    }

    /// True if the runs touch or overlap horizontally (8-connectivity).
    #[inline]
    pub const fn overlap_x(&self, other: &Self) -> bool {
        other.x1() + 1 >= self.x0() && other.x0() <= self.x1() + 1
    }

    #[inline]
    pub const fn to_horizontal(&self) -> HorizontalLine {
        HorizontalLine::new(self.x0(), self.x1(), self.y())
    }
}

impl<const BIG: u32, const SMALL: u32> Ord for HLine<BIG, SMALL> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.packed & Self::MASK_ORDER)
            .cmp(&(other.packed & Self::MASK_ORDER))
            .then_with(|| self.span().cmp(&other.span()))
    }
}

impl<const BIG: u32, const SMALL: u32> PartialOrd for HLine<BIG, SMALL> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const BIG: u32, const SMALL: u32> TryFrom<HorizontalLine> for HLine<BIG, SMALL> {
    type Error = BlobError;

    fn try_from(line: HorizontalLine) -> Result<Self> {
        Self::new(line.x0, line.x1, line.y)
    }
}

impl<const BIG: u32, const SMALL: u32> From<HLine<BIG, SMALL>> for HorizontalLine {
    fn from(line: HLine<BIG, SMALL>) -> Self {
        line.to_horizontal()
    }
}

impl<const BIG: u32, const SMALL: u32> fmt::Display for HLine<BIG, SMALL> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HLine<{};{},{}>", self.y(), self.x0(), self.x1())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_constants() {
        assert_eq!(Line32::MAX_COORD, 4095);
        assert_eq!(Line32::MAX_SPAN, 255);
        assert_eq!(Line32::OFFSET_X0, 8);
        assert_eq!(Line32::OFFSET_Y, 20);
        assert_eq!(Line64::MAX_COORD, (1 << 24) - 1);
        assert_eq!(Line64::MAX_SPAN, u16::MAX as u32);
    }

    #[test]
    fn round_trip_at_field_edges() {
        for &(x0, x1, y) in &[
            (0, 0, 0),
            (10, 20, 5),
            (4095, 4095, 4095),
            (3840, 4095, 0),
            (0, 255, 4095),
            (1000, 1001, 2000),
        ] {
            let line = HLine::<12, 8>::new(x0, x1, y).unwrap();
            assert_eq!((line.x0(), line.x1(), line.y()), (x0, x1, y));
            assert_eq!(line.len(), x1 - x0 + 1);
        }
    }

    #[test]
    fn packed_layout_is_y_x0_span() {
        let line = Line32::new(0x123, 0x123 + 0x45, 0x678).unwrap();
        assert_eq!(line.packed(), 0x678_123_45);
        assert_eq!(Line32::from_packed(0x678_123_45).unwrap(), line);
    }

    #[test]
    fn from_packed_rejects_stray_bits() {
        assert_eq!(
            Line32::from_packed(1 << 40),
            Err(BlobError::InvalidPacked { packed: 1 << 40 })
        );
    }

    #[test]
    fn from_packed_rejects_right_end_past_range() {
        // x0=4000, span=200
        let packed = (4000u64 << 8) | 200;
        assert_eq!(
            Line32::from_packed(packed),
            Err(BlobError::InvalidPacked { packed })
        );
        let edge = Line32::from_packed((3840u64 << 8) | 255).unwrap();
        assert_eq!(edge.x1(), Line32::MAX_COORD);
    }

    #[test]
    fn construction_rejects_out_of_range() {
        assert_eq!(
            Line32::new(5, 4, 0),
            Err(BlobError::InvertedRun { x0: 5, x1: 4 })
        );
        assert_eq!(
            Line32::new(4096, 4096, 0),
            Err(BlobError::X0OutOfRange { x0: 4096, bits: 12 })
        );
        assert_eq!(
            Line32::new(0, 0, 4096),
            Err(BlobError::YOutOfRange { y: 4096, bits: 12 })
        );
        assert!(matches!(
            Line32::new(0, 256, 0),
            Err(BlobError::SpanOutOfRange { span: 256, .. })
        ));
        // the span fits but the right end would leave the coordinate range
        assert_eq!(
            Line32::new(4000, 4200, 0),
            Err(BlobError::X1OutOfRange { x1: 4200, bits: 12 })
        );
        // a wide run that is fine with a larger small field
        assert!(Line64::new(0, 256, 0).is_ok());
    }

    #[test]
    fn try_from_horizontal_line() {
        let line = Line32::try_from(HorizontalLine::new(3, 9, 2)).unwrap();
        assert_eq!(HorizontalLine::from(line), HorizontalLine::new(3, 9, 2));
        assert!(Line32::try_from(HorizontalLine::new(0, 300, 2)).is_err());
    }

    #[test]
    fn set_x0_keeps_x1_and_y() {
        let mut line = Line32::new(10, 20, 5).unwrap();
        line.set_x0(15).unwrap();
        assert_eq!((line.x0(), line.x1(), line.y()), (15, 20, 5));

        assert_eq!(
            line.set_x0(21),
            Err(BlobError::InvertedRun { x0: 21, x1: 20 })
        );
        // growing the span past the small field fails and leaves the run intact
        let mut wide = Line32::new(300, 300, 1).unwrap();
        assert!(wide.set_x0(10).is_err());
        assert_eq!((wide.x0(), wide.x1()), (300, 300));
    }

    #[test]
    fn set_x1_revalidates_span() {
        let mut line = Line32::new(10, 20, 5).unwrap();
        line.set_x1(265).unwrap();
        assert_eq!((line.x0(), line.x1(), line.y()), (10, 265, 5));
        assert!(line.set_x1(266).is_err());
        assert_eq!(line.set_x1(9), Err(BlobError::InvertedRun { x0: 10, x1: 9 }));
        assert_eq!(line.x1(), 265);

        let mut edge = Line32::new(4000, 4095, 0).unwrap();
        assert_eq!(
            edge.set_x1(4096),
            Err(BlobError::X1OutOfRange { x1: 4096, bits: 12 })
        );
        assert_eq!(edge.x1(), 4095);
    }

    #[test]
    fn set_y_keeps_x() {
        let mut line = Line32::new(10, 20, 5).unwrap();
        line.set_y(4095).unwrap();
        assert_eq!((line.x0(), line.x1(), line.y()), (10, 20, 4095));
        assert!(line.set_y(4096).is_err());
        assert_eq!(line.y(), 4095);
    }

    #[test]
    fn ordering_is_row_major() {
        let upper_right = Line32::new(4000, 4001, 1).unwrap();
        let lower_left = Line32::new(0, 0, 2).unwrap();
        assert!(upper_right < lower_left);

        let left = Line32::new(3, 9, 7).unwrap();
        let right = Line32::new(4, 5, 7).unwrap();
        assert!(left < right);

        let mut lines = vec![lower_left, right, upper_right, left];
        lines.sort();
        assert_eq!(lines, vec![upper_right, lower_left, left, right]);
    }

    #[test]
    fn overlap_x_includes_touching_runs() {
        let a = Line32::new(10, 20, 0).unwrap();
        assert!(a.overlap_x(&Line32::new(21, 30, 1).unwrap()));
        assert!(a.overlap_x(&Line32::new(0, 9, 1).unwrap()));
        assert!(a.overlap_x(&Line32::new(12, 14, 1).unwrap()));
        assert!(!a.overlap_x(&Line32::new(22, 30, 1).unwrap()));
        assert!(!a.overlap_x(&Line32::new(0, 8, 1).unwrap()));

        let at_zero = Line32::new(0, 0, 0).unwrap();
        assert!(at_zero.overlap_x(&Line32::new(1, 1, 1).unwrap()));
    }

    #[test]
    fn horizontal_line_len_and_overlap_at_extremes() {
        assert_eq!(HorizontalLine::new(3, 9, 0).len(), 7);
        assert_eq!(HorizontalLine::new(9, 3, 0).len(), 0);
        assert_eq!(HorizontalLine::new(0, u32::MAX, 0).len(), u32::MAX);

        let far = HorizontalLine::new(u32::MAX - 1, u32::MAX, 0);
        assert!(far.overlap_x(&HorizontalLine::new(u32::MAX, u32::MAX, 1)));
        assert!(far.overlap_x(&HorizontalLine::new(0, u32::MAX - 2, 1)));
        assert!(!far.overlap_x(&HorizontalLine::new(0, u32::MAX - 3, 1)));
    }

    #[test]
    fn display_format() {
        let line = Line32::new(10, 20, 5).unwrap();
        assert_eq!(line.to_string(), "HLine<5;10,20>");
    }
}
