//! In-progress blob builder used during a labeling pass.

use crate::hline::Line32;

/// Minimum number of entries reserved when a builder has to grow.
const MIN_RESERVE: usize = 64;

/// Accumulates the runs of one blob while rows are being merged.
///
/// Each run is paired with the offset of its first sample in the caller's
/// packed pixel buffer. Runs are kept in (y, x0) order. Builders are recycled
/// through [`DLList`](crate::list::DLList); [`Brototype::clear`] keeps the
/// allocations.
#[derive(Debug, Clone, Default)]
pub struct Brototype {
    lines: Vec<Line32>,
    pixel_starts: Vec<usize>,
}

#[inline]
fn push_growing<T>(vec: &mut Vec<T>, value: T) {
    if vec.len() == vec.capacity() {
        vec.reserve(MIN_RESERVE.max(vec.len()));
    }
    vec.push(value);
}

impl Brototype {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(line: Line32, pixel_start: usize) -> Self {
        let mut broto = Self::new();
        broto.push(line, pixel_start);
        broto
    }

    #[inline]
    pub fn push(&mut self, line: Line32, pixel_start: usize) {
        debug_assert!(
            self.lines.last().is_none_or(|last| *last <= line),
            "runs must be pushed in (y, x0) order"
        );
        push_growing(&mut self.lines, line);
        push_growing(&mut self.pixel_starts, pixel_start);
    }

    #[inline]
    pub fn lines(&self) -> &[Line32] {
        &self.lines
    }

    #[inline]
    pub fn pixel_starts(&self) -> &[usize] {
        &self.pixel_starts
    }

    /// Runs paired with their pixel offsets.
    pub fn iter(&self) -> impl Iterator<Item = (Line32, usize)> + '_ {
        self.lines
            .iter()
            .copied()
            .zip(self.pixel_starts.iter().copied())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of pixels covered by the runs.
    pub fn num_pixels(&self) -> usize {
        self.lines.iter().map(|line| line.len() as usize).sum()
    }

    /// Drops all runs, keeping capacity for reuse.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.pixel_starts.clear();
    }

    /// Moves all runs of `other` into `self`, keeping (y, x0) order.
    ///
    /// `other` is left empty.
    pub fn merge_with(&mut self, other: &mut Brototype) {
        if other.is_empty() {
            return;
        }

        let appends = match (self.lines.last(), other.lines.first()) {
            (None, _) => true,
            (Some(last), Some(first)) => last < first,
            (Some(_), None) => unreachable!(),
        };
        if appends {
            self.lines.append(&mut other.lines);
            self.pixel_starts.append(&mut other.pixel_starts);
            return;
        }

        let total = self.lines.len() + other.lines.len();
        let mut lines = Vec::with_capacity(total);
        let mut pixel_starts = Vec::with_capacity(total);

        let (mut i, mut j) = (0, 0);
        while i < self.lines.len() || j < other.lines.len() {
            let take_other = i == self.lines.len()
                || (j < other.lines.len() && other.lines[j] < self.lines[i]);
            if take_other {
                lines.push(other.lines[j]);
                pixel_starts.push(other.pixel_starts[j]);
                j += 1;
            } else {
                lines.push(self.lines[i]);
                pixel_starts.push(self.pixel_starts[i]);
                i += 1;
            }
        }

        self.lines = lines;
        self.pixel_starts = pixel_starts;
        other.clear();
    }
}
