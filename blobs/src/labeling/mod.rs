//! Run-based connected component labeling.
//!
//! Takes the foreground runs of one frame, sorted by (y, x0), and groups them
//! into 8-connected blobs:
//! - each row is merged against the previous row with runs
//! - a run touching no builder starts a new one
//! - a run touching two builders joins them (smaller into larger)
//!
//! Builders live in a [`DLList`] that is cleared before and after the pass,
//! so the list's node and builder caches carry over to the next frame.

#[cfg(test)]
mod tests;

use std::ops::Range;

use crate::blob::Blob;
use crate::brototype::Brototype;
use crate::error::{BlobError, Result};
use crate::hline::{HorizontalLine, Line32};
use crate::list::{DLList, ListPool, NodeId};

/// A blob produced by a labeling pass, with its pixels when a pixel buffer was
/// supplied.
#[derive(Debug, Clone)]
pub struct LabeledBlob {
    pub blob: Blob,
    /// Samples of the blob's runs, packed in run order.
    pub pixels: Option<Vec<u8>>,
}

/// One input run while rows are merged.
#[derive(Debug)]
struct Run {
    line: HorizontalLine,
    /// Encodable pieces of the run in `pieces`.
    pieces: Range<usize>,
    node: Option<NodeId>,
}

/// Groups sorted runs into blobs.
///
/// `pixels`, if given, holds the samples of all runs packed in input order
/// and must have exactly one sample per covered pixel. Runs wider than a
/// [`Line32`] span are split into encodable pieces; adjacent pieces are joined
/// again in the output where the joined run still fits.
pub fn label_runs(
    lines: &[HorizontalLine],
    pixels: Option<&[u8]>,
    list: &mut DLList,
) -> Result<Vec<LabeledBlob>> {
    check_sorted(lines)?;
    let (mut runs, pieces) = split_runs(lines)?;

    let total_pixels: usize = pieces.iter().map(|(line, _)| line.len() as usize).sum();
    if let Some(pixels) = pixels {
        if pixels.len() != total_pixels {
            return Err(BlobError::PixelCountMismatch {
                expected: total_pixels,
                actual: pixels.len(),
            });
        }
    }

    list.clear();
    let rows = row_ranges(&runs);
    let mut previous: Option<Range<usize>> = None;
    for row in rows {
        match previous {
            None => {
                for index in row.clone() {
                    let node = start_blob(list, &pieces[runs[index].pieces.clone()]);
                    runs[index].node = Some(node);
                }
            }
            Some(prev) => merge_rows(&mut runs, &pieces, prev, row.clone(), list),
        }
        previous = Some(row);
    }

    let mut blobs = Vec::with_capacity(list.len());
    for id in list.iter() {
        let builder = list.builder(id);
        if builder.is_empty() {
            continue;
        }
        blobs.push(finish_blob(builder, pixels));
    }
    list.clear();

    log::trace!(
        "labeled {} runs ({} pixels) into {} blobs",
        lines.len(),
        total_pixels,
        blobs.len()
    );
    Ok(blobs)
}

/// [`label_runs`] on a list borrowed from `pool` for the duration of the pass.
pub fn label_runs_pooled(
    pool: &ListPool,
    lines: &[HorizontalLine],
    pixels: Option<&[u8]>,
) -> Result<Vec<LabeledBlob>> {
    let mut list = pool.checkout();
    label_runs(lines, pixels, &mut list)
}

fn check_sorted(lines: &[HorizontalLine]) -> Result<()> {
    match lines
        .windows(2)
        .position(|pair| (pair[1].y, pair[1].x0) < (pair[0].y, pair[0].x0))
    {
        Some(position) => Err(BlobError::UnsortedRuns {
            index: position + 1,
        }),
        None => Ok(()),
    }
}

/// Encodes every run, cutting runs wider than the span field into pieces.
/// Each piece carries the offset of its first sample in the packed pixels.
fn split_runs(lines: &[HorizontalLine]) -> Result<(Vec<Run>, Vec<(Line32, usize)>)> {
    let mut runs = Vec::with_capacity(lines.len());
    let mut pieces = Vec::with_capacity(lines.len());
    let mut pixel_start = 0usize;
    let mut split = 0usize;

    for &line in lines {
        if line.x1 < line.x0 {
            return Err(BlobError::InvertedRun {
                x0: line.x0,
                x1: line.x1,
            });
        }

        let first = pieces.len();
        let mut x0 = line.x0;
        loop {
            let x1 = line.x1.min(x0.saturating_add(Line32::MAX_SPAN));
            pieces.push((Line32::new(x0, x1, line.y)?, pixel_start));
            pixel_start += (x1 - x0) as usize + 1;
            if x1 == line.x1 {
                break;
            }
            x0 = x1 + 1;
        }
        if pieces.len() - first > 1 {
            split += 1;
        }

        runs.push(Run {
            line,
            pieces: first..pieces.len(),
            node: None,
        });
    }

    if split > 0 {
        log::debug!(
            "split {} runs wider than {} pixels into {} pieces",
            split,
            Line32::MAX_SPAN + 1,
            pieces.len() - (lines.len() - split)
        );
    }
    Ok((runs, pieces))
}

/// Index ranges of the runs sharing one y.
fn row_ranges(runs: &[Run]) -> Vec<Range<usize>> {
    let mut rows = Vec::new();
    let mut start = 0;
    for index in 1..=runs.len() {
        if index == runs.len() || runs[index].line.y != runs[start].line.y {
            rows.push(start..index);
            start = index;
        }
    }
    rows
}

fn start_blob(list: &mut DLList, pieces: &[(Line32, usize)]) -> NodeId {
    let mut builder = list.take_builder();
    push_pieces(&mut builder, pieces);
    list.insert(builder)
}

#[inline]
fn push_pieces(builder: &mut Brototype, pieces: &[(Line32, usize)]) {
    for &(line, pixel_start) in pieces {
        builder.push(line, pixel_start);
    }
}

/// Connects the runs of `current` to the blobs of `previous`.
///
/// Both rows are walked left to right; after an overlap, the run that ends
/// first is advanced since the other one may still touch the next run.
fn merge_rows(
    runs: &mut [Run],
    pieces: &[(Line32, usize)],
    previous: Range<usize>,
    current: Range<usize>,
    list: &mut DLList,
) {
    let mut p = previous.start;
    let mut c = current.start;

    while c < current.end {
        let cl = runs[c].line;
        let disconnected = p == previous.end
            || cl.y > runs[p].line.y + 1
            || cl.x1.saturating_add(1) < runs[p].line.x0;

        if disconnected {
            if runs[c].node.is_none() {
                runs[c].node = Some(start_blob(list, &pieces[runs[c].pieces.clone()]));
            }
            c += 1;
            continue;
        }

        let pl = runs[p].line;
        if cl.x0 > pl.x1.saturating_add(1) {
            p += 1;
            continue;
        }

        let pnode = runs[p]
            .node
            .expect("runs of an earlier row always belong to a blob");
        match runs[c].node {
            None => {
                push_pieces(list.builder_mut(pnode), &pieces[runs[c].pieces.clone()]);
                runs[c].node = Some(pnode);
            }
            Some(cnode) if cnode != pnode => {
                let (keep, gone) = if list.builder(pnode).len() <= list.builder(cnode).len() {
                    (cnode, pnode)
                } else {
                    (pnode, cnode)
                };
                list.absorb(keep, gone);
                // previous and current are adjacent ranges of `runs`
                for run in &mut runs[p..current.end] {
                    if run.node == Some(gone) {
                        run.node = Some(keep);
                    }
                }
            }
            Some(_) => {}
        }

        if cl.x1 <= pl.x1 {
            c += 1;
        } else {
            p += 1;
        }
    }
}

/// Copies a finished builder into a blob, joining runs that continue each
/// other on the same row.
fn finish_blob(builder: &Brototype, pixels: Option<&[u8]>) -> LabeledBlob {
    let mut lines: Vec<Line32> = Vec::with_capacity(builder.len());
    let mut packed = pixels.map(|_| Vec::with_capacity(builder.num_pixels()));

    for (line, pixel_start) in builder.iter() {
        let joined = lines.last_mut().is_some_and(|last| {
            last.y() == line.y() && last.x1() + 1 == line.x0() && last.set_x1(line.x1()).is_ok()
        });
        if !joined {
            lines.push(line);
        }

        if let (Some(src), Some(dst)) = (pixels, packed.as_mut()) {
            let end = pixel_start + line.len() as usize;
            dst.extend_from_slice(&src[pixel_start..end]);
        }
    }

    LabeledBlob {
        blob: Blob::new(lines),
        pixels: packed,
    }
}
