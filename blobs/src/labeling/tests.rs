use common::log_setup::setup_logging;
use rand::prelude::*;

use super::*;
use crate::bid::Bid;

fn hl(x0: u32, x1: u32, y: u32) -> HorizontalLine {
    HorizontalLine::new(x0, x1, y)
}

fn line(x0: u32, x1: u32, y: u32) -> Line32 {
    Line32::new(x0, x1, y).unwrap()
}

fn label(lines: &[HorizontalLine]) -> Vec<LabeledBlob> {
    let mut list = DLList::new();
    label_runs(lines, None, &mut list).unwrap()
}

fn runs_from_mask(mask: &[bool], width: usize) -> Vec<HorizontalLine> {
    let mut runs = Vec::new();
    for (y, row) in mask.chunks(width).enumerate() {
        let mut x = 0;
        while x < width {
            if !row[x] {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && row[x] {
                x += 1;
            }
            runs.push(hl(start as u32, x as u32 - 1, y as u32));
        }
    }
    runs
}

/// Reference labeling by flood fill with 8-connectivity.
fn count_components(mask: &[bool], width: usize, height: usize) -> usize {
    let mut seen = vec![false; mask.len()];
    let mut count = 0;
    for start in 0..mask.len() {
        if !mask[start] || seen[start] {
            continue;
        }
        count += 1;
        seen[start] = true;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            let (x, y) = ((i % width) as i64, (i / width) as i64);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    let n = ny as usize * width + nx as usize;
                    if mask[n] && !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
    }
    count
}

#[test]
fn empty_input_yields_no_blobs() {
    assert!(label(&[]).is_empty());
}

#[test]
fn separate_runs_make_separate_blobs() {
    let blobs = label(&[hl(0, 2, 0), hl(10, 12, 0), hl(0, 2, 1)]);
    assert_eq!(blobs.len(), 2);
    assert_eq!(blobs[0].blob.lines(), &[line(0, 2, 0), line(0, 2, 1)]);
    assert_eq!(blobs[1].blob.lines(), &[line(10, 12, 0)]);
    assert!(blobs.iter().all(|b| b.pixels.is_none()));
}

#[test]
fn u_shape_merges_into_one_blob() {
    // ##..##
    // ##..##
    // ######
    let blobs = label(&[
        hl(0, 1, 0),
        hl(4, 5, 0),
        hl(0, 1, 1),
        hl(4, 5, 1),
        hl(0, 5, 2),
    ]);
    assert_eq!(blobs.len(), 1);
    let blob = &blobs[0].blob;
    assert!(blob.is_sorted());
    assert_eq!(
        blob.lines(),
        &[
            line(0, 1, 0),
            line(4, 5, 0),
            line(0, 1, 1),
            line(4, 5, 1),
            line(0, 5, 2),
        ]
    );
}

#[test]
fn comb_merges_every_tooth() {
    let blobs = label(&[
        hl(0, 0, 0),
        hl(2, 2, 0),
        hl(4, 4, 0),
        hl(6, 6, 0),
        hl(0, 6, 1),
    ]);
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].blob.lines().len(), 5);
}

#[test]
fn diagonal_neighbours_are_connected() {
    assert_eq!(label(&[hl(0, 0, 0), hl(1, 1, 1)]).len(), 1);
    assert_eq!(label(&[hl(5, 5, 0), hl(4, 4, 1)]).len(), 1);
    assert_eq!(label(&[hl(0, 0, 0), hl(2, 2, 1)]).len(), 2);
}

#[test]
fn row_gap_separates_blobs() {
    let blobs = label(&[hl(0, 3, 0), hl(0, 3, 2)]);
    assert_eq!(blobs.len(), 2);
}

#[test]
fn unsorted_input_is_rejected() {
    let mut list = DLList::new();
    assert_eq!(
        label_runs(&[hl(0, 1, 1), hl(0, 1, 0)], None, &mut list).unwrap_err(),
        BlobError::UnsortedRuns { index: 1 }
    );
    assert_eq!(
        label_runs(&[hl(5, 6, 0), hl(0, 1, 0)], None, &mut list).unwrap_err(),
        BlobError::UnsortedRuns { index: 1 }
    );
}

#[test]
fn unencodable_run_is_rejected() {
    let mut list = DLList::new();
    assert!(matches!(
        label_runs(&[hl(0, 1, 5000)], None, &mut list),
        Err(BlobError::YOutOfRange { y: 5000, .. })
    ));
    assert!(matches!(
        label_runs(&[hl(4, 1, 0)], None, &mut list),
        Err(BlobError::InvertedRun { x0: 4, x1: 1 })
    ));
    assert_eq!(
        label_runs(&[hl(4000, 4200, 0)], None, &mut list).unwrap_err(),
        BlobError::X1OutOfRange { x1: 4200, bits: 12 }
    );
}

#[test]
fn run_ending_at_right_edge_gets_an_id() {
    let mut blobs = label(&[hl(3000, 4095, 9), hl(4095, 4095, 10)]);
    assert_eq!(blobs.len(), 1);
    let blob = &mut blobs[0].blob;
    assert_eq!(blob.lines().last().map(|l| l.x1()), Some(4095));
    blob.calculate_properties().unwrap();
    assert!(Bid::from_blob(blob).valid());
}

#[test]
fn pixel_count_must_match_runs() {
    let mut list = DLList::new();
    assert_eq!(
        label_runs(&[hl(0, 3, 0)], Some(&[1u8, 2, 3][..]), &mut list).unwrap_err(),
        BlobError::PixelCountMismatch {
            expected: 4,
            actual: 3
        }
    );
}

#[test]
fn pixels_are_packed_per_blob_in_run_order() {
    // row 0: A A . . . B
    // row 1: A
    let lines = [hl(0, 1, 0), hl(5, 5, 0), hl(0, 0, 1)];
    let pixels = [1u8, 2, 3, 4];
    let mut list = DLList::new();
    let blobs = label_runs(&lines, Some(&pixels[..]), &mut list).unwrap();

    assert_eq!(blobs.len(), 2);
    assert_eq!(blobs[0].blob.lines(), &[line(0, 1, 0), line(0, 0, 1)]);
    assert_eq!(blobs[0].pixels.as_deref(), Some(&[1u8, 2, 4][..]));
    assert_eq!(blobs[1].pixels.as_deref(), Some(&[3u8][..]));
}

#[test]
fn wide_runs_are_split_into_encodable_pieces() {
    setup_logging("debug").unwrap();
    let width = 600;
    let pixels: Vec<u8> = (0..width).map(|x| x as u8).collect();
    let mut list = DLList::new();
    let blobs = label_runs(&[hl(0, width - 1, 3)], Some(pixels.as_slice()), &mut list).unwrap();

    assert_eq!(blobs.len(), 1);
    let mut blob = blobs[0].blob.clone();
    assert_eq!(
        blob.lines(),
        &[line(0, 255, 3), line(256, 511, 3), line(512, 599, 3)]
    );
    blob.calculate_properties().unwrap();
    assert_eq!(blob.num_pixels(), width as u64);
    assert_eq!(blobs[0].pixels.as_deref(), Some(pixels.as_slice()));
}

#[test]
fn touching_pieces_are_joined_when_they_fit() {
    // two runs meeting on row 0, held together by row 1
    let blobs = label(&[hl(0, 4, 0), hl(5, 9, 0), hl(0, 9, 1)]);
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].blob.lines(), &[line(0, 9, 0), line(0, 9, 1)]);
}

#[test]
fn list_is_cleared_and_recycled() {
    let lines = [hl(0, 1, 0), hl(4, 5, 0), hl(0, 5, 1), hl(9, 9, 1)];
    let mut list = DLList::new();
    let first = label_runs(&lines, None, &mut list).unwrap();
    assert!(list.is_empty());
    // three blobs were started, one was absorbed on row 1 and its builder
    // went straight to the run (9, 9, 1): one builder fewer than shells
    let cached = list.cached_nodes();
    assert_eq!(cached, 3);
    assert_eq!(list.cached_builders(), 2);
    assert!(list.cached_builders() <= cached);

    let second = label_runs(&lines, None, &mut list).unwrap();
    assert_eq!(list.capacity(), cached);
    let lines_of = |blobs: &[LabeledBlob]| -> Vec<Vec<Line32>> {
        blobs.iter().map(|b| b.blob.lines().to_vec()).collect()
    };
    assert_eq!(lines_of(&first), lines_of(&second));
}

#[test]
fn pooled_labeling_returns_list() {
    let pool = ListPool::new();
    let blobs = label_runs_pooled(&pool, &[hl(0, 1, 0), hl(3, 4, 0)], None).unwrap();
    assert_eq!(blobs.len(), 2);
    assert_eq!(pool.live_lists(), 0);
    assert_eq!(pool.len(), 1);

    assert!(label_runs_pooled(&pool, &[hl(3, 4, 0), hl(0, 1, 0)], None).is_err());
    assert_eq!(pool.live_lists(), 0);
}

#[test]
fn random_masks_match_flood_fill() {
    setup_logging("debug").unwrap();
    let (width, height) = (48usize, 32usize);
    let mut rng = StdRng::seed_from_u64(7);
    let mut list = DLList::new();

    for density in [0.2, 0.45, 0.6] {
        for _ in 0..10 {
            let mask: Vec<bool> = (0..width * height)
                .map(|_| rng.random_bool(density))
                .collect();
            let runs = runs_from_mask(&mask, width);
            let blobs = label_runs(&runs, None, &mut list).unwrap();

            assert_eq!(blobs.len(), count_components(&mask, width, height));

            let mut owner = vec![usize::MAX; mask.len()];
            for (index, labeled) in blobs.iter().enumerate() {
                assert!(labeled.blob.is_sorted());
                for l in labeled.blob.lines() {
                    for x in l.x0()..=l.x1() {
                        let i = l.y() as usize * width + x as usize;
                        assert!(mask[i]);
                        assert_eq!(owner[i], usize::MAX, "pixel in two blobs");
                        owner[i] = index;
                    }
                }
            }
            assert!(mask
                .iter()
                .zip(&owner)
                .all(|(&set, &o)| set == (o != usize::MAX)));
        }
    }
}
