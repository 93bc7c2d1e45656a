//! Spatial quantization of a binarized raster into square cells.
//!
//! The last row and column of cells are clipped to the raster when its size is not a
//! multiple of the split length; the clipped-away area counts as background.

use std::collections::BTreeSet;

use ndarray::Array2;

use crate::config::GridOptions;
use crate::error::ensure_positive;
use crate::preprocess::BinarizedRaster;
use crate::SketchResult;

/// A grid cell addressed by row and column.
///
/// The derived ordering is row-major, which is the enumeration order the tracer relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Grid dimensions `(rows, cols)` for a raster size and split length.
pub fn grid_dimensions(width: u32, height: u32, split_len: u32) -> (u32, u32) {
    (height.div_ceil(split_len), width.div_ceil(split_len))
}

/// Count ink samples per cell.
pub fn ink_counts(raster: &BinarizedRaster, split_len: u32) -> SketchResult<Array2<u32>> {
    let split_len = ensure_positive("split_len", split_len)?;
    let (rows, cols) = grid_dimensions(raster.width(), raster.height(), split_len);
    let mut counts = Array2::<u32>::zeros((rows as usize, cols as usize));
    for (x, y, px) in raster.image().enumerate_pixels() {
        if px[0] == BinarizedRaster::INK {
            counts[[(y / split_len) as usize, (x / split_len) as usize]] += 1;
        }
    }
    Ok(counts)
}

/// Select the cells whose ink count strictly exceeds `options.min_ink`.
#[tracing::instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn segment(raster: &BinarizedRaster, options: GridOptions) -> SketchResult<BTreeSet<Cell>> {
    ensure_positive("min_ink", options.min_ink)?;
    let counts = ink_counts(raster, options.split_len)?;
    let selected: BTreeSet<Cell> = counts
        .indexed_iter()
        .filter(|&(_, &count)| count > options.min_ink)
        .map(|((row, col), _)| Cell::new(row as u32, col as u32))
        .collect();
    tracing::debug!(
        cells = counts.len(),
        selected = selected.len(),
        "segmented raster"
    );
    Ok(selected)
}

/// Split lengths that tile the working resolution exactly, in ascending order.
pub fn suggest_split_lens(width: u32, height: u32) -> Vec<u32> {
    let limit = width.min(height);
    (1..=limit)
        .filter(|len| width % len == 0 && height % len == 0)
        .collect()
}

/// Pick the default split length from the suggestions: the library default when offered,
/// otherwise the smallest suggestion, otherwise 1.
pub fn default_split_len(suggestions: &[u32]) -> u32 {
    if suggestions.contains(&crate::config::DEFAULT_SPLIT_LEN) {
        crate::config::DEFAULT_SPLIT_LEN
    } else {
        suggestions.first().copied().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SketchError;

    fn square_raster(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> BinarizedRaster {
        BinarizedRaster::from_fn(w, h, |x, y| {
            x >= x0 && x < x0 + side && y >= y0 && y < y0 + side
        })
        .unwrap()
    }

    mod segment {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn blank_raster_selects_nothing() {
                let raster = BinarizedRaster::blank(64, 48).unwrap();
                assert!(segment(&raster, GridOptions::default()).unwrap().is_empty());
            }

            #[test]
            fn count_must_exceed_threshold() {
                // 10 ink samples in one cell: not selected; 11: selected
                let ten = BinarizedRaster::from_fn(20, 10, |x, y| y == 0 && x < 10).unwrap();
                assert!(segment(&ten, GridOptions::default()).unwrap().is_empty());

                let eleven =
                    BinarizedRaster::from_fn(20, 10, |x, y| (y == 0 && x < 10) || (x, y) == (0, 1))
                        .unwrap();
                let cells = segment(&eleven, GridOptions::default()).unwrap();
                assert_eq!(cells.into_iter().collect::<Vec<_>>(), vec![Cell::new(0, 0)]);
            }

            #[test]
            fn zero_split_len_is_invalid() {
                let raster = BinarizedRaster::blank(4, 4).unwrap();
                let err = segment(&raster, GridOptions::new(0)).unwrap_err();
                assert!(matches!(
                    err,
                    SketchError::InvalidParameter {
                        name: "split_len",
                        ..
                    }
                ));
            }

            #[test]
            fn zero_min_ink_is_invalid() {
                let raster = BinarizedRaster::blank(4, 4).unwrap();
                let err = segment(&raster, GridOptions::default().with_min_ink(0)).unwrap_err();
                assert!(matches!(
                    err,
                    SketchError::InvalidParameter {
                        name: "min_ink",
                        ..
                    }
                ));
            }

            #[test]
            fn edge_cells_are_clipped() {
                // 25x25 with split 10 -> 3x3 grid, last row/col only 5 px wide
                let raster = BinarizedRaster::from_fn(25, 25, |_, _| true).unwrap();
                let counts = ink_counts(&raster, 10).unwrap();
                assert_eq!(counts.dim(), (3, 3));
                assert_eq!(counts[[0, 0]], 100);
                assert_eq!(counts[[0, 2]], 50);
                assert_eq!(counts[[2, 2]], 25);
            }

            #[test]
            fn centered_square_selects_contiguous_block() {
                let raster = square_raster(640, 480, 295, 215, 50);
                let cells = segment(&raster, GridOptions::default()).unwrap();
                // 295..345 touches columns 29..=34, 215..265 touches rows 21..=26
                assert_eq!(cells.len(), 36);
                for cell in &cells {
                    assert!((21..=26).contains(&cell.row));
                    assert!((29..=34).contains(&cell.col));
                }
            }

            #[test]
            fn coarser_grid_selects_no_more_cells_on_solid_ink() {
                let raster = square_raster(640, 480, 295, 215, 50);
                let mut previous = usize::MAX;
                for split_len in [5, 10, 20, 40, 80] {
                    let count = segment(&raster, GridOptions::new(split_len)).unwrap().len();
                    assert!(count <= previous, "split {split_len}: {count} > {previous}");
                    previous = count;
                }
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// segment: every selected cell lies inside the grid
                #[test]
                fn cells_inside_grid(
                    w in 1u32..60,
                    h in 1u32..60,
                    split_len in 1u32..16,
                    stripe in 1u32..5
                ) {
                    let raster = BinarizedRaster::from_fn(w, h, |x, y| (x + y) % stripe == 0).unwrap();
                    let (rows, cols) = grid_dimensions(w, h, split_len);
                    for cell in segment(&raster, GridOptions::new(split_len)).unwrap() {
                        prop_assert!(cell.row < rows && cell.col < cols);
                    }
                }

                /// ink_counts: per-cell counts add up to the raster's ink count
                #[test]
                fn counts_sum_to_total_ink(
                    w in 1u32..60,
                    h in 1u32..60,
                    split_len in 1u32..16
                ) {
                    let raster = BinarizedRaster::from_fn(w, h, |x, y| (x * 3 + y) % 4 == 0).unwrap();
                    let counts = ink_counts(&raster, split_len).unwrap();
                    prop_assert_eq!(counts.sum() as usize, raster.ink_count());
                }
            }
        }
    }

    mod split_lens {
        use super::*;

        #[test]
        fn common_divisors_of_default_resolution() {
            assert_eq!(
                suggest_split_lens(640, 480),
                vec![1, 2, 4, 5, 8, 10, 16, 20, 32, 40, 80, 160]
            );
        }

        #[test]
        fn default_prefers_ten_then_first() {
            assert_eq!(default_split_len(&[1, 2, 5, 10]), 10);
            assert_eq!(default_split_len(&[1, 3, 9]), 1);
            assert_eq!(default_split_len(&[3, 9]), 3);
            assert_eq!(default_split_len(&[]), 1);
        }
    }
}
