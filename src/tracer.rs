//! Greedy nearest-neighbor ordering of selected cells into a single drawable path.
//!
//! The walk starts at the first cell in row-major order. From each visited cell it moves to
//! the closest remaining cell by Euclidean distance; among equally close cells the one that
//! comes first in row-major order wins. Both search strategies follow this rule, so they
//! produce identical paths.

use std::collections::BTreeSet;

use ndarray::Array2;

use crate::error::ensure_positive;
use crate::grid::Cell;
use crate::{SketchError, SketchResult};

/// A pixel coordinate on the working raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Center of `cell`, using integer floor division for the half cell.
    ///
    /// Fails when the center does not fit in pixel coordinates.
    pub fn from_cell(cell: Cell, split_len: u32) -> SketchResult<Self> {
        let half = split_len / 2;
        let center = |index: u32| index.checked_mul(split_len)?.checked_add(half);
        match (center(cell.col), center(cell.row)) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(SketchError::invalid_parameter(
                "cell",
                format!("{cell:?} is out of range for split length {split_len}"),
            )),
        }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// The visiting order produced by one tracing run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderedPath {
    points: Vec<Point>,
}

impl OrderedPath {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Append a second run after this one, e.g. the background pass after the object pass.
    pub fn chain(self, next: OrderedPath) -> OrderedPath {
        let mut points = self.points;
        points.extend(next.points);
        Self { points }
    }
}

/// How the next nearest cell is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NearestSearch {
    /// Scan every remaining cell. Quadratic, kept as the reference behavior.
    Linear,
    /// Search expanding square rings on a cell occupancy grid.
    #[default]
    Bucketed,
}

/// Trace selected cells into an ordered path using the default search.
pub fn trace(cells: impl IntoIterator<Item = Cell>, split_len: u32) -> SketchResult<OrderedPath> {
    trace_with(cells, split_len, NearestSearch::default())
}

/// Trace selected cells into an ordered path.
///
/// The input order does not matter; duplicate cells are visited once.
#[tracing::instrument(skip(cells))]
pub fn trace_with(
    cells: impl IntoIterator<Item = Cell>,
    split_len: u32,
    search: NearestSearch,
) -> SketchResult<OrderedPath> {
    let split_len = ensure_positive("split_len", split_len)?;
    let cells: BTreeSet<Cell> = cells.into_iter().collect();
    // the farthest corner fits in pixel coordinates only if every cell does
    if let (Some(last), Some(max_col)) = (cells.last(), cells.iter().map(|c| c.col).max()) {
        Point::from_cell(Cell::new(last.row, max_col), split_len)?;
    }
    let order = match search {
        NearestSearch::Linear => order_linear(cells),
        NearestSearch::Bucketed => order_bucketed(cells),
    };
    tracing::debug!(points = order.len(), "traced path");
    let points = order
        .into_iter()
        .map(|cell| Point::from_cell(cell, split_len))
        .collect::<SketchResult<Vec<_>>>()?;
    Ok(OrderedPath::from_points(points))
}

/// Squared distance between cells. Cell centers share the split length, so this orders
/// candidates exactly like the pixel distance does.
fn cell_distance_sq(a: Cell, b: Cell) -> u64 {
    let dr = i64::from(a.row) - i64::from(b.row);
    let dc = i64::from(a.col) - i64::from(b.col);
    (dr * dr + dc * dc) as u64
}

fn order_linear(cells: BTreeSet<Cell>) -> Vec<Cell> {
    let mut remaining: Vec<Cell> = cells.into_iter().collect();
    let mut order = Vec::with_capacity(remaining.len());
    if remaining.is_empty() {
        return order;
    }

    let mut current = remaining.remove(0);
    loop {
        order.push(current);
        // `remaining` stays sorted and min_by_key keeps the first minimum, which is the tie-break
        let Some((idx, _)) = remaining
            .iter()
            .enumerate()
            .min_by_key(|(_, cell)| cell_distance_sq(current, **cell))
        else {
            break;
        };
        current = remaining.remove(idx);
    }
    order
}

/// Grids up to this many slots are always indexed.
const MIN_INDEX_SLOTS: u64 = 1 << 16;
/// Beyond that, a grid may hold at most this many slots per selected cell.
const MAX_SLOTS_PER_CELL: u64 = 64;

/// Occupancy grid over the remaining cells.
struct CellIndex {
    occupied: Array2<bool>,
    remaining: usize,
}

impl CellIndex {
    /// Whether the occupancy grid spanning `cells` stays proportional to their number.
    fn worth_building(cells: &BTreeSet<Cell>) -> bool {
        let rows = cells.last().map_or(0, |c| u64::from(c.row) + 1);
        let cols = cells.iter().map(|c| u64::from(c.col) + 1).max().unwrap_or(0);
        let budget = (cells.len() as u64 * MAX_SLOTS_PER_CELL).max(MIN_INDEX_SLOTS);
        rows.saturating_mul(cols) <= budget
    }

    fn new(cells: &BTreeSet<Cell>) -> Self {
        let rows = cells.iter().map(|c| c.row).max().map_or(0, |r| r as usize + 1);
        let cols = cells.iter().map(|c| c.col).max().map_or(0, |c| c as usize + 1);
        let mut occupied = Array2::from_elem((rows, cols), false);
        for cell in cells {
            occupied[[cell.row as usize, cell.col as usize]] = true;
        }
        Self {
            occupied,
            remaining: cells.len(),
        }
    }

    fn remove(&mut self, cell: Cell) {
        let slot = &mut self.occupied[[cell.row as usize, cell.col as usize]];
        if *slot {
            *slot = false;
            self.remaining -= 1;
        }
    }

    fn is_occupied(&self, row: i64, col: i64) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        self.occupied
            .get([row as usize, col as usize])
            .copied()
            .unwrap_or(false)
    }

    /// Nearest occupied cell to `from`, scanning rings of growing Chebyshev radius.
    ///
    /// A cell on ring `d` is at least `d` away, so once the best squared distance is below
    /// `(d + 1)^2` no outer ring can beat or tie it.
    fn nearest(&self, from: Cell) -> Option<Cell> {
        if self.remaining == 0 {
            return None;
        }
        let (rows, cols) = self.occupied.dim();
        let max_radius = rows.max(cols) as i64;
        let (r0, c0) = (i64::from(from.row), i64::from(from.col));
        let mut best: Option<(u64, Cell)> = None;

        for d in 1..=max_radius {
            for row in (r0 - d)..=(r0 + d) {
                let on_edge_row = row == r0 - d || row == r0 + d;
                let step = if on_edge_row { 1 } else { 2 * d };
                let mut col = c0 - d;
                while col <= c0 + d {
                    if self.is_occupied(row, col) {
                        let cell = Cell::new(row as u32, col as u32);
                        let candidate = (cell_distance_sq(from, cell), cell);
                        if best.is_none_or(|b| candidate < b) {
                            best = Some(candidate);
                        }
                    }
                    col += step;
                }
            }
            if let Some((dist_sq, _)) = best
                && dist_sq < ((d + 1) * (d + 1)) as u64
            {
                break;
            }
        }
        best.map(|(_, cell)| cell)
    }
}

fn order_bucketed(cells: BTreeSet<Cell>) -> Vec<Cell> {
    let mut order = Vec::with_capacity(cells.len());
    let Some(&start) = cells.first() else {
        return order;
    };
    if !CellIndex::worth_building(&cells) {
        tracing::debug!(cells = cells.len(), "selection too sparse for the grid index");
        return order_linear(cells);
    }
    let mut index = CellIndex::new(&cells);

    let mut current = start;
    loop {
        order.push(current);
        index.remove(current);
        match index.nearest(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridOptions;
    use crate::grid::segment;
    use crate::preprocess::BinarizedRaster;

    fn cells(coords: &[(u32, u32)]) -> Vec<Cell> {
        coords.iter().map(|&(r, c)| Cell::new(r, c)).collect()
    }

    fn points(path: &OrderedPath) -> Vec<(u32, u32)> {
        path.points().iter().map(|p| (p.x, p.y)).collect()
    }

    mod unit {
        use super::*;

        #[test]
        fn empty_selection_gives_empty_path() {
            for search in [NearestSearch::Linear, NearestSearch::Bucketed] {
                let path = trace_with(Vec::new(), 10, search).unwrap();
                assert!(path.is_empty());
            }
        }

        #[test]
        fn single_cell_gives_single_point() {
            let path = trace(cells(&[(3, 4)]), 10).unwrap();
            assert_eq!(points(&path), vec![(45, 35)]);
        }

        #[test]
        fn point_uses_floor_half_cell() {
            assert_eq!(Point::from_cell(Cell::new(0, 0), 7).unwrap(), Point::new(3, 3));
            assert_eq!(Point::from_cell(Cell::new(2, 1), 1).unwrap(), Point::new(1, 2));
        }

        #[test]
        fn starts_at_first_row_major_cell() {
            let path = trace(cells(&[(5, 0), (0, 9), (0, 3)]), 10).unwrap();
            assert_eq!(path.points()[0], Point::new(35, 5));
        }

        #[test]
        fn ties_prefer_row_major_order() {
            // from (1,1): (0,1), (1,0), (1,2), (2,1) are all at distance 1
            let input = cells(&[(2, 1), (1, 2), (1, 0), (0, 1), (1, 1)]);
            for search in [NearestSearch::Linear, NearestSearch::Bucketed] {
                let path = trace_with(input.clone(), 2, search).unwrap();
                // start (0,1) -> (1,1) -> (1,0) -> (2,1) -> (1,2)
                assert_eq!(
                    points(&path),
                    vec![(3, 1), (3, 3), (1, 3), (3, 5), (5, 3)],
                    "{search:?}"
                );
            }
        }

        #[test]
        fn follows_nearest_not_scan_order() {
            let input = cells(&[(0, 0), (0, 10), (0, 1), (5, 0)]);
            let path = trace(input, 1).unwrap();
            assert_eq!(points(&path), vec![(0, 0), (1, 0), (0, 5), (10, 0)]);
        }

        #[test]
        fn input_order_and_duplicates_do_not_matter() {
            let a = trace(cells(&[(0, 0), (3, 3), (1, 2)]), 10).unwrap();
            let b = trace(cells(&[(1, 2), (3, 3), (0, 0), (3, 3)]), 10).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), 3);
        }

        #[test]
        fn unaddressable_cells_are_invalid() {
            for search in [NearestSearch::Linear, NearestSearch::Bucketed] {
                for input in [
                    cells(&[(0, 500_000_000)]),
                    cells(&[(1, 1), (u32::MAX, 0)]),
                ] {
                    let err = trace_with(input, 10, search).unwrap_err();
                    assert!(
                        matches!(err, SketchError::InvalidParameter { name: "cell", .. }),
                        "{search:?}"
                    );
                }
            }
        }

        #[test]
        fn sparse_far_apart_cells_match_linear() {
            // the bounding box spans 10^10 slots; the index must not be built for it
            let input = cells(&[(0, 0), (100_000, 100_000), (3, 4), (99_999, 100_000)]);
            let linear = trace_with(input.clone(), 1, NearestSearch::Linear).unwrap();
            let bucketed = trace_with(input, 1, NearestSearch::Bucketed).unwrap();
            assert_eq!(linear, bucketed);
            assert_eq!(
                points(&bucketed),
                vec![(0, 0), (4, 3), (100_000, 99_999), (100_000, 100_000)]
            );
        }

        #[test]
        fn zero_split_len_is_invalid() {
            assert!(trace(cells(&[(0, 0)]), 0).is_err());
        }

        #[test]
        fn centered_square_steps_stay_local() {
            let raster = BinarizedRaster::from_fn(640, 480, |x, y| {
                (295..345).contains(&x) && (215..265).contains(&y)
            })
            .unwrap();
            let selected = segment(&raster, GridOptions::default()).unwrap();
            let path = trace(selected.iter().copied(), 10).unwrap();

            assert_eq!(path.len(), selected.len());
            let limit = 10.0 * 2f64.sqrt() + 1e-9;
            for pair in path.points().windows(2).skip(1) {
                assert!(pair[0].distance(&pair[1]) <= limit);
            }
        }

        #[test]
        fn chain_appends_second_run() {
            let first = trace(cells(&[(0, 0)]), 10).unwrap();
            let second = trace(cells(&[(4, 4), (4, 5)]), 10).unwrap();
            let joined = first.chain(second);
            assert_eq!(points(&joined), vec![(5, 5), (45, 45), (55, 45)]);
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn cell_sets() -> impl Strategy<Value = Vec<Cell>> {
            proptest::collection::vec((0u32..24, 0u32..24), 0..120)
                .prop_map(|coords| coords.into_iter().map(|(r, c)| Cell::new(r, c)).collect())
        }

        proptest! {
            /// bucketed search visits cells in exactly the same order as the linear scan
            #[test]
            fn bucketed_matches_linear(input in cell_sets(), split_len in 1u32..12) {
                let linear = trace_with(input.clone(), split_len, NearestSearch::Linear).unwrap();
                let bucketed = trace_with(input, split_len, NearestSearch::Bucketed).unwrap();
                prop_assert_eq!(linear, bucketed);
            }

            /// every selected cell appears exactly once
            #[test]
            fn visits_each_cell_once(input in cell_sets(), split_len in 1u32..12) {
                let unique: HashSet<Cell> = input.iter().copied().collect();
                let path = trace(input, split_len).unwrap();
                prop_assert_eq!(path.len(), unique.len());

                let expected: HashSet<Point> =
                    unique.iter().map(|&c| Point::from_cell(c, split_len).unwrap()).collect();
                let seen: HashSet<Point> = path.points().iter().copied().collect();
                prop_assert_eq!(seen, expected);
            }

            /// repeated tracing is exactly reproducible
            #[test]
            fn deterministic(input in cell_sets()) {
                let a = trace(input.clone(), 10).unwrap();
                let b = trace(input, 10).unwrap();
                prop_assert_eq!(a, b);
            }
        }
    }
}
