//! Traits that decouple the viewport and selection components from the
//! concrete cell store, per the dependency direction in `spec.md` §2: the
//! store implements these; the viewport and selection components consume
//! them generically and never depend on the store crate directly.

use crate::key::CellKey;
use crate::reference::CellRange;

/// The four Ctrl+Arrow directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Row/column sizing and visibility, as needed by the viewport's position
/// caches. Implemented directly by the cell store.
pub trait DimensionProvider {
    fn row_height(&self, row: u32) -> f64;
    fn col_width(&self, col: u32) -> f64;
    fn is_row_hidden(&self, row: u32) -> bool;
    fn is_col_hidden(&self, col: u32) -> bool;
}

/// Excel-style Ctrl+Arrow and current-region navigation, as needed by the
/// selection manager's keyboard operations. Implemented directly by the
/// cell store.
pub trait CellNavigation {
    fn find_next_non_empty(&self, row: u32, col: u32, dir: Direction) -> (u32, u32);
    fn find_current_region(&self, row: u32, col: u32) -> Option<CellRange>;
}

/// Optional read access to cell contents for frame assembly, kept separate
/// from [`DimensionProvider`] since some dimension providers (e.g. a
/// print-layout preview) have sizes but no cell data. Implemented directly
/// by the cell store, with `Cell` bound to its record type.
pub trait CellSource {
    type Cell;
    fn get_cell(&self, row: u32, col: u32) -> Option<Self::Cell>;
}
