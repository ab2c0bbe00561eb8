//! A dimension-provider adapter that layers row visibility from an active
//! filter on top of a base provider, without touching column behavior.

use rustc_hash::FxHashSet;
use tabulon_common::{CellSource, DimensionProvider};

/// Reports `isRowHidden(r) = base.isRowHidden(r) || (filter_active &&
/// !visible.contains(r))`. When no filter is active this is a trivial
/// delegate: `visible` is never consulted.
pub struct FilteredDimensions<'a, P> {
    base: &'a P,
    visible: FxHashSet<u32>,
    filter_active: bool,
}

impl<'a, P> FilteredDimensions<'a, P> {
    pub fn passthrough(base: &'a P) -> Self {
        Self {
            base,
            visible: FxHashSet::default(),
            filter_active: false,
        }
    }

    pub fn with_filter(base: &'a P, visible: FxHashSet<u32>) -> Self {
        Self {
            base,
            visible,
            filter_active: true,
        }
    }
}

impl<'a, P: DimensionProvider> DimensionProvider for FilteredDimensions<'a, P> {
    fn row_height(&self, row: u32) -> f64 {
        self.base.row_height(row)
    }

    fn col_width(&self, col: u32) -> f64 {
        self.base.col_width(col)
    }

    fn is_row_hidden(&self, row: u32) -> bool {
        self.base.is_row_hidden(row) || (self.filter_active && !self.visible.contains(&row))
    }

    fn is_col_hidden(&self, col: u32) -> bool {
        self.base.is_col_hidden(col)
    }
}

impl<'a, P: CellSource> CellSource for FilteredDimensions<'a, P> {
    type Cell = P::Cell;

    fn get_cell(&self, row: u32, col: u32) -> Option<Self::Cell> {
        self.base.get_cell(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;
    impl DimensionProvider for Fixed {
        fn row_height(&self, _row: u32) -> f64 {
            20.0
        }
        fn col_width(&self, _col: u32) -> f64 {
            64.0
        }
        fn is_row_hidden(&self, _row: u32) -> bool {
            false
        }
        fn is_col_hidden(&self, _col: u32) -> bool {
            false
        }
    }

    #[test]
    fn passthrough_never_hides_rows() {
        let base = Fixed;
        let wrapped = FilteredDimensions::passthrough(&base);
        assert!(!wrapped.is_row_hidden(5));
    }

    #[test]
    fn filter_hides_rows_not_in_visible_set() {
        let base = Fixed;
        let mut visible = FxHashSet::default();
        visible.insert(2u32);
        let wrapped = FilteredDimensions::with_filter(&base, visible);
        assert!(!wrapped.is_row_hidden(2));
        assert!(wrapped.is_row_hidden(3));
    }
}
