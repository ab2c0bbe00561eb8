//! The selection state itself: an immutable value with pure transition
//! methods. Every method returns a fresh [`Selection`]; nothing is mutated
//! in place. Callers that want change notification go through
//! [`crate::manager::SelectionManager`] instead of using these directly.

use tabulon_common::{CellKey, CellRange};

/// Interaction mode the selection is currently in. Tracked mainly so the
/// pointer operations know when a drag is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    Normal,
    Selecting,
    Extending,
}

/// Ordered list of ranges, one of which is active, plus the anchor/active
/// cell pair that drives extension. `activeCell` always lies within the
/// range at `activeRangeIndex`; every range is stored normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    ranges: Vec<CellRange>,
    active_range_index: usize,
    anchor_cell: CellKey,
    active_cell: CellKey,
    mode: SelectionMode,
}

fn clamp_into_range(range: CellRange, cell: CellKey) -> CellKey {
    let row = cell.row().clamp(range.start().row(), range.end().row());
    let col = cell.col().clamp(range.start().col(), range.end().col());
    CellKey::new(row, col)
}

impl Selection {
    /// A single-cell selection at `cell`. This is also the canonical "A1"
    /// reset value when callers pass `CellKey::new(0, 0)`.
    pub fn at(cell: CellKey) -> Self {
        Self {
            ranges: vec![CellRange::single(cell)],
            active_range_index: 0,
            anchor_cell: cell,
            active_cell: cell,
            mode: SelectionMode::Normal,
        }
    }

    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    pub fn active_range_index(&self) -> usize {
        self.active_range_index
    }

    pub fn active_range(&self) -> CellRange {
        self.ranges[self.active_range_index]
    }

    pub fn anchor_cell(&self) -> CellKey {
        self.anchor_cell
    }

    pub fn active_cell(&self) -> CellKey {
        self.active_cell
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn set_active_cell(&self, cell: CellKey) -> Self {
        Self::at(cell)
    }

    /// `active` defaults to the range's top-left corner, clamped into the
    /// range if supplied explicitly.
    pub fn set_range(&self, range: CellRange, active: Option<CellKey>) -> Self {
        let active_cell = match active {
            Some(cell) => clamp_into_range(range, cell),
            None => range.start(),
        };
        Self {
            ranges: vec![range],
            active_range_index: 0,
            anchor_cell: active_cell,
            active_cell,
            mode: SelectionMode::Normal,
        }
    }

    /// Shift+Click/Arrow: replace the active range with `span(anchor,
    /// target)`, keep the anchor, move the active cell to `target`.
    pub fn extend_selection(&self, target: CellKey) -> Self {
        let mut ranges = self.ranges.clone();
        ranges[self.active_range_index] = CellRange::new(self.anchor_cell, target);
        Self {
            ranges,
            active_range_index: self.active_range_index,
            anchor_cell: self.anchor_cell,
            active_cell: target,
            mode: SelectionMode::Extending,
        }
    }

    /// Ctrl+Click: append a new range, make it active, move active to its
    /// start.
    pub fn add_range(&self, range: CellRange) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.push(range);
        let active_range_index = ranges.len() - 1;
        Self {
            ranges,
            active_range_index,
            anchor_cell: range.start(),
            active_cell: range.start(),
            mode: SelectionMode::Normal,
        }
    }

    pub fn add_cell(&self, cell: CellKey) -> Self {
        self.add_range(CellRange::single(cell))
    }

    /// Removes the i-th range and fixes `activeRangeIndex`. If the list
    /// empties, resets to an A1 selection.
    pub fn remove_range(&self, index: usize) -> Self {
        if index >= self.ranges.len() {
            return self.clone();
        }
        let mut ranges = self.ranges.clone();
        ranges.remove(index);
        if ranges.is_empty() {
            return Self::at(CellKey::new(0, 0));
        }
        let active_range_index = self.active_range_index.min(ranges.len() - 1);
        let active_range = ranges[active_range_index];
        Self {
            ranges,
            active_range_index,
            anchor_cell: active_range.start(),
            active_cell: active_range.start(),
            mode: SelectionMode::Normal,
        }
    }

    pub fn clear(&self) -> Self {
        Self::at(CellKey::new(0, 0))
    }

    /// Moves the active cell within the current active range without
    /// touching the range list or the anchor. Used by Tab/Enter cycling.
    pub fn move_active_within_range(&self, cell: CellKey) -> Self {
        Self {
            active_cell: cell,
            ..self.clone()
        }
    }

    pub(crate) fn with_mode(&self, mode: SelectionMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_cell_always_inside_active_range() {
        let sel = Selection::at(CellKey::new(3, 3));
        let extended = sel.extend_selection(CellKey::new(0, 0));
        assert!(extended.active_range().contains(extended.active_cell()));
    }

    fn a1(r: u32, c: u32) -> CellKey {
        CellKey::new(r, c)
    }

    #[test]
    fn set_active_cell_collapses_to_single_cell_range() {
        let sel = Selection::at(a1(0, 0)).set_active_cell(a1(5, 5));
        assert_eq!(sel.ranges().len(), 1);
        assert_eq!(sel.active_cell(), a1(5, 5));
        assert_eq!(sel.anchor_cell(), a1(5, 5));
    }

    #[test]
    fn set_range_clamps_explicit_active_cell() {
        let range = CellRange::new(a1(0, 0), a1(4, 4));
        let sel = Selection::at(a1(9, 9)).set_range(range, Some(a1(100, 100)));
        assert_eq!(sel.active_cell(), a1(4, 4));
    }

    #[test]
    fn extend_selection_keeps_anchor_and_moves_active() {
        let sel = Selection::at(a1(2, 2)).extend_selection(a1(5, 5));
        assert_eq!(sel.anchor_cell(), a1(2, 2));
        assert_eq!(sel.active_cell(), a1(5, 5));
        assert_eq!(sel.active_range(), CellRange::new(a1(2, 2), a1(5, 5)));
    }

    #[test]
    fn add_range_appends_and_activates() {
        let sel = Selection::at(a1(0, 0)).add_cell(a1(3, 3));
        assert_eq!(sel.ranges().len(), 2);
        assert_eq!(sel.active_range_index(), 1);
        assert_eq!(sel.active_cell(), a1(3, 3));
    }

    #[test]
    fn remove_last_range_resets_to_a1() {
        let sel = Selection::at(a1(5, 5)).remove_range(0);
        assert_eq!(sel.ranges(), &[CellRange::single(a1(0, 0))]);
        assert_eq!(sel.active_cell(), a1(0, 0));
    }

    #[test]
    fn remove_range_fixes_out_of_bounds_active_index() {
        let sel = Selection::at(a1(0, 0))
            .add_cell(a1(1, 1))
            .add_cell(a1(2, 2));
        assert_eq!(sel.active_range_index(), 2);
        let sel = sel.remove_range(2);
        assert_eq!(sel.active_range_index(), 1);
        assert_eq!(sel.active_cell(), a1(1, 1));
    }
}
