//! Wraps the pure [`Selection`] value with Ctrl+A timing and fire-on-change
//! subscription. Keyboard operations that need grid metadata (navigation,
//! hidden rows/cols, used range) take it as a generic trait or a plain
//! parameter rather than owning a store reference — the store stays owned
//! by whatever embeds both.

use tabulon_common::{CellKey, CellNavigation, CellRange, DimensionProvider, Direction, MAX_COLS, MAX_ROWS};

use crate::ctrl_a::{CtrlACycle, CtrlAStage};
use crate::selection::{Selection, SelectionMode};

/// Tab (row-major) vs. Enter (column-major) cycling, each with a reverse
/// direction for Shift+Tab / Shift+Enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Next,
    Previous,
    NextRow,
    PrevRow,
}

type ChangeListener = Box<dyn FnMut(&Selection, &Selection)>;

pub struct SelectionManager {
    state: Selection,
    ctrl_a: CtrlACycle,
    listeners: Vec<ChangeListener>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self {
            state: Selection::at(CellKey::new(0, 0)),
            ctrl_a: CtrlACycle::new(),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &Selection {
        &self.state
    }

    /// Fire-on-change only: a transition that produces a structurally equal
    /// state dispatches nothing.
    pub fn subscribe(&mut self, listener: impl FnMut(&Selection, &Selection) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn apply(&mut self, next: Selection) {
        if next == self.state {
            return;
        }
        let previous = self.state.clone();
        self.state = next;
        for listener in &mut self.listeners {
            listener(&previous, &self.state);
        }
    }

    // --- primary operations -------------------------------------------------

    pub fn set_active_cell(&mut self, cell: CellKey) {
        self.apply(self.state.set_active_cell(cell));
    }

    pub fn set_range(&mut self, range: CellRange, active: Option<CellKey>) {
        self.apply(self.state.set_range(range, active));
    }

    pub fn extend_selection(&mut self, target: CellKey) {
        self.apply(self.state.extend_selection(target));
    }

    pub fn add_range(&mut self, range: CellRange) {
        self.apply(self.state.add_range(range));
    }

    pub fn add_cell(&mut self, cell: CellKey) {
        self.apply(self.state.add_cell(cell));
    }

    pub fn remove_range(&mut self, index: usize) {
        self.apply(self.state.remove_range(index));
    }

    pub fn clear(&mut self) {
        self.apply(self.state.clear());
    }

    // --- keyboard operations -------------------------------------------------

    pub fn move_active_cell(&mut self, dr: i64, dc: i64, extend: bool) {
        let target = clamp_move(self.state.active_cell(), dr, dc);
        if extend {
            self.extend_selection(target);
        } else {
            self.set_active_cell(target);
        }
    }

    /// Cycles the active cell within the active range in row-major (Tab)
    /// or column-major (Enter) order, wrapping at edges and skipping
    /// hidden rows/cols with a scan bounded by the range's area.
    pub fn move_within_selection<D: DimensionProvider>(
        &mut self,
        dim: &D,
        direction: CycleDirection,
    ) {
        let range = self.state.active_range();
        let forward = matches!(direction, CycleDirection::Next | CycleDirection::NextRow);
        let row_major = matches!(direction, CycleDirection::Next | CycleDirection::Previous);

        let bound = (range.width() as u64 * range.height() as u64).max(1);
        let mut cell = self.state.active_cell();
        for _ in 0..bound {
            cell = if row_major {
                step_row_major(range, cell, forward)
            } else {
                step_col_major(range, cell, forward)
            };
            if !dim.is_row_hidden(cell.row()) && !dim.is_col_hidden(cell.col()) {
                break;
            }
        }
        self.apply(self.state.move_active_within_range(cell));
    }

    pub fn ctrl_arrow<N: CellNavigation>(&mut self, nav: &N, dir: Direction) {
        let active = self.state.active_cell();
        let (row, col) = nav.find_next_non_empty(active.row(), active.col(), dir);
        self.set_active_cell(CellKey::new(row, col));
    }

    pub fn ctrl_shift_arrow<N: CellNavigation>(&mut self, nav: &N, dir: Direction) {
        let active = self.state.active_cell();
        let (row, col) = nav.find_next_non_empty(active.row(), active.col(), dir);
        self.extend_selection(CellKey::new(row, col));
    }

    /// 1st press selects the current region (flood fill), 2nd the used
    /// range, 3rd the entire grid; a gap over 1s restarts the cycle.
    pub fn ctrl_a<N: CellNavigation>(&mut self, nav: &N, used_range: Option<CellRange>) {
        let active = self.state.active_cell();
        let stage = self.ctrl_a.press();
        let target = match stage {
            CtrlAStage::CurrentRegion => nav.find_current_region(active.row(), active.col()),
            CtrlAStage::UsedRange => used_range,
            CtrlAStage::EntireGrid => Some(CellRange::new(
                CellKey::new(0, 0),
                CellKey::new(MAX_ROWS - 1, MAX_COLS - 1),
            )),
        };
        if let Some(range) = target {
            self.set_range(range, None);
        }
    }

    pub fn home(&mut self, extend: bool) {
        let active = self.state.active_cell();
        let target = CellKey::new(active.row(), 0);
        self.navigate_to(target, extend);
    }

    pub fn end(&mut self, extend: bool) {
        let active = self.state.active_cell();
        let target = CellKey::new(active.row(), MAX_COLS - 1);
        self.navigate_to(target, extend);
    }

    pub fn ctrl_home(&mut self, extend: bool) {
        self.navigate_to(CellKey::new(0, 0), extend);
    }

    pub fn ctrl_end(&mut self, used_range: Option<CellRange>, extend: bool) {
        if let Some(range) = used_range {
            self.navigate_to(range.end(), extend);
        }
    }

    pub fn page_up(&mut self, page_row_count: u32, extend: bool) {
        let target = clamp_move(self.state.active_cell(), -(page_row_count as i64), 0);
        self.navigate_to(target, extend);
    }

    pub fn page_down(&mut self, page_row_count: u32, extend: bool) {
        let target = clamp_move(self.state.active_cell(), page_row_count as i64, 0);
        self.navigate_to(target, extend);
    }

    fn navigate_to(&mut self, target: CellKey, extend: bool) {
        if extend {
            self.extend_selection(target);
        } else {
            self.set_active_cell(target);
        }
    }

    // --- pointer operations -------------------------------------------------

    pub fn mouse_down(&mut self, cell: CellKey, shift: bool, ctrl_or_meta: bool) {
        let next = if ctrl_or_meta {
            self.state.add_cell(cell)
        } else if shift {
            self.state.extend_selection(cell)
        } else {
            self.state.set_active_cell(cell)
        };
        self.apply(next.with_mode(SelectionMode::Selecting));
    }

    pub fn mouse_drag(&mut self, cell: CellKey) {
        let next = self.state.extend_selection(cell);
        self.apply(next.with_mode(SelectionMode::Selecting));
    }

    pub fn mouse_up(&mut self) {
        self.apply(self.state.with_mode(SelectionMode::Normal));
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_move(cell: CellKey, dr: i64, dc: i64) -> CellKey {
    let row = (cell.row() as i64 + dr).clamp(0, MAX_ROWS as i64 - 1) as u32;
    let col = (cell.col() as i64 + dc).clamp(0, MAX_COLS as i64 - 1) as u32;
    CellKey::new(row, col)
}

fn step_row_major(range: CellRange, cell: CellKey, forward: bool) -> CellKey {
    let (mut row, mut col) = (cell.row() as i64, cell.col() as i64);
    let (start_row, end_row) = (range.start().row() as i64, range.end().row() as i64);
    let (start_col, end_col) = (range.start().col() as i64, range.end().col() as i64);
    if forward {
        col += 1;
        if col > end_col {
            col = start_col;
            row += 1;
            if row > end_row {
                row = start_row;
            }
        }
    } else {
        col -= 1;
        if col < start_col {
            col = end_col;
            row -= 1;
            if row < start_row {
                row = end_row;
            }
        }
    }
    CellKey::new(row as u32, col as u32)
}

fn step_col_major(range: CellRange, cell: CellKey, forward: bool) -> CellKey {
    let (mut row, mut col) = (cell.row() as i64, cell.col() as i64);
    let (start_row, end_row) = (range.start().row() as i64, range.end().row() as i64);
    let (start_col, end_col) = (range.start().col() as i64, range.end().col() as i64);
    if forward {
        row += 1;
        if row > end_row {
            row = start_row;
            col += 1;
            if col > end_col {
                col = start_col;
            }
        }
    } else {
        row -= 1;
        if row < start_row {
            row = end_row;
            col -= 1;
            if col < start_col {
                col = end_col;
            }
        }
    }
    CellKey::new(row as u32, col as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllVisible;
    impl DimensionProvider for AllVisible {
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

    struct HideRow(u32);
    impl DimensionProvider for HideRow {
        fn row_height(&self, _row: u32) -> f64 {
            20.0
        }
        fn col_width(&self, _col: u32) -> f64 {
            64.0
        }
        fn is_row_hidden(&self, row: u32) -> bool {
            row == self.0
        }
        fn is_col_hidden(&self, _col: u32) -> bool {
            false
        }
    }

    struct StubNav {
        next_non_empty: (u32, u32),
        current_region: Option<CellRange>,
    }
    impl CellNavigation for StubNav {
        fn find_next_non_empty(&self, _row: u32, _col: u32, _dir: Direction) -> (u32, u32) {
            self.next_non_empty
        }
        fn find_current_region(&self, _row: u32, _col: u32) -> Option<CellRange> {
            self.current_region
        }
    }

    #[test]
    fn subscribe_fires_only_on_structural_change() {
        let mut manager = SelectionManager::new();
        let fired = std::rc::Rc::new(std::cell::RefCell::new(0));
        let counter = fired.clone();
        manager.subscribe(move |_prev, _cur| {
            *counter.borrow_mut() += 1;
        });

        manager.set_active_cell(CellKey::new(0, 0));
        assert_eq!(*fired.borrow(), 0, "no-op transition must not fire");

        manager.set_active_cell(CellKey::new(2, 2));
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn move_active_cell_clamps_at_grid_edge() {
        let mut manager = SelectionManager::new();
        manager.move_active_cell(-5, -5, false);
        assert_eq!(manager.state().active_cell(), CellKey::new(0, 0));
    }

    #[test]
    fn tab_cycles_row_major_and_wraps() {
        let mut manager = SelectionManager::new();
        let range = CellRange::new(CellKey::new(0, 0), CellKey::new(1, 1));
        manager.set_range(range, Some(CellKey::new(0, 0)));
        let dim = AllVisible;

        manager.move_within_selection(&dim, CycleDirection::Next);
        assert_eq!(manager.state().active_cell(), CellKey::new(0, 1));
        manager.move_within_selection(&dim, CycleDirection::Next);
        assert_eq!(manager.state().active_cell(), CellKey::new(1, 0));
        manager.move_within_selection(&dim, CycleDirection::Next);
        assert_eq!(manager.state().active_cell(), CellKey::new(1, 1));
        manager.move_within_selection(&dim, CycleDirection::Next);
        assert_eq!(manager.state().active_cell(), CellKey::new(0, 0));
    }

    #[test]
    fn tab_skips_hidden_rows() {
        let mut manager = SelectionManager::new();
        let range = CellRange::new(CellKey::new(0, 0), CellKey::new(2, 0));
        manager.set_range(range, Some(CellKey::new(0, 0)));
        let dim = HideRow(1);

        manager.move_within_selection(&dim, CycleDirection::Next);
        assert_eq!(manager.state().active_cell(), CellKey::new(2, 0));
    }

    #[test]
    fn ctrl_arrow_delegates_to_navigation_and_resets_to_single_cell() {
        let mut manager = SelectionManager::new();
        manager.add_cell(CellKey::new(5, 5));
        let nav = StubNav {
            next_non_empty: (9, 9),
            current_region: None,
        };
        manager.ctrl_arrow(&nav, Direction::Down);
        assert_eq!(manager.state().ranges().len(), 1);
        assert_eq!(manager.state().active_cell(), CellKey::new(9, 9));
    }

    #[test]
    fn ctrl_a_cycles_region_then_used_range_then_grid() {
        let mut manager = SelectionManager::new();
        let region = CellRange::new(CellKey::new(0, 0), CellKey::new(2, 2));
        let used = CellRange::new(CellKey::new(0, 0), CellKey::new(9, 9));
        let nav = StubNav {
            next_non_empty: (0, 0),
            current_region: Some(region),
        };

        manager.ctrl_a(&nav, Some(used));
        assert_eq!(manager.state().active_range(), region);
        manager.ctrl_a(&nav, Some(used));
        assert_eq!(manager.state().active_range(), used);
        manager.ctrl_a(&nav, Some(used));
        assert_eq!(
            manager.state().active_range(),
            CellRange::new(CellKey::new(0, 0), CellKey::new(MAX_ROWS - 1, MAX_COLS - 1))
        );
    }

    #[test]
    fn mouse_down_then_drag_extends_without_moving_anchor() {
        let mut manager = SelectionManager::new();
        manager.mouse_down(CellKey::new(2, 2), false, false);
        let anchor = manager.state().anchor_cell();
        manager.mouse_drag(CellKey::new(5, 5));
        assert_eq!(manager.state().anchor_cell(), anchor);
        assert_eq!(manager.state().active_cell(), CellKey::new(5, 5));
        manager.mouse_up();
        assert_eq!(manager.state().mode(), SelectionMode::Normal);
    }

    #[test]
    fn mouse_down_with_ctrl_adds_a_range() {
        let mut manager = SelectionManager::new();
        manager.mouse_down(CellKey::new(0, 0), false, false);
        manager.mouse_down(CellKey::new(9, 9), false, true);
        assert_eq!(manager.state().ranges().len(), 2);
    }
}
