//! The `Engine` facade: the single owner of the cell store, dependency
//! graph, formula engine, viewport, and selection, wiring the data flow
//! `commands mutate SCS -> DG update -> FE may recalculate -> VE re-reads
//! dimensions -> consumers read the render frame`.

use tabulon_common::{CellKey, CellRange, CellValue, Direction, ErrorTag};
use tabulon_formula::{CalcOptions, CalcResult, CancelToken, CooperativeRun, Evaluator, FormulaEngine, StepOutcome};
use tabulon_graph::DependencyGraph;
use tabulon_selection::{CycleDirection, Selection, SelectionManager};
use tabulon_store::{CellRecord, CellStore, StoreError};
use tabulon_viewport::{RenderFrame, ViewportConfig, ViewportEngine};

/// One slice's worth of progress through a cooperative recalculation, fed
/// to a host-supplied sink after every cell.
#[derive(Debug, Clone)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    pub current_cell: CellKey,
    pub errors: Vec<(CellKey, ErrorTag)>,
}

/// Owns every component and implements the public verbs. Parameterized by
/// the host's formula evaluator, exactly like `FormulaEngine` itself.
pub struct Engine<E: Evaluator> {
    store: CellStore,
    graph: DependencyGraph,
    formula: FormulaEngine<E>,
    viewport: ViewportEngine,
    selection: SelectionManager,
    calc_options: CalcOptions,
    cooperative_run: Option<CooperativeRun>,
}

impl<E: Evaluator> Engine<E> {
    pub fn new(evaluator: E, viewport_config: ViewportConfig) -> Self {
        Self {
            store: CellStore::new(),
            graph: DependencyGraph::default(),
            formula: FormulaEngine::new(evaluator),
            viewport: ViewportEngine::new(viewport_config),
            selection: SelectionManager::new(),
            calc_options: CalcOptions::default(),
            cooperative_run: None,
        }
    }

    pub fn set_calc_options(&mut self, options: CalcOptions) {
        self.calc_options = options;
    }

    // --- cell access ---------------------------------------------------

    pub fn get_cell(&self, row: u32, col: u32) -> Option<CellRecord> {
        self.store.get(row, col).cloned()
    }

    /// Overwrites `(row, col)` with a literal value, dropping any formula
    /// and dependency edges it carried, and marks its dependents dirty.
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue) -> Result<(), StoreError> {
        let key = CellKey::new(row, col);
        self.graph.mark_dirty(key);
        self.graph.remove_deps(key);

        let mut record = self
            .store
            .get(row, col)
            .cloned()
            .unwrap_or_else(|| CellRecord::new(CellValue::Null));
        record.kind = value.kind();
        record.value = value;
        record.formula = None;
        record.last_result = None;
        record.dirty = false;
        self.store.set(row, col, Some(record))
    }

    pub fn clear_range(&mut self, range: CellRange) {
        for key in range.iter() {
            self.graph.mark_dirty(key);
            self.graph.remove_deps(key);
        }
        self.store.clear_range(&range);
    }

    pub fn set_formula(&mut self, row: u32, col: u32, src: &str) -> Result<(), ErrorTag> {
        self.formula.set_formula(&mut self.store, &mut self.graph, row, col, src)
    }

    pub fn remove_formula(&mut self, row: u32, col: u32) {
        self.formula.remove_formula(&mut self.store, &mut self.graph, row, col);
    }

    // --- recalculation ---------------------------------------------------

    pub fn recalculate(&mut self) -> CalcResult {
        self.formula.recalculate(&mut self.store, &mut self.graph)
    }

    pub fn recalculate_affected(&mut self, row: u32, col: u32) -> CalcResult {
        self.formula.recalculate_affected(&mut self.store, &mut self.graph, row, col)
    }

    /// Starts a cooperative recalculation; any in-flight one is cancelled.
    /// Returns the token a host can use to cancel this one too.
    pub fn begin_cooperative_recalculate(&mut self) -> CancelToken {
        let run = self.formula.begin_cooperative(&mut self.graph);
        let token = run.cancel_token().clone();
        self.cooperative_run = Some(run);
        token
    }

    /// Drives the in-flight cooperative run for one host-scheduled slice.
    /// Returns `None` while it's still running (call again later), `Some`
    /// once it completes or is cancelled.
    pub fn step_cooperative(
        &mut self,
        mut progress_sink: Option<&mut dyn FnMut(Progress)>,
    ) -> Option<CalcResult> {
        let run = self.cooperative_run.as_mut()?;
        let outcome = match progress_sink.as_deref_mut() {
            Some(sink) => run.step_with_progress(
                &mut self.store,
                &mut self.graph,
                self.formula.evaluator(),
                &self.calc_options,
                &mut |key, completed, total, errors| {
                    sink(Progress {
                        total,
                        completed,
                        current_cell: key,
                        errors: errors.to_vec(),
                    });
                },
            ),
            None => run.step(&mut self.store, &mut self.graph, self.formula.evaluator(), &self.calc_options),
        };

        match outcome {
            StepOutcome::Continue => None,
            StepOutcome::Done(result) => {
                self.cooperative_run = None;
                Some(result)
            }
        }
    }

    pub fn cancel_recalculation(&mut self) {
        if let Some(run) = &self.cooperative_run {
            run.cancel_token().cancel();
        }
    }

    // --- structural operations -------------------------------------------

    pub fn insert_rows(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        let result = self.store.insert_rows(at, count);
        self.viewport.invalidate_dimensions();
        result
    }

    pub fn delete_rows(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        let result = self.store.delete_rows(at, count);
        self.viewport.invalidate_dimensions();
        result
    }

    pub fn insert_cols(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        let result = self.store.insert_cols(at, count);
        self.viewport.invalidate_dimensions();
        result
    }

    pub fn delete_cols(&mut self, at: u32, count: u32) -> Result<(), StoreError> {
        let result = self.store.delete_cols(at, count);
        self.viewport.invalidate_dimensions();
        result
    }

    // --- row/column dimensions -------------------------------------------

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.store.set_row_height(row, height);
        self.viewport.invalidate_dimensions();
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.store.set_row_hidden(row, hidden);
        self.viewport.invalidate_dimensions();
    }

    pub fn set_col_width(&mut self, col: u32, width: f64) {
        self.store.set_col_width(col, width);
        self.viewport.invalidate_dimensions();
    }

    pub fn set_col_hidden(&mut self, col: u32, hidden: bool) {
        self.store.set_col_hidden(col, hidden);
        self.viewport.invalidate_dimensions();
    }

    // --- selection ---------------------------------------------------------

    pub fn selection(&self) -> &Selection {
        self.selection.state()
    }

    pub fn subscribe_selection(&mut self, listener: impl FnMut(&Selection, &Selection) + 'static) {
        self.selection.subscribe(listener);
    }

    pub fn set_active_cell(&mut self, row: u32, col: u32) {
        self.selection.set_active_cell(CellKey::new(row, col));
    }

    pub fn set_selection_range(&mut self, range: CellRange, active: Option<CellKey>) {
        self.selection.set_range(range, active);
    }

    pub fn extend_selection(&mut self, target: CellKey) {
        self.selection.extend_selection(target);
    }

    pub fn add_selection_range(&mut self, range: CellRange) {
        self.selection.add_range(range);
    }

    pub fn add_selection_cell(&mut self, cell: CellKey) {
        self.selection.add_cell(cell);
    }

    pub fn remove_selection_range(&mut self, index: usize) {
        self.selection.remove_range(index);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn move_active_cell(&mut self, dr: i64, dc: i64, extend: bool) {
        self.selection.move_active_cell(dr, dc, extend);
    }

    pub fn move_within_selection(&mut self, direction: CycleDirection) {
        self.selection.move_within_selection(&self.store, direction);
    }

    pub fn ctrl_arrow(&mut self, dir: Direction) {
        self.selection.ctrl_arrow(&self.store, dir);
    }

    pub fn ctrl_shift_arrow(&mut self, dir: Direction) {
        self.selection.ctrl_shift_arrow(&self.store, dir);
    }

    pub fn ctrl_a(&mut self) {
        let used = self.used_range_as_cell_range();
        self.selection.ctrl_a(&self.store, used);
    }

    pub fn home(&mut self, extend: bool) {
        self.selection.home(extend);
    }

    pub fn end(&mut self, extend: bool) {
        self.selection.end(extend);
    }

    pub fn ctrl_home(&mut self, extend: bool) {
        self.selection.ctrl_home(extend);
    }

    pub fn ctrl_end(&mut self, extend: bool) {
        let used = self.used_range_as_cell_range();
        self.selection.ctrl_end(used, extend);
    }

    pub fn page_up(&mut self, extend: bool) {
        let page_row_count = self.page_row_count();
        self.selection.page_up(page_row_count, extend);
    }

    pub fn page_down(&mut self, extend: bool) {
        let page_row_count = self.page_row_count();
        self.selection.page_down(page_row_count, extend);
    }

    fn page_row_count(&self) -> u32 {
        let (_, height) = self.viewport.viewport_size();
        let row_height = self.viewport.config().default_row_height.max(1.0);
        ((height / row_height).floor() as u32).max(1)
    }

    fn used_range_as_cell_range(&mut self) -> Option<CellRange> {
        let used = self.store.used_range();
        if used.is_empty() {
            None
        } else {
            Some(CellRange::new(
                CellKey::new(used.start_row as u32, used.start_col as u32),
                CellKey::new(used.end_row as u32, used.end_col as u32),
            ))
        }
    }

    // --- viewport ---------------------------------------------------------

    pub fn scroll_to(&mut self, row: u32, col: u32) {
        self.viewport.scroll_to_cell(&self.store, row, col);
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.set_viewport_size(width, height);
    }

    pub fn set_frozen_panes(&mut self, frozen_rows: u32, frozen_cols: u32) {
        self.viewport.set_frozen_panes(frozen_rows, frozen_cols);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    pub fn set_rtl(&mut self, rtl: bool) {
        self.viewport.set_rtl(rtl);
    }

    pub fn render_frame(&mut self) -> RenderFrame<CellRecord> {
        self.viewport.render_frame(&self.store)
    }
}
