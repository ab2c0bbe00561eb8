//! Resumable, time-sliced recalculation.
//!
//! The core has no bundled async runtime or event loop, so rather than an
//! `async fn` this models suspension as an explicit resumable value: a host
//! calls [`CooperativeRun::step`] from its own scheduler (a microtask, an
//! idle callback, or just a loop) until it reports [`StepOutcome::Done`].

use std::collections::VecDeque;
use std::time::Instant;

use tabulon_common::{CellKey, CellValue, ErrorTag};
use tabulon_graph::DependencyGraph;
use tabulon_store::CellStore;

use crate::cancel::CancelToken;
use crate::evaluator::Evaluator;
use crate::lookup::RecursiveLookup;
use crate::options::{CalcOptions, CalcResult};

#[derive(Debug)]
pub enum StepOutcome {
    /// The slice budget was reached; call `step` again to resume.
    Continue,
    Done(CalcResult),
}

/// One in-flight cooperative calculation. Cells within a slice complete in
/// the topological order computed when the run began; that order is fixed
/// for the run's lifetime and never recomputed mid-run.
pub struct CooperativeRun {
    order: VecDeque<CellKey>,
    total: usize,
    cancel: CancelToken,
    success_count: usize,
    errors: Vec<(CellKey, ErrorTag)>,
    started: Instant,
}

impl CooperativeRun {
    pub(crate) fn new(order: Vec<CellKey>, cancel: CancelToken) -> Self {
        let total = order.len();
        Self {
            order: order.into(),
            total,
            cancel,
            success_count: 0,
            errors: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Process cells until the slice's time or cell-count budget is
    /// exhausted, the cancellation token is observed, or the order drains.
    pub fn step<E: Evaluator>(
        &mut self,
        store: &mut CellStore,
        graph: &mut DependencyGraph,
        evaluator: &E,
        opts: &CalcOptions,
    ) -> StepOutcome {
        self.step_with_progress(store, graph, evaluator, opts, &mut |_, _, _, _| {})
    }

    /// Same as [`Self::step`], but `on_cell(key, completed, total, errors
    /// so far)` is invoked right after every cell evaluation — the
    /// per-cell progress sink hook a host can wire to a UI.
    pub fn step_with_progress<E: Evaluator>(
        &mut self,
        store: &mut CellStore,
        graph: &mut DependencyGraph,
        evaluator: &E,
        opts: &CalcOptions,
        on_cell: &mut dyn FnMut(CellKey, usize, usize, &[(CellKey, ErrorTag)]),
    ) -> StepOutcome {
        let slice_start = Instant::now();
        let mut processed_in_slice = 0usize;

        while let Some(key) = self.order.front().copied() {
            if self.cancel.is_cancelled() {
                return StepOutcome::Done(self.partial_result(false));
            }

            {
                let lookup = RecursiveLookup::new(store, graph, evaluator);
                lookup.evaluate(key);
            }
            self.order.pop_front();

            match store.get(key.row(), key.col()).map(|r| &r.value) {
                Some(CellValue::Error(tag)) => self.errors.push((key, *tag)),
                Some(_) => self.success_count += 1,
                None => {}
            }

            let completed = self.success_count + self.errors.len();
            on_cell(key, completed, self.total, &self.errors);

            processed_in_slice += 1;
            if processed_in_slice >= opts.cell_budget || slice_start.elapsed() >= opts.time_budget {
                return StepOutcome::Continue;
            }
        }

        graph.clear_all_dirty();
        StepOutcome::Done(self.partial_result(true))
    }

    fn partial_result(&self, success: bool) -> CalcResult {
        CalcResult {
            success,
            success_count: self.success_count,
            errors: self.errors.clone(),
            duration: self.started.elapsed(),
        }
    }
}
