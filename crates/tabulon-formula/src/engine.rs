//! Orchestrates the cell store and dependency graph against an injected
//! evaluator: `setFormula`, synchronous/affected-only recalculation, and the
//! cooperative time-sliced path.

use std::time::Instant;

use tabulon_common::{CellKey, CellRange, CellValue, ErrorTag};
use tabulon_graph::{extract_references, is_volatile_formula, DependencyGraph, ParsedRef};
use tabulon_store::{CellRecord, CellStore};
use tracing::info;

use crate::cancel::CancelToken;
use crate::cooperative::CooperativeRun;
use crate::evaluator::Evaluator;
use crate::lookup::RecursiveLookup;
use crate::options::{CalcOptions, CalcResult};

/// Formula orchestration over a store + graph pair, parameterized by the
/// host's evaluator implementation.
pub struct FormulaEngine<E: Evaluator> {
    evaluator: E,
    active_cooperative: Option<CancelToken>,
}

impl<E: Evaluator> FormulaEngine<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            active_cooperative: None,
        }
    }

    /// Parse references out of `src`, wire them into the dependency graph,
    /// and mark `(row, col)` dirty. If the new edges are circular, `#REF!`
    /// is stored as the formula result for `(row, col)` and for every other
    /// cell on the cycle, and the call returns an error.
    pub fn set_formula(
        &self,
        store: &mut CellStore,
        graph: &mut DependencyGraph,
        row: u32,
        col: u32,
        src: &str,
    ) -> Result<(), ErrorTag> {
        let key = CellKey::new(row, col);
        let precedents = precedents_of_formula(src);
        let volatile = is_volatile_formula(src);

        let mut record = store
            .get(row, col)
            .cloned()
            .unwrap_or_else(|| CellRecord::new(CellValue::Null));
        record.formula = Some(src.to_string());

        match graph.set_deps(key, precedents, volatile) {
            Ok(()) => {
                record.dirty = true;
                store.set(row, col, Some(record)).ok();
                graph.mark_dirty(key);
                Ok(())
            }
            Err(err) => {
                record.value = CellValue::Error(ErrorTag::Ref);
                record.last_result = Some(CellValue::Error(ErrorTag::Ref));
                record.dirty = false;
                store.set(row, col, Some(record)).ok();

                for &member in &err.path {
                    if member == key {
                        continue;
                    }
                    let mut member_record = store
                        .get(member.row(), member.col())
                        .cloned()
                        .unwrap_or_else(|| CellRecord::new(CellValue::Null));
                    member_record.value = CellValue::Error(ErrorTag::Ref);
                    member_record.last_result = Some(CellValue::Error(ErrorTag::Ref));
                    member_record.dirty = false;
                    store.set(member.row(), member.col(), Some(member_record)).ok();
                }
                Err(ErrorTag::Ref)
            }
        }
    }

    /// Remove the formula from `(row, col)`, leaving its last value in
    /// place, and drop its outbound dependency edges.
    pub fn remove_formula(&self, store: &mut CellStore, graph: &mut DependencyGraph, row: u32, col: u32) {
        let key = CellKey::new(row, col);
        graph.remove_deps(key);
        if let Some(mut record) = store.get(row, col).cloned() {
            record.formula = None;
            record.dirty = false;
            let _ = store.set(row, col, Some(record));
        }
    }

    /// Mark volatile cells dirty, compute calculation order, evaluate every
    /// cell in order, then clear the dirty set.
    pub fn recalculate(&self, store: &mut CellStore, graph: &mut DependencyGraph) -> CalcResult {
        let start = Instant::now();
        graph.mark_volatile_dirty();
        let order = graph.calculation_order();

        let lookup = RecursiveLookup::new(store, graph, &self.evaluator);
        for key in &order {
            lookup.evaluate(*key);
        }
        drop(lookup);

        let (success_count, errors) = tally(store, &order);
        graph.clear_all_dirty();

        let result = CalcResult {
            success: true,
            success_count,
            errors,
            duration: start.elapsed(),
        };
        info!(
            success_count = result.success_count,
            error_count = result.errors.len(),
            duration_ms = result.duration.as_millis() as u64,
            "recalculate"
        );
        result
    }

    /// Mark `(row, col)` dirty and run the synchronous path; propagation
    /// through `markDirty` ensures every transitive dependent recomputes.
    pub fn recalculate_affected(
        &self,
        store: &mut CellStore,
        graph: &mut DependencyGraph,
        row: u32,
        col: u32,
    ) -> CalcResult {
        graph.mark_dirty(CellKey::new(row, col));
        self.recalculate(store, graph)
    }

    /// Begin a cooperative run. Any in-flight cooperative run is cancelled
    /// first — only one may be active.
    pub fn begin_cooperative(&mut self, graph: &mut DependencyGraph) -> CooperativeRun {
        if let Some(prior) = self.active_cooperative.take() {
            prior.cancel();
        }
        graph.mark_volatile_dirty();
        let order = graph.calculation_order();
        let token = CancelToken::new();
        self.active_cooperative = Some(token.clone());
        CooperativeRun::new(order, token)
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}

fn precedents_of_formula(src: &str) -> Vec<CellKey> {
    extract_references(src)
        .into_iter()
        .flat_map(|r| match r {
            ParsedRef::Single(key) => vec![key],
            ParsedRef::Range(range) => range.iter().collect::<Vec<_>>(),
        })
        .collect()
}

fn tally(store: &CellStore, order: &[CellKey]) -> (usize, Vec<(CellKey, ErrorTag)>) {
    let mut success = 0;
    let mut errors = Vec::new();
    for &key in order {
        match store.get(key.row(), key.col()).map(|r| &r.value) {
            Some(CellValue::Error(tag)) => errors.push((key, *tag)),
            Some(_) => success += 1,
            None => {}
        }
    }
    (success, errors)
}

/// Exposed so `recalculate`-adjacent callers (and the cooperative run) can
/// mark a range dirty before a synchronous recalculation, mirroring
/// `DG.markRangeDirty` in `spec.md` §4.2.
pub fn mark_range_dirty(graph: &mut DependencyGraph, range: &CellRange) {
    graph.mark_range_dirty(range);
}
