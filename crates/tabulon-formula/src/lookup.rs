//! The recursive, memoizing lookup handed to the evaluator.
//!
//! `Evaluator::eval` takes `&dyn CellLookup`, a shared reference — but
//! resolving a reference to a still-dirty formula cell requires recursing
//! into its evaluation and writing the result back into the store. That
//! mutation happens through `RefCell`s here rather than through `&mut`,
//! which is the idiomatic way to thread interior mutability through a
//! trait-object callback without infecting the `Evaluator` trait itself
//! with a `&mut self` requirement it doesn't otherwise need.

use std::cell::RefCell;

use rustc_hash::FxHashSet;
use tabulon_common::{CellKey, CellValue, ErrorTag};
use tabulon_graph::DependencyGraph;
use tabulon_store::CellStore;

use crate::evaluator::{CellLookup, Evaluator};

pub(crate) struct RecursiveLookup<'s, 'g, 'e, E: Evaluator> {
    store: RefCell<&'s mut CellStore>,
    graph: RefCell<&'g mut DependencyGraph>,
    evaluator: &'e E,
    in_progress: RefCell<FxHashSet<CellKey>>,
}

impl<'s, 'g, 'e, E: Evaluator> RecursiveLookup<'s, 'g, 'e, E> {
    pub(crate) fn new(store: &'s mut CellStore, graph: &'g mut DependencyGraph, evaluator: &'e E) -> Self {
        Self {
            store: RefCell::new(store),
            graph: RefCell::new(graph),
            evaluator,
            in_progress: RefCell::new(FxHashSet::default()),
        }
    }

    pub(crate) fn with_store_and_graph<R>(
        &self,
        f: impl FnOnce(&mut CellStore, &mut DependencyGraph) -> R,
    ) -> R {
        let mut store = self.store.borrow_mut();
        let mut graph = self.graph.borrow_mut();
        f(&mut store, &mut graph)
    }

    /// Evaluate `key` if it is a dirty formula cell, writing the result back
    /// into the store and clearing its dirty flag. Already-computed and
    /// non-formula cells are no-ops.
    pub(crate) fn evaluate(&self, key: CellKey) {
        let (needs_eval, circular) = self.with_store_and_graph(|store, graph| {
            let needs = store
                .get(key.row(), key.col())
                .map(|r| r.formula.is_some() && r.dirty)
                .unwrap_or(false);
            (needs, graph.has_circular(key))
        });

        if !needs_eval {
            return;
        }

        if circular {
            self.write_result(key, CellValue::Error(ErrorTag::Ref));
            return;
        }

        // Defensive recursion guard: the dependency graph already rejects
        // cycles at `setFormula` time, so this should never trigger, but a
        // lookup-time guard keeps a bug in `setDeps` from becoming a stack
        // overflow instead of a `#REF!`.
        if !self.in_progress.borrow_mut().insert(key) {
            self.write_result(key, CellValue::Error(ErrorTag::Ref));
            return;
        }

        let formula = self.with_store_and_graph(|store, _| {
            store.get(key.row(), key.col()).and_then(|r| r.formula.clone())
        });

        if let Some(formula) = formula {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                self.evaluator.eval(&formula, self)
            }));

            let value = match outcome {
                Ok(Ok(value)) => value,
                Ok(Err(tag)) => CellValue::Error(tag),
                Err(_) => CellValue::Error(ErrorTag::Value),
            };
            self.write_result(key, value);
        }

        self.in_progress.borrow_mut().remove(&key);
    }

    fn write_result(&self, key: CellKey, value: CellValue) {
        self.with_store_and_graph(|store, _| {
            if let Some(mut record) = store.get(key.row(), key.col()).cloned() {
                record.value = value.clone();
                record.last_result = Some(value);
                record.dirty = false;
                let _ = store.set(key.row(), key.col(), Some(record));
            }
        });
    }
}

impl<'s, 'g, 'e, E: Evaluator> CellLookup for RecursiveLookup<'s, 'g, 'e, E> {
    fn lookup(&self, row: u32, col: u32) -> CellValue {
        let Ok(key) = CellKey::try_new(row, col) else {
            return CellValue::Null;
        };
        self.evaluate(key);
        self.with_store_and_graph(|store, _| {
            store.get(row, col).map(|r| r.value.clone()).unwrap_or(CellValue::Null)
        })
    }
}
