use tabulon_common::{CellValue, ErrorTag};
use tabulon_formula::{CalcOptions, CellLookup, EvalOutcome, Evaluator, FormulaEngine, StepOutcome};
use tabulon_graph::DependencyGraph;
use tabulon_store::CellStore;

/// A toy evaluator: `=REF(A1)` returns the referenced cell's value doubled
/// if numeric; `=BOOM` panics (exercises the `#VALUE!` panic boundary);
/// anything else returns its source text as a literal.
struct ToyEvaluator;

impl Evaluator for ToyEvaluator {
    fn eval(&self, formula: &str, lookup: &dyn CellLookup) -> EvalOutcome {
        let body = formula.trim_start_matches('=');
        if body == "BOOM" {
            panic!("evaluator exploded");
        }
        if let Some(rest) = body.strip_prefix("REF(").and_then(|s| s.strip_suffix(')')) {
            let key = tabulon_common::parse_cell_ref(rest).map_err(|_| ErrorTag::Ref)?;
            let value = lookup.lookup(key.row(), key.col());
            return match value {
                CellValue::Number(n) => Ok(CellValue::Number(n * 2.0)),
                CellValue::Null => Ok(CellValue::Number(0.0)),
                other => Ok(other),
            };
        }
        Ok(CellValue::Text(body.to_string()))
    }
}

#[test]
fn set_formula_on_circular_reference_stores_ref_error() {
    let mut store = CellStore::new();
    let mut graph = DependencyGraph::new();
    let engine = FormulaEngine::new(ToyEvaluator);

    let err = engine
        .set_formula(&mut store, &mut graph, 0, 0, "=REF(A1)")
        .unwrap_err();
    assert_eq!(err, ErrorTag::Ref);
    assert_eq!(store.get(0, 0).unwrap().value, CellValue::Error(ErrorTag::Ref));
}

#[test]
fn synchronous_recalculate_propagates_through_dependents() {
    let mut store = CellStore::new();
    let mut graph = DependencyGraph::new();
    let engine = FormulaEngine::new(ToyEvaluator);

    store
        .set(0, 0, Some(tabulon_store::CellRecord::new(CellValue::Number(3.0))))
        .unwrap();
    engine.set_formula(&mut store, &mut graph, 1, 0, "=REF(A1)").unwrap();
    engine.set_formula(&mut store, &mut graph, 2, 0, "=REF(A2)").unwrap();

    let result = engine.recalculate(&mut store, &mut graph);
    assert!(result.success);
    assert_eq!(store.get(1, 0).unwrap().value, CellValue::Number(6.0));
    assert_eq!(store.get(2, 0).unwrap().value, CellValue::Number(12.0));
}

#[test]
fn evaluator_panic_is_caught_as_value_error() {
    let mut store = CellStore::new();
    let mut graph = DependencyGraph::new();
    let engine = FormulaEngine::new(ToyEvaluator);

    engine.set_formula(&mut store, &mut graph, 0, 0, "=BOOM").unwrap();
    let result = engine.recalculate(&mut store, &mut graph);
    assert_eq!(store.get(0, 0).unwrap().value, CellValue::Error(ErrorTag::Value));
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn cooperative_run_drains_in_slices_and_completes() {
    let mut store = CellStore::new();
    let mut graph = DependencyGraph::new();
    let mut engine = FormulaEngine::new(ToyEvaluator);

    for row in 0..10u32 {
        store
            .set(row, 0, Some(tabulon_store::CellRecord::new(CellValue::Number(row as f64))))
            .unwrap();
        engine
            .set_formula(&mut store, &mut graph, row, 1, &format!("=REF({})", tabulon_common::cell_ref_to_string(tabulon_common::CellKey::new(row, 0))))
            .unwrap();
    }

    let mut run = engine.begin_cooperative(&mut graph);
    let tight_budget = CalcOptions { cell_budget: 3, ..Default::default() };

    let mut slices = 0;
    loop {
        slices += 1;
        match run.step(&mut store, &mut graph, engine.evaluator(), &tight_budget) {
            StepOutcome::Continue => continue,
            StepOutcome::Done(result) => {
                assert!(result.success);
                assert_eq!(result.success_count, 10);
                break;
            }
        }
    }
    assert!(slices >= 4, "a 3-cell budget over 10 cells should need multiple slices");

    for row in 0..10u32 {
        assert_eq!(store.get(row, 1).unwrap().value, CellValue::Number(row as f64 * 2.0));
    }
}

#[test]
fn cancelling_cooperative_run_leaves_dirty_flags_set() {
    let mut store = CellStore::new();
    let mut graph = DependencyGraph::new();
    let mut engine = FormulaEngine::new(ToyEvaluator);

    for row in 0..5u32 {
        engine.set_formula(&mut store, &mut graph, row, 0, "=1").unwrap();
    }

    let mut run = engine.begin_cooperative(&mut graph);
    run.cancel_token().cancel();

    let budget = CalcOptions::default();
    match run.step(&mut store, &mut graph, engine.evaluator(), &budget) {
        StepOutcome::Done(result) => assert!(!result.success),
        StepOutcome::Continue => panic!("cancellation should resolve immediately"),
    }

    for row in 0..5u32 {
        assert!(store.get(row, 0).unwrap().dirty, "unprocessed cells keep their dirty flag set");
    }
}
