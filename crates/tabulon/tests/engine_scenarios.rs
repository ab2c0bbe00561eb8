use tabulon::Engine;
use tabulon_common::{CellKey, CellValue, ErrorTag};
use tabulon_formula::{CellLookup, EvalOutcome, Evaluator};
use tabulon_viewport::ViewportConfig;

/// `=REF(A1)` doubles a numeric precedent; anything else is literal text.
struct ToyEvaluator;

impl Evaluator for ToyEvaluator {
    fn eval(&self, formula: &str, lookup: &dyn CellLookup) -> EvalOutcome {
        let body = formula.trim_start_matches('=');
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

fn engine() -> Engine<ToyEvaluator> {
    Engine::new(ToyEvaluator, ViewportConfig::default())
}

#[test]
fn scenario_value_then_dependent_formula_recalculates() {
    let mut e = engine();
    e.set_cell(0, 0, CellValue::Number(1.0)).unwrap();
    e.set_formula(1, 0, "=REF(A1)").unwrap();
    e.set_cell(0, 0, CellValue::Number(2.0)).unwrap();

    let result = e.recalculate();
    assert!(result.success);
    assert_eq!(e.get_cell(1, 0).unwrap().value, CellValue::Number(4.0));
}

#[test]
fn scenario_circular_reference_both_cells_become_ref_error() {
    let mut e = engine();
    let err_b1 = e.set_formula(0, 0, "=REF(B1)");
    let err_a1 = e.set_formula(0, 1, "=REF(A1)");
    assert_eq!(err_a1, Err(ErrorTag::Ref));
    assert!(err_b1.is_ok() || err_b1 == Err(ErrorTag::Ref));

    e.recalculate();
    assert_eq!(e.get_cell(0, 1).unwrap().value, CellValue::Error(ErrorTag::Ref));
    assert_eq!(e.get_cell(0, 0).unwrap().value, CellValue::Error(ErrorTag::Ref));
}

#[test]
fn scenario_insert_rows_shifts_values_and_used_range() {
    let mut e = engine();
    for row in 0..10u32 {
        for col in 0..3u32 {
            e.set_cell(row, col, CellValue::Number((row * 3 + col) as f64)).unwrap();
        }
    }
    e.insert_rows(2, 3).unwrap();

    for row in 2..5u32 {
        for col in 0..3u32 {
            assert!(e.get_cell(row, col).is_none());
        }
    }
    assert_eq!(
        e.get_cell(5, 0).unwrap().value,
        CellValue::Number(2.0 * 3.0)
    );
}

#[test]
fn selection_and_viewport_verbs_compose_through_the_facade() {
    let mut e = engine();
    e.set_viewport_size(1200.0, 800.0);
    e.set_active_cell(10, 10);
    assert_eq!(e.selection().active_cell(), CellKey::new(10, 10));

    e.scroll_to(500, 0);
    let frame = e.render_frame();
    assert!(!frame.rows.is_empty());
}

#[test]
fn cooperative_recalculation_can_be_cancelled_through_the_facade() {
    let mut e = engine();
    for row in 0..20u32 {
        e.set_formula(row, 0, "=1").unwrap();
    }
    let token = e.begin_cooperative_recalculate();
    token.cancel();

    let result = e.step_cooperative(None);
    assert_eq!(result.map(|r| r.success), Some(false));
}
