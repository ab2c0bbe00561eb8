//! The evaluator contract injected by the host.

use tabulon_common::{CellValue, ErrorTag};

/// What the evaluator returns for one formula: a value, or an error tag.
pub type EvalOutcome = Result<CellValue, ErrorTag>;

/// Resolves the current best value for a referenced cell: its raw value if
/// not a formula, its cached formula result if it is one (recursing into
/// evaluation first if that formula cell is still dirty), or null if empty.
pub trait CellLookup {
    fn lookup(&self, row: u32, col: u32) -> CellValue;
}

/// A pure function from formula source + a lookup callback to a value. The
/// engine treats a panic unwinding out of `eval` as `#VALUE!` — see
/// [`crate::engine::FormulaEngine::evaluate_cell`].
pub trait Evaluator {
    fn eval(&self, formula: &str, lookup: &dyn CellLookup) -> EvalOutcome;
}

impl<F> Evaluator for F
where
    F: Fn(&str, &dyn CellLookup) -> EvalOutcome,
{
    fn eval(&self, formula: &str, lookup: &dyn CellLookup) -> EvalOutcome {
        self(formula, lookup)
    }
}
