pub mod cancel;
pub mod cooperative;
pub mod engine;
pub mod evaluator;
mod lookup;
pub mod options;

pub use cancel::CancelToken;
pub use cooperative::{CooperativeRun, StepOutcome};
pub use engine::{mark_range_dirty, FormulaEngine};
pub use evaluator::{CellLookup, EvalOutcome, Evaluator};
pub use options::{CalcOptions, CalcResult};
