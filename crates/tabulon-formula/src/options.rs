use std::time::Duration;

/// Cooperative-slice budgets and the result shape of a calculation run.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalcOptions {
    /// Wall-clock budget per slice before yielding to the host scheduler.
    pub time_budget: Duration,
    /// Cell-count budget per slice before yielding, whichever is hit first.
    pub cell_budget: usize,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(16),
            cell_budget: 100,
        }
    }
}

/// The outcome of a synchronous, affected-only, or completed cooperative
/// calculation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcResult {
    pub success: bool,
    pub success_count: usize,
    pub errors: Vec<(tabulon_common::CellKey, tabulon_common::ErrorTag)>,
    pub duration: Duration,
}
