//! Timing state behind the Ctrl+A cycle: current region, then used range,
//! then the entire grid, restarting if the presses are more than a second
//! apart.

use std::time::{Duration, Instant};

const RESET_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAStage {
    CurrentRegion,
    UsedRange,
    EntireGrid,
}

impl CtrlAStage {
    fn from_index(index: u8) -> Self {
        match index % 3 {
            0 => CtrlAStage::CurrentRegion,
            1 => CtrlAStage::UsedRange,
            _ => CtrlAStage::EntireGrid,
        }
    }
}

#[derive(Debug)]
pub struct CtrlACycle {
    stage_index: u8,
    last_press: Option<Instant>,
}

impl CtrlACycle {
    pub fn new() -> Self {
        Self {
            stage_index: 0,
            last_press: None,
        }
    }

    /// Registers a press and returns the stage it lands on. A gap over
    /// [`RESET_WINDOW`] restarts the cycle at `CurrentRegion`.
    pub fn press(&mut self) -> CtrlAStage {
        let now = Instant::now();
        let continues = self
            .last_press
            .map(|last| now.duration_since(last) <= RESET_WINDOW)
            .unwrap_or(false);

        self.stage_index = if continues { self.stage_index + 1 } else { 0 };
        self.last_press = Some(now);
        CtrlAStage::from_index(self.stage_index)
    }
}

impl Default for CtrlACycle {
    fn default() -> Self {
        Self::new()
    }
}
