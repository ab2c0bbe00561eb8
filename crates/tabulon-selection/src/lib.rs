//! Immutable selection-state machine: active cell, anchor, multiple
//! ranges, keyboard/pointer transitions, and fire-on-change subscription.
//! Generic over the [`tabulon_common::CellNavigation`] /
//! [`tabulon_common::DimensionProvider`] traits so it never depends on a
//! concrete cell store.

pub mod ctrl_a;
pub mod manager;
pub mod selection;

pub use ctrl_a::{CtrlACycle, CtrlAStage};
pub use manager::{CycleDirection, SelectionManager};
pub use selection::{Selection, SelectionMode};
