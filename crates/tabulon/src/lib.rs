//! Meta crate that re-exports the six Tabulon component crates behind
//! feature flags and provides the [`Engine`] facade that wires them
//! together. Downstream users can depend on this crate alone, or reach
//! into the re-exported component modules for deeper integration.

pub use tabulon_common as common;

#[cfg(feature = "store")]
pub use tabulon_store as store;

#[cfg(feature = "graph")]
pub use tabulon_graph as graph;

#[cfg(feature = "formula")]
pub use tabulon_formula as formula;

#[cfg(feature = "viewport")]
pub use tabulon_viewport as viewport;

#[cfg(feature = "selection")]
pub use tabulon_selection as selection;

#[cfg(all(
    feature = "store",
    feature = "graph",
    feature = "formula",
    feature = "viewport",
    feature = "selection"
))]
mod engine;

#[cfg(all(
    feature = "store",
    feature = "graph",
    feature = "formula",
    feature = "viewport",
    feature = "selection"
))]
pub use engine::{Engine, Progress};
