//! Virtualized viewport over a potentially million-row grid: lazy
//! prefix-sum position caches, a filter-aware dimension adapter, and
//! render-frame assembly.

pub mod config;
pub mod filter;
pub mod frame;
pub mod position_cache;
pub mod viewport;

pub use config::ViewportConfig;
pub use filter::FilteredDimensions;
pub use frame::{
    ColumnDescriptor, FreezeLines, Rect, RenderCell, RenderFrame, RowDescriptor, ScrollPosition,
};
pub use position_cache::PositionCache;
pub use viewport::ViewportEngine;
