//! Render frame types: the immutable snapshot `renderFrame()` produces.

/// A screen-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowDescriptor {
    pub index: u32,
    pub top: f64,
    pub height: f64,
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDescriptor {
    pub index: u32,
    pub left: f64,
    pub width: f64,
    pub frozen: bool,
}

/// One cell positioned on screen. `cell` is `None` for empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCell<C> {
    pub row: u32,
    pub col: u32,
    pub rect: Rect,
    pub cell: Option<C>,
}

/// Screen-space lines separating frozen panes from the scrollable area.
/// `None` when the corresponding frozen count is 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FreezeLines {
    pub y: Option<f64>,
    pub x: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

/// One immutable snapshot produced by `renderFrame()`. A new frame
/// supersedes all prior ones; there is no incremental frame diffing in the
/// core.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame<C> {
    pub rows: Vec<RowDescriptor>,
    pub columns: Vec<ColumnDescriptor>,
    pub cells: Vec<RenderCell<C>>,
    pub freeze_lines: FreezeLines,
    pub content_bounds: Rect,
    pub scroll: ScrollPosition,
    pub visible_bounds: Rect,
}
