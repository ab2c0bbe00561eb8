//! The viewport engine: position caches, viewport-rectangle computation,
//! and render frame assembly for a virtualized grid.

use tabulon_common::{CellSource, DimensionProvider, MAX_COLS, MAX_ROWS};
use tracing::trace;

use crate::config::ViewportConfig;
use crate::frame::{
    ColumnDescriptor, FreezeLines, Rect, RenderCell, RenderFrame, RowDescriptor, ScrollPosition,
};
use crate::position_cache::PositionCache;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 4.0;

/// The visible cell range in content-space indices, already widened by
/// overscan and clamped to the frozen/grid boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewportRect {
    start_row: u32,
    end_row: u32,
    start_col: u32,
    end_col: u32,
}

/// Owns the two position caches plus the scroll/zoom/freeze/RTL state that
/// determines what's on screen. Generic over any `DimensionProvider` so it
/// never needs to know about a concrete cell store.
pub struct ViewportEngine {
    config: ViewportConfig,
    row_cache: PositionCache,
    col_cache: PositionCache,
    frozen_rows: u32,
    frozen_cols: u32,
    zoom: f64,
    rtl: bool,
    scroll: ScrollPosition,
    viewport_width: f64,
    viewport_height: f64,
    cached_rect: Option<ViewportRect>,
}

impl ViewportEngine {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            row_cache: PositionCache::new(MAX_ROWS, config.default_row_height),
            col_cache: PositionCache::new(MAX_COLS, config.default_col_width),
            config,
            frozen_rows: 0,
            frozen_cols: 0,
            zoom: 1.0,
            rtl: false,
            scroll: ScrollPosition { x: 0.0, y: 0.0 },
            viewport_width: 0.0,
            viewport_height: 0.0,
            cached_rect: None,
        }
    }

    fn invalidate_rect(&mut self) {
        self.cached_rect = None;
    }

    /// Any structural or dimension change (row height, hidden flag, insert
    /// row/col) invalidates both position caches and the viewport rect.
    pub fn invalidate_dimensions(&mut self) {
        self.row_cache.invalidate();
        self.col_cache.invalidate();
        self.invalidate_rect();
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
        self.invalidate_rect();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.invalidate_rect();
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_rtl(&mut self, rtl: bool) {
        self.rtl = rtl;
        self.invalidate_rect();
    }

    pub fn set_frozen_panes(&mut self, frozen_rows: u32, frozen_cols: u32) {
        self.frozen_rows = frozen_rows;
        self.frozen_cols = frozen_cols;
        self.invalidate_rect();
    }

    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.scroll = ScrollPosition {
            x: x.max(0.0),
            y: y.max(0.0),
        };
        self.invalidate_rect();
    }

    fn scrollable_width(&self) -> f64 {
        ((self.viewport_width - self.config.header_width).max(0.0)) / self.zoom
    }

    fn scrollable_height(&self) -> f64 {
        ((self.viewport_height - self.config.header_height).max(0.0)) / self.zoom
    }

    fn viewport_rect<P: DimensionProvider>(&mut self, provider: &P) -> ViewportRect {
        if let Some(rect) = self.cached_rect {
            return rect;
        }

        let row_sizer = |r: u32| -> f64 {
            if provider.is_row_hidden(r) {
                0.0
            } else {
                provider.row_height(r)
            }
        };
        let col_sizer = |c: u32| -> f64 {
            if provider.is_col_hidden(c) {
                0.0
            } else {
                provider.col_width(c)
            }
        };

        let visible_height = self.scrollable_height();
        let visible_width = self.scrollable_width();

        let raw_start_row = self.row_cache.find_index_at(self.scroll.y, &row_sizer);
        let raw_end_row = self
            .row_cache
            .find_index_at(self.scroll.y + visible_height, &row_sizer);
        let raw_start_col = self.col_cache.find_index_at(self.scroll.x, &col_sizer);
        let raw_end_col = self
            .col_cache
            .find_index_at(self.scroll.x + visible_width, &col_sizer);

        let start_row = raw_start_row
            .saturating_sub(self.config.overscan_rows)
            .max(self.frozen_rows);
        let end_row = raw_end_row
            .saturating_add(self.config.overscan_rows)
            .min(MAX_ROWS - 1);
        let start_col = raw_start_col
            .saturating_sub(self.config.overscan_cols)
            .max(self.frozen_cols);
        let end_col = raw_end_col
            .saturating_add(self.config.overscan_cols)
            .min(MAX_COLS - 1);

        let rect = ViewportRect {
            start_row,
            end_row,
            start_col,
            end_col,
        };
        self.cached_rect = Some(rect);
        trace!(
            start_row = rect.start_row,
            end_row = rect.end_row,
            start_col = rect.start_col,
            end_col = rect.end_col,
            "viewport rect recomputed"
        );
        rect
    }

    fn row_screen_top(&mut self, row: u32, frozen: bool, sizer: &dyn Fn(u32) -> f64) -> f64 {
        let content_top = self.row_cache.position(row, sizer);
        let scroll_adjusted = if frozen { content_top } else { content_top - self.scroll.y };
        self.config.header_height + scroll_adjusted * self.zoom
    }

    fn col_screen_left(&mut self, col: u32, frozen: bool, sizer: &dyn Fn(u32) -> f64) -> f64 {
        let content_left = self.col_cache.position(col, sizer);
        let scroll_adjusted = if frozen { content_left } else { content_left - self.scroll.x };
        self.config.header_width + scroll_adjusted * self.zoom
    }

    fn mirror_x(&self, x: f64, width: f64) -> f64 {
        if self.rtl {
            self.viewport_width - x - width
        } else {
            x
        }
    }

    /// Assembles one immutable render frame. Cells come from `provider`'s
    /// `CellSource` side; dimensions from its `DimensionProvider` side.
    pub fn render_frame<P>(&mut self, provider: &P) -> RenderFrame<P::Cell>
    where
        P: DimensionProvider + CellSource,
    {
        let rect = self.viewport_rect(provider);

        let row_sizer = |r: u32| -> f64 {
            if provider.is_row_hidden(r) {
                0.0
            } else {
                provider.row_height(r)
            }
        };
        let col_sizer = |c: u32| -> f64 {
            if provider.is_col_hidden(c) {
                0.0
            } else {
                provider.col_width(c)
            }
        };

        let frozen_row_range: Vec<u32> = (0..self.frozen_rows)
            .filter(|&r| !provider.is_row_hidden(r))
            .collect();
        let scroll_row_range: Vec<u32> = (rect.start_row..=rect.end_row)
            .filter(|&r| !provider.is_row_hidden(r))
            .collect();
        let frozen_col_range: Vec<u32> = (0..self.frozen_cols)
            .filter(|&c| !provider.is_col_hidden(c))
            .collect();
        let scroll_col_range: Vec<u32> = (rect.start_col..=rect.end_col)
            .filter(|&c| !provider.is_col_hidden(c))
            .collect();

        let mut rows = Vec::with_capacity(frozen_row_range.len() + scroll_row_range.len());
        for &r in frozen_row_range.iter().chain(scroll_row_range.iter()) {
            let frozen = r < self.frozen_rows;
            let top = self.row_screen_top(r, frozen, &row_sizer);
            let height = provider.row_height(r) * self.zoom;
            rows.push(RowDescriptor {
                index: r,
                top,
                height,
                frozen,
            });
        }

        let mut columns = Vec::with_capacity(frozen_col_range.len() + scroll_col_range.len());
        for &c in frozen_col_range.iter().chain(scroll_col_range.iter()) {
            let frozen = c < self.frozen_cols;
            let width = provider.col_width(c) * self.zoom;
            let left = self.col_screen_left(c, frozen, &col_sizer);
            let left = self.mirror_x(left, width);
            columns.push(ColumnDescriptor {
                index: c,
                left,
                width,
                frozen,
            });
        }

        let mut cells = Vec::new();
        let quadrants: [(&[u32], &[u32]); 4] = [
            (&frozen_row_range, &frozen_col_range),
            (&frozen_row_range, &scroll_col_range),
            (&scroll_row_range, &frozen_col_range),
            (&scroll_row_range, &scroll_col_range),
        ];
        for (row_set, col_set) in quadrants {
            for &r in row_set {
                let row_frozen = r < self.frozen_rows;
                let top = self.row_screen_top(r, row_frozen, &row_sizer);
                let height = provider.row_height(r) * self.zoom;
                for &c in col_set {
                    let col_frozen = c < self.frozen_cols;
                    let width = provider.col_width(c) * self.zoom;
                    let left = self.col_screen_left(c, col_frozen, &col_sizer);
                    let left = self.mirror_x(left, width);
                    cells.push(RenderCell {
                        row: r,
                        col: c,
                        rect: Rect {
                            x: left,
                            y: top,
                            width,
                            height,
                        },
                        cell: provider.get_cell(r, c),
                    });
                }
            }
        }

        let freeze_lines = FreezeLines {
            y: if self.frozen_rows > 0 {
                Some(self.config.header_height + self.row_cache.total_size(self.frozen_rows - 1, &row_sizer) * self.zoom)
            } else {
                None
            },
            x: if self.frozen_cols > 0 {
                Some(self.config.header_width + self.col_cache.total_size(self.frozen_cols - 1, &col_sizer) * self.zoom)
            } else {
                None
            },
        };

        let content_width = self.col_cache.total_size(MAX_COLS - 1, &col_sizer);
        let content_height = self.row_cache.total_size(MAX_ROWS - 1, &row_sizer);

        RenderFrame {
            rows,
            columns,
            cells,
            freeze_lines,
            content_bounds: Rect {
                x: 0.0,
                y: 0.0,
                width: content_width,
                height: content_height,
            },
            scroll: self.scroll,
            visible_bounds: Rect {
                x: self.scroll.x,
                y: self.scroll.y,
                width: self.scrollable_width(),
                height: self.scrollable_height(),
            },
        }
    }

    /// Adjusts scroll by the minimum amount that brings `(row, col)` fully
    /// into the visible (non-frozen) area. A cell on a frozen axis leaves
    /// that axis untouched.
    pub fn scroll_to_cell<P: DimensionProvider>(&mut self, provider: &P, row: u32, col: u32) {
        let row_sizer = |r: u32| -> f64 {
            if provider.is_row_hidden(r) {
                0.0
            } else {
                provider.row_height(r)
            }
        };
        let col_sizer = |c: u32| -> f64 {
            if provider.is_col_hidden(c) {
                0.0
            } else {
                provider.col_width(c)
            }
        };

        if row >= self.frozen_rows {
            let cell_top = self.row_cache.position(row, &row_sizer);
            let cell_bottom = cell_top + provider.row_height(row);
            let visible_height = self.scrollable_height();
            let mut y = self.scroll.y;
            if cell_top < y {
                y = cell_top;
            } else if cell_bottom > y + visible_height {
                y = cell_bottom - visible_height;
            }
            self.scroll.y = y.max(0.0);
        }

        if col >= self.frozen_cols {
            let cell_left = self.col_cache.position(col, &col_sizer);
            let cell_right = cell_left + provider.col_width(col);
            let visible_width = self.scrollable_width();
            let mut x = self.scroll.x;
            if cell_left < x {
                x = cell_left;
            } else if cell_right > x + visible_width {
                x = cell_right - visible_width;
            }
            self.scroll.x = x.max(0.0);
        }

        self.invalidate_rect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    struct Fixture {
        hidden_rows: FxHashSet<u32>,
    }

    impl DimensionProvider for Fixture {
        fn row_height(&self, _row: u32) -> f64 {
            20.0
        }
        fn col_width(&self, _col: u32) -> f64 {
            64.0
        }
        fn is_row_hidden(&self, row: u32) -> bool {
            self.hidden_rows.contains(&row)
        }
        fn is_col_hidden(&self, _col: u32) -> bool {
            false
        }
    }

    impl CellSource for Fixture {
        type Cell = ();
        fn get_cell(&self, _row: u32, _col: u32) -> Option<()> {
            None
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            hidden_rows: FxHashSet::default(),
        }
    }

    #[test]
    fn viewport_rect_widens_by_overscan_and_clamps_at_zero() {
        let provider = fixture();
        let mut engine = ViewportEngine::new(ViewportConfig::default());
        engine.set_viewport_size(1200.0, 800.0);
        engine.set_scroll(0.0, 0.0);
        let rect = engine.viewport_rect(&provider);
        assert_eq!(rect.start_row, 0);
        assert_eq!(rect.start_col, 0);
    }

    #[test]
    fn render_frame_orders_quadrants_frozen_first() {
        let provider = fixture();
        let mut engine = ViewportEngine::new(ViewportConfig::default());
        engine.set_viewport_size(400.0, 300.0);
        engine.set_frozen_panes(2, 1);
        let frame = engine.render_frame(&provider);
        assert!(frame.cells[0].row < 2 && frame.cells[0].col < 1);
        assert!(frame.rows.iter().take(2).all(|r| r.frozen));
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let mut engine = ViewportEngine::new(ViewportConfig::default());
        engine.set_zoom(100.0);
        assert_eq!(engine.zoom(), MAX_ZOOM);
        engine.set_zoom(0.0);
        assert_eq!(engine.zoom(), MIN_ZOOM);
    }

    #[test]
    fn scroll_to_cell_brings_cell_into_view_below_fold() {
        let provider = fixture();
        let mut engine = ViewportEngine::new(ViewportConfig::default());
        engine.set_viewport_size(400.0, 200.0);
        engine.scroll_to_cell(&provider, 100, 0);
        let scroll = engine.scroll();
        assert!(scroll.y > 0.0);
    }

    #[test]
    fn scroll_to_cell_ignores_frozen_axis() {
        let provider = fixture();
        let mut engine = ViewportEngine::new(ViewportConfig::default());
        engine.set_viewport_size(400.0, 200.0);
        engine.set_frozen_panes(5, 0);
        engine.scroll_to_cell(&provider, 2, 0);
        assert_eq!(engine.scroll().y, 0.0);
    }

    #[test]
    fn setting_zoom_invalidates_cached_rect() {
        let provider = fixture();
        let mut engine = ViewportEngine::new(ViewportConfig::default());
        engine.set_viewport_size(400.0, 200.0);
        let _ = engine.viewport_rect(&provider);
        assert!(engine.cached_rect.is_some());
        engine.set_zoom(2.0);
        assert!(engine.cached_rect.is_none());
    }
}
