/// Plain configuration for the viewport engine. No file I/O — the core has
/// no persistence of its own, so this is just a struct with a `Default`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub overscan_rows: u32,
    pub overscan_cols: u32,
    pub header_width: f64,
    pub header_height: f64,
    pub default_row_height: f64,
    pub default_col_width: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            overscan_rows: 3,
            overscan_cols: 2,
            header_width: 48.0,
            header_height: 24.0,
            default_row_height: 20.0,
            default_col_width: 64.0,
        }
    }
}
