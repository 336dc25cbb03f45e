/*
[INPUT]:  Chart section of the YAML config (or defaults)
[OUTPUT]: ChartOptions consumed by TerminalChart
[POS]:    Chart layer - appearance configuration
[UPDATE]: When adding chart appearance options
*/

use std::str::FromStr;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

const GRID_COLOR: &str = "#c5cbce";
const SERIES_COLOR: &str = "#2962FF";
// rgba(41, 98, 255, 0.28) over a white background
const SERIES_FILL_COLOR: &str = "#c3d3ff";

/// Full chart configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartOptions {
    /// Fixed width in cells; `None` follows the container width
    #[serde(default)]
    pub width: Option<u16>,
    /// Requested height, clamped to the panel when drawn
    #[serde(default = "default_height")]
    pub height: u16,
    #[serde(default)]
    pub layout: LayoutOptions,
    #[serde(default)]
    pub grid: GridOptions,
    #[serde(default)]
    pub crosshair: CrosshairOptions,
    #[serde(default)]
    pub right_price_scale: PriceScaleOptions,
    #[serde(default)]
    pub time_scale: TimeScaleOptions,
    #[serde(default)]
    pub series: AreaSeriesOptions,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: default_height(),
            layout: LayoutOptions::default(),
            grid: GridOptions::default(),
            crosshair: CrosshairOptions::default(),
            right_price_scale: PriceScaleOptions::default(),
            time_scale: TimeScaleOptions::default(),
            series: AreaSeriesOptions::default(),
        }
    }
}

impl ChartOptions {
    /// Reject values that cannot be drawn
    pub fn validate(&self) -> Result<(), String> {
        if self.height == 0 {
            return Err("chart.height must be greater than 0".to_string());
        }
        if self.width == Some(0) {
            return Err("chart.width must be greater than 0 when set".to_string());
        }
        let format = &self.series.price_format;
        if format.precision > MAX_PRECISION {
            return Err(format!(
                "chart.series.price_format.precision must be at most {MAX_PRECISION}"
            ));
        }
        if !(format.min_move.is_finite() && format.min_move > 0.0) {
            return Err("chart.series.price_format.min_move must be positive".to_string());
        }
        if self.series.line_width == 0 {
            return Err("chart.series.line_width must be at least 1".to_string());
        }
        Ok(())
    }
}

const MAX_PRECISION: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LayoutOptions {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            background: default_background(),
            text_color: default_text_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GridLineOptions {
    #[serde(default = "default_grid_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl Default for GridLineOptions {
    fn default() -> Self {
        Self {
            color: default_grid_color(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GridOptions {
    #[serde(default)]
    pub vert_lines: GridLineOptions,
    #[serde(default)]
    pub horz_lines: GridLineOptions,
}

/// How the crosshair follows the cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrosshairMode {
    /// Crosshair line sits at the cursor time, price read from the nearest point
    Normal,
    /// Crosshair snaps onto the data point, marker drawn on the line
    #[default]
    Magnet,
    Hidden,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrosshairOptions {
    #[serde(default)]
    pub mode: CrosshairMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriceScaleOptions {
    #[serde(default = "default_grid_color")]
    pub border_color: String,
    /// Rescale the price axis to the visible points on every draw
    #[serde(default = "default_true")]
    pub auto_scale: bool,
}

impl Default for PriceScaleOptions {
    fn default() -> Self {
        Self {
            border_color: default_grid_color(),
            auto_scale: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeScaleOptions {
    #[serde(default = "default_grid_color")]
    pub border_color: String,
    #[serde(default = "default_true")]
    pub time_visible: bool,
    #[serde(default)]
    pub seconds_visible: bool,
}

impl Default for TimeScaleOptions {
    fn default() -> Self {
        Self {
            border_color: default_grid_color(),
            time_visible: true,
            seconds_visible: false,
        }
    }
}

impl TimeScaleOptions {
    /// chrono format string for axis labels
    pub fn label_format(&self) -> &'static str {
        match (self.time_visible, self.seconds_visible) {
            (true, true) => "%m-%d %H:%M:%S",
            (true, false) => "%m-%d %H:%M",
            (false, _) => "%Y-%m-%d",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceFormat {
    #[serde(default = "default_precision")]
    pub precision: u8,
    #[serde(default = "default_min_move")]
    pub min_move: f64,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            min_move: default_min_move(),
        }
    }
}

impl PriceFormat {
    pub fn format(&self, price: f64) -> String {
        format!("{:.*}", usize::from(self.precision), price)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AreaSeriesOptions {
    #[serde(default = "default_series_color")]
    pub line_color: String,
    #[serde(default = "default_series_color")]
    pub top_color: String,
    #[serde(default = "default_fill_color")]
    pub bottom_color: String,
    #[serde(default = "default_line_width")]
    pub line_width: u8,
    #[serde(default)]
    pub price_format: PriceFormat,
}

impl Default for AreaSeriesOptions {
    fn default() -> Self {
        Self {
            line_color: default_series_color(),
            top_color: default_series_color(),
            bottom_color: default_fill_color(),
            line_width: default_line_width(),
            price_format: PriceFormat::default(),
        }
    }
}

/// Parse a color name or `#rrggbb`; unknown values fall back to the terminal default
pub fn parse_color(value: &str) -> Color {
    Color::from_str(value.trim()).unwrap_or(Color::Reset)
}

fn default_height() -> u16 {
    400
}

fn default_background() -> String {
    "white".to_string()
}

fn default_text_color() -> String {
    "black".to_string()
}

fn default_grid_color() -> String {
    GRID_COLOR.to_string()
}

fn default_series_color() -> String {
    SERIES_COLOR.to_string()
}

fn default_fill_color() -> String {
    SERIES_FILL_COLOR.to_string()
}

fn default_line_width() -> u8 {
    2
}

fn default_precision() -> u8 {
    2
}

fn default_min_move() -> f64 {
    0.01
}

fn default_true() -> bool {
    true
}
