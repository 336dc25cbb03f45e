/*
[INPUT]:  ChartOptions, normalized series, container width, crosshair keys
[OUTPUT]: Area/line price chart drawn into a ratatui frame
[POS]:    Chart layer - terminal RenderSurface implementation
[UPDATE]: When changing how the chart is drawn or which options it honors
*/

use chrono::DateTime;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use super::RenderSurface;
use super::options::{ChartOptions, CrosshairMode, parse_color};
use crate::normalize::ChartPoint;

const TITLE: &str = "Price Chart";
const X_TICKS: usize = 3;
const Y_TICKS: usize = 5;
const PRICE_PADDING: f64 = 0.05;
// Half-width of the time axis when every point shares one timestamp
const SINGLE_POINT_SPAN_SECS: f64 = 30.0;

/// Inclusive time range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

/// Price chart drawn with ratatui's `Chart` widget.
///
/// The area under the line is filled with bar datasets in the series top and
/// bottom colors.
#[derive(Debug, Clone)]
pub struct TerminalChart {
    options: ChartOptions,
    width: u16,
    series: Vec<ChartPoint>,
    visible: Option<TimeRange>,
    fitted_prices: Option<(f64, f64)>,
    crosshair: Option<usize>,
}

impl TerminalChart {
    /// New empty chart; the width follows `options.width` or the container
    pub fn new(options: ChartOptions, container_width: u16) -> Self {
        let width = options.width.unwrap_or(container_width);
        Self {
            options,
            width,
            series: Vec::new(),
            visible: None,
            fitted_prices: None,
            crosshair: None,
        }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.options.height
    }

    pub fn series(&self) -> &[ChartPoint] {
        &self.series
    }

    pub fn visible_range(&self) -> Option<TimeRange> {
        self.visible
    }

    pub fn last_point(&self) -> Option<ChartPoint> {
        self.series.last().copied()
    }

    /// Points inside the visible time range
    pub fn visible_points(&self) -> &[ChartPoint] {
        let Some(range) = self.visible else {
            return &[];
        };
        let start = self.series.partition_point(|point| point.time < range.from);
        let end = self.series.partition_point(|point| point.time <= range.to);
        &self.series[start..end.max(start)]
    }

    /// Point under the crosshair, `None` when hidden or not placed yet
    pub fn crosshair_point(&self) -> Option<ChartPoint> {
        if self.options.crosshair.mode == CrosshairMode::Hidden {
            return None;
        }
        self.crosshair.and_then(|idx| self.series.get(idx).copied())
    }

    /// Step the crosshair by `delta` points. The first move places it on the
    /// newest point.
    pub fn move_crosshair(&mut self, delta: isize) {
        if self.series.is_empty() || self.options.crosshair.mode == CrosshairMode::Hidden {
            return;
        }
        let last = self.series.len() - 1;
        let next = match self.crosshair {
            None => last,
            Some(idx) => idx.saturating_add_signed(delta).min(last),
        };
        self.crosshair = Some(next);
    }

    pub fn clear_crosshair(&mut self) {
        self.crosshair = None;
    }

    /// Area actually drawn: container width and configured height, clamped to `area`
    pub fn drawn_area(&self, area: Rect) -> Rect {
        Rect {
            x: area.x,
            y: area.y,
            width: self.width.min(area.width),
            height: self.options.height.min(area.height),
        }
    }

    /// Padded price bounds for the y axis
    pub fn price_bounds(&self) -> Option<[f64; 2]> {
        let (low, high) = if self.options.right_price_scale.auto_scale {
            min_max(self.visible_points())?
        } else {
            self.fitted_prices?
        };
        Some(pad_bounds(
            low,
            high,
            self.options.series.price_format.min_move,
        ))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let area = self.drawn_area(area);
        if area.width == 0 || area.height == 0 {
            return;
        }

        let options = &self.options;
        let base = Style::default()
            .bg(parse_color(&options.layout.background))
            .fg(parse_color(&options.layout.text_color));
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(base);

        let points = self.visible_points();
        let (Some(range), Some(y_bounds)) = (self.visible, self.price_bounds()) else {
            render_waiting(frame, area, block, base);
            return;
        };
        if points.is_empty() {
            render_waiting(frame, area, block, base);
            return;
        }

        let x_bounds = time_bounds(range);
        let x_ticks = ticks(x_bounds, X_TICKS);
        let y_ticks = ticks(y_bounds, Y_TICKS);

        let line: Vec<(f64, f64)> = points
            .iter()
            .map(|point| (point.time as f64, point.value))
            .collect();
        // Lower half of the fill drawn over the full-height bars
        let lower_fill: Vec<(f64, f64)> = line
            .iter()
            .map(|(x, y)| (*x, y_bounds[0] + (y - y_bounds[0]) / 2.0))
            .collect();

        let vertical_grid: Vec<[(f64, f64); 2]> = if options.grid.vert_lines.visible {
            x_ticks
                .iter()
                .map(|x| [(*x, y_bounds[0]), (*x, y_bounds[1])])
                .collect()
        } else {
            Vec::new()
        };
        let horizontal_grid: Vec<[(f64, f64); 2]> = if options.grid.horz_lines.visible {
            y_ticks
                .iter()
                .map(|y| [(x_bounds[0], *y), (x_bounds[1], *y)])
                .collect()
        } else {
            Vec::new()
        };

        let crosshair = self
            .crosshair_point()
            .filter(|point| point.time >= range.from && point.time <= range.to);
        let mut crosshair_lines: Vec<[(f64, f64); 2]> = Vec::new();
        let mut crosshair_marker: Vec<(f64, f64)> = Vec::new();
        if let Some(point) = crosshair {
            let x = point.time as f64;
            crosshair_lines.push([(x, y_bounds[0]), (x, y_bounds[1])]);
            match options.crosshair.mode {
                CrosshairMode::Normal => {
                    crosshair_lines.push([(x_bounds[0], point.value), (x_bounds[1], point.value)]);
                }
                CrosshairMode::Magnet => crosshair_marker.push((x, point.value)),
                CrosshairMode::Hidden => {}
            }
        }

        let vert_style = Style::default().fg(parse_color(&options.grid.vert_lines.color));
        let horz_style = Style::default().fg(parse_color(&options.grid.horz_lines.color));
        let crosshair_style = Style::default().fg(parse_color(&options.layout.text_color));
        let line_marker = if options.series.line_width >= 2 {
            Marker::HalfBlock
        } else {
            Marker::Braille
        };

        let mut datasets = Vec::new();
        for segment in &vertical_grid {
            datasets.push(segment_dataset(segment, vert_style));
        }
        for segment in &horizontal_grid {
            datasets.push(segment_dataset(segment, horz_style));
        }
        datasets.push(
            Dataset::default()
                .graph_type(GraphType::Bar)
                .marker(Marker::Braille)
                .style(Style::default().fg(parse_color(&options.series.top_color)))
                .data(&line),
        );
        datasets.push(
            Dataset::default()
                .graph_type(GraphType::Bar)
                .marker(Marker::Braille)
                .style(Style::default().fg(parse_color(&options.series.bottom_color)))
                .data(&lower_fill),
        );
        datasets.push(
            Dataset::default()
                .graph_type(GraphType::Line)
                .marker(line_marker)
                .style(Style::default().fg(parse_color(&options.series.line_color)))
                .data(&line),
        );
        for segment in &crosshair_lines {
            datasets.push(segment_dataset(segment, crosshair_style));
        }
        if !crosshair_marker.is_empty() {
            datasets.push(
                Dataset::default()
                    .graph_type(GraphType::Scatter)
                    .marker(Marker::Block)
                    .style(crosshair_style)
                    .data(&crosshair_marker),
            );
        }

        let label_style = base.add_modifier(Modifier::DIM);
        let x_labels: Vec<Span> = x_ticks
            .iter()
            .map(|x| Span::styled(self.format_time(x.round() as i64), label_style))
            .collect();
        let y_labels: Vec<Span> = y_ticks
            .iter()
            .map(|y| Span::styled(options.series.price_format.format(*y), label_style))
            .collect();

        let chart = Chart::new(datasets)
            .block(block)
            .style(base)
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(parse_color(&options.time_scale.border_color)))
                    .bounds(x_bounds)
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(
                        Style::default().fg(parse_color(&options.right_price_scale.border_color)),
                    )
                    .bounds(y_bounds)
                    .labels(y_labels),
            );
        frame.render_widget(chart, area);
    }

    fn title(&self) -> String {
        match self.crosshair_point() {
            Some(point) => format!(
                " {TITLE}  {}  {} ",
                self.format_time(point.time),
                self.options.series.price_format.format(point.value)
            ),
            None => format!(" {TITLE} "),
        }
    }

    fn format_time(&self, secs: i64) -> String {
        DateTime::from_timestamp(secs, 0)
            .map(|time| time.format(self.options.time_scale.label_format()).to_string())
            .unwrap_or_else(|| secs.to_string())
    }
}

impl RenderSurface for TerminalChart {
    fn set_data(&mut self, points: Vec<ChartPoint>) {
        self.series = points;
        self.crosshair = match self.crosshair {
            Some(_) if self.series.is_empty() => None,
            Some(idx) => Some(idx.min(self.series.len() - 1)),
            None => None,
        };
    }

    fn fit_content(&mut self) {
        let (Some(first), Some(last)) = (self.series.first(), self.series.last()) else {
            self.visible = None;
            self.fitted_prices = None;
            return;
        };
        self.visible = Some(TimeRange {
            from: first.time,
            to: last.time,
        });
        self.fitted_prices = min_max(&self.series);
    }

    fn apply_width(&mut self, width: u16) {
        self.width = width;
    }
}

fn render_waiting(frame: &mut Frame, area: Rect, block: Block<'_>, style: Style) {
    let waiting = Paragraph::new("Waiting for kline data...")
        .style(style)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(waiting, area);
}

fn segment_dataset(segment: &[(f64, f64); 2], style: Style) -> Dataset<'_> {
    Dataset::default()
        .graph_type(GraphType::Line)
        .marker(Marker::Braille)
        .style(style)
        .data(segment.as_slice())
}

fn min_max(points: &[ChartPoint]) -> Option<(f64, f64)> {
    let first = points.first()?;
    Some(points.iter().fold((first.value, first.value), |(low, high), point| {
        (low.min(point.value), high.max(point.value))
    }))
}

fn pad_bounds(low: f64, high: f64, min_move: f64) -> [f64; 2] {
    let span = high - low;
    let pad = if span < min_move {
        min_move * 10.0
    } else {
        span * PRICE_PADDING
    };
    [low - pad, high + pad]
}

fn time_bounds(range: TimeRange) -> [f64; 2] {
    let from = range.from as f64;
    let to = range.to as f64;
    if from < to {
        [from, to]
    } else {
        [from - SINGLE_POINT_SPAN_SECS, to + SINGLE_POINT_SPAN_SECS]
    }
}

fn ticks(bounds: [f64; 2], count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![bounds[0]];
    }
    let step = (bounds[1] - bounds[0]) / (count - 1) as f64;
    (0..count).map(|idx| bounds[0] + step * idx as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn points(values: &[(i64, f64)]) -> Vec<ChartPoint> {
        values
            .iter()
            .map(|(time, value)| ChartPoint::new(*time, *value))
            .collect()
    }

    fn screen_text(chart: &TerminalChart, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| chart.render(frame, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn width_follows_container_unless_configured() {
        let chart = TerminalChart::new(ChartOptions::default(), 120);
        assert_eq!(chart.width(), 120);

        let options = ChartOptions {
            width: Some(60),
            ..ChartOptions::default()
        };
        assert_eq!(TerminalChart::new(options, 120).width(), 60);
    }

    #[test]
    fn drawn_area_clamps_height_and_width() {
        let mut chart = TerminalChart::new(ChartOptions::default(), 100);
        let area = Rect::new(0, 2, 80, 20);
        assert_eq!(chart.drawn_area(area), Rect::new(0, 2, 80, 20));

        chart.apply_width(50);
        assert_eq!(chart.drawn_area(area), Rect::new(0, 2, 50, 20));
    }

    #[test]
    fn fit_content_covers_whole_series() {
        let mut chart = TerminalChart::new(ChartOptions::default(), 80);
        chart.set_data(points(&[(10, 1.0), (20, 3.0), (30, 2.0)]));
        assert_eq!(chart.visible_range(), None);

        chart.fit_content();
        assert_eq!(chart.visible_range(), Some(TimeRange { from: 10, to: 30 }));
        assert_eq!(chart.visible_points().len(), 3);

        let [low, high] = chart.price_bounds().unwrap();
        assert!(low < 1.0 && high > 3.0);
    }

    #[test]
    fn flat_series_gets_min_move_padding() {
        let mut chart = TerminalChart::new(ChartOptions::default(), 80);
        chart.set_data(points(&[(1, 5.0)]));
        chart.fit_content();
        let [low, high] = chart.price_bounds().unwrap();
        assert!((low - 4.9).abs() < 1e-9);
        assert!((high - 5.1).abs() < 1e-9);
        assert_eq!(time_bounds(chart.visible_range().unwrap()), [-29.0, 31.0]);
    }

    #[test]
    fn crosshair_starts_at_newest_and_clamps() {
        let mut chart = TerminalChart::new(ChartOptions::default(), 80);
        chart.move_crosshair(-1);
        assert_eq!(chart.crosshair_point(), None);

        chart.set_data(points(&[(1, 1.0), (2, 2.0), (3, 3.0)]));
        chart.fit_content();
        chart.move_crosshair(-1);
        assert_eq!(chart.crosshair_point(), Some(ChartPoint::new(3, 3.0)));
        chart.move_crosshair(-5);
        assert_eq!(chart.crosshair_point(), Some(ChartPoint::new(1, 1.0)));
        chart.move_crosshair(10);
        assert_eq!(chart.crosshair_point(), Some(ChartPoint::new(3, 3.0)));

        chart.set_data(points(&[(1, 1.0)]));
        assert_eq!(chart.crosshair_point(), Some(ChartPoint::new(1, 1.0)));

        chart.clear_crosshair();
        assert_eq!(chart.crosshair_point(), None);
    }

    #[test]
    fn hidden_crosshair_never_moves() {
        let mut options = ChartOptions::default();
        options.crosshair.mode = CrosshairMode::Hidden;
        let mut chart = TerminalChart::new(options, 80);
        chart.set_data(points(&[(1, 1.0)]));
        chart.move_crosshair(0);
        assert_eq!(chart.crosshair_point(), None);
    }

    #[test]
    fn renders_waiting_message_before_data() {
        let chart = TerminalChart::new(ChartOptions::default(), 60);
        let text = screen_text(&chart, 60, 12);
        assert!(text.contains("Price Chart"));
        assert!(text.contains("Waiting for kline data..."));
    }

    #[test]
    fn renders_axis_labels_and_crosshair_readout() {
        let mut chart = TerminalChart::new(ChartOptions::default(), 80);
        chart.set_data(points(&[(0, 100.0), (3600, 110.0)]));
        chart.fit_content();
        chart.move_crosshair(0);

        let text = screen_text(&chart, 80, 20);
        assert!(text.contains("Price Chart  01-01 01:00  110.00"));
        assert!(text.contains("01-01 00:00"));
        assert!(!text.contains("Waiting for kline data"));
    }
}
