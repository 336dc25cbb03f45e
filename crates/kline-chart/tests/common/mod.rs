/*
[INPUT]:  Page and chart types from kline-chart
[OUTPUT]: Recording surface and candle fixtures for integration tests
[POS]:    Test infrastructure - shared across kline-chart integration tests
[UPDATE]: When RenderSurface changes
*/

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use kline_chart::{ChartPoint, RenderSurface};
use kline_feed::CandleRecord;
use serde_json::{Value, json};

/// Surface that remembers every series it was given
#[derive(Debug, Clone, Default)]
pub struct SeriesLog {
    series: Arc<Mutex<Vec<Vec<ChartPoint>>>>,
    widths: Arc<Mutex<Vec<u16>>>,
}

impl SeriesLog {
    pub fn series(&self) -> Vec<Vec<ChartPoint>> {
        self.series.lock().unwrap().clone()
    }

    pub fn widths(&self) -> Vec<u16> {
        self.widths.lock().unwrap().clone()
    }
}

impl RenderSurface for SeriesLog {
    fn set_data(&mut self, points: Vec<ChartPoint>) {
        self.series.lock().unwrap().push(points);
    }

    fn fit_content(&mut self) {}

    fn apply_width(&mut self, width: u16) {
        self.widths.lock().unwrap().push(width);
    }
}

pub fn candles(value: Value) -> Vec<CandleRecord> {
    serde_json::from_value(value).unwrap()
}

/// Two one-minute candles in feed order
pub fn minute_batch() -> Vec<CandleRecord> {
    candles(json!([
        [1_700_000_000_000_i64, "100.0", "101.5", "99.5", "100.5", "12.3"],
        [1_700_000_060_000_i64, "100.5", "102.0", "100.1", "101.0", "8.7"]
    ]))
}
