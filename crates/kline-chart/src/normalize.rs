/*
[INPUT]:  Candle batch as received from the feed (any order, duplicates, junk)
[OUTPUT]: Chart points sorted by time with unique timestamps
[POS]:    Data layer - candle to chart point normalization
[UPDATE]: When the chart point shape or malformed-record policy changes
*/

use kline_feed::CandleRecord;
use serde::{Deserialize, Serialize};

/// One point of the price line: seconds since epoch and close price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: i64,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }

    /// `time = floor(open_time_ms / 1000)`, `value = close`.
    /// `None` when either field is missing or not a finite number.
    pub fn from_candle(candle: &CandleRecord) -> Option<Self> {
        let open_time_ms = candle.open_time_ms()?;
        let value = candle.close()?;
        let time = (open_time_ms / 1000.0).floor();
        if !time.is_finite() {
            return None;
        }
        Some(Self {
            time: time as i64,
            value,
        })
    }
}

/// Result of normalizing one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub points: Vec<ChartPoint>,
    /// Records dropped because time or price did not parse
    pub skipped: usize,
}

/// Map, sort by time, and keep the first point per timestamp.
///
/// The sort is stable, so for equal timestamps the record that came first in
/// the batch wins.
pub fn normalize_candles(candles: &[CandleRecord]) -> Normalized {
    let mut points = Vec::with_capacity(candles.len());
    let mut skipped = 0;
    for candle in candles {
        match ChartPoint::from_candle(candle) {
            Some(point) => points.push(point),
            None => skipped += 1,
        }
    }

    points.sort_by_key(|point| point.time);
    points.dedup_by_key(|point| point.time);

    Normalized { points, skipped }
}
