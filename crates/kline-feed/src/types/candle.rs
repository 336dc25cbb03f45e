/*
[INPUT]:  Raw candle arrays from the `kline_data` event
[OUTPUT]: CandleRecord with typed accessors for open time and close
[POS]:    Data layer - candle record model
[UPDATE]: When the upstream candle layout changes
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index of the open time (milliseconds since epoch)
pub const OPEN_TIME_INDEX: usize = 0;
/// Index of the close price
pub const CLOSE_INDEX: usize = 4;

/// One OHLCV candle as sent by the feed: `[open_time, open, high, low, close, volume, ...]`.
///
/// Fields are kept as raw JSON values; upstream sends prices as strings and
/// times as integers, but either may show up as the other.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CandleRecord(pub Vec<Value>);

impl CandleRecord {
    pub fn new(fields: Vec<Value>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Open time in milliseconds, if present and numeric
    pub fn open_time_ms(&self) -> Option<f64> {
        self.0.get(OPEN_TIME_INDEX).and_then(numeric)
    }

    /// Close price, if present and numeric
    pub fn close(&self) -> Option<f64> {
        self.0.get(CLOSE_INDEX).and_then(numeric)
    }
}

impl From<Vec<Value>> for CandleRecord {
    fn from(fields: Vec<Value>) -> Self {
        Self(fields)
    }
}

/// Finite number from a JSON number or a numeric string.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candle_parses_binance_shape() {
        let candle: CandleRecord = serde_json::from_value(json!([
            1_700_000_000_000_i64,
            "37000.10",
            "37100.00",
            "36950.00",
            "37050.25",
            "12.5"
        ]))
        .unwrap();

        assert_eq!(candle.len(), 6);
        assert_eq!(candle.open_time_ms(), Some(1_700_000_000_000.0));
        assert_eq!(candle.close(), Some(37050.25));
    }

    #[test]
    fn candle_accepts_numbers_and_numeric_strings() {
        let candle = CandleRecord::new(vec![
            json!("2000"),
            json!(1),
            json!(2),
            json!(3),
            json!(101.5),
        ]);
        assert_eq!(candle.open_time_ms(), Some(2000.0));
        assert_eq!(candle.close(), Some(101.5));
    }

    #[test]
    fn candle_rejects_malformed_fields() {
        let short = CandleRecord::new(vec![json!(1000), json!("1")]);
        assert_eq!(short.close(), None);

        let garbage = CandleRecord::new(vec![
            json!(null),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("abc"),
        ]);
        assert_eq!(garbage.open_time_ms(), None);
        assert_eq!(garbage.close(), None);

        let infinite = CandleRecord::new(vec![
            json!(1000),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("inf"),
        ]);
        assert_eq!(infinite.close(), None);
    }
}
