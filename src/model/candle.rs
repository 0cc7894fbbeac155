use crate::error::RoboError;
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Column order used when a series is written out as rows.
pub const CANDLE_COLUMNS: [&str; 11] = [
    "open_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "close_time",
    "quote_volume",
    "trade_count",
    "taker_buy_base_volume",
    "taker_buy_quote_volume",
];

/// One fixed-width bucket of trade activity. Times are UTC epoch millis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
    pub quote_volume: f64,
    pub trade_count: u64,
    pub taker_buy_base_volume: f64,
    pub taker_buy_quote_volume: f64,
}

/// Kline as returned by `/api/v3/klines`: a positional array with prices
/// and volumes encoded as strings.
///
/// ```json
/// [1499040000000, "0.0163", "0.8", "0.0157", "0.0157", "148976.1",
///  1499644799999, "2434.1", 308, "1.7", "28.4", "0"]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CandleRaw {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
    pub quote_volume: String,
    pub trade_count: u64,
    pub taker_buy_base_volume: String,
    pub taker_buy_quote_volume: String,
}

fn next_field<'de, A, T>(seq: &mut A, name: &'static str) -> Result<T, A::Error>
where
    A: SeqAccess<'de>,
    T: Deserialize<'de>,
{
    seq.next_element::<T>()?
        .ok_or_else(|| de::Error::custom(format!("kline array missing {}", name)))
}

impl<'de> Deserialize<'de> for CandleRaw {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CandleRawVisitor;

        impl<'de> Visitor<'de> for CandleRawVisitor {
            type Value = CandleRaw;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a kline array with at least 11 elements")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let raw = CandleRaw {
                    open_time: next_field(&mut seq, "open_time")?,
                    open: next_field(&mut seq, "open")?,
                    high: next_field(&mut seq, "high")?,
                    low: next_field(&mut seq, "low")?,
                    close: next_field(&mut seq, "close")?,
                    volume: next_field(&mut seq, "volume")?,
                    close_time: next_field(&mut seq, "close_time")?,
                    quote_volume: next_field(&mut seq, "quote_volume")?,
                    trade_count: next_field(&mut seq, "trade_count")?,
                    taker_buy_base_volume: next_field(&mut seq, "taker_buy_base_volume")?,
                    taker_buy_quote_volume: next_field(&mut seq, "taker_buy_quote_volume")?,
                };

                // trailing "ignore" column
                while seq.next_element::<IgnoredAny>()?.is_some() {}

                Ok(raw)
            }
        }

        deserializer.deserialize_seq(CandleRawVisitor)
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<f64, RoboError> {
    value
        .parse::<f64>()
        .map_err(|e| RoboError::MalformedCandle(format!("{} '{}': {}", field, value, e)))
}

impl TryFrom<CandleRaw> for Candle {
    type Error = RoboError;

    fn try_from(raw: CandleRaw) -> Result<Self, Self::Error> {
        if raw.open_time >= raw.close_time {
            return Err(RoboError::MalformedCandle(format!(
                "open_time {} is not before close_time {}",
                raw.open_time, raw.close_time
            )));
        }

        Ok(Candle {
            open_time: raw.open_time,
            open: parse_decimal("open", &raw.open)?,
            high: parse_decimal("high", &raw.high)?,
            low: parse_decimal("low", &raw.low)?,
            close: parse_decimal("close", &raw.close)?,
            volume: parse_decimal("volume", &raw.volume)?,
            close_time: raw.close_time,
            quote_volume: parse_decimal("quote_volume", &raw.quote_volume)?,
            trade_count: raw.trade_count,
            taker_buy_base_volume: parse_decimal(
                "taker_buy_base_volume",
                &raw.taker_buy_base_volume,
            )?,
            taker_buy_quote_volume: parse_decimal(
                "taker_buy_quote_volume",
                &raw.taker_buy_quote_volume,
            )?,
        })
    }
}
