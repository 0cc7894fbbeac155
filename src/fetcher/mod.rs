//! Historical series retrieval over a page-capped candle endpoint.

mod config;
mod throttle;

pub use config::{FetchConfig, FetchConfigBuilder, MAX_PAGE_LIMIT};
pub use throttle::PageThrottle;

use crate::error::RoboError;
use crate::interval::Interval;
use crate::model::{Candle, Series};
use crate::time::{date_to_ms, format_ms};
use std::future::Future;
use tracing::{debug, info, warn, Instrument};

/// One page request against the candle endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    pub symbol: String,
    pub interval: Interval,
    pub limit: u32,
    /// Inclusive, epoch millis.
    pub start_time: Option<i64>,
    /// Inclusive, epoch millis.
    pub end_time: Option<i64>,
}

/// A source of bounded candle pages.
pub trait CandleSource {
    /// At most `query.limit` candles with `open_time` inside the query bounds,
    /// ascending. With no bounds, the latest `limit` candles.
    fn get_candles(
        &self,
        query: &CandleQuery,
    ) -> impl Future<Output = Result<Vec<Candle>, RoboError>> + Send;

    /// The source's current time in epoch millis.
    fn get_server_time(&self) -> impl Future<Output = Result<i64, RoboError>> + Send;
}

/// Stitches candle pages into one ordered, de-duplicated [`Series`].
pub struct HistoricalFetcher<S> {
    source: S,
    config: FetchConfig,
}

impl<S: CandleSource> HistoricalFetcher<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, FetchConfig::default())
    }

    pub fn with_config(source: S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `symbol` at `interval` (e.g. `"1h"`) between two optional
    /// human-readable dates.
    ///
    /// The interval and both dates are validated before any request is made.
    pub async fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Series, RoboError> {
        let interval: Interval = interval.parse()?;
        let start = start.map(date_to_ms).transpose()?;
        let end = end.map(date_to_ms).transpose()?;
        self.fetch_range(symbol, interval, start, end).await
    }

    /// Same as [`fetch`](Self::fetch) with bounds already in epoch millis.
    ///
    /// | start | end  | pages requested                                   |
    /// |-------|------|---------------------------------------------------|
    /// | none  | none | one: the latest `limit` candles                   |
    /// | some  | none | `start` up to now, floored to the interval        |
    /// | none  | some | one: `[end - limit × interval, end]`              |
    /// | some  | some | `start` up to `end`                               |
    pub async fn fetch_range(
        &self,
        symbol: &str,
        interval: Interval,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Series, RoboError> {
        if symbol.trim().is_empty() {
            return Err(RoboError::config("symbol is empty"));
        }
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(RoboError::config(format!(
                    "start {} is after end {}",
                    format_ms(s),
                    format_ms(e)
                )));
            }
        }

        let window = page_window(interval, self.config.limit)?;
        if let Some(start) = start {
            shift(start, window)?;
        }
        if let Some(end) = end {
            shift(end, -window)?;
        }

        let span = tracing::info_span!(
            "fetch_history",
            symbol = %symbol,
            interval = %interval,
            limit = self.config.limit,
        );

        async move {
            let candles = match (start, end) {
                (None, None) => {
                    info!("fetching latest {} candles", self.config.limit);
                    self.fetch_page(symbol, interval, None, None, 0).await?
                }
                (None, Some(end)) => {
                    let from = shift(end, -window)?;
                    self.fetch_page(symbol, interval, Some(from), Some(end), 0)
                        .await?
                }
                (Some(start), None) => {
                    let now = self.source.get_server_time().await?;
                    let boundary = now - now.rem_euclid(interval.as_millis());
                    self.paginate(symbol, interval, start, boundary, window).await?
                }
                (Some(start), Some(end)) => {
                    self.paginate(symbol, interval, start, end, window).await?
                }
            };

            let mut series = Series::from_candles(candles);
            if let Some(end) = end {
                series.truncate_after(end);
            }

            info!(candles = series.len(), "history fetch complete");
            Ok::<_, RoboError>(series)
        }
        .instrument(span)
        .await
    }

    /// Walk `[start, boundary]` in windows of `limit` candles.
    ///
    /// Each page starts just after the previous page's last close; an empty
    /// page (no trading yet) moves the cursor a full window instead. The page
    /// end grows by one window per iteration, so the loop always terminates.
    async fn paginate(
        &self,
        symbol: &str,
        interval: Interval,
        start: i64,
        boundary: i64,
        window: i64,
    ) -> Result<Vec<Candle>, RoboError> {
        // page_end stays below boundary + window
        shift(boundary.max(start), window)?;

        let mut candles = Vec::new();
        let mut cursor = start;
        let mut page_end = shift(start, window)?;
        let mut page = 0u32;

        loop {
            let batch = self
                .fetch_page(symbol, interval, Some(cursor), Some(page_end), page)
                .await?;
            page += 1;

            let next_cursor = match batch.last() {
                Some(last) => last.close_time.checked_add(1).ok_or_else(|| {
                    RoboError::MalformedCandle(format!(
                        "close_time {} out of range",
                        last.close_time
                    ))
                })?,
                None => {
                    warn!(
                        from = %format_ms(cursor),
                        to = %format_ms(page_end),
                        "empty page, skipping window"
                    );
                    shift(cursor, window)?
                }
            };
            candles.extend(batch);

            if page_end >= boundary {
                break;
            }
            cursor = next_cursor;
            page_end = shift(page_end, window)?;
        }

        debug!(pages = page, candles = candles.len(), "pagination finished");
        Ok(candles)
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        interval: Interval,
        start_time: Option<i64>,
        end_time: Option<i64>,
        page: u32,
    ) -> Result<Vec<Candle>, RoboError> {
        self.config.throttle().before_page(page).await;

        if let (Some(from), Some(to)) = (start_time, end_time) {
            info!(
                "gathering historical data, {} -> {}",
                format_ms(from),
                format_ms(to)
            );
        }

        let query = CandleQuery {
            symbol: symbol.to_string(),
            interval,
            limit: self.config.limit,
            start_time,
            end_time,
        };
        let batch = self.source.get_candles(&query).await?;
        debug!(page, count = batch.len(), "page received");
        Ok(batch)
    }
}

/// Span of one full page, `limit` candles wide.
fn page_window(interval: Interval, limit: u32) -> Result<i64, RoboError> {
    interval
        .as_millis()
        .checked_mul(i64::from(limit))
        .ok_or_else(|| {
            RoboError::config(format!(
                "{} candles of {} overflow the time range",
                limit, interval
            ))
        })
}

fn shift(ms: i64, by: i64) -> Result<i64, RoboError> {
    ms.checked_add(by).ok_or_else(|| {
        RoboError::config(format!("time {} shifted by {}ms is out of range", ms, by))
    })
}
