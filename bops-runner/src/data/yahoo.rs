//! Yahoo Finance data provider.
//!
//! Fetches OHLCV bars from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, and response parsing. Rows with any
//! missing price or a zero volume are dropped.
//!
//! Yahoo has no 4-hour interval; 4h requests fetch hourly bars and resample.
//! Yahoo has no official API and is subject to unannounced format changes.
//! The CSV provider is the fallback when it is unavailable.

use std::time::Duration;

use bops_core::domain::{Bar, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::warn;

use super::{resample_to_4h, DataError, DataRequest, MarketDataProvider};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: "https://query2.finance.yahoo.com/v8/finance/chart".into(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Interval label Yahoo accepts for `timeframe`.
    fn interval(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 | Timeframe::H4 => "60m",
            Timeframe::D1 => "1d",
        }
    }

    /// Build the chart API URL. The end date is inclusive.
    fn chart_url(&self, request: &DataRequest) -> String {
        let start_ts = day_start_ts(request.start);
        let end_ts = day_start_ts(request.end.succ_opt().unwrap_or(request.end));
        format!(
            "{}/{}?period1={start_ts}&period2={end_ts}&interval={}",
            self.base_url,
            request.symbol,
            Self::interval(request.timeframe)
        )
    }

    fn fetch_with_retry(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError> {
        let url = self.chart_url(request);
        let symbol = request.symbol.as_str();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;
                    return parse_response(symbol, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError> {
        let bars: Vec<Bar> = self
            .fetch_with_retry(request)?
            .into_iter()
            .filter(|b| request.contains(b))
            .collect();
        if request.timeframe == Timeframe::H4 {
            return Ok(resample_to_4h(&bars));
        }
        Ok(bars)
    }
}

fn day_start_ts(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Parse the chart API response into bars.
///
/// An empty result (no rows in range) is an empty Vec, not an error.
fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    let Some(data) = result.into_iter().next() else {
        return Ok(Vec::new());
    };
    let Some(timestamps) = data.timestamp else {
        return Ok(Vec::new());
    };
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
        })?;

        let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        match (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            volume,
        ) {
            (Some(open), Some(high), Some(low), Some(close), Some(volume)) if volume > 0 => {
                bars.push(Bar::new(timestamp, open, high, low, close, volume));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(symbol, dropped, "dropped incomplete or zero-volume rows");
    }
    Ok(bars)
}
