//! Yahoo Finance data provider.
//!
//! Bars come from the v8 chart API, fundamentals from the v10 quoteSummary
//! API. quoteSummary refuses requests without a session cookie and a matching
//! "crumb", so the provider performs that handshake once and caches the crumb.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; every parsing failure surfaces as `ResponseFormatChanged`.

use super::provider::{
    DataError, MarketDataProvider, LABEL_ADJ_CLOSE, LABEL_CLOSE, LABEL_DATE, LABEL_DATETIME,
    LABEL_HIGH, LABEL_LOW, LABEL_OPEN, LABEL_VOLUME,
};
use super::quote_summary::{fundamentals_from_summary, SummaryResponse, SUMMARY_MODULES};
use crate::config::{Interval, Period};
use crate::domain::Fundamentals;
use polars::prelude::*;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

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
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Base URLs used by the provider. Overridable for tests.
#[derive(Debug, Clone)]
pub struct YahooEndpoints {
    pub chart_base: String,
    pub summary_base: String,
    /// Any Yahoo page that sets the session cookie.
    pub cookie_url: String,
    pub crumb_url: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            chart_base: "https://query2.finance.yahoo.com".into(),
            summary_base: "https://query2.finance.yahoo.com".into(),
            cookie_url: "https://fc.yahoo.com".into(),
            crumb_url: "https://query2.finance.yahoo.com/v1/test/getcrumb".into(),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: Client,
    endpoints: YahooEndpoints,
    crumb: Mutex<Option<String>>,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_endpoints(YahooEndpoints::default())
    }

    pub fn with_endpoints(endpoints: YahooEndpoints) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .cookie_store(true)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoints,
            crumb: Mutex::new(None),
        })
    }

    /// Build the chart API URL for a ticker, lookback and interval.
    fn chart_url(&self, ticker: &str, period: Period, interval: Interval) -> Result<Url, DataError> {
        let base = format!("{}/v8/finance/chart/{ticker}", self.endpoints.chart_base);
        Url::parse_with_params(
            &base,
            &[
                ("range", period.as_str()),
                ("interval", interval.as_str()),
                ("includePrePost", "false"),
            ],
        )
        .map_err(|e| DataError::Other(format!("invalid chart URL: {e}")))
    }

    fn summary_url(&self, ticker: &str, crumb: &str) -> Result<Url, DataError> {
        let base = format!(
            "{}/v10/finance/quoteSummary/{ticker}",
            self.endpoints.summary_base
        );
        Url::parse_with_params(&base, &[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .map_err(|e| DataError::Other(format!("invalid quoteSummary URL: {e}")))
    }

    /// Send a GET and map transport failures.
    fn send(&self, url: Url) -> Result<Response, DataError> {
        debug!(%url, "GET");
        self.client.get(url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(e.to_string())
            }
        })
    }

    /// GET a JSON document, mapping HTTP status codes to structured errors.
    fn get_json<T: DeserializeOwned>(&self, url: Url, ticker: &str) -> Result<T, DataError> {
        let resp = self.send(url)?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(DataError::AuthenticationRequired(format!(
                "Yahoo Finance rejected the request for {ticker}"
            )));
        }

        // The chart API answers unknown symbols with 404 and a JSON error body.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(DataError::Http {
                status: status.as_u16(),
                ticker: ticker.to_string(),
            });
        }

        resp.json::<T>().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })
    }

    /// Return the cached crumb, performing the cookie + crumb handshake if needed.
    fn crumb(&self) -> Result<String, DataError> {
        let mut cached = self
            .crumb
            .lock()
            .map_err(|_| DataError::Other("crumb cache poisoned".into()))?;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Sets the session cookie; the page itself usually answers 404.
        let cookie_url = Url::parse(&self.endpoints.cookie_url)
            .map_err(|e| DataError::Other(format!("invalid cookie URL: {e}")))?;
        self.send(cookie_url)?;

        let crumb_url = Url::parse(&self.endpoints.crumb_url)
            .map_err(|e| DataError::Other(format!("invalid crumb URL: {e}")))?;
        let resp = self.send(crumb_url)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::AuthenticationRequired(format!(
                "crumb request failed with HTTP {status}"
            )));
        }
        let crumb = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(DataError::AuthenticationRequired(
                "crumb endpoint returned no crumb".into(),
            ));
        }

        debug!("obtained Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    fn forget_crumb(&self) {
        if let Ok(mut cached) = self.crumb.lock() {
            *cached = None;
        }
    }
}

/// Parse the chart API response into a source frame.
///
/// Unknown symbols and results without timestamps produce an empty frame
/// rather than an error: "no data" is not a transient failure.
fn chart_to_frame(
    ticker: &str,
    resp: ChartResponse,
    interval: Interval,
) -> Result<DataFrame, DataError> {
    let Some(result) = resp.chart.result else {
        return match resp.chart.error {
            Some(err) if err.code == "Not Found" => {
                debug!(ticker, description = %err.description, "chart reports unknown symbol");
                Ok(DataFrame::empty())
            }
            Some(err) => Err(DataError::ResponseFormatChanged(format!(
                "{}: {}",
                err.code, err.description
            ))),
            None => Err(DataError::ResponseFormatChanged(
                "empty result with no error".into(),
            )),
        };
    };

    let Some(data) = result.into_iter().next() else {
        return Ok(DataFrame::empty());
    };

    let timestamps = match data.timestamp {
        Some(ts) if !ts.is_empty() => ts,
        _ => return Ok(DataFrame::empty()),
    };

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    debug!(
        ticker,
        bars = timestamps.len(),
        timezone = data.meta.exchange_timezone_name.as_deref().unwrap_or("UTC"),
        "parsed chart"
    );

    let offset_ms = data.meta.gmtoffset * 1000;
    let at = |series: &Option<Vec<Option<f64>>>, i: usize| {
        series.as_ref().and_then(|v| v.get(i).copied().flatten())
    };

    let mut times = Vec::with_capacity(timestamps.len());
    let mut opens = Vec::with_capacity(timestamps.len());
    let mut highs = Vec::with_capacity(timestamps.len());
    let mut lows = Vec::with_capacity(timestamps.len());
    let mut closes = Vec::with_capacity(timestamps.len());
    let mut adj = Vec::with_capacity(timestamps.len());
    let mut volumes = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let open = at(&quote.open, i);
        let high = at(&quote.high, i);
        let low = at(&quote.low, i);
        let close = at(&quote.close, i);
        let volume = quote
            .volume
            .as_ref()
            .and_then(|v| v.get(i).copied().flatten());

        // Skip placeholder bars where all OHLCV are None
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }

        times.push(ts * 1000 + offset_ms);
        opens.push(open);
        highs.push(high);
        lows.push(low);
        closes.push(close);
        adj.push(adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten()));
        volumes.push(volume);
    }

    if times.is_empty() {
        return Ok(DataFrame::empty());
    }

    let time_label = if interval.is_intraday() {
        LABEL_DATETIME
    } else {
        LABEL_DATE
    };

    let mut columns = vec![Column::new(time_label.into(), times)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?];
    if quote.open.is_some() {
        columns.push(Column::new(LABEL_OPEN.into(), opens));
    }
    if quote.high.is_some() {
        columns.push(Column::new(LABEL_HIGH.into(), highs));
    }
    if quote.low.is_some() {
        columns.push(Column::new(LABEL_LOW.into(), lows));
    }
    if quote.close.is_some() {
        columns.push(Column::new(LABEL_CLOSE.into(), closes));
    }
    if adj_closes.is_some() {
        columns.push(Column::new(LABEL_ADJ_CLOSE.into(), adj));
    }
    if quote.volume.is_some() {
        columns.push(Column::new(LABEL_VOLUME.into(), volumes));
    }

    Ok(DataFrame::new(columns)?)
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_bars(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<DataFrame, DataError> {
        let url = self.chart_url(ticker, period, interval)?;
        let chart: ChartResponse = self.get_json(url, ticker)?;
        chart_to_frame(ticker, chart, interval)
    }

    fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, DataError> {
        let crumb = self.crumb()?;
        let url = self.summary_url(ticker, &crumb)?;
        let summary: SummaryResponse = match self.get_json(url, ticker) {
            Ok(summary) => summary,
            Err(e @ DataError::AuthenticationRequired(_)) => {
                // Stale session: the next ticker starts a fresh handshake.
                self.forget_crumb();
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        fundamentals_from_summary(ticker, summary)
    }
}
