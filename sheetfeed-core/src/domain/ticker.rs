//! Ticker display names.

/// Strip a configured exchange suffix from a ticker (`BOVA11.SA` -> `BOVA11`).
///
/// Only a trailing suffix is removed, and only the first matching one.
/// Tickers without a listed suffix come back unchanged.
pub fn display_ticker(ticker: &str, suffixes: &[&str]) -> String {
    suffixes
        .iter()
        .find_map(|suffix| ticker.strip_suffix(suffix))
        .unwrap_or(ticker)
        .to_string()
}
