//! quoteSummary wire types and their mapping onto [`Fundamentals`].

use super::provider::DataError;
use crate::domain::Fundamentals;
use serde::Deserialize;

/// Modules requested from quoteSummary; together they cover every
/// [`FundamentalField`](crate::domain::FundamentalField).
pub const SUMMARY_MODULES: &str = "assetProfile,price,summaryDetail";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryModules>>,
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    code: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    #[serde(default)]
    asset_profile: AssetProfile,
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetail,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    symbol: Option<String>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    dividend_yield: Option<RawValue>,
}

/// Numeric values arrive as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when unknown.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Map a quoteSummary response onto the typed snapshot.
pub fn fundamentals_from_summary(
    ticker: &str,
    resp: SummaryResponse,
) -> Result<Fundamentals, DataError> {
    let Some(result) = resp.quote_summary.result else {
        return Err(match resp.quote_summary.error {
            Some(err) => DataError::ResponseFormatChanged(format!(
                "quoteSummary for {ticker}: {}: {}",
                err.code, err.description
            )),
            None => DataError::ResponseFormatChanged(format!(
                "quoteSummary for {ticker}: empty result with no error"
            )),
        });
    };

    let modules = result.into_iter().next().ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("quoteSummary for {ticker}: result array is empty"))
    })?;

    Ok(Fundamentals {
        sector: non_blank(modules.asset_profile.sector),
        industry: non_blank(modules.asset_profile.industry),
        long_name: non_blank(modules.price.long_name),
        country: non_blank(modules.asset_profile.country),
        currency: non_blank(modules.price.currency),
        market_cap: modules.price.market_cap.and_then(|v| v.raw),
        dividend_yield: modules.summary_detail.dividend_yield.and_then(|v| v.raw),
        symbol: non_blank(modules.price.symbol),
        short_name: non_blank(modules.price.short_name),
    })
}
