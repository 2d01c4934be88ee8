//! Fundamentals snapshot: point-in-time descriptive attributes of a ticker.

use serde::{Deserialize, Serialize};

/// Descriptive and financial attributes for one ticker.
///
/// Every field is optional: crypto pairs have no sector, ETFs have no
/// dividend yield, and a failed snapshot fetch degrades to
/// `Fundamentals::default()` with everything absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub long_name: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    /// Raw market capitalization in currency units (not yet rescaled).
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub symbol: Option<String>,
    pub short_name: Option<String>,
}

impl Fundamentals {
    /// True when no attribute is present.
    pub fn is_empty(&self) -> bool {
        *self == Fundamentals::default()
    }

    /// Value of a single configured attribute.
    pub fn get(&self, field: FundamentalField) -> FieldValue {
        match field {
            FundamentalField::Sector => FieldValue::Text(self.sector.clone()),
            FundamentalField::Industry => FieldValue::Text(self.industry.clone()),
            FundamentalField::LongName => FieldValue::Text(self.long_name.clone()),
            FundamentalField::Country => FieldValue::Text(self.country.clone()),
            FundamentalField::Currency => FieldValue::Text(self.currency.clone()),
            FundamentalField::MarketCap => FieldValue::Number(self.market_cap),
            FundamentalField::DividendYield => FieldValue::Number(self.dividend_yield),
            FundamentalField::Symbol => FieldValue::Text(self.symbol.clone()),
            FundamentalField::ShortName => FieldValue::Text(self.short_name.clone()),
        }
    }
}

/// A configurable fundamental attribute, mapped to its output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundamentalField {
    Sector,
    Industry,
    LongName,
    Country,
    Currency,
    MarketCap,
    DividendYield,
    Symbol,
    ShortName,
}

impl FundamentalField {
    /// Output column name.
    pub fn column_name(self) -> &'static str {
        match self {
            FundamentalField::Sector => "sector",
            FundamentalField::Industry => "industry",
            FundamentalField::LongName => "longName",
            FundamentalField::Country => "country",
            FundamentalField::Currency => "currency",
            FundamentalField::MarketCap => "marketCap",
            FundamentalField::DividendYield => "dividendYield",
            FundamentalField::Symbol => "symbol",
            FundamentalField::ShortName => "shortName",
        }
    }
}

/// Typed value of one attribute; `None` means the source did not supply it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Number(Option<f64>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Text(None) | FieldValue::Number(None))
    }
}
