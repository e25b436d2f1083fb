//! Value types produced by the market data gateway

use crate::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One OHLCV bar; histories are ordered ascending by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted value, in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire form, as understood by the upstream provider
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Wire forms of every accepted value
            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl FromStr for $name {
            type Err = MarketError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(MarketError::InvalidRequest(format!(
                        concat!("unknown ", $what, " '{}', expected one of: {}"),
                        other,
                        Self::names().join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Lookback window of a price history request
    Period, "period" {
        OneDay => "1d",
        FiveDays => "5d",
        OneMonth => "1mo",
        ThreeMonths => "3mo",
        SixMonths => "6mo",
        OneYear => "1y",
        TwoYears => "2y",
        FiveYears => "5y",
        TenYears => "10y",
        YearToDate => "ytd",
        Max => "max",
    }
}

vocabulary! {
    /// Bar size of a price history request
    Interval, "interval" {
        OneMinute => "1m",
        FiveMinutes => "5m",
        FifteenMinutes => "15m",
        ThirtyMinutes => "30m",
        SixtyMinutes => "60m",
        OneHour => "1h",
        OneDay => "1d",
        OneWeek => "1wk",
        OneMonth => "1mo",
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::OneMonth
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::OneDay
    }
}

impl Interval {
    /// Bars shorter than a day carry a meaningful time of day
    pub fn is_intraday(self) -> bool {
        matches!(
            self,
            Self::OneMinute
                | Self::FiveMinutes
                | Self::FifteenMinutes
                | Self::ThirtyMinutes
                | Self::SixtyMinutes
                | Self::OneHour
        )
    }
}

/// Which fixed universe top movers are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    /// Large-cap equities
    #[default]
    Stocks,
    /// Exchange-traded funds
    #[serde(alias = "etfs")]
    Etf,
}

impl FromStr for MarketType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stocks" | "stock" => Ok(Self::Stocks),
            "etf" | "etfs" => Ok(Self::Etf),
            other => Err(MarketError::InvalidRequest(format!(
                "unknown market type '{other}', expected 'stocks' or 'etf'"
            ))),
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stocks => "stocks",
            Self::Etf => "etf",
        })
    }
}

/// Company descriptors and valuation ratios from the profile provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    /// Market capitalisation in the listing currency
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// Quote snapshot returned by `stock_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
    pub avg_volume: u64,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub dividend_yield: Option<f64>,
    #[serde(rename = "52_week_high")]
    pub fifty_two_week_high: f64,
    #[serde(rename = "52_week_low")]
    pub fifty_two_week_low: f64,
    #[serde(rename = "50_day_avg")]
    pub fifty_day_avg: Option<f64>,
    #[serde(rename = "200_day_avg")]
    pub two_hundred_day_avg: Option<f64>,
    pub beta: Option<f64>,
    pub description: String,
    pub website: String,
    pub currency: String,
}

/// One bar of a `historical_data` response, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Response of `historical_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    pub data: Vec<HistoryBar>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub data_points: usize,
}

/// A news article about a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
    pub link: String,
    /// Publication time, `YYYY-MM-DD HH:MM` UTC
    pub published: String,
    pub summary: String,
    pub thumbnail: String,
}

/// Line items of one statement for one reporting period
pub type StatementLines = BTreeMap<String, f64>;

/// One statement keyed by period end date
pub type StatementTable = BTreeMap<String, StatementLines>;

/// Statements filed for one reporting period, as returned by the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    /// Period end date, `YYYY-MM-DD`
    pub end_date: String,
    pub income_statement: StatementLines,
    pub balance_sheet: StatementLines,
    pub cash_flow: StatementLines,
}

/// Response of `financials`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub symbol: String,
    pub income_statement: StatementTable,
    pub balance_sheet: StatementTable,
    pub cash_flow: StatementTable,
}

/// Analyst rating counts for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTrend {
    /// Month the counts refer to, `YYYY-MM-DD`
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// Response of `recommendations`; an empty list is a valid answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub symbol: String,
    pub recommendations: Vec<RecommendationTrend>,
}

/// Latest level of a market index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Daily move of one instrument in a movers universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
}

/// Response of `top_movers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movers {
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
}

/// A symbol search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub symbol: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_round_trips_through_str() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), *period);
        }
    }

    #[test]
    fn test_unknown_interval_lists_choices() {
        let err = "2h".parse::<Interval>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown interval '2h'"));
        assert!(message.contains("1wk"));
    }

    #[test]
    fn test_period_serializes_as_wire_name() {
        assert_eq!(serde_json::to_value(Period::YearToDate).unwrap(), "ytd");
        assert_eq!(serde_json::to_value(Interval::OneWeek).unwrap(), "1wk");
    }

    #[test]
    fn test_market_type_parsing() {
        assert_eq!("stocks".parse::<MarketType>().unwrap(), MarketType::Stocks);
        assert_eq!("ETF".parse::<MarketType>().unwrap(), MarketType::Etf);
        assert!("bonds".parse::<MarketType>().is_err());
    }

    #[test]
    fn test_intraday() {
        assert!(Interval::FiveMinutes.is_intraday());
        assert!(!Interval::OneDay.is_intraday());
    }

    #[test]
    fn test_stock_info_field_names() {
        let info = StockInfo {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            sector: "Technology".to_string(),
            industry: "N/A".to_string(),
            current_price: 1.0,
            previous_close: 1.0,
            change: 0.0,
            change_percent: 0.0,
            open: 1.0,
            day_high: 1.0,
            day_low: 1.0,
            volume: 1,
            avg_volume: 1,
            market_cap: None,
            pe_ratio: None,
            eps: None,
            dividend_yield: None,
            fifty_two_week_high: 2.0,
            fifty_two_week_low: 0.5,
            fifty_day_avg: None,
            two_hundred_day_avg: None,
            beta: None,
            description: String::new(),
            website: String::new(),
            currency: "USD".to_string(),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["52_week_high"], 2.0);
        assert!(value["200_day_avg"].is_null());
    }
}
