//! Market Data Gateway
//!
//! Shapes raw provider data into the caller-facing results used by the chat
//! tools and the HTTP API. Every per-symbol operation returns a
//! [`MarketError`] carrying the symbol, never a panic.

use crate::error::{MarketError, Result};
use crate::indicators::{self, IndicatorReport, LOOKBACK_PERIOD};
use crate::source::MarketDataSource;
use crate::types::{
    Financials, HistoryBar, IndexSnapshot, Interval, MarketType, Mover, Movers, NewsItem, Period,
    PriceBar, PriceHistory, Recommendations, SearchHit, StatementTable, StockInfo,
};
use crate::universe::Universe;
use analyst_utils::round2;
use chrono::Local;
use std::sync::Arc;

/// News items returned per symbol
pub const NEWS_LIMIT: usize = 10;

/// Reporting periods kept per statement
pub const FINANCIAL_PERIODS: usize = 4;

/// Analyst trend rows returned per symbol
pub const RECOMMENDATION_LIMIT: usize = 10;

/// Trading days averaged into `avg_volume` (about three months)
const AVG_VOLUME_WINDOW: usize = 63;

/// Facade over a [`MarketDataSource`] and the fixed symbol tables
#[derive(Clone)]
pub struct MarketGateway {
    source: Arc<dyn MarketDataSource>,
    universe: Arc<Universe>,
}

impl MarketGateway {
    pub fn new(source: Arc<dyn MarketDataSource>, universe: Arc<Universe>) -> Self {
        Self { source, universe }
    }

    /// Gateway over `source` with the built-in symbol tables
    pub fn with_default_universe(source: Arc<dyn MarketDataSource>) -> Self {
        Self::new(source, Arc::new(Universe::default()))
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Quote snapshot with a best-effort company profile
    pub async fn stock_info(&self, symbol: &str) -> Result<StockInfo> {
        let symbol = normalize(symbol)?;
        let bars = self
            .history(&symbol, Period::OneYear, Interval::OneDay)
            .await?;

        let Some(last) = bars.last() else {
            return Err(MarketError::no_data(&symbol, "No data available"));
        };

        let current_price = last.close;
        let previous_close = if bars.len() >= 2 {
            bars[bars.len() - 2].close
        } else {
            last.open
        };
        let (change, change_percent) = change_between(previous_close, current_price);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let recent = &bars[bars.len().saturating_sub(AVG_VOLUME_WINDOW)..];
        let avg_volume = recent.iter().map(|b| b.volume).sum::<u64>() / recent.len() as u64;
        let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        let profile = match self.source.company_profile(&symbol).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::debug!(symbol = %symbol, error = %e, "Profile unavailable, continuing with prices only");
                Default::default()
            }
        };

        let name = profile
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| self.universe.name_of(&symbol).map(str::to_string))
            .unwrap_or_else(|| symbol.clone());

        Ok(StockInfo {
            name,
            sector: profile.sector.unwrap_or_else(|| "N/A".to_string()),
            industry: profile.industry.unwrap_or_else(|| "N/A".to_string()),
            current_price: round2(current_price),
            previous_close: round2(previous_close),
            change: round2(change),
            change_percent: round2(change_percent),
            open: round2(last.open),
            day_high: round2(last.high),
            day_low: round2(last.low),
            volume: last.volume,
            avg_volume,
            market_cap: profile.market_cap,
            pe_ratio: profile.pe_ratio.map(round2),
            eps: profile.eps.map(round2),
            dividend_yield: profile.dividend_yield.map(round2),
            fifty_two_week_high: round2(high),
            fifty_two_week_low: round2(low),
            fifty_day_avg: indicators::sma(&closes, 50)?.map(round2),
            two_hundred_day_avg: indicators::sma(&closes, 200)?.map(round2),
            beta: profile.beta.map(round2),
            description: profile.description.unwrap_or_default(),
            website: profile.website.unwrap_or_default(),
            currency: profile.currency.unwrap_or_else(|| "USD".to_string()),
            symbol,
        })
    }

    /// Rounded price bars over `period`
    pub async fn historical_data(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceHistory> {
        let symbol = normalize(symbol)?;
        let bars = self.history(&symbol, period, interval).await?;
        if bars.is_empty() {
            return Err(MarketError::no_data(&symbol, "No historical data available"));
        }

        let date_format = if interval.is_intraday() {
            "%Y-%m-%d %H:%M"
        } else {
            "%Y-%m-%d"
        };
        let data: Vec<HistoryBar> = bars
            .iter()
            .map(|b| HistoryBar {
                date: b.date.format(date_format).to_string(),
                open: round2(b.open),
                high: round2(b.high),
                low: round2(b.low),
                close: round2(b.close),
                volume: b.volume,
            })
            .collect();

        Ok(PriceHistory {
            start_date: data.first().map(|b| b.date.clone()),
            end_date: data.last().map(|b| b.date.clone()),
            data_points: data.len(),
            symbol,
            period,
            interval,
            data,
        })
    }

    /// Latest news for a symbol, newest first
    pub async fn stock_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let symbol = normalize(symbol)?;
        let mut news = self
            .source
            .company_news(&symbol)
            .await
            .map_err(|e| e.for_symbol(&symbol))?;
        news.truncate(NEWS_LIMIT);
        Ok(news)
    }

    /// Income statement, balance sheet and cash flow for recent periods
    pub async fn financials(&self, symbol: &str) -> Result<Financials> {
        let symbol = normalize(symbol)?;
        let reports = self
            .source
            .financial_statements(&symbol)
            .await
            .map_err(|e| e.for_symbol(&symbol))?;

        let mut income_statement = StatementTable::new();
        let mut balance_sheet = StatementTable::new();
        let mut cash_flow = StatementTable::new();
        for report in reports.into_iter().take(FINANCIAL_PERIODS) {
            income_statement.insert(report.end_date.clone(), report.income_statement);
            balance_sheet.insert(report.end_date.clone(), report.balance_sheet);
            cash_flow.insert(report.end_date, report.cash_flow);
        }

        Ok(Financials {
            symbol,
            income_statement,
            balance_sheet,
            cash_flow,
        })
    }

    /// Most recent analyst recommendation trends
    pub async fn recommendations(&self, symbol: &str) -> Result<Recommendations> {
        let symbol = normalize(symbol)?;
        let mut trends = self
            .source
            .recommendation_trends(&symbol)
            .await
            .map_err(|e| e.for_symbol(&symbol))?;
        trends.sort_by(|a, b| b.period.cmp(&a.period));
        trends.truncate(RECOMMENDATION_LIMIT);

        Ok(Recommendations {
            symbol,
            recommendations: trends,
        })
    }

    /// Indicator report over six months of daily bars
    pub async fn technicals(&self, symbol: &str) -> Result<IndicatorReport> {
        let symbol = normalize(symbol)?;
        let bars = self
            .history(&symbol, LOOKBACK_PERIOD, Interval::OneDay)
            .await?;
        indicators::analyze(&symbol, &bars, Local::now().naive_local())
    }

    /// Snapshots of the tracked indices; indices that cannot be priced are
    /// skipped
    pub async fn market_indices(&self) -> Vec<IndexSnapshot> {
        let mut snapshots = Vec::with_capacity(self.universe.indices().len());

        for index in self.universe.indices() {
            let bars = match self
                .source
                .price_history(&index.symbol, Period::FiveDays, Interval::OneDay)
                .await
            {
                Ok(bars) => bars,
                Err(e) => {
                    tracing::warn!(symbol = %index.symbol, error = %e, "Skipping index");
                    continue;
                }
            };
            let Some(last) = bars.last() else {
                continue;
            };

            let (change, change_percent) = match bars.len() {
                0 | 1 => (0.0, 0.0),
                n => change_between(bars[n - 2].close, last.close),
            };
            snapshots.push(IndexSnapshot {
                symbol: index.symbol.clone(),
                name: index.name.clone(),
                price: round2(last.close),
                change: round2(change),
                change_percent: round2(change_percent),
            });
        }

        snapshots
    }

    /// Best and worst daily performers of the universe for `market_type`
    ///
    /// Symbols whose prices cannot be resolved are left out.
    pub async fn top_movers(&self, market_type: MarketType, limit: usize) -> Movers {
        let mut movers = Vec::new();

        for listing in self.universe.movers(market_type) {
            let bars = match self
                .source
                .price_history(&listing.symbol, Period::FiveDays, Interval::OneDay)
                .await
            {
                Ok(bars) => bars,
                Err(e) => {
                    tracing::debug!(symbol = %listing.symbol, error = %e, "Skipping mover");
                    continue;
                }
            };
            if let Some(mover) = mover_from_bars(&listing.symbol, &listing.name, &bars) {
                movers.push(mover);
            }
        }

        rank_movers(movers, limit)
    }

    /// Symbols or names matching `query`
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.universe.search(query, limit)
    }

    async fn history(&self, symbol: &str, period: Period, interval: Interval) -> Result<Vec<PriceBar>> {
        self.source
            .price_history(symbol, period, interval)
            .await
            .map_err(|e| e.for_symbol(symbol))
    }
}

impl std::fmt::Debug for MarketGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketGateway")
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}

fn normalize(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(MarketError::InvalidRequest("symbol must not be empty".to_string()));
    }
    Ok(symbol)
}

/// Absolute and percentage change; percentage is 0 when `previous` is 0
fn change_between(previous: f64, current: f64) -> (f64, f64) {
    let change = current - previous;
    let percent = if previous == 0.0 {
        0.0
    } else {
        change / previous * 100.0
    };
    (change, percent)
}

fn mover_from_bars(symbol: &str, name: &str, bars: &[PriceBar]) -> Option<Mover> {
    let [.., previous, current] = bars else {
        return None;
    };
    if previous.close <= 0.0 {
        return None;
    }
    let (change, change_percent) = change_between(previous.close, current.close);

    Some(Mover {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price: round2(current.close),
        change: round2(change),
        change_percent: round2(change_percent),
        volume: current.volume,
    })
}

/// Sort descending by percentage change and cut both ends
///
/// Gainers are the first `limit` entries; losers are the last `limit`
/// entries, worst first. With fewer than `2 * limit` movers the two lists
/// overlap.
pub fn rank_movers(mut movers: Vec<Mover>, limit: usize) -> Movers {
    movers.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));

    let gainers = movers.iter().take(limit).cloned().collect();
    let losers = movers.iter().rev().take(limit).cloned().collect();

    Movers { gainers, losers }
}
