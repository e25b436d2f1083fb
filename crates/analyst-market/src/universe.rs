//! Fixed symbol tables: market indices, movers universes and the
//! searchable symbol list
//!
//! A [`Universe`] is built once at startup and shared behind an `Arc`;
//! nothing mutates it afterwards.

use crate::types::{MarketType, SearchHit};

/// A ticker with its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub symbol: String,
    pub name: String,
}

impl Listing {
    fn new(symbol: &str, name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

const INDICES: &[(&str, &str)] = &[
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "NASDAQ"),
    ("^RUT", "Russell 2000"),
    ("^VIX", "VIX"),
    ("^FTSE", "FTSE 100"),
    ("^N225", "Nikkei 225"),
    ("^HSI", "Hang Seng"),
];

const STOCKS: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms Inc."),
    ("TSLA", "Tesla Inc."),
    ("BRK-B", "Berkshire Hathaway Inc."),
    ("JPM", "JPMorgan Chase & Co."),
    ("JNJ", "Johnson & Johnson"),
    ("V", "Visa Inc."),
    ("PG", "Procter & Gamble Co."),
    ("UNH", "UnitedHealth Group Inc."),
    ("HD", "Home Depot Inc."),
    ("MA", "Mastercard Inc."),
    ("DIS", "Walt Disney Co."),
    ("PYPL", "PayPal Holdings Inc."),
    ("NFLX", "Netflix Inc."),
    ("ADBE", "Adobe Inc."),
    ("CRM", "Salesforce Inc."),
    ("INTC", "Intel Corporation"),
    ("AMD", "Advanced Micro Devices Inc."),
    ("CSCO", "Cisco Systems Inc."),
    ("PEP", "PepsiCo Inc."),
    ("KO", "Coca-Cola Co."),
    ("NKE", "Nike Inc."),
    ("MRK", "Merck & Co. Inc."),
    ("PFE", "Pfizer Inc."),
];

const ETFS: &[(&str, &str)] = &[
    ("SPY", "SPDR S&P 500 ETF Trust"),
    ("QQQ", "Invesco QQQ Trust"),
    ("IWM", "iShares Russell 2000 ETF"),
    ("DIA", "SPDR Dow Jones Industrial Average ETF"),
    ("VTI", "Vanguard Total Stock Market ETF"),
    ("VOO", "Vanguard S&P 500 ETF"),
    ("VEA", "Vanguard FTSE Developed Markets ETF"),
    ("VWO", "Vanguard FTSE Emerging Markets ETF"),
    ("BND", "Vanguard Total Bond Market ETF"),
    ("GLD", "SPDR Gold Shares"),
    ("SLV", "iShares Silver Trust"),
    ("USO", "United States Oil Fund"),
    ("XLF", "Financial Select Sector SPDR Fund"),
    ("XLE", "Energy Select Sector SPDR Fund"),
    ("XLK", "Technology Select Sector SPDR Fund"),
    ("XLV", "Health Care Select Sector SPDR Fund"),
    ("XLI", "Industrial Select Sector SPDR Fund"),
    ("XLP", "Consumer Staples Select Sector SPDR Fund"),
    ("XLU", "Utilities Select Sector SPDR Fund"),
    ("ARKK", "ARK Innovation ETF"),
];

const SEARCHABLE: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms Inc."),
    ("TSLA", "Tesla Inc."),
    ("JPM", "JPMorgan Chase & Co."),
    ("V", "Visa Inc."),
    ("JNJ", "Johnson & Johnson"),
];

fn listings(table: &[(&str, &str)]) -> Vec<Listing> {
    table.iter().map(|(s, n)| Listing::new(s, n)).collect()
}

/// Immutable symbol tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    indices: Vec<Listing>,
    stocks: Vec<Listing>,
    etfs: Vec<Listing>,
    searchable: Vec<Listing>,
}

impl Default for Universe {
    fn default() -> Self {
        Self {
            indices: listings(INDICES),
            stocks: listings(STOCKS),
            etfs: listings(ETFS),
            searchable: listings(SEARCHABLE),
        }
    }
}

impl Universe {
    /// Tables with caller-supplied contents
    pub fn new(
        indices: Vec<Listing>,
        stocks: Vec<Listing>,
        etfs: Vec<Listing>,
        searchable: Vec<Listing>,
    ) -> Self {
        Self {
            indices,
            stocks,
            etfs,
            searchable,
        }
    }

    /// Tracked market indices
    pub fn indices(&self) -> &[Listing] {
        &self.indices
    }

    /// Movers universe for a market type
    pub fn movers(&self, market_type: MarketType) -> &[Listing] {
        match market_type {
            MarketType::Stocks => &self.stocks,
            MarketType::Etf => &self.etfs,
        }
    }

    /// Display name for a symbol found in any table
    pub fn name_of(&self, symbol: &str) -> Option<&str> {
        self.indices
            .iter()
            .chain(&self.stocks)
            .chain(&self.etfs)
            .chain(&self.searchable)
            .find(|l| l.symbol.eq_ignore_ascii_case(symbol))
            .map(|l| l.name.as_str())
    }

    /// Case-insensitive match on symbol or name, capped at `limit`
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let symbol_query = query.trim().to_uppercase();
        let name_query = query.trim().to_lowercase();
        if symbol_query.is_empty() {
            return Vec::new();
        }

        self.searchable
            .iter()
            .filter(|l| {
                l.symbol.contains(&symbol_query) || l.name.to_lowercase().contains(&name_query)
            })
            .take(limit)
            .map(|l| SearchHit {
                symbol: l.symbol.clone(),
                name: l.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let universe = Universe::default();
        assert_eq!(universe.indices().len(), 8);
        assert_eq!(universe.indices()[0].symbol, "^GSPC");
        assert_eq!(universe.movers(MarketType::Stocks).len(), 28);
        assert_eq!(universe.movers(MarketType::Etf).len(), 20);
    }

    #[test]
    fn test_search_by_symbol_and_name() {
        let universe = Universe::default();

        let hits = universe.search("aapl", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Apple Inc.");

        let hits = universe.search("corporation", 10);
        let symbols: Vec<_> = hits.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MSFT", "NVDA"]);
    }

    #[test]
    fn test_search_limit_and_empty_query() {
        let universe = Universe::default();
        assert_eq!(universe.search("inc", 2).len(), 2);
        assert!(universe.search("   ", 10).is_empty());
        assert!(universe.search("zzzz", 10).is_empty());
    }

    #[test]
    fn test_name_of() {
        let universe = Universe::default();
        assert_eq!(universe.name_of("^dji"), Some("Dow Jones"));
        assert_eq!(universe.name_of("ARKK"), Some("ARK Innovation ETF"));
        assert_eq!(universe.name_of("NOPE"), None);
    }
}
