//! Market data tools exposed to the language model
//!
//! Every tool wraps one [`MarketGateway`] operation. Gateway failures are
//! returned as `{"error": ..., "symbol": ...}` payloads so the model can read
//! and react to them; only malformed arguments surface as [`ToolError`].

use analyst_llm::tools::schema;
use analyst_market::{Interval, MarketError, MarketGateway, MarketType, Period};
use analyst_tools::{Result, Tool, ToolError, ToolRegistry, parse_params};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Tool names in registration order
pub const TOOL_NAMES: [&str; 8] = [
    "get_stock_info",
    "get_historical_data",
    "get_stock_news",
    "analyze_stock_technicals",
    "get_market_indices",
    "get_top_movers",
    "get_recommendations",
    "get_financials",
];

/// Build the fixed registry of market tools over `gateway`
pub fn market_tools(gateway: &MarketGateway) -> Result<ToolRegistry> {
    ToolRegistry::builder()
        .register(Arc::new(StockInfoTool::new(gateway.clone())))
        .register(Arc::new(HistoricalDataTool::new(gateway.clone())))
        .register(Arc::new(StockNewsTool::new(gateway.clone())))
        .register(Arc::new(TechnicalsTool::new(gateway.clone())))
        .register(Arc::new(MarketIndicesTool::new(gateway.clone())))
        .register(Arc::new(TopMoversTool::new(gateway.clone())))
        .register(Arc::new(RecommendationsTool::new(gateway.clone())))
        .register(Arc::new(FinancialsTool::new(gateway.clone())))
        .build()
}

#[derive(Debug, Deserialize)]
struct SymbolParams {
    symbol: String,
}

fn symbol_schema() -> Value {
    schema::object(
        json!({ "symbol": schema::string("The stock ticker symbol (e.g., AAPL, MSFT)") }),
        &["symbol"],
    )
}

/// Serialize a gateway result, turning gateway errors into payloads
fn respond<T: Serialize>(tool: &str, result: analyst_market::Result<T>) -> Result<Value> {
    match result {
        Ok(value) => serde_json::to_value(value).map_err(|e| ToolError::ExecutionFailed {
            tool: tool.to_string(),
            reason: e.to_string(),
        }),
        Err(e) => {
            tracing::debug!(tool_name = tool, error = %e, "Market lookup failed");
            Ok(e.to_payload())
        }
    }
}

macro_rules! gateway_tool {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            gateway: MarketGateway,
        }

        impl $name {
            pub fn new(gateway: MarketGateway) -> Self {
                Self { gateway }
            }
        }
    };
}

gateway_tool!(
    /// Quote snapshot and company profile
    StockInfoTool
);

#[async_trait]
impl Tool for StockInfoTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SymbolParams = parse_params(self.name(), params)?;
        respond(self.name(), self.gateway.stock_info(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_stock_info"
    }

    fn description(&self) -> &str {
        "Get comprehensive information about a stock including price, fundamentals, and company details"
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}

gateway_tool!(
    /// Price bars over a period
    HistoricalDataTool
);

#[derive(Debug, Deserialize)]
struct HistoricalParams {
    symbol: String,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    interval: Option<String>,
}

#[async_trait]
impl Tool for HistoricalDataTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: HistoricalParams = parse_params(self.name(), params)?;
        let vocab = params
            .period
            .as_deref()
            .map_or(Ok(Period::default()), str::parse::<Period>)
            .and_then(|period| {
                let interval = params
                    .interval
                    .as_deref()
                    .map_or(Ok(Interval::default()), str::parse::<Interval>)?;
                Ok((period, interval))
            });

        let result = match vocab {
            Ok((period, interval)) => {
                self.gateway
                    .historical_data(&params.symbol, period, interval)
                    .await
            }
            Err(e) => Err(e.for_symbol(&params.symbol.to_uppercase())),
        };
        respond(self.name(), result)
    }

    fn name(&self) -> &str {
        "get_historical_data"
    }

    fn description(&self) -> &str {
        "Get historical price data for a stock"
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "symbol": schema::string("The stock ticker symbol"),
                "period": schema::string_enum("Time period", &Period::names(), Period::default().as_str()),
                "interval": schema::string_enum("Bar interval", &Interval::names(), Interval::default().as_str()),
            }),
            &["symbol"],
        )
    }
}

gateway_tool!(
    /// Recent company news
    StockNewsTool
);

#[async_trait]
impl Tool for StockNewsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SymbolParams = parse_params(self.name(), params)?;
        respond(self.name(), self.gateway.stock_news(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_stock_news"
    }

    fn description(&self) -> &str {
        "Get recent news articles about a stock"
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}

gateway_tool!(
    /// Indicator report and signals
    TechnicalsTool
);

#[async_trait]
impl Tool for TechnicalsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SymbolParams = parse_params(self.name(), params)?;
        respond(self.name(), self.gateway.technicals(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "analyze_stock_technicals"
    }

    fn description(&self) -> &str {
        "Perform technical analysis on a stock including RSI, MACD, and moving averages"
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}

gateway_tool!(
    /// Snapshots of the major indices
    MarketIndicesTool
);

#[async_trait]
impl Tool for MarketIndicesTool {
    async fn execute(&self, _params: Value) -> Result<Value> {
        let indices = self.gateway.market_indices().await;
        respond(self.name(), Ok::<_, MarketError>(indices))
    }

    fn name(&self) -> &str {
        "get_market_indices"
    }

    fn description(&self) -> &str {
        "Get current data for major market indices (S&P 500, Dow Jones, NASDAQ, etc.)"
    }

    fn input_schema(&self) -> Value {
        schema::empty_object()
    }
}

gateway_tool!(
    /// Best and worst performers of a fixed universe
    TopMoversTool
);

#[derive(Debug, Deserialize)]
struct MoversParams {
    #[serde(default)]
    market_type: Option<String>,
    #[serde(default = "default_movers_limit")]
    limit: usize,
}

fn default_movers_limit() -> usize {
    10
}

#[async_trait]
impl Tool for TopMoversTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: MoversParams = parse_params(self.name(), params)?;
        // Anything but an ETF request ranks stocks.
        let market_type = params
            .market_type
            .as_deref()
            .and_then(|m| m.parse::<MarketType>().ok())
            .unwrap_or_default();

        let movers = self.gateway.top_movers(market_type, params.limit).await;
        respond(self.name(), Ok::<_, MarketError>(movers))
    }

    fn name(&self) -> &str {
        "get_top_movers"
    }

    fn description(&self) -> &str {
        "Get top gaining and losing stocks or ETFs"
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "market_type": schema::string_enum("Type of securities", &["stocks", "etf"], "stocks"),
                "limit": schema::integer_with_default("Number of results to return", 10),
            }),
            &[],
        )
    }
}

gateway_tool!(
    /// Analyst recommendation trends
    RecommendationsTool
);

#[async_trait]
impl Tool for RecommendationsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SymbolParams = parse_params(self.name(), params)?;
        respond(self.name(), self.gateway.recommendations(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_recommendations"
    }

    fn description(&self) -> &str {
        "Get analyst recommendations for a stock"
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}

gateway_tool!(
    /// Income statement, balance sheet and cash flow
    FinancialsTool
);

#[async_trait]
impl Tool for FinancialsTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SymbolParams = parse_params(self.name(), params)?;
        respond(self.name(), self.gateway.financials(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_financials"
    }

    fn description(&self) -> &str {
        "Get financial statements (income statement, balance sheet, cash flow) for a stock"
    }

    fn input_schema(&self) -> Value {
        symbol_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_market::InMemorySource;

    fn gateway(source: InMemorySource) -> MarketGateway {
        MarketGateway::with_default_universe(Arc::new(source))
    }

    #[test]
    fn test_registry_has_all_tools_in_order() {
        let registry = market_tools(&gateway(InMemorySource::new())).unwrap();
        assert_eq!(registry.names(), TOOL_NAMES);

        let defs = registry.definitions();
        assert_eq!(defs[1].input_schema["properties"]["period"]["default"], "1mo");
        assert_eq!(defs[5].input_schema["properties"]["limit"]["default"], 10);
        assert_eq!(defs[0].input_schema["required"][0], "symbol");
    }

    #[tokio::test]
    async fn test_stock_info_tool() {
        let source = InMemorySource::new().with_closes("AAPL", &[180.0, 181.8]);
        let tool = StockInfoTool::new(gateway(source));

        let result = tool.execute(json!({"symbol": "AAPL"})).await.unwrap();
        assert_eq!(result["symbol"], "AAPL");
        assert_eq!(result["current_price"], 181.8);
        assert_eq!(result["name"], "Apple Inc.");
    }

    #[tokio::test]
    async fn test_gateway_error_becomes_payload() {
        let tool = TechnicalsTool::new(gateway(InMemorySource::new()));
        let result = tool.execute(json!({"symbol": "zzzz"})).await.unwrap();
        assert_eq!(result, json!({"error": "No data available", "symbol": "ZZZZ"}));
    }

    #[tokio::test]
    async fn test_missing_symbol_is_invalid_parameters() {
        let tool = StockNewsTool::new(gateway(InMemorySource::new()));
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters { .. }));
    }

    #[tokio::test]
    async fn test_historical_defaults_and_bad_period() {
        let source = InMemorySource::new().with_closes("SPY", &[500.0, 501.0]);
        let tool = HistoricalDataTool::new(gateway(source));

        let result = tool.execute(json!({"symbol": "SPY"})).await.unwrap();
        assert_eq!(result["period"], "1mo");
        assert_eq!(result["interval"], "1d");
        assert_eq!(result["data_points"], 2);

        let result = tool
            .execute(json!({"symbol": "spy", "period": "forever"}))
            .await
            .unwrap();
        assert_eq!(result["symbol"], "SPY");
        assert!(result["error"].as_str().unwrap().contains("unknown period 'forever'"));
    }

    #[tokio::test]
    async fn test_top_movers_defaults_to_stocks() {
        let source = InMemorySource::new()
            .with_closes("AAPL", &[100.0, 103.0])
            .with_closes("SPY", &[100.0, 150.0]);
        let tool = TopMoversTool::new(gateway(source));

        let result = tool
            .execute(json!({"market_type": "bonds", "limit": 3}))
            .await
            .unwrap();
        assert_eq!(result["gainers"][0]["symbol"], "AAPL");
        assert_eq!(result["gainers"].as_array().unwrap().len(), 1);

        let result = tool.execute(json!({"market_type": "etf"})).await.unwrap();
        assert_eq!(result["gainers"][0]["symbol"], "SPY");
    }

    #[tokio::test]
    async fn test_market_indices_accepts_null_params() {
        let source = InMemorySource::new().with_closes("^IXIC", &[16000.0, 16160.0]);
        let tool = MarketIndicesTool::new(gateway(source));

        let result = tool.execute(Value::Null).await.unwrap();
        assert_eq!(result[0]["name"], "NASDAQ");
        assert_eq!(result[0]["change_percent"], 1.0);
    }
}
