//! Prompt templates for the stock analyst
//!
//! The system instruction is static text; the two single-shot analysis
//! prompts are MiniJinja templates rendered with pre-serialized JSON so the
//! model sees exactly the data the caller receives.

use crate::error::Result;
use minijinja::{Environment, context};
use serde::Serialize;

/// Fixed system instruction for every conversation
pub const SYSTEM_PROMPT: &str = "You are an expert AI stock analyst with deep knowledge of financial markets, \
technical analysis, fundamental analysis, and market trends. You have access to real-time stock data \
through specialized tools.

Your responsibilities:
1. Analyze stocks, ETFs, and funds based on user queries
2. Provide buy/sell/hold recommendations with clear reasoning
3. Consider world news, market conditions, company fundamentals, and technical indicators
4. Explain complex financial concepts in simple terms
5. Be objective and always mention risks involved

When analyzing stocks:
- Consider both technical indicators (RSI, MACD, moving averages) and fundamentals (P/E, EPS, revenue growth)
- Factor in recent news and market sentiment
- Provide specific price targets when possible
- Always include risk warnings

Format your responses clearly with sections for:
- Summary
- Analysis
- Recommendation
- Risk Factors";

const MARKET_SUMMARY: &str = "Based on the following market data, provide a brief market summary:

Market Indices: {{ indices }}
Top Movers: {{ movers }}

Provide a concise summary of:
1. Overall market sentiment
2. Key movements in major indices
3. Notable stock movements
4. Any potential concerns or opportunities";

const STOCK_RECOMMENDATION: &str = "Analyze the following stock data and provide a clear BUY, SELL, or HOLD recommendation:

Stock Info: {{ info }}
Technical Analysis: {{ technicals }}
Recent News: {{ news }}
Analyst Recommendations: {{ recommendations }}

Provide:
1. Clear recommendation (BUY/SELL/HOLD)
2. Confidence level (1-10)
3. Target price
4. Stop loss price
5. Detailed reasoning
6. Key risks";

/// User message that scopes a chat to one symbol
pub fn scoped_message(message: &str, symbol: Option<&str>) -> String {
    match symbol.map(str::trim).filter(|s| !s.is_empty()) {
        Some(symbol) => format!("[Regarding {symbol}] {message}"),
        None => message.to_string(),
    }
}

/// Prompt asking for a market overview
pub fn market_summary_prompt(indices: &impl Serialize, movers: &impl Serialize) -> Result<String> {
    render(
        MARKET_SUMMARY,
        context! {
            indices => to_json(indices),
            movers => to_json(movers),
        },
    )
}

/// Prompt asking for a BUY / SELL / HOLD call on one stock
pub fn recommendation_prompt(
    info: &impl Serialize,
    technicals: &impl Serialize,
    news: &impl Serialize,
    recommendations: &impl Serialize,
) -> Result<String> {
    render(
        STOCK_RECOMMENDATION,
        context! {
            info => to_json(info),
            technicals => to_json(technicals),
            news => to_json(news),
            recommendations => to_json(recommendations),
        },
    )
}

fn render(template: &str, ctx: minijinja::Value) -> Result<String> {
    let env = Environment::new();
    Ok(env.render_str(template, ctx)?)
}

fn to_json(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scoped_message() {
        assert_eq!(
            scoped_message("Should I buy?", Some("AAPL")),
            "[Regarding AAPL] Should I buy?"
        );
        assert_eq!(scoped_message("Hello", None), "Hello");
        assert_eq!(scoped_message("Hello", Some("  ")), "Hello");
    }

    #[test]
    fn test_market_summary_prompt_embeds_json() {
        let prompt = market_summary_prompt(
            &json!([{"symbol": "^GSPC", "price": 5000.5}]),
            &json!({"gainers": [], "losers": []}),
        )
        .unwrap();

        assert!(prompt.starts_with("Based on the following market data"));
        assert!(prompt.contains(r#"Market Indices: [{"price":5000.5,"symbol":"^GSPC"}]"#));
        assert!(prompt.contains(r#"Top Movers: {"gainers":[],"losers":[]}"#));
    }

    #[test]
    fn test_recommendation_prompt_is_not_html_escaped() {
        let prompt = recommendation_prompt(
            &json!({"name": "AT&T <T>"}),
            &json!({"error": "No data available", "symbol": "T"}),
            &json!([]),
            &json!({"symbol": "T", "recommendations": []}),
        )
        .unwrap();

        assert!(prompt.contains("AT&T <T>"));
        assert!(prompt.contains(r#"Technical Analysis: {"error":"No data available","symbol":"T"}"#));
        assert!(prompt.ends_with("6. Key risks"));
    }
}
