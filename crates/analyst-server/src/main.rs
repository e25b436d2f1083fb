//! `stock-analyst`: the API server binary

use analyst_alerts::{JsonFileStore, LogDispatcher, ScheduleConfig};
use analyst_chat::ChatConfig;
use analyst_llm::providers::OpenAIProvider;
use analyst_market::{LiveMarketSource, MarketConfig};
use analyst_server::{AppState, create_app};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "stock-analyst")]
#[command(about = "AI-powered stock analysis API", long_about = None, version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "ANALYST_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "ANALYST_PORT", default_value_t = 8000)]
    port: u16,

    /// Directory holding users.json and schedulers.json
    #[arg(long, env = "ANALYST_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Serve the API without running scheduled alerts
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    analyst_utils::init_tracing();

    let args = Args::parse();
    let app = analyst_utils::Config::from_env();
    info!(
        app = %app.app_name,
        environment = %app.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting stock-analyst"
    );

    let provider = Arc::new(OpenAIProvider::from_env()?);
    let source = Arc::new(LiveMarketSource::from_config(MarketConfig::from_env()?)?);
    let store = Arc::new(JsonFileStore::open(&args.data_dir).await?);

    let state = AppState::new(
        provider,
        source,
        store,
        Arc::new(LogDispatcher),
        ChatConfig::from_env()?,
        ScheduleConfig::from_env()?,
    )?;

    if args.no_scheduler {
        info!("Alert scheduler disabled");
    } else {
        state.scheduler.start();
    }

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, create_app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.scheduler.stop();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
