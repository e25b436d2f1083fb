//! Shared handler state

use analyst_alerts::{
    AlertScheduler, AlertStore, EmailDispatcher, JsonFileStore, ScheduleConfig, UserDirectory,
};
use analyst_chat::{ChatConfig, ChatOrchestrator, StockAnalyst, tools::market_tools};
use analyst_llm::LLMProvider;
use analyst_market::{MarketDataSource, MarketGateway};
use std::sync::Arc;

/// Everything a handler can reach; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub gateway: MarketGateway,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub analyst: StockAnalyst,
    pub alerts: Arc<dyn AlertStore>,
    pub users: Arc<dyn UserDirectory>,
    pub mailer: Arc<dyn EmailDispatcher>,
    pub scheduler: Arc<AlertScheduler>,
}

impl AppState {
    /// Wire the gateway, tool registry, analysts and scheduler together
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        source: Arc<dyn MarketDataSource>,
        store: Arc<JsonFileStore>,
        mailer: Arc<dyn EmailDispatcher>,
        chat: ChatConfig,
        schedule: ScheduleConfig,
    ) -> anyhow::Result<Self> {
        let gateway = MarketGateway::with_default_universe(source);
        let tools = Arc::new(market_tools(&gateway)?);
        let orchestrator = Arc::new(ChatOrchestrator::new(provider.clone(), tools, chat.clone()));
        let analyst = StockAnalyst::new(provider, gateway.clone(), chat);

        let scheduler = Arc::new(AlertScheduler::new(
            store.clone(),
            store.clone(),
            Arc::new(analyst.clone()),
            mailer.clone(),
            schedule,
        ));

        Ok(Self {
            gateway,
            orchestrator,
            analyst,
            alerts: store.clone(),
            users: store,
            mailer,
            scheduler,
        })
    }
}
