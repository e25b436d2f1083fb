//! Twice-daily alert scheduler
//!
//! Two independent timers wake at the configured morning and evening clock
//! times, load the active alerts for that trigger and email each owner an
//! AI-written update. A failing alert is logged and never stops the batch.

use crate::email::{EmailDispatcher, compose_market_alert};
use crate::error::{AlertError, Result};
use crate::model::{AlertDefinition, Trigger};
use crate::store::{AlertStore, UserDirectory};
use analyst_chat::{ChatError, StockAnalyst};
use analyst_utils::{ConfigError, env_or};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const TIME_FORMAT: &str = "%H:%M";
const SECTION_DELIMITER: &str = "\n\n---\n\n";
const NO_SUMMARY: &str = "No summary available";
const NO_ANALYSIS: &str = "No analysis available";

/// Source of the analysis text placed in alert emails
#[async_trait]
pub trait AlertAnalyst: Send + Sync {
    async fn recommendation(&self, symbol: &str) -> std::result::Result<String, ChatError>;

    async fn market_summary(&self) -> std::result::Result<String, ChatError>;
}

#[async_trait]
impl AlertAnalyst for StockAnalyst {
    async fn recommendation(&self, symbol: &str) -> std::result::Result<String, ChatError> {
        Ok(self.stock_recommendation(symbol).await?.analysis)
    }

    async fn market_summary(&self) -> std::result::Result<String, ChatError> {
        Ok(StockAnalyst::market_summary(self).await?.summary)
    }
}

/// Local clock times of the two daily triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub morning: NaiveTime,
    pub evening: NaiveTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            morning: NaiveTime::from_hms_opt(8, 30, 0).unwrap_or(NaiveTime::MIN),
            evening: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ScheduleConfig {
    /// Read `ALERT_MORNING_TIME` / `ALERT_EVENING_TIME` (HH:MM)
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            morning: parse_clock("ALERT_MORNING_TIME", defaults.morning)?,
            evening: parse_clock("ALERT_EVENING_TIME", defaults.evening)?,
        })
    }

    pub fn time_of(&self, trigger: Trigger) -> NaiveTime {
        match trigger {
            Trigger::Morning => self.morning,
            Trigger::Evening => self.evening,
        }
    }
}

fn parse_clock(key: &str, default: NaiveTime) -> std::result::Result<NaiveTime, ConfigError> {
    let raw = env_or(key, &default.format(TIME_FORMAT).to_string());
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw,
    })
}

/// First instant strictly after `now` whose wall-clock time is `at`
///
/// Days on which `at` does not exist locally (DST gaps) are skipped.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    now.clone() + TimeDelta::days(1)
}

/// Instant to schedule from after a timer fired at `fired`
///
/// The sleep is monotonic, so the wall clock can still read just before the
/// fire instant when the batch ends. Scheduling from at least one second past
/// it keeps the same occurrence from firing twice.
fn resume_point<Tz: TimeZone>(now: DateTime<Tz>, fired: Option<DateTime<Tz>>) -> DateTime<Tz> {
    match fired {
        Some(at) => {
            let floor = at + TimeDelta::seconds(1);
            if floor > now { floor } else { now }
        }
        None => now,
    }
}

/// Next fire instants of both triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextRuns {
    pub morning: DateTime<FixedOffset>,
    pub evening: DateTime<FixedOffset>,
}

/// Outcome of a delivered alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRun {
    pub success: bool,
    pub email_sent: bool,
    pub content: String,
}

/// Tally of one trigger's batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// `Custom Prompt: ...` header followed by `**SYMBOL**` analysis blocks
pub fn compose_symbol_alert(prompt: &str, parts: &[(String, String)]) -> String {
    let blocks: Vec<String> = parts
        .iter()
        .map(|(symbol, analysis)| format!("**{symbol}**\n{analysis}"))
        .collect();
    format!("Custom Prompt: {prompt}\n\n{}", blocks.join(SECTION_DELIMITER))
}

/// `Custom Prompt: ...` header followed by a market summary
pub fn compose_summary_alert(prompt: &str, summary: &str) -> String {
    format!("Custom Prompt: {prompt}\n\n{summary}")
}

/// Runs alerts on the two daily triggers and on demand
pub struct AlertScheduler {
    store: Arc<dyn AlertStore>,
    users: Arc<dyn UserDirectory>,
    analyst: Arc<dyn AlertAnalyst>,
    mailer: Arc<dyn EmailDispatcher>,
    config: ScheduleConfig,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for AlertScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl AlertScheduler {
    pub fn new(
        store: Arc<dyn AlertStore>,
        users: Arc<dyn UserDirectory>,
        analyst: Arc<dyn AlertAnalyst>,
        mailer: Arc<dyn EmailDispatcher>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            store,
            users,
            analyst,
            mailer,
            config,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Spawn the morning and evening timers; a second call is a no-op
    pub fn start(self: &Arc<Self>) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if !handles.is_empty() {
            warn!("Alert scheduler already running");
            return;
        }

        for trigger in Trigger::ALL {
            let scheduler = Arc::clone(self);
            handles.push(tokio::spawn(async move { scheduler.run_timer(trigger).await }));
        }
        info!(
            morning = %self.config.morning.format(TIME_FORMAT),
            evening = %self.config.evening.format(TIME_FORMAT),
            "Alert scheduler started"
        );
    }

    /// Abort both timers
    pub fn stop(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.is_empty() {
            return;
        }
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("Alert scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        !self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Next fire instants of both triggers after `now`
    pub fn next_run_times<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> NextRuns {
        NextRuns {
            morning: next_occurrence(now, self.config.morning).fixed_offset(),
            evening: next_occurrence(now, self.config.evening).fixed_offset(),
        }
    }

    /// Next fire instant of one trigger after `now`
    pub fn next_run<Tz: TimeZone>(&self, trigger: Trigger, now: &DateTime<Tz>) -> DateTime<FixedOffset> {
        next_occurrence(now, self.config.time_of(trigger)).fixed_offset()
    }

    async fn run_timer(&self, trigger: Trigger) {
        let mut fired: Option<DateTime<Local>> = None;
        loop {
            let now = Local::now();
            let next = next_occurrence(&resume_point(now, fired), self.config.time_of(trigger));
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(trigger = %trigger, next = %next, "Waiting for next trigger");
            tokio::time::sleep(wait).await;

            fired = Some(next);
            if let Err(e) = self.process_trigger(trigger).await {
                error!(trigger = %trigger, error = %e, "Failed to load alerts for trigger");
            }
        }
    }

    /// Deliver every active alert for `trigger`
    ///
    /// Only failing to load the alert list is an error; per-alert failures
    /// are logged and counted.
    pub async fn process_trigger(&self, trigger: Trigger) -> Result<BatchReport> {
        let start = Instant::now();
        let alerts = self.store.active_alerts(trigger).await?;
        info!(trigger = %trigger, alerts = alerts.len(), "Running scheduled alerts");

        let mut report = BatchReport::default();
        for alert in &alerts {
            report.processed += 1;
            match self.deliver(alert).await {
                Ok(run) => {
                    if run.email_sent {
                        report.sent += 1;
                    }
                    info!(alert_id = %alert.id, email_sent = run.email_sent, "Alert processed");
                }
                Err(AlertError::UserNotFound(user_id)) => {
                    report.skipped += 1;
                    warn!(alert_id = %alert.id, user_id = %user_id, "Alert owner not found, skipping");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(alert_id = %alert.id, error = %e, "Error processing alert");
                }
            }
        }

        info!(
            trigger = %trigger,
            processed = report.processed,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis(),
            "Scheduled alerts finished"
        );
        Ok(report)
    }

    /// Compose and dispatch one alert immediately
    pub async fn run_manual_alert(&self, id: &str) -> Result<ManualRun> {
        let alert = self
            .store
            .get_alert(id)
            .await?
            .ok_or_else(|| AlertError::AlertNotFound(id.to_string()))?;
        info!(alert_id = %id, "Running alert manually");
        self.deliver(&alert).await
    }

    async fn deliver(&self, alert: &AlertDefinition) -> Result<ManualRun> {
        let user = self
            .users
            .get_user(&alert.user_id)
            .await?
            .ok_or_else(|| AlertError::UserNotFound(alert.user_id.clone()))?;

        let content = self.content_for(alert).await;
        let email = compose_market_alert(&user, &content, alert.trigger_time, &alert.symbols)?;
        let email_sent = self.mailer.send(email).await?;

        Ok(ManualRun {
            success: true,
            email_sent,
            content,
        })
    }

    async fn content_for(&self, alert: &AlertDefinition) -> String {
        if alert.symbols.is_empty() {
            let summary = match self.analyst.market_summary().await {
                Ok(summary) if !summary.trim().is_empty() => summary,
                Ok(_) => NO_SUMMARY.to_string(),
                Err(e) => {
                    warn!(alert_id = %alert.id, error = %e, "Market summary failed");
                    NO_SUMMARY.to_string()
                }
            };
            return compose_summary_alert(&alert.prompt, &summary);
        }

        let mut parts = Vec::with_capacity(alert.symbols.len());
        for symbol in &alert.symbols {
            match self.analyst.recommendation(symbol).await {
                Ok(analysis) if analysis.trim().is_empty() => {
                    parts.push((symbol.clone(), NO_ANALYSIS.to_string()));
                }
                Ok(analysis) => parts.push((symbol.clone(), analysis)),
                Err(e) => {
                    warn!(alert_id = %alert.id, symbol = %symbol, error = %e, "Recommendation failed, omitting symbol");
                }
            }
        }
        compose_symbol_alert(&alert.prompt, &parts)
    }
}
