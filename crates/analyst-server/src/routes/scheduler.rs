//! Alert definitions and manual runs

use analyst_alerts::{AlertDefinition, AlertError, AlertUpdate, ManualRun, NewAlert, NextRuns};
use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;

/// Alert definition with its next fire instant
#[derive(Debug, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: AlertDefinition,
    pub next_run: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct AlertList {
    pub schedulers: Vec<AlertView>,
}

fn view(state: &AppState, alert: AlertDefinition) -> AlertView {
    let next_run = state.scheduler.next_run(alert.trigger_time, &Local::now());
    AlertView { alert, next_run }
}

async fn require_user(state: &AppState, user_id: &str) -> Result<(), ApiError> {
    match state.users.get_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AlertError::UserNotFound(user_id.to_string()).into()),
    }
}

/// `POST /api/scheduler`
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewAlert>,
) -> Result<Json<AlertView>, ApiError> {
    require_user(&state, &req.user_id).await?;
    let alert = state.alerts.create_alert(req).await?;
    Ok(Json(view(&state, alert)))
}

/// `GET /api/scheduler/user/:user_id`
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<AlertList>, ApiError> {
    require_user(&state, &user_id).await?;
    let schedulers = state
        .alerts
        .list_alerts_for_user(&user_id)
        .await?
        .into_iter()
        .map(|alert| view(&state, alert))
        .collect();
    Ok(Json(AlertList { schedulers }))
}

/// `GET /api/scheduler/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AlertView>, ApiError> {
    let alert = state
        .alerts
        .get_alert(&id)
        .await?
        .ok_or(AlertError::AlertNotFound(id))?;
    Ok(Json(view(&state, alert)))
}

/// `PUT /api/scheduler/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<AlertUpdate>,
) -> Result<Json<AlertDefinition>, ApiError> {
    let alert = state
        .alerts
        .update_alert(&id, update)
        .await?
        .ok_or(AlertError::AlertNotFound(id))?;
    Ok(Json(alert))
}

/// `DELETE /api/scheduler/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.alerts.delete_alert(&id).await? {
        return Err(AlertError::AlertNotFound(id).into());
    }
    Ok(Json(json!({ "message": "Scheduler deleted successfully" })))
}

/// `POST /api/scheduler/:id/test`
///
/// Every failure, including unknown ids, is reported as a bad request.
pub async fn test(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ManualRun>, ApiError> {
    state
        .scheduler
        .run_manual_alert(&id)
        .await
        .map(Json)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// `GET /api/scheduler/next-runs`
pub async fn next_runs(State(state): State<AppState>) -> Json<NextRuns> {
    Json(state.scheduler.next_run_times(&Local::now()))
}
