//! User registration and login

use analyst_alerts::{Credentials, NewUser, User, compose_welcome};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub message: &'static str,
}

/// `POST /api/auth/register` (also mounted at `POST /api/users`)
///
/// The welcome email is sent in the background; its outcome does not
/// affect the response.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.users.create_user(req).await?;

    let mailer = state.mailer.clone();
    let welcome = user.clone();
    tokio::spawn(async move {
        let sent = match compose_welcome(&welcome) {
            Ok(email) => mailer.send(email).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            warn!(user_id = %welcome.id, error = %e, "Welcome email failed");
        }
    });

    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/users/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .authenticate(&credentials)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        user: LoginUser {
            id: user.id,
            email: user.email,
            name: user.name,
        },
        message: "Login successful",
    }))
}
