//! Token issuance endpoint.

use axum::{extract::State, extract::rejection::JsonRejection, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

/// Sign a token for whatever identity the caller claims.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = payload
        .ok()
        .and_then(|Json(req)| req.user)
        .filter(|user| !user.is_empty())
        .ok_or_else(|| AppError::InvalidInput("user requerido".to_string()))?;

    let token = state.tokens.issue(&user)?;
    tracing::info!("Issued token for user {}", user);

    Ok(Json(TokenResponse { token }))
}
