//! Watchlist API Routes
//!
//! CRUD over the caller's own watchlist entries. Every route sits behind
//! [`auth_middleware`], so handlers always receive a verified [`Identity`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use watchlist_store::WatchlistEntry;

use crate::auth::{auth_middleware, Identity};
use crate::{AppError, AppState};

#[derive(Deserialize, Default)]
pub struct AddWatchlistRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateWatchlistRequest {
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Serialize)]
pub struct AddedResponse {
    pub added: WatchlistEntry,
}

#[derive(Serialize)]
pub struct UpdatedResponse {
    pub updated: WatchlistEntry,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: Option<String>,
}

pub fn watchlist_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/watchlist", get(list_watchlist).post(add_to_watchlist))
        .route(
            "/api/watchlist/:id",
            get(get_watchlist_entry)
                .patch(update_watchlist_entry)
                .delete(remove_from_watchlist),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn list_watchlist(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<Vec<WatchlistEntry>> {
    Json(state.store.list_by_owner(identity.as_str()).await)
}

async fn get_watchlist_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(asset_id): Path<String>,
) -> Result<Json<WatchlistEntry>, AppError> {
    let entry = state.store.get(identity.as_str(), &asset_id).await?;
    Ok(Json(entry))
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<AddWatchlistRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddedResponse>), AppError> {
    // An unreadable body is treated like one with no fields
    let req = payload.map(|Json(req)| req).unwrap_or_default();

    let added = state
        .store
        .add(
            identity.as_str(),
            req.id.as_deref().unwrap_or_default(),
            req.symbol.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AddedResponse { added })))
}

async fn update_watchlist_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(asset_id): Path<String>,
    payload: Result<Json<UpdateWatchlistRequest>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, AppError> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();

    let updated = state
        .store
        .update_symbol(
            identity.as_str(),
            &asset_id,
            req.symbol.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(UpdatedResponse { updated }))
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(asset_id): Path<String>,
) -> Result<Json<RemovedResponse>, AppError> {
    let removed = state.store.remove(identity.as_str(), &asset_id).await?;
    Ok(Json(RemovedResponse { removed }))
}
