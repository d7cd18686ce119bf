use axum::{extract::State, routing::get, Json, Router};
use coingecko_client::CoinSummary;

use crate::{AppError, AppState};

pub fn coin_routes() -> Router<AppState> {
    Router::new().route("/api/coins", get(get_coins))
}

async fn get_coins(State(state): State<AppState>) -> Result<Json<Vec<CoinSummary>>, AppError> {
    let coins = state.market_data.top_coins().await?;
    Ok(Json(coins))
}
