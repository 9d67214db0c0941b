//! Market price endpoint.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use rawmate_common::AppResult;
use rawmate_core::{MarketPrice, MarketPriceQuery};

use crate::middleware::AppState;

/// Look up commodity prices for a district.
async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<MarketPriceQuery>,
) -> AppResult<Json<Vec<MarketPrice>>> {
    let prices = state.market_price_service.lookup(&query).await?;

    Ok(Json(prices))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(lookup))
}
