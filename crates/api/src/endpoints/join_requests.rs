//! Join request endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use rawmate_common::AppResult;
use rawmate_core::{Actor, JoinGroupInput};
use serde::{Deserialize, Serialize};

use crate::{extractors::ApiJson, middleware::AppState};

/// Join request body.
#[derive(Debug, Deserialize)]
pub struct JoinRequestBody {
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(flatten)]
    pub input: JoinGroupInput,
}

/// Join confirmation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub message: &'static str,
    pub product: String,
    pub joined_quantity: i32,
}

/// Ask to join a group with a quantity.
async fn join(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    ApiJson(req): ApiJson<JoinRequestBody>,
) -> AppResult<Json<JoinResponse>> {
    let admission = state
        .group_service
        .join(&req.actor, &group_id, req.input)
        .await?;

    Ok(Json(JoinResponse {
        message: "Join request submitted successfully.",
        product: admission.group.product,
        joined_quantity: admission.group.joined_quantity,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{group_id}/join", post(join))
}
