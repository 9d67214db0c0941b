//! Group endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use rawmate_common::AppResult;
use rawmate_core::{Actor, CreateGroupInput};
use rawmate_db::entities::group::{self, GroupStatus};
use serde::{Deserialize, Serialize};

use crate::{extractors::ApiJson, middleware::AppState, response::Created};

// ==================== Request/Response Types ====================

/// Group response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub creator_id: String,
    pub product: String,
    pub price: f64,
    pub total_quantity: i32,
    pub min_join_quantity: i32,
    pub joined_quantity: i32,
    pub pickup_point: String,
    pub status: GroupStatus,
    pub created_at: String,
}

impl From<group::Model> for GroupResponse {
    fn from(g: group::Model) -> Self {
        Self {
            id: g.id,
            creator_id: g.creator_id,
            product: g.product,
            price: g.price,
            total_quantity: g.total_quantity,
            min_join_quantity: g.min_join_quantity,
            joined_quantity: g.joined_quantity,
            pickup_point: g.pickup_point,
            status: g.status,
            created_at: g.created_at.to_rfc3339(),
        }
    }
}

/// Create group request.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(flatten)]
    pub group: CreateGroupInput,
}

// ==================== Handlers ====================

/// Create a group.
async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> AppResult<Created<GroupResponse>> {
    let group = state.group_service.create(&req.actor, req.group).await?;

    Ok(Created(group.into()))
}

/// List all groups.
async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<GroupResponse>>> {
    let groups = state.group_service.list_all().await?;

    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

/// List groups created by a user.
async fn mine(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<GroupResponse>>> {
    let groups = state.group_service.list_by_creator(&user_id).await?;

    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/my/{user_id}", get(mine))
}
