//! Identity endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use rawmate_common::AppResult;
use rawmate_core::{IdentifyInput, Identified};
use rawmate_db::entities::user::{self, UserRole};
use serde::Serialize;

use crate::{extractors::ApiJson, middleware::AppState};

// ==================== Response Types ====================

/// Full user record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub location: String,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            location: u.location,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Supplier directory entry. Email and creation time are withheld.
#[derive(Serialize)]
pub struct SupplierResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub location: String,
}

impl From<user::Model> for SupplierResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            role: u.role,
            location: u.location,
        }
    }
}

/// Identify response.
#[derive(Serialize)]
pub struct IdentifyResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

// ==================== Handlers ====================

/// Create or update the caller's user record.
async fn identify(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<IdentifyInput>,
) -> AppResult<(StatusCode, Json<IdentifyResponse>)> {
    let (status, message, user) = match state.user_service.identify(input).await? {
        Identified::Created(user) => (StatusCode::CREATED, "User profile created.", user),
        Identified::Updated(user) => (StatusCode::OK, "User profile updated.", user),
    };

    Ok((
        status,
        Json(IdentifyResponse {
            message,
            user: user.into(),
        }),
    ))
}

/// List suppliers.
async fn suppliers(State(state): State<AppState>) -> AppResult<Json<Vec<SupplierResponse>>> {
    let suppliers = state.user_service.list_suppliers().await?;

    Ok(Json(suppliers.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/identify", post(identify))
        .route("/suppliers", get(suppliers))
}
