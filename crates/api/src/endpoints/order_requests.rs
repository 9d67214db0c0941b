//! Order request endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use rawmate_common::AppResult;
use rawmate_core::{Actor, CreateOrderRequestInput, OrderRequestWithParty, UpdateOrderStatusInput};
use rawmate_db::entities::request_status::RequestStatus;
use rawmate_db::entities::{order_request, user};
use serde::{Deserialize, Serialize};

use crate::{extractors::ApiJson, middleware::AppState, response::Created};

// ==================== Request/Response Types ====================

/// Order request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub vendor_id: String,
    pub supplier_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub notes: String,
    pub status: RequestStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<order_request::Model> for OrderRequestResponse {
    fn from(r: order_request::Model) -> Self {
        Self {
            id: r.id,
            vendor_id: r.vendor_id,
            supplier_id: r.supplier_id,
            product_id: r.product_id,
            quantity: r.quantity,
            notes: r.notes,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// Public fields of the user on the other side of a request.
#[derive(Serialize)]
pub struct PartyResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub location: String,
}

impl From<user::Model> for PartyResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            location: u.location,
        }
    }
}

/// Supplier dashboard entry.
#[derive(Serialize)]
pub struct ReceivedOrderRequest {
    #[serde(flatten)]
    pub request: OrderRequestResponse,
    pub vendor: Option<PartyResponse>,
}

impl From<OrderRequestWithParty> for ReceivedOrderRequest {
    fn from(r: OrderRequestWithParty) -> Self {
        Self {
            request: r.request.into(),
            vendor: r.counterpart.map(Into::into),
        }
    }
}

/// Vendor history entry.
#[derive(Serialize)]
pub struct SentOrderRequest {
    #[serde(flatten)]
    pub request: OrderRequestResponse,
    pub supplier: Option<PartyResponse>,
}

impl From<OrderRequestWithParty> for SentOrderRequest {
    fn from(r: OrderRequestWithParty) -> Self {
        Self {
            request: r.request.into(),
            supplier: r.counterpart.map(Into::into),
        }
    }
}

/// Confirmation carrying the affected request.
#[derive(Serialize)]
pub struct OrderRequestEnvelope {
    pub message: String,
    pub request: OrderRequestResponse,
}

/// Create order request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequestBody {
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(flatten)]
    pub input: CreateOrderRequestInput,
}

/// Status update body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(flatten)]
    pub input: UpdateOrderStatusInput,
}

// ==================== Handlers ====================

/// Send an order request to a supplier.
async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrderRequestBody>,
) -> AppResult<Created<OrderRequestEnvelope>> {
    let request = state
        .order_request_service
        .create(&req.actor, req.input)
        .await?;

    Ok(Created(OrderRequestEnvelope {
        message: "Order request submitted successfully!".to_string(),
        request: request.into(),
    }))
}

/// Requests received by a supplier.
async fn received(
    State(state): State<AppState>,
    Path(supplier_id): Path<String>,
) -> AppResult<Json<Vec<ReceivedOrderRequest>>> {
    let requests = state
        .order_request_service
        .list_for_supplier(&supplier_id)
        .await?;

    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Accept or decline a request.
async fn update_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    ApiJson(req): ApiJson<UpdateStatusBody>,
) -> AppResult<Json<OrderRequestEnvelope>> {
    let request = state
        .order_request_service
        .update_status(&req.actor, &request_id, req.input)
        .await?;

    Ok(Json(OrderRequestEnvelope {
        message: format!("Order request status updated to {}.", request.status),
        request: request.into(),
    }))
}

/// Requests sent by a vendor.
async fn sent(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> AppResult<Json<Vec<SentOrderRequest>>> {
    let requests = state
        .order_request_service
        .list_for_vendor(&vendor_id)
        .await?;

    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order-requests", post(create))
        // Both paths share one parameter name at the same position
        .route("/supplier/order-requests/{id}", get(received))
        .route("/supplier/order-requests/{id}/status", put(update_status))
        .route("/vendor/my-order-requests/{vendor_id}", get(sent))
}
