// libs/pharmacy-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::pharmacy::OrderStatus;
use shared_store::AppState;

use crate::models::{
    AddBatchRequest, CreateMedicationRequest, CreateOrderRequest, MedicationSearchQuery,
    OrderError, UpdateOrderItemsRequest, UpdateOrderMetadataRequest,
};
use crate::services::inventory::MedicationInventoryService;
use crate::services::notify::LogInvoiceNotifier;
use crate::services::workflow::OrderWorkflow;

fn order_workflow(state: &AppState) -> OrderWorkflow {
    OrderWorkflow::new(
        Arc::clone(&state.store),
        Arc::new(LogInvoiceNotifier::new(state.config.invoice_sender.clone())),
    )
}

fn inventory_service(state: &AppState) -> MedicationInventoryService {
    MedicationInventoryService::new(Arc::clone(&state.store))
}

// ==============================================================================
// ORDER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let order = order_workflow(&state)
        .create(request)
        .await
        .map_err(to_app_error)?;

    let message = match order.status {
        OrderStatus::Confirmed => "Order confirmed",
        OrderStatus::WaitingStock => "Order created as WAITING_STOCK due to insufficient stock",
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "order": order,
            "message": message
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_orders(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let orders = order_workflow(&state).list().await;

    Ok(Json(json!({
        "orders": orders,
        "total": orders.len()
    })))
}

#[axum::debug_handler]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let order = order_workflow(&state)
        .get(&order_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(order)))
}

#[axum::debug_handler]
pub async fn update_order_items(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderItemsRequest>,
) -> Result<Json<Value>, AppError> {
    let order = order_workflow(&state)
        .update_items(order_id, request)
        .await
        .map_err(to_app_error)?;

    let message = match order.status {
        OrderStatus::Confirmed => "Order updated and confirmed",
        OrderStatus::WaitingStock => "Order updated as WAITING_STOCK due to insufficient stock",
    };

    Ok(Json(json!({
        "success": true,
        "order": order,
        "message": message
    })))
}

#[axum::debug_handler]
pub async fn update_order_metadata(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderMetadataRequest>,
) -> Result<Json<Value>, AppError> {
    let order = order_workflow(&state)
        .update_metadata(order_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "order": order
    })))
}

// ==============================================================================
// MEDICATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_medication(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let medication = inventory_service(&state)
        .create_medication(request)
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(medication))))
}

#[axum::debug_handler]
pub async fn list_medications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MedicationSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let medications = inventory_service(&state)
        .list_medications(query.search.as_deref())
        .await;

    Ok(Json(json!({
        "medications": medications,
        "total": medications.len()
    })))
}

#[axum::debug_handler]
pub async fn get_medication(
    State(state): State<Arc<AppState>>,
    Path(medication_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let medication = inventory_service(&state)
        .get_medication(&medication_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(medication)))
}

#[axum::debug_handler]
pub async fn add_batch(
    State(state): State<Arc<AppState>>,
    Path(medication_id): Path<Uuid>,
    Json(request): Json<AddBatchRequest>,
) -> Result<Json<Value>, AppError> {
    let medication = inventory_service(&state)
        .add_batch(medication_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(medication)))
}

fn to_app_error(err: OrderError) -> AppError {
    match err {
        OrderError::OrderNotFound
        | OrderError::MedicationNotFound
        | OrderError::BatchNotFound => AppError::NotFound(err.to_string()),
        OrderError::StockConflict { .. } => AppError::Conflict(err.to_string()),
        OrderError::Validation(_) => AppError::Validation(err.to_string()),
        OrderError::Store(_) => AppError::Internal(err.to_string()),
    }
}
