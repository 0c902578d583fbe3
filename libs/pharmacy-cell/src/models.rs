// libs/pharmacy-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::pharmacy::{MedicationForm, OrderItem, OrderStatus, PatientContact};
use shared_store::StoreError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub medication_id: Uuid,
    pub qty: u32,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub patient: PatientContact,
    pub prescription_text_snapshot: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderItemsRequest {
    pub items: Vec<OrderItemRequest>,
    pub patient: Option<PatientContact>,
    pub prescription_text_snapshot: Option<String>,
}

/// Clerical patch: applying this must never touch stock or allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderMetadataRequest {
    pub patient: Option<PatientContact>,
    pub prescription_text_snapshot: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMedicationRequest {
    pub name: String,
    pub brand_name: Option<String>,
    pub strength: String,
    pub form: Option<MedicationForm>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBatchRequest {
    pub batch_no: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
    pub unit_price: Option<f64>,
    pub added_by_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MedicationSearchQuery {
    pub search: Option<String>,
}

// ==============================================================================
// PLANNING RESULT
// ==============================================================================

/// Outcome of a pure allocation pass. `Waiting` carries only the shortage
/// entries: no sibling item is partially allocated when any item is short,
/// the whole order waits.
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Fulfillable { items: Vec<OrderItem>, subtotal: f64 },
    Waiting { items: Vec<OrderItem>, shortage_total: u32 },
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found")]
    OrderNotFound,

    #[error("Medication not found")]
    MedicationNotFound,

    #[error("Batch not found")]
    BatchNotFound,

    #[error("Stock changed for batch {batch_no}: available {available_now}, needed {needed}")]
    StockConflict {
        batch_no: String,
        available_now: u32,
        needed: u32,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
