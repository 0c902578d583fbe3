// libs/scheduling-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::scheduling::{AppointmentStatus, PaymentMethod};
use shared_store::StoreError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub center_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_id: Uuid,
    pub user_id: Uuid,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayAppointmentRequest {
    pub method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub center_id: Uuid,
    pub name: String,
    pub specialization: String,
    pub fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    pub center_id: Uuid,
    pub doctor_id: Uuid,
    pub start_date: NaiveDate,
    pub number_of_days: Option<u32>,
    pub slot_minutes: Option<u32>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct FreeSlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Doctor does not belong to this center")]
    DoctorNotInCenter,

    #[error("Doctor is inactive")]
    DoctorInactive,

    #[error("Slot not available or already booked")]
    SlotUnavailable,

    #[error("Cannot cancel a {0} appointment")]
    NotCancellable(AppointmentStatus),

    #[error("Cannot pay for a {0} appointment")]
    NotPayable(AppointmentStatus),

    #[error("Appointment is already paid")]
    AlreadyPaid,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
