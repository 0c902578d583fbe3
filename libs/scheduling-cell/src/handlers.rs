// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_store::AppState;

use crate::models::{
    BookAppointmentRequest, BookingError, CancelQuery, CreateDoctorRequest, FreeSlotsQuery,
    GenerateSlotsRequest, PayAppointmentRequest,
};
use crate::services::reservation::SlotReservationService;
use crate::services::schedule::ScheduleService;

fn reservation_service(state: &AppState) -> SlotReservationService {
    SlotReservationService::new(
        Arc::clone(&state.store),
        state.config.default_currency.clone(),
    )
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = reservation_service(&state)
        .book(request)
        .await
        .map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Query(query): Query<CancelQuery>,
) -> Result<Json<Value>, AppError> {
    let appointment = reservation_service(&state)
        .cancel(appointment_id, query.user_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn pay_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<PayAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = reservation_service(&state)
        .pay(appointment_id, request.method)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Payment recorded"
    })))
}

#[axum::debug_handler]
pub async fn list_user_appointments(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = reservation_service(&state).list_by_user(&user_id).await;

    Ok(Json(json!({
        "user_id": user_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = ScheduleService::new(Arc::clone(&state.store))
        .create_doctor(request)
        .await
        .map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "doctor": doctor
        })),
    ))
}

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateSlotsRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let slots = ScheduleService::new(Arc::clone(&state.store))
        .generate_slots(request)
        .await
        .map_err(to_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "created": slots.len(),
            "slots": slots
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_free_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = ScheduleService::new(Arc::clone(&state.store))
        .list_free_slots(&query.doctor_id, query.date)
        .await;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len()
    })))
}

fn to_app_error(err: BookingError) -> AppError {
    match err {
        BookingError::DoctorNotFound | BookingError::AppointmentNotFound => {
            AppError::NotFound(err.to_string())
        }
        BookingError::SlotUnavailable => AppError::Conflict(err.to_string()),
        BookingError::DoctorNotInCenter
        | BookingError::DoctorInactive
        | BookingError::Validation(_) => AppError::Validation(err.to_string()),
        BookingError::NotCancellable(_)
        | BookingError::NotPayable(_)
        | BookingError::AlreadyPaid => AppError::InvalidState(err.to_string()),
        BookingError::Store(_) => AppError::Internal(err.to_string()),
    }
}
