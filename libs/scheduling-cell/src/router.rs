// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_store::AppState;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/users/{user_id}", get(handlers::list_user_appointments))
        .route("/{appointment_id}/cancel", patch(handlers::cancel_appointment))
        .route("/{appointment_id}/pay", patch(handlers::pay_appointment))
        .with_state(state)
}

pub fn schedule_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors", post(handlers::create_doctor))
        .route("/slots/generate", post(handlers::generate_slots))
        .route("/slots", get(handlers::list_free_slots))
        .with_state(state)
}
