// libs/scheduling-cell/src/services/reservation.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, PaymentInfo, PaymentMethod, PaymentStatus, StatusActor,
};
use shared_store::ResourceStore;

use crate::models::{BookAppointmentRequest, BookingError};

/// Claims and releases appointment slots.
///
/// The only write to `Slot.is_booked` anywhere in the system goes through
/// the store's conditional update, so two concurrent bookings of the same
/// slot resolve to exactly one success and one `SlotUnavailable`.
pub struct SlotReservationService {
    store: Arc<ResourceStore>,
    default_currency: String,
}

impl SlotReservationService {
    pub fn new(store: Arc<ResourceStore>, default_currency: String) -> Self {
        Self {
            store,
            default_currency,
        }
    }

    /// Book a slot for a user: validate the doctor, claim the slot via a
    /// single conditional update, and create the pending appointment. The
    /// claim and the appointment insert commit together or not at all.
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment, BookingError> {
        info!(
            "Booking slot {} with doctor {} for user {}",
            request.slot_id, request.doctor_id, request.user_id
        );

        let appointment = self
            .store
            .transaction(|tx| {
                let doctor = tx
                    .doctor(&request.doctor_id)
                    .ok_or(BookingError::DoctorNotFound)?;
                if doctor.center_id != request.center_id {
                    return Err(BookingError::DoctorNotInCenter);
                }
                if !doctor.is_active {
                    return Err(BookingError::DoctorInactive);
                }
                let fee = doctor.fee;

                // The sole concurrency-safety mechanism: match-then-set in
                // one step. Zero matches means someone else got there first
                // (or the slot is inactive / belongs elsewhere).
                tx.update_slot_where(
                    &request.slot_id,
                    |s| {
                        s.doctor_id == request.doctor_id
                            && s.center_id == request.center_id
                            && s.is_active
                            && !s.is_booked
                    },
                    |s| s.is_booked = true,
                )
                .ok_or(BookingError::SlotUnavailable)?;

                let now = Utc::now();
                let appointment = Appointment {
                    id: Uuid::new_v4(),
                    center_id: request.center_id,
                    doctor_id: request.doctor_id,
                    user_id: request.user_id,
                    slot_id: request.slot_id,
                    note: request.note.clone().unwrap_or_default(),
                    status: AppointmentStatus::Pending,
                    payment: PaymentInfo {
                        status: PaymentStatus::Unpaid,
                        method: PaymentMethod::Cash,
                        amount: fee,
                        currency: self.default_currency.clone(),
                        paid_at: None,
                        paid_by: None,
                    },
                    status_updated_at: now,
                    status_updated_by: StatusActor::Patient,
                    created_at: now,
                    updated_at: now,
                };

                Ok(tx.insert_appointment(appointment)?)
            })
            .await?;

        info!("Appointment {} booked for slot {}", appointment.id, appointment.slot_id);
        Ok(appointment)
    }

    /// Cancel an appointment owned by `user_id` and release its slot.
    ///
    /// Idempotent: cancelling an already-cancelled appointment succeeds
    /// without touching the slot again.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Appointment, BookingError> {
        debug!("Cancelling appointment {} for user {}", appointment_id, user_id);

        self.store
            .transaction(|tx| {
                let appointment = tx
                    .appointment(&appointment_id)
                    .filter(|a| a.user_id == user_id)
                    .cloned()
                    .ok_or(BookingError::AppointmentNotFound)?;

                match appointment.status {
                    AppointmentStatus::Completed | AppointmentStatus::NoShow => {
                        return Err(BookingError::NotCancellable(appointment.status));
                    }
                    AppointmentStatus::Cancelled => {
                        // Already released; do not flip the slot a second time.
                        return Ok(appointment);
                    }
                    _ => {}
                }

                let now = Utc::now();
                let mut appointment = appointment;
                appointment.status = AppointmentStatus::Cancelled;
                appointment.status_updated_at = now;
                appointment.status_updated_by = StatusActor::Patient;
                appointment.updated_at = now;

                tx.update_slot_where(
                    &appointment.slot_id,
                    |s| s.is_booked,
                    |s| s.is_booked = false,
                );

                Ok(tx.put_appointment(appointment))
            })
            .await
    }

    /// Mark an appointment paid; a pending appointment is promoted to
    /// confirmed in the same write.
    pub async fn pay(
        &self,
        appointment_id: Uuid,
        method: Option<PaymentMethod>,
    ) -> Result<Appointment, BookingError> {
        debug!("Recording payment for appointment {}", appointment_id);

        self.store
            .transaction(|tx| {
                let mut appointment = tx
                    .appointment(&appointment_id)
                    .cloned()
                    .ok_or(BookingError::AppointmentNotFound)?;

                if matches!(
                    appointment.status,
                    AppointmentStatus::Cancelled | AppointmentStatus::NoShow
                ) {
                    return Err(BookingError::NotPayable(appointment.status));
                }
                if appointment.payment.status == PaymentStatus::Paid {
                    return Err(BookingError::AlreadyPaid);
                }

                let now = Utc::now();
                appointment.payment.status = PaymentStatus::Paid;
                if let Some(method) = method {
                    appointment.payment.method = method;
                }
                appointment.payment.paid_at = Some(now);
                appointment.payment.paid_by = Some(StatusActor::Receptionist);

                if appointment.status == AppointmentStatus::Pending {
                    appointment.status = AppointmentStatus::Confirmed;
                }
                appointment.status_updated_at = now;
                appointment.status_updated_by = StatusActor::Receptionist;
                appointment.updated_at = now;

                Ok(tx.put_appointment(appointment))
            })
            .await
    }

    pub async fn list_by_user(&self, user_id: &Uuid) -> Vec<Appointment> {
        self.store.list_appointments_by_user(user_id).await
    }
}
