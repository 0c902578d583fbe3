// libs/scheduling-cell/src/services/schedule.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Timelike, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::scheduling::{Doctor, Slot};
use shared_store::ResourceStore;

use crate::models::{BookingError, CreateDoctorRequest, GenerateSlotsRequest};

const MAX_GENERATION_DAYS: u32 = 14;
const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Bulk schedule generation and the minimal doctor surface that makes the
/// booking flow exercisable. Slots are created here and only ever flipped
/// by the reservation service afterwards.
pub struct ScheduleService {
    store: Arc<ResourceStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self { store }
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, BookingError> {
        if request.name.trim().is_empty() {
            return Err(BookingError::Validation("name is required".to_string()));
        }
        if request.specialization.trim().is_empty() {
            return Err(BookingError::Validation(
                "specialization is required".to_string(),
            ));
        }
        if request.fee < 0.0 {
            return Err(BookingError::Validation("fee must be >= 0".to_string()));
        }

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            center_id: request.center_id,
            name: request.name.trim().to_string(),
            specialization: request.specialization.trim().to_string(),
            fee: request.fee,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.store
            .transaction(|tx| Ok::<_, BookingError>(tx.insert_doctor(doctor)))
            .await
    }

    /// Generate back-to-back slots for a doctor across a date range,
    /// skipping `(doctor, date, start_time)` pairs that already exist.
    pub async fn generate_slots(
        &self,
        request: GenerateSlotsRequest,
    ) -> Result<Vec<Slot>, BookingError> {
        let days = request
            .number_of_days
            .unwrap_or(MAX_GENERATION_DAYS)
            .clamp(1, MAX_GENERATION_DAYS);
        let slot_minutes = request.slot_minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
        if slot_minutes == 0 {
            return Err(BookingError::Validation(
                "slot_minutes must be > 0".to_string(),
            ));
        }
        if request.closing_time <= request.opening_time {
            return Err(BookingError::Validation(
                "closing_time must be after opening_time".to_string(),
            ));
        }

        let opening_min = minutes_from_midnight(request.opening_time);
        let closing_min = minutes_from_midnight(request.closing_time);

        let created = self
            .store
            .transaction(|tx| {
                let doctor = tx
                    .doctor(&request.doctor_id)
                    .ok_or(BookingError::DoctorNotFound)?;
                if doctor.center_id != request.center_id {
                    return Err(BookingError::DoctorNotInCenter);
                }

                let mut created = Vec::new();
                for day in 0..days {
                    let date = request.start_date + ChronoDuration::days(day as i64);
                    let mut start_min = opening_min;
                    while start_min + slot_minutes <= closing_min {
                        let (Some(start_time), Some(end_time)) = (
                            time_from_minutes(start_min),
                            time_from_minutes(start_min + slot_minutes),
                        ) else {
                            break;
                        };

                        if !tx.slot_exists(&request.doctor_id, date, start_time) {
                            let now = Utc::now();
                            let slot = tx.insert_slot(Slot {
                                id: Uuid::new_v4(),
                                center_id: request.center_id,
                                doctor_id: request.doctor_id,
                                date,
                                start_time,
                                end_time,
                                is_booked: false,
                                is_active: true,
                                created_at: now,
                                updated_at: now,
                            })?;
                            created.push(slot);
                        }

                        start_min += slot_minutes;
                    }
                }
                Ok(created)
            })
            .await?;

        info!(
            "Generated {} slots for doctor {} starting {}",
            created.len(),
            request.doctor_id,
            request.start_date
        );
        Ok(created)
    }

    pub async fn list_free_slots(&self, doctor_id: &Uuid, date: NaiveDate) -> Vec<Slot> {
        debug!("Listing free slots for doctor {} on {}", doctor_id, date);
        self.store.list_free_slots(doctor_id, date).await
    }
}

fn minutes_from_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}
