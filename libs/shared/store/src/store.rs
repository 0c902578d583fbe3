// libs/shared/store/src/store.rs
use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::pharmacy::{Medication, PharmacyOrder};
use shared_models::scheduling::{Appointment, AppointmentStatus, Doctor, Slot};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
}

#[derive(Default, Clone)]
struct Collections {
    doctors: HashMap<Uuid, Doctor>,
    slots: HashMap<Uuid, Slot>,
    appointments: HashMap<Uuid, Appointment>,
    medications: HashMap<Uuid, Medication>,
    orders: HashMap<Uuid, PharmacyOrder>,
}

/// In-process document store over the five resource collections.
///
/// All cross-document consistency goes through [`ResourceStore::transaction`]:
/// the closure runs over a working copy of the collections under the write
/// lock, and the copy is swapped in only when the closure returns `Ok`. An
/// `Err` aborts with no observable effect, which is exactly how a
/// transaction-driver abort must be treated by callers.
pub struct ResourceStore {
    data: RwLock<Collections>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Collections::default()),
        }
    }

    /// Run `f` as one serializable multi-document transaction.
    ///
    /// The closure is synchronous: the store suspends only at the lock
    /// boundary, never mid-transaction.
    pub async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<T, E>,
    {
        let mut guard = self.data.write().await;
        let mut work = guard.clone();
        let value = f(&mut Tx { data: &mut work })?;
        *guard = work;
        Ok(value)
    }

    // Point reads return cloned snapshots; mutation happens only inside
    // transactions.

    pub async fn get_doctor(&self, id: &Uuid) -> Option<Doctor> {
        self.data.read().await.doctors.get(id).cloned()
    }

    pub async fn get_slot(&self, id: &Uuid) -> Option<Slot> {
        self.data.read().await.slots.get(id).cloned()
    }

    pub async fn get_appointment(&self, id: &Uuid) -> Option<Appointment> {
        self.data.read().await.appointments.get(id).cloned()
    }

    pub async fn get_medication(&self, id: &Uuid) -> Option<Medication> {
        self.data.read().await.medications.get(id).cloned()
    }

    pub async fn get_order(&self, id: &Uuid) -> Option<PharmacyOrder> {
        self.data.read().await.orders.get(id).cloned()
    }

    pub async fn list_appointments_by_user(&self, user_id: &Uuid) -> Vec<Appointment> {
        let guard = self.data.read().await;
        let mut items: Vec<Appointment> = guard
            .appointments
            .values()
            .filter(|a| a.user_id == *user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    pub async fn list_orders(&self) -> Vec<PharmacyOrder> {
        let guard = self.data.read().await;
        let mut items: Vec<PharmacyOrder> = guard.orders.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// Case-insensitive substring search over name, brand, strength and
    /// category; no filter returns the whole catalog, newest first.
    pub async fn list_medications(&self, search: Option<&str>) -> Vec<Medication> {
        let guard = self.data.read().await;
        let needle = search.map(|s| s.to_lowercase());
        let mut items: Vec<Medication> = guard
            .medications
            .values()
            .filter(|m| match &needle {
                Some(n) => {
                    m.name.to_lowercase().contains(n)
                        || m.brand_name.to_lowercase().contains(n)
                        || m.strength.to_lowercase().contains(n)
                        || m.category.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    pub async fn list_free_slots(&self, doctor_id: &Uuid, date: chrono::NaiveDate) -> Vec<Slot> {
        let guard = self.data.read().await;
        let mut items: Vec<Slot> = guard
            .slots
            .values()
            .filter(|s| s.doctor_id == *doctor_id && s.date == date && s.is_active && !s.is_booked)
            .cloned()
            .collect();
        items.sort_by_key(|s| s.start_time);
        items
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read/write view handed to a transaction closure.
pub struct Tx<'a> {
    data: &'a mut Collections,
}

impl Tx<'_> {
    pub fn doctor(&self, id: &Uuid) -> Option<&Doctor> {
        self.data.doctors.get(id)
    }

    pub fn slot(&self, id: &Uuid) -> Option<&Slot> {
        self.data.slots.get(id)
    }

    pub fn appointment(&self, id: &Uuid) -> Option<&Appointment> {
        self.data.appointments.get(id)
    }

    pub fn medication(&self, id: &Uuid) -> Option<&Medication> {
        self.data.medications.get(id)
    }

    pub fn order(&self, id: &Uuid) -> Option<&PharmacyOrder> {
        self.data.orders.get(id)
    }

    /// Conditional update: mutate the slot only if `pred` matches, returning
    /// the updated document. `None` means zero documents matched, which is
    /// the sole signal concurrent claimers get.
    pub fn update_slot_where<P, M>(&mut self, id: &Uuid, pred: P, mutate: M) -> Option<Slot>
    where
        P: FnOnce(&Slot) -> bool,
        M: FnOnce(&mut Slot),
    {
        let slot = self.data.slots.get_mut(id)?;
        if !pred(slot) {
            return None;
        }
        mutate(slot);
        slot.updated_at = chrono::Utc::now();
        debug!(slot_id = %id, is_booked = slot.is_booked, "slot updated conditionally");
        Some(slot.clone())
    }

    pub fn insert_doctor(&mut self, doctor: Doctor) -> Doctor {
        self.data.doctors.insert(doctor.id, doctor.clone());
        doctor
    }

    pub fn slot_exists(
        &self,
        doctor_id: &Uuid,
        date: chrono::NaiveDate,
        start_time: chrono::NaiveTime,
    ) -> bool {
        self.data
            .slots
            .values()
            .any(|s| s.doctor_id == *doctor_id && s.date == date && s.start_time == start_time)
    }

    /// `(doctor_id, date, start_time)` is unique.
    pub fn insert_slot(&mut self, slot: Slot) -> Result<Slot, StoreError> {
        if self.slot_exists(&slot.doctor_id, slot.date, slot.start_time) {
            return Err(StoreError::DuplicateKey(format!(
                "slot {} {} for doctor {}",
                slot.date, slot.start_time, slot.doctor_id
            )));
        }
        self.data.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    /// `slot_id` is unique across non-cancelled appointments; this backs the
    /// atomic claim the same way a partial unique index would. Cancelled
    /// appointments release the slot, so they no longer count.
    pub fn insert_appointment(&mut self, appt: Appointment) -> Result<Appointment, StoreError> {
        if self
            .data
            .appointments
            .values()
            .any(|a| a.slot_id == appt.slot_id && a.status != AppointmentStatus::Cancelled)
        {
            return Err(StoreError::DuplicateKey(format!(
                "appointment for slot {}",
                appt.slot_id
            )));
        }
        self.data.appointments.insert(appt.id, appt.clone());
        Ok(appt)
    }

    pub fn put_appointment(&mut self, appt: Appointment) -> Appointment {
        self.data.appointments.insert(appt.id, appt.clone());
        appt
    }

    pub fn insert_medication(&mut self, med: Medication) -> Medication {
        self.data.medications.insert(med.id, med.clone());
        med
    }

    pub fn put_medication(&mut self, med: Medication) -> Medication {
        self.data.medications.insert(med.id, med.clone());
        med
    }

    pub fn insert_order(&mut self, order: PharmacyOrder) -> Result<PharmacyOrder, StoreError> {
        if self
            .data
            .orders
            .values()
            .any(|o| o.order_no == order.order_no)
        {
            return Err(StoreError::DuplicateKey(format!(
                "order {}",
                order.order_no
            )));
        }
        self.data.orders.insert(order.id, order.clone());
        Ok(order)
    }

    pub fn put_order(&mut self, order: PharmacyOrder) -> PharmacyOrder {
        self.data.orders.insert(order.id, order.clone());
        order
    }
}
