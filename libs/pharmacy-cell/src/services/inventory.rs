// libs/pharmacy-cell/src/services/inventory.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_models::pharmacy::{Batch, Medication};
use shared_store::ResourceStore;

use crate::models::{AddBatchRequest, CreateMedicationRequest, OrderError};

/// Catalog and receiving surface for the medication inventory. Batches are
/// appended or topped up here; quantities are decremented only by the
/// stock ledger.
pub struct MedicationInventoryService {
    store: Arc<ResourceStore>,
}

impl MedicationInventoryService {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self { store }
    }

    pub async fn create_medication(
        &self,
        request: CreateMedicationRequest,
    ) -> Result<Medication, OrderError> {
        if request.name.trim().is_empty() {
            return Err(OrderError::Validation("name is required".to_string()));
        }
        if request.strength.trim().is_empty() {
            return Err(OrderError::Validation("strength is required".to_string()));
        }

        let now = Utc::now();
        let medication = Medication {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            brand_name: request.brand_name.unwrap_or_default(),
            strength: request.strength.trim().to_string(),
            form: request.form.unwrap_or_default(),
            category: request.category.unwrap_or_default(),
            description: request.description.unwrap_or_default(),
            unit: request.unit.unwrap_or_else(|| "units".to_string()),
            is_active: true,
            batches: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store
            .transaction(|tx| Ok::<_, OrderError>(tx.insert_medication(medication)))
            .await
    }

    pub async fn get_medication(&self, id: &Uuid) -> Result<Medication, OrderError> {
        self.store
            .get_medication(id)
            .await
            .ok_or(OrderError::MedicationNotFound)
    }

    pub async fn list_medications(&self, search: Option<&str>) -> Vec<Medication> {
        self.store.list_medications(search).await
    }

    /// Receive stock. An existing batch number is topped up (quantity added,
    /// expiry and price refreshed); a new one is appended.
    pub async fn add_batch(
        &self,
        medication_id: Uuid,
        request: AddBatchRequest,
    ) -> Result<Medication, OrderError> {
        if request.batch_no.trim().is_empty() {
            return Err(OrderError::Validation("batch_no is required".to_string()));
        }
        if request.quantity < 1 {
            return Err(OrderError::Validation("quantity must be >= 1".to_string()));
        }
        if request.added_by_name.trim().is_empty() {
            return Err(OrderError::Validation(
                "added_by_name is required".to_string(),
            ));
        }

        let updated = self
            .store
            .transaction(|tx| {
                let mut medication = tx
                    .medication(&medication_id)
                    .cloned()
                    .ok_or(OrderError::MedicationNotFound)?;

                let now = Utc::now();
                match medication
                    .batches
                    .iter_mut()
                    .find(|b| b.batch_no == request.batch_no)
                {
                    Some(existing) => {
                        existing.quantity += request.quantity;
                        existing.expiry_date = request.expiry_date;
                        if let Some(price) = request.unit_price {
                            existing.unit_price = price;
                        }
                        existing.added_by_name = request.added_by_name.clone();
                        existing.added_at = now;
                    }
                    None => {
                        medication.batches.push(Batch {
                            id: Uuid::new_v4(),
                            batch_no: request.batch_no.clone(),
                            expiry_date: request.expiry_date,
                            quantity: request.quantity,
                            unit_price: request.unit_price.unwrap_or(0.0),
                            added_by_name: request.added_by_name.clone(),
                            added_at: now,
                        });
                    }
                }
                medication.updated_at = now;

                Ok::<_, OrderError>(tx.put_medication(medication))
            })
            .await?;

        info!(
            "Batch {} received for medication {} ({} on hand)",
            request.batch_no,
            updated.name,
            updated.total_quantity()
        );
        Ok(updated)
    }
}
