// libs/pharmacy-cell/src/services/workflow.rs
use std::sync::Arc;
use std::sync::OnceLock;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use shared_models::pharmacy::{OrderStatus, PatientContact, PharmacyOrder};
use shared_store::ResourceStore;

use crate::models::{
    CreateOrderRequest, OrderError, OrderItemRequest, PlanOutcome, UpdateOrderItemsRequest,
    UpdateOrderMetadataRequest,
};
use crate::services::ledger;
use crate::services::notify::{InvoiceNotifier, NotifyMode};
use crate::services::planner;

/// Orchestrates planning and the stock ledger around pharmacy orders.
///
/// Creation and item revision each run as a single transaction; the item
/// revision always restores the order's prior stock effect before the new
/// plan is deducted, so a mid-sequence failure commits nothing.
pub struct OrderWorkflow {
    store: Arc<ResourceStore>,
    notifier: Arc<dyn InvoiceNotifier>,
}

impl OrderWorkflow {
    pub fn new(store: Arc<ResourceStore>, notifier: Arc<dyn InvoiceNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn create(&self, request: CreateOrderRequest) -> Result<PharmacyOrder, OrderError> {
        validate_patient(&request.patient)?;
        if request.prescription_text_snapshot.trim().is_empty() {
            return Err(OrderError::Validation(
                "prescription_text_snapshot is required".to_string(),
            ));
        }
        validate_items(&request.items)?;

        let order = self
            .store
            .transaction(|tx| {
                let outcome = planner::plan(tx, &request.items)?;
                let now = Utc::now();

                let order = match outcome {
                    PlanOutcome::Waiting { items, shortage_total } => {
                        info!(
                            "Creating order as WAITING_STOCK, {} unit(s) short",
                            shortage_total
                        );
                        PharmacyOrder {
                            id: Uuid::new_v4(),
                            order_no: make_order_no(),
                            patient: request.patient.clone(),
                            prescription_text_snapshot: request
                                .prescription_text_snapshot
                                .clone(),
                            status: OrderStatus::WaitingStock,
                            items,
                            subtotal: 0.0,
                            total: 0.0,
                            confirmed_at: None,
                            created_at: now,
                            updated_at: now,
                        }
                    }
                    PlanOutcome::Fulfillable { items, subtotal } => {
                        ledger::apply_deductions(tx, &items)?;
                        PharmacyOrder {
                            id: Uuid::new_v4(),
                            order_no: make_order_no(),
                            patient: request.patient.clone(),
                            prescription_text_snapshot: request
                                .prescription_text_snapshot
                                .clone(),
                            status: OrderStatus::Confirmed,
                            items,
                            subtotal,
                            total: subtotal,
                            confirmed_at: Some(now),
                            created_at: now,
                            updated_at: now,
                        }
                    }
                };

                Ok::<_, OrderError>(tx.insert_order(order)?)
            })
            .await?;

        info!("Order {} created as {}", order.order_no, order.status);
        self.notify(&order).await;
        Ok(order)
    }

    /// Replace an order's item list: restore its prior stock effect, re-plan
    /// the new items, and either rededuct (CONFIRMED) or park the order as
    /// WAITING_STOCK. The three steps are one atomic transaction.
    pub async fn update_items(
        &self,
        order_id: Uuid,
        request: UpdateOrderItemsRequest,
    ) -> Result<PharmacyOrder, OrderError> {
        if let Some(patient) = &request.patient {
            validate_patient(patient)?;
        }
        validate_items(&request.items)?;

        let order = self
            .store
            .transaction(|tx| {
                let mut order = tx
                    .order(&order_id)
                    .cloned()
                    .ok_or(OrderError::OrderNotFound)?;

                ledger::restore(tx, &order)?;
                let outcome = planner::plan(tx, &request.items)?;

                if let Some(patient) = request.patient.clone() {
                    order.patient = patient;
                }
                if let Some(snapshot) = request.prescription_text_snapshot.clone() {
                    if !snapshot.trim().is_empty() {
                        order.prescription_text_snapshot = snapshot;
                    }
                }

                let now = Utc::now();
                match outcome {
                    PlanOutcome::Waiting { items, .. } => {
                        order.status = OrderStatus::WaitingStock;
                        order.items = items;
                        order.subtotal = 0.0;
                        order.total = 0.0;
                    }
                    PlanOutcome::Fulfillable { items, subtotal } => {
                        ledger::apply_deductions(tx, &items)?;
                        order.status = OrderStatus::Confirmed;
                        order.items = items;
                        order.subtotal = subtotal;
                        order.total = subtotal;
                        order.confirmed_at = Some(now);
                    }
                }
                order.updated_at = now;

                Ok::<_, OrderError>(tx.put_order(order))
            })
            .await?;

        info!("Order {} items revised, now {}", order.order_no, order.status);
        self.notify(&order).await;
        Ok(order)
    }

    /// Clerical patch for patient/prescription/status. Never restores or
    /// reallocates stock.
    pub async fn update_metadata(
        &self,
        order_id: Uuid,
        request: UpdateOrderMetadataRequest,
    ) -> Result<PharmacyOrder, OrderError> {
        if let Some(patient) = &request.patient {
            validate_patient(patient)?;
        }

        self.store
            .transaction(|tx| {
                let mut order = tx
                    .order(&order_id)
                    .cloned()
                    .ok_or(OrderError::OrderNotFound)?;

                if let Some(patient) = request.patient.clone() {
                    order.patient = patient;
                }
                if let Some(snapshot) = request.prescription_text_snapshot.clone() {
                    if !snapshot.trim().is_empty() {
                        order.prescription_text_snapshot = snapshot;
                    }
                }
                if let Some(status) = request.status {
                    order.status = status;
                }
                order.updated_at = Utc::now();

                Ok(tx.put_order(order))
            })
            .await
    }

    pub async fn get(&self, order_id: &Uuid) -> Result<PharmacyOrder, OrderError> {
        self.store
            .get_order(order_id)
            .await
            .ok_or(OrderError::OrderNotFound)
    }

    pub async fn list(&self) -> Vec<PharmacyOrder> {
        self.store.list_orders().await
    }

    async fn notify(&self, order: &PharmacyOrder) {
        let mode = match order.status {
            OrderStatus::Confirmed => NotifyMode::Confirmed,
            OrderStatus::WaitingStock => NotifyMode::WaitingStock,
        };
        if let Err(err) = self.notifier.send(&order.patient.email, order, mode).await {
            warn!(
                "Invoice notification for order {} failed: {}",
                order.order_no, err
            );
        }
    }
}

fn make_order_no() -> String {
    let rand: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("PH-{}-{}", Utc::now().timestamp_millis(), rand)
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,14}$").unwrap())
}

fn validate_patient(patient: &PatientContact) -> Result<(), OrderError> {
    if patient.name.trim().is_empty() {
        return Err(OrderError::Validation(
            "patient name is required".to_string(),
        ));
    }
    if !email_regex().is_match(&patient.email) {
        return Err(OrderError::Validation(
            "patient email is invalid".to_string(),
        ));
    }
    if !phone_regex().is_match(&patient.phone) {
        return Err(OrderError::Validation(
            "patient phone is invalid".to_string(),
        ));
    }
    Ok(())
}

fn validate_items(items: &[OrderItemRequest]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation("items array is required".to_string()));
    }
    for item in items {
        if item.qty < 1 {
            return Err(OrderError::Validation("qty must be >= 1".to_string()));
        }
    }
    Ok(())
}
