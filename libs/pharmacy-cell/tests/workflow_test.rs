use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use pharmacy_cell::models::{
    CreateOrderRequest, OrderError, OrderItemRequest, UpdateOrderItemsRequest,
    UpdateOrderMetadataRequest,
};
use pharmacy_cell::services::notify::{InvoiceNotifier, NotifyMode};
use pharmacy_cell::services::workflow::OrderWorkflow;
use shared_models::pharmacy::{Batch, Medication, MedicationForm, OrderStatus, PatientContact, PharmacyOrder};
use shared_store::ResourceStore;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, NotifyMode)>>,
}

#[async_trait]
impl InvoiceNotifier for RecordingNotifier {
    async fn send(&self, to: &str, _order: &PharmacyOrder, mode: NotifyMode) -> anyhow::Result<()> {
        self.sent.lock().await.push((to.to_string(), mode));
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl InvoiceNotifier for FailingNotifier {
    async fn send(&self, _to: &str, _order: &PharmacyOrder, _mode: NotifyMode) -> anyhow::Result<()> {
        anyhow::bail!("smtp unreachable")
    }
}

fn batch(batch_no: &str, expiry: NaiveDate, quantity: u32, unit_price: f64) -> Batch {
    Batch {
        id: Uuid::new_v4(),
        batch_no: batch_no.to_string(),
        expiry_date: expiry,
        quantity,
        unit_price,
        added_by_name: "Stock Clerk".to_string(),
        added_at: Utc::now(),
    }
}

fn medication(name: &str, batches: Vec<Batch>) -> Medication {
    let now = Utc::now();
    Medication {
        id: Uuid::new_v4(),
        name: name.to_string(),
        brand_name: String::new(),
        strength: "500mg".to_string(),
        form: MedicationForm::Tablet,
        category: "analgesic".to_string(),
        description: String::new(),
        unit: "tablets".to_string(),
        is_active: true,
        batches,
        created_at: now,
        updated_at: now,
    }
}

fn patient() -> PatientContact {
    PatientContact {
        name: "Nimal Jayawardena".to_string(),
        email: "nimal@example.com".to_string(),
        phone: "+94 71 234 5678".to_string(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed(store: &ResourceStore, meds: Vec<Medication>) {
    store
        .transaction::<_, OrderError, _>(|tx| {
            for med in meds {
                tx.insert_medication(med);
            }
            Ok(())
        })
        .await
        .unwrap();
}

fn order_request(med_id: Uuid, qty: u32) -> CreateOrderRequest {
    CreateOrderRequest {
        patient: patient(),
        prescription_text_snapshot: "1 tablet twice daily after meals".to_string(),
        items: vec![OrderItemRequest {
            medication_id: med_id,
            qty,
            instructions: Some("after meals".to_string()),
        }],
    }
}

#[tokio::test]
async fn test_create_confirmed_order_deducts_fifo() {
    let store = Arc::new(ResourceStore::new());
    let med = medication(
        "Paracetamol",
        vec![
            batch("B-OLD", date(2026, 1, 1), 5, 10.0),
            batch("B-NEW", date(2026, 6, 1), 10, 12.0),
        ],
    );
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = OrderWorkflow::new(Arc::clone(&store), notifier.clone());

    let order = workflow.create(order_request(med_id, 8)).await.unwrap();

    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(order.order_no.starts_with("PH-"));
    assert_eq!(order.subtotal, 86.0);
    assert_eq!(order.total, 86.0);
    assert!(order.confirmed_at.is_some());

    let after = store.get_medication(&med_id).await.unwrap();
    let old = after.batches.iter().find(|b| b.batch_no == "B-OLD").unwrap();
    let new = after.batches.iter().find(|b| b.batch_no == "B-NEW").unwrap();
    assert_eq!(old.quantity, 0);
    assert_eq!(new.quantity, 7);

    let sent = notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], ("nimal@example.com".to_string(), NotifyMode::Confirmed));
}

#[tokio::test]
async fn test_waiting_stock_order_deducts_nothing() {
    let store = Arc::new(ResourceStore::new());
    let med = medication("Amoxicillin", vec![batch("A1", date(2026, 3, 1), 4, 25.0)]);
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = OrderWorkflow::new(Arc::clone(&store), notifier.clone());

    let order = workflow.create(order_request(med_id, 10)).await.unwrap();

    assert_eq!(order.status, OrderStatus::WaitingStock);
    assert_eq!(order.subtotal, 0.0);
    assert_eq!(order.total, 0.0);
    assert!(order.confirmed_at.is_none());
    assert!(order.items[0].allocations.is_empty());

    let after = store.get_medication(&med_id).await.unwrap();
    assert_eq!(after.total_quantity(), 4);

    let sent = notifier.sent.lock().await;
    assert_eq!(sent[0].1, NotifyMode::WaitingStock);
}

#[tokio::test]
async fn test_one_short_item_parks_the_whole_order() {
    let store = Arc::new(ResourceStore::new());
    let short = medication("Amoxicillin", vec![batch("A1", date(2026, 3, 1), 2, 25.0)]);
    let plenty = medication("Cetirizine", vec![batch("C1", date(2026, 3, 1), 50, 5.0)]);
    let short_id = short.id;
    let plenty_id = plenty.id;
    seed(&store, vec![short, plenty]).await;

    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));

    let order = workflow
        .create(CreateOrderRequest {
            patient: patient(),
            prescription_text_snapshot: "as prescribed".to_string(),
            items: vec![
                OrderItemRequest {
                    medication_id: short_id,
                    qty: 10,
                    instructions: None,
                },
                OrderItemRequest {
                    medication_id: plenty_id,
                    qty: 5,
                    instructions: None,
                },
            ],
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::WaitingStock);

    // The fulfillable sibling is not deducted while the order waits.
    let untouched = store.get_medication(&plenty_id).await.unwrap();
    assert_eq!(untouched.total_quantity(), 50);
}

#[tokio::test]
async fn test_update_items_restores_before_rededucting() {
    let store = Arc::new(ResourceStore::new());
    let med = medication("Paracetamol", vec![batch("B1", date(2026, 1, 1), 10, 10.0)]);
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));

    let order = workflow.create(order_request(med_id, 8)).await.unwrap();
    assert_eq!(store.get_medication(&med_id).await.unwrap().total_quantity(), 2);

    let revised = workflow
        .update_items(
            order.id,
            UpdateOrderItemsRequest {
                items: vec![OrderItemRequest {
                    medication_id: med_id,
                    qty: 3,
                    instructions: None,
                }],
                patient: None,
                prescription_text_snapshot: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(revised.status, OrderStatus::Confirmed);
    assert_eq!(revised.items[0].requested_qty, 3);
    assert_eq!(revised.subtotal, 30.0);

    // 10 on hand, the prior 8 restored, then 3 deducted.
    assert_eq!(store.get_medication(&med_id).await.unwrap().total_quantity(), 7);
}

#[tokio::test]
async fn test_revision_round_trips_across_batches() {
    let store = Arc::new(ResourceStore::new());
    let med = medication(
        "Paracetamol",
        vec![
            batch("B-OLD", date(2025, 1, 1), 5, 10.0),
            batch("B-NEW", date(2025, 6, 1), 10, 12.0),
        ],
    );
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));

    // 8 empties the old batch and takes 3 from the new one.
    let order = workflow.create(order_request(med_id, 8)).await.unwrap();
    let after_create = store.get_medication(&med_id).await.unwrap();
    assert_eq!(after_create.batches[0].quantity, 0);
    assert_eq!(after_create.batches[1].quantity, 7);

    // Dropping to 3 restores the 8 (back to 5 and 10) before re-deducting,
    // so the 3 comes from the old batch again.
    workflow
        .update_items(
            order.id,
            UpdateOrderItemsRequest {
                items: vec![OrderItemRequest {
                    medication_id: med_id,
                    qty: 3,
                    instructions: None,
                }],
                patient: None,
                prescription_text_snapshot: None,
            },
        )
        .await
        .unwrap();

    let after_revision = store.get_medication(&med_id).await.unwrap();
    assert_eq!(after_revision.batches[0].quantity, 2);
    assert_eq!(after_revision.batches[1].quantity, 10);
}

#[tokio::test]
async fn test_update_items_can_park_a_confirmed_order() {
    let store = Arc::new(ResourceStore::new());
    let med = medication("Paracetamol", vec![batch("B1", date(2026, 1, 1), 10, 10.0)]);
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));

    let order = workflow.create(order_request(med_id, 8)).await.unwrap();

    let revised = workflow
        .update_items(
            order.id,
            UpdateOrderItemsRequest {
                items: vec![OrderItemRequest {
                    medication_id: med_id,
                    qty: 25,
                    instructions: None,
                }],
                patient: None,
                prescription_text_snapshot: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(revised.status, OrderStatus::WaitingStock);
    assert_eq!(revised.total, 0.0);

    // The restore of the prior allocation still commits with the parked plan.
    assert_eq!(store.get_medication(&med_id).await.unwrap().total_quantity(), 10);
}

#[tokio::test]
async fn test_update_metadata_touches_no_stock() {
    let store = Arc::new(ResourceStore::new());
    let med = medication("Paracetamol", vec![batch("B1", date(2026, 1, 1), 10, 10.0)]);
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));
    let order = workflow.create(order_request(med_id, 8)).await.unwrap();

    let patched = workflow
        .update_metadata(
            order.id,
            UpdateOrderMetadataRequest {
                patient: Some(PatientContact {
                    name: "Kamala Jayawardena".to_string(),
                    email: "kamala@example.com".to_string(),
                    phone: "+94 77 111 2222".to_string(),
                }),
                prescription_text_snapshot: None,
                status: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(patched.patient.name, "Kamala Jayawardena");
    assert_eq!(patched.items[0].requested_qty, 8);
    assert_eq!(
        store.get_medication(&med_id).await.unwrap().total_quantity(),
        2,
        "clerical patch must not restore or reallocate"
    );
}

#[tokio::test]
async fn test_invalid_patient_or_items_rejected() {
    let store = Arc::new(ResourceStore::new());
    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));

    let mut bad_email = order_request(Uuid::new_v4(), 1);
    bad_email.patient.email = "not-an-email".to_string();
    assert_matches!(
        workflow.create(bad_email).await,
        Err(OrderError::Validation(_))
    );

    let mut zero_qty = order_request(Uuid::new_v4(), 0);
    zero_qty.items[0].qty = 0;
    assert_matches!(
        workflow.create(zero_qty).await,
        Err(OrderError::Validation(_))
    );

    let empty_items = CreateOrderRequest {
        patient: patient(),
        prescription_text_snapshot: "as prescribed".to_string(),
        items: vec![],
    };
    assert_matches!(
        workflow.create(empty_items).await,
        Err(OrderError::Validation(_))
    );
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_the_order() {
    let store = Arc::new(ResourceStore::new());
    let med = medication("Paracetamol", vec![batch("B1", date(2026, 1, 1), 10, 10.0)]);
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(FailingNotifier));

    let order = workflow.create(order_request(med_id, 2)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(workflow.get(&order.id).await.is_ok());
}

#[tokio::test]
async fn test_get_unknown_order_errors() {
    let store = Arc::new(ResourceStore::new());
    let workflow = OrderWorkflow::new(Arc::clone(&store), Arc::new(RecordingNotifier::default()));

    assert_matches!(
        workflow.get(&Uuid::new_v4()).await,
        Err(OrderError::OrderNotFound)
    );
    assert_matches!(
        workflow
            .update_items(
                Uuid::new_v4(),
                UpdateOrderItemsRequest {
                    items: vec![OrderItemRequest {
                        medication_id: Uuid::new_v4(),
                        qty: 1,
                        instructions: None,
                    }],
                    patient: None,
                    prescription_text_snapshot: None,
                },
            )
            .await,
        Err(OrderError::OrderNotFound)
    );
}
