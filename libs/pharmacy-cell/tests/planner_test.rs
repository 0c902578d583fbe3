use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use pharmacy_cell::models::{OrderError, OrderItemRequest, PlanOutcome};
use pharmacy_cell::services::planner;
use shared_models::pharmacy::{Batch, Medication, MedicationForm};
use shared_store::ResourceStore;

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

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_allocates_oldest_expiry_first() {
    let store = Arc::new(ResourceStore::new());
    let med = medication(
        "Paracetamol",
        vec![
            batch("B-NEW", date(2026, 6, 1), 10, 12.0),
            batch("B-OLD", date(2026, 1, 1), 5, 10.0),
        ],
    );
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let outcome = store
        .transaction(|tx| {
            planner::plan(
                tx,
                &[OrderItemRequest {
                    medication_id: med_id,
                    qty: 8,
                    instructions: None,
                }],
            )
        })
        .await
        .unwrap();

    let PlanOutcome::Fulfillable { items, subtotal } = outcome else {
        panic!("expected a fulfillable plan");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].form_snapshot, "tablet");

    let allocations = &items[0].allocations;
    assert_eq!(allocations.len(), 2);
    assert_eq!(allocations[0].batch_no_snapshot, "B-OLD");
    assert_eq!(allocations[0].qty, 5);
    assert_eq!(allocations[1].batch_no_snapshot, "B-NEW");
    assert_eq!(allocations[1].qty, 3);

    // 5 x 10.00 + 3 x 12.00
    assert_eq!(items[0].item_total, 86.0);
    assert_eq!(subtotal, 86.0);
}

#[tokio::test]
async fn test_short_item_does_not_abort_the_pass() {
    let store = Arc::new(ResourceStore::new());
    let short = medication("Amoxicillin", vec![batch("A1", date(2026, 3, 1), 40, 25.0)]);
    let plenty = medication("Cetirizine", vec![batch("C1", date(2026, 3, 1), 10, 5.0)]);
    let short_id = short.id;
    let plenty_id = plenty.id;
    seed(&store, vec![short, plenty]).await;

    let outcome = store
        .transaction(|tx| {
            planner::plan(
                tx,
                &[
                    OrderItemRequest {
                        medication_id: short_id,
                        qty: 100,
                        instructions: None,
                    },
                    OrderItemRequest {
                        medication_id: plenty_id,
                        qty: 5,
                        instructions: None,
                    },
                ],
            )
        })
        .await
        .unwrap();

    let PlanOutcome::Waiting {
        items,
        shortage_total,
    } = outcome
    else {
        panic!("expected a waiting plan");
    };

    // Only the short line is reported; the fulfillable sibling waits
    // without being allocated.
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].medication_id, short_id);
    assert!(items[0].allocations.is_empty());

    let shortage = items[0].shortage.as_ref().unwrap();
    assert_eq!(shortage.requested_qty, 100);
    assert_eq!(shortage.available_qty, 40);
    assert_eq!(shortage.shortage_qty, 60);
    assert_eq!(shortage_total, 60);
}

#[tokio::test]
async fn test_plan_never_mutates_stock() {
    let store = Arc::new(ResourceStore::new());
    let med = medication("Ibuprofen", vec![batch("I1", date(2026, 2, 1), 50, 8.0)]);
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let request = [OrderItemRequest {
        medication_id: med_id,
        qty: 20,
        instructions: None,
    }];

    for _ in 0..2 {
        store
            .transaction(|tx| planner::plan(tx, &request))
            .await
            .unwrap();
    }

    let after = store.get_medication(&med_id).await.unwrap();
    assert_eq!(after.total_quantity(), 50, "planning must leave stock untouched");
}

#[tokio::test]
async fn test_empty_batches_are_skipped() {
    let store = Arc::new(ResourceStore::new());
    let med = medication(
        "Metformin",
        vec![
            batch("EMPTY", date(2025, 12, 1), 0, 6.0),
            batch("LIVE", date(2026, 4, 1), 30, 7.0),
        ],
    );
    let med_id = med.id;
    seed(&store, vec![med]).await;

    let outcome = store
        .transaction(|tx| {
            planner::plan(
                tx,
                &[OrderItemRequest {
                    medication_id: med_id,
                    qty: 10,
                    instructions: None,
                }],
            )
        })
        .await
        .unwrap();

    let PlanOutcome::Fulfillable { items, .. } = outcome else {
        panic!("expected a fulfillable plan");
    };
    assert_eq!(items[0].allocations.len(), 1);
    assert_eq!(items[0].allocations[0].batch_no_snapshot, "LIVE");
}

#[tokio::test]
async fn test_unknown_medication_fails_the_plan() {
    let store = Arc::new(ResourceStore::new());

    let result = store
        .transaction(|tx| {
            planner::plan(
                tx,
                &[OrderItemRequest {
                    medication_id: Uuid::new_v4(),
                    qty: 1,
                    instructions: None,
                }],
            )
        })
        .await;

    assert_matches!(result, Err(OrderError::MedicationNotFound));
}
