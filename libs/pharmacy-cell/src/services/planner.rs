// libs/pharmacy-cell/src/services/planner.rs
use tracing::debug;

use shared_models::pharmacy::{Batch, BatchAllocation, Medication, OrderItem, ShortageInfo};
use shared_store::Tx;

use crate::models::{OrderItemRequest, OrderError, PlanOutcome};

/// Compute a FIFO allocation plan for the requested items.
///
/// Pure with respect to the store: reads batches through the transaction
/// view, never mutates, and is safe to re-run. Batches are consumed oldest
/// expiry first; ties keep document order (the sort is stable). A short item
/// does not abort the pass — every shortage is collected so the caller can
/// report the complete picture.
pub fn plan(tx: &Tx<'_>, items: &[OrderItemRequest]) -> Result<PlanOutcome, OrderError> {
    let mut planned = Vec::new();
    let mut subtotal = 0.0;
    let mut waiting = Vec::new();
    let mut shortage_total = 0u32;

    for request in items {
        let medication = tx
            .medication(&request.medication_id)
            .ok_or(OrderError::MedicationNotFound)?;

        let batches = fifo_batches(medication);
        let available: u32 = batches.iter().map(|b| b.quantity).sum();

        if available < request.qty {
            let shortage = request.qty - available;
            shortage_total += shortage;
            waiting.push(snapshot_item(
                medication,
                request,
                Vec::new(),
                0.0,
                Some(ShortageInfo {
                    requested_qty: request.qty,
                    available_qty: available,
                    shortage_qty: shortage,
                }),
            ));
            continue;
        }

        let mut remaining = request.qty;
        let mut allocations = Vec::new();
        let mut item_total = 0.0;

        for batch in batches {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(batch.quantity);
            let line_total = take as f64 * batch.unit_price;

            allocations.push(BatchAllocation {
                batch_id: batch.id,
                batch_no_snapshot: batch.batch_no.clone(),
                expiry_date_snapshot: batch.expiry_date,
                qty: take,
                unit_price_snapshot: batch.unit_price,
                line_total,
            });

            item_total += line_total;
            remaining -= take;
        }

        subtotal += item_total;
        planned.push(snapshot_item(medication, request, allocations, item_total, None));
    }

    if !waiting.is_empty() {
        debug!(
            "Plan is waiting: {} short item(s), {} unit(s) short in total",
            waiting.len(),
            shortage_total
        );
        return Ok(PlanOutcome::Waiting {
            items: waiting,
            shortage_total,
        });
    }

    Ok(PlanOutcome::Fulfillable {
        items: planned,
        subtotal,
    })
}

/// Non-empty batches ordered by expiry ascending; stable for equal expiries.
fn fifo_batches(medication: &Medication) -> Vec<&Batch> {
    let mut batches: Vec<&Batch> = medication
        .batches
        .iter()
        .filter(|b| b.quantity > 0)
        .collect();
    batches.sort_by_key(|b| b.expiry_date);
    batches
}

fn snapshot_item(
    medication: &Medication,
    request: &OrderItemRequest,
    allocations: Vec<BatchAllocation>,
    item_total: f64,
    shortage: Option<ShortageInfo>,
) -> OrderItem {
    OrderItem {
        medication_id: medication.id,
        requested_qty: request.qty,
        instructions: request.instructions.clone().unwrap_or_default(),
        name_snapshot: medication.name.clone(),
        strength_snapshot: medication.strength.clone(),
        brand_name_snapshot: medication.brand_name.clone(),
        form_snapshot: medication.form.to_string(),
        unit_snapshot: medication.unit.clone(),
        allocations,
        item_total,
        shortage,
    }
}
