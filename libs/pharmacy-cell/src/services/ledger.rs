// libs/pharmacy-cell/src/services/ledger.rs
use tracing::debug;

use shared_models::pharmacy::{OrderItem, PharmacyOrder};
use shared_store::Tx;

use crate::models::OrderError;

/// Apply a fulfillable plan's deductions to batch quantities.
///
/// Every allocation is re-validated against the batch's current quantity
/// before subtracting: if stock was depleted between planning and commit,
/// this returns `StockConflict` and the caller's transaction aborts, so no
/// partial deduction ever survives.
pub fn apply_deductions(tx: &mut Tx<'_>, items: &[OrderItem]) -> Result<(), OrderError> {
    for item in items {
        let mut medication = tx
            .medication(&item.medication_id)
            .cloned()
            .ok_or(OrderError::MedicationNotFound)?;

        for alloc in &item.allocations {
            let batch = medication
                .batch_mut(&alloc.batch_id)
                .ok_or(OrderError::BatchNotFound)?;

            if batch.quantity < alloc.qty {
                return Err(OrderError::StockConflict {
                    batch_no: batch.batch_no.clone(),
                    available_now: batch.quantity,
                    needed: alloc.qty,
                });
            }

            batch.quantity -= alloc.qty;
        }

        tx.put_medication(medication);
    }

    debug!("Applied deductions for {} item(s)", items.len());
    Ok(())
}

/// Credit every allocation recorded on `order` back to its batch.
///
/// First step of an item-list revision only; must run inside the same
/// transaction as the replan and rededuct that follow.
pub fn restore(tx: &mut Tx<'_>, order: &PharmacyOrder) -> Result<(), OrderError> {
    for item in &order.items {
        if item.allocations.is_empty() {
            continue;
        }

        let mut medication = tx
            .medication(&item.medication_id)
            .cloned()
            .ok_or(OrderError::MedicationNotFound)?;

        for alloc in &item.allocations {
            let batch = medication
                .batch_mut(&alloc.batch_id)
                .ok_or(OrderError::BatchNotFound)?;
            batch.quantity += alloc.qty;
        }

        tx.put_medication(medication);
    }

    debug!("Restored prior allocations for order {}", order.order_no);
    Ok(())
}
