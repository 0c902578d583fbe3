// libs/pharmacy-cell/src/services/notify.rs
use async_trait::async_trait;
use tracing::info;

use shared_models::pharmacy::PharmacyOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    Confirmed,
    WaitingStock,
}

/// Best-effort sink for order notifications, invoked strictly after the
/// order transaction has committed. A failure here is logged by the caller
/// and never affects the request outcome.
#[async_trait]
pub trait InvoiceNotifier: Send + Sync {
    async fn send(&self, to: &str, order: &PharmacyOrder, mode: NotifyMode) -> anyhow::Result<()>;
}

/// Renders the invoice (or waiting-stock notice) and emits it to the log.
/// Actual delivery is owned by an external channel.
pub struct LogInvoiceNotifier {
    sender: String,
}

impl LogInvoiceNotifier {
    pub fn new(sender: String) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl InvoiceNotifier for LogInvoiceNotifier {
    async fn send(&self, to: &str, order: &PharmacyOrder, mode: NotifyMode) -> anyhow::Result<()> {
        let body = match mode {
            NotifyMode::Confirmed => render_confirmed(order),
            NotifyMode::WaitingStock => render_waiting(order),
        };
        let subject = match mode {
            NotifyMode::Confirmed => format!("Order Invoice - {}", order.order_no),
            NotifyMode::WaitingStock => format!("Order Waiting for Stock - {}", order.order_no),
        };

        info!(
            from = %self.sender,
            to = %to,
            subject = %subject,
            "\n{}",
            body
        );
        Ok(())
    }
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn render_confirmed(order: &PharmacyOrder) -> String {
    let mut lines = vec![format!("Invoice for order {}", order.order_no)];
    for item in &order.items {
        lines.push(format!(
            "  {} {} x{} = {}",
            item.name_snapshot,
            item.unit_snapshot,
            item.requested_qty,
            money(item.item_total)
        ));
    }
    lines.push(format!("  Subtotal: {}", money(order.subtotal)));
    lines.push(format!("  Total:    {}", money(order.total)));
    lines.join("\n")
}

fn render_waiting(order: &PharmacyOrder) -> String {
    let mut lines = vec![format!(
        "Order {} is waiting for stock; we will notify you when it is available.",
        order.order_no
    )];
    for item in &order.items {
        let (available, shortage) = item
            .shortage
            .as_ref()
            .map(|s| (s.available_qty, s.shortage_qty))
            .unwrap_or((0, 0));
        lines.push(format!(
            "  {} {}: requested {}, available {}, short {}",
            item.name_snapshot, item.unit_snapshot, item.requested_qty, available, shortage
        ));
    }
    lines.join("\n")
}
