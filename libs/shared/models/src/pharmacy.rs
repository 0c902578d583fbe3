// libs/shared/models/src/pharmacy.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub brand_name: String,
    pub strength: String,
    pub form: MedicationForm,
    pub category: String,
    pub description: String,
    pub unit: String,
    pub is_active: bool,
    pub batches: Vec<Batch>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    pub fn total_quantity(&self) -> u32 {
        self.batches.iter().map(|b| b.quantity).sum()
    }

    pub fn batch(&self, batch_id: &Uuid) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == *batch_id)
    }

    pub fn batch_mut(&mut self, batch_id: &Uuid) -> Option<&mut Batch> {
        self.batches.iter_mut().find(|b| b.id == *batch_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MedicationForm {
    Tablet,
    Capsule,
    Syrup,
    Injection,
    Cream,
    Drops,
    Other,
}

impl Default for MedicationForm {
    fn default() -> Self {
        MedicationForm::Tablet
    }
}

impl fmt::Display for MedicationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicationForm::Tablet => write!(f, "tablet"),
            MedicationForm::Capsule => write!(f, "capsule"),
            MedicationForm::Syrup => write!(f, "syrup"),
            MedicationForm::Injection => write!(f, "injection"),
            MedicationForm::Cream => write!(f, "cream"),
            MedicationForm::Drops => write!(f, "drops"),
            MedicationForm::Other => write!(f, "other"),
        }
    }
}

/// One received lot of a medication. Quantity is unsigned: stock can never
/// go negative, the ledger re-checks before every subtraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub batch_no: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
    pub unit_price: f64,
    pub added_by_name: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyOrder {
    pub id: Uuid,
    pub order_no: String,
    pub patient: PatientContact,
    pub prescription_text_snapshot: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub total: f64,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "WAITING_STOCK")]
    WaitingStock,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Confirmed => write!(f, "CONFIRMED"),
            OrderStatus::WaitingStock => write!(f, "WAITING_STOCK"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One order line. Descriptive fields are snapshots taken at allocation
/// time so historical orders stay stable if the catalog entry changes.
/// A fulfilled line carries allocations; a waiting line carries shortage
/// bookkeeping and an empty allocation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub medication_id: Uuid,
    pub requested_qty: u32,
    pub instructions: String,
    pub name_snapshot: String,
    pub strength_snapshot: String,
    pub brand_name_snapshot: String,
    pub form_snapshot: String,
    pub unit_snapshot: String,
    pub allocations: Vec<BatchAllocation>,
    pub item_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortage: Option<ShortageInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAllocation {
    pub batch_id: Uuid,
    pub batch_no_snapshot: String,
    pub expiry_date_snapshot: NaiveDate,
    pub qty: u32,
    pub unit_price_snapshot: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortageInfo {
    pub requested_qty: u32,
    pub available_qty: u32,
    pub shortage_qty: u32,
}
