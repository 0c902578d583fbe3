use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_port: u16,
    pub default_currency: String,
    pub invoice_sender: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_port: env::var("CLINIC_OPS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("CLINIC_OPS_PORT not set, using 3000");
                    3000
                }),
            default_currency: env::var("CLINIC_OPS_CURRENCY").unwrap_or_else(|_| {
                warn!("CLINIC_OPS_CURRENCY not set, using LKR");
                "LKR".to_string()
            }),
            invoice_sender: env::var("CLINIC_OPS_INVOICE_SENDER").unwrap_or_else(|_| {
                warn!("CLINIC_OPS_INVOICE_SENDER not set, using pharmacy@clinic.local");
                "pharmacy@clinic.local".to_string()
            }),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_port: 3000,
            default_currency: "LKR".to_string(),
            invoice_sender: "pharmacy@clinic.local".to_string(),
        }
    }
}
