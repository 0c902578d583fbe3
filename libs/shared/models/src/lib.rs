pub mod error;
pub mod pharmacy;
pub mod scheduling;
