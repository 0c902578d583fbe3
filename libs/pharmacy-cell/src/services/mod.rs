pub mod inventory;
pub mod ledger;
pub mod notify;
pub mod planner;
pub mod workflow;
