pub mod core;
pub mod dashboard;
pub mod reports;
pub mod setup;
