pub mod calc;
pub mod config;
pub mod db;
pub mod intake;
pub mod ipc;
pub mod store;
