pub mod api;
pub mod auth;
pub mod balance;
pub mod config;
pub mod dispense;
pub mod inventory;
pub mod logging;
pub mod machine;
