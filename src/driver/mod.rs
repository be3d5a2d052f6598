pub mod action_driver;
pub mod bridge;
pub mod error;
pub mod simulated;
pub mod timeouts;
