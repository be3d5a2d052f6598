pub mod budget;
pub mod config;
pub mod context;
pub mod depth_first;
pub mod error;
pub mod random;
pub mod strategy;
