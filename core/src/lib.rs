//! Churn desk core: cancellation intake, reason normalization, churn
//! aggregation, rule-based insights, and exports over a SQLite store.

pub mod aggregator;
pub mod config;
pub mod demo;
pub mod desk;
pub mod error;
pub mod filter;
pub mod insights;
pub mod reason;
pub mod record;
pub mod report;
pub mod request;
pub mod rng;
pub mod store;
pub mod types;

pub use desk::ChurnDesk;
pub use error::{DeskError, DeskResult};
