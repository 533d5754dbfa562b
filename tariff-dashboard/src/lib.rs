pub mod calculator;
pub mod charts;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod tariff_source;
pub mod web;

pub use error::DashboardError;
pub use web::{router, AppState};
