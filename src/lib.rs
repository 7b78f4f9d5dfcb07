//! Forwards newsletter/SMS signups to an external marketing-contacts platform.
//!
//! A signup is validated, its phone number normalized, and the contact upserted on the
//! platform before it is added to a configured distribution list.

pub mod app;
pub mod config;
mod error;
pub mod marketing_client;
mod telemetry;
mod utils;
pub mod web;

pub use app::{serve, App, AppState};
pub use error::{Error, Result};
pub use marketing_client::MarketingClient;
pub use telemetry::{init_dbg_tracing, init_production_tracing};
