//! API-Football Client
//!
//! Rate-limited, retrying HTTP client for the API-Football v3 vendor API.
//! Every outbound call honors a minimum inter-request spacing and retries
//! transient failures with exponential backoff; a daily-quota response is
//! surfaced as a hard error that callers must propagate unmodified.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod models;

pub use client::{ApiFootballClient, FootballApi};
pub use config::ApiConfig;
pub use envelope::{ApiEnvelope, Paging};
pub use error::{ApiError, Result};
pub use models::*;
