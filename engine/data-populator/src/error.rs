//! Error types for the population pipeline

use apifootball_client::ApiError;
use talent_store::StoreError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PopulationError>;

/// Errors flowing through the reconciler and orchestrator.
///
/// Only the daily-quota signal aborts a run; every other value is localized
/// to the current unit of work and recorded as a soft failure.
#[derive(Error, Debug)]
pub enum PopulationError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PopulationError {
    /// True when this error is the vendor's hard daily quota
    pub fn is_daily_limit(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_daily_limit())
    }
}
