//! Driver error type.

use domain::DomainError;
use event_store::EventStoreError;
use thiserror::Error;

/// Errors that end a driver run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Seeding the demo history failed.
    #[error("Failed to seed demo history: {0}")]
    Seed(#[from] EventStoreError),

    /// Loading or committing the account failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
