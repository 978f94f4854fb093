//! Domain error types.

use std::time::Duration;

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::account::AccountError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// An error occurred in the account aggregate.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// The account history did not finish streaming in time.
    #[error("Replay of account {account_id} did not finish within {timeout:?}")]
    ReplayTimeout {
        account_id: AggregateId,
        timeout: Duration,
    },
}
