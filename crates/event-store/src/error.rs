use thiserror::Error;

use crate::{AggregateId, Version};

/// Failures reported by an [`EventStore`](crate::EventStore).
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The stream moved past the version the writer read.
    #[error("Stream {aggregate_id} is at version {actual}, append expected {expected}")]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// Name of the first required field left unset.
    #[error("Incomplete event envelope: {0} is required")]
    IncompleteEnvelope(&'static str),

    /// Payload could not be encoded to JSON.
    #[error("Payload encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EventStoreError>;
