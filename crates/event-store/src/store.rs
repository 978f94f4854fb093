use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Version};

/// Preconditions checked by [`EventStore::append`].
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the stream must be at before the batch lands. None skips the
    /// check, leaving only the contiguous-version rule.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimistic concurrency: fail unless the stream is exactly at `version`.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Fail unless the stream is empty.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// An ordered, finite stream of one aggregate's events, oldest first.
///
/// The stream ends once the producer has sent every stored event.
pub type EventStream = Pin<Box<dyn Stream<Item = EventEnvelope> + Send>>;

/// Append-only storage of per-aggregate event streams.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch for one aggregate, all or nothing.
    ///
    /// Fails with `ConcurrencyConflict` when the stream is not at
    /// `options.expected_version`, or when the batch does not start right
    /// after the stream's last version. Returns the stream's new version.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Opens a stream over all events of one aggregate in persisted order.
    ///
    /// An unknown aggregate yields an empty stream, not an error.
    async fn read_stream(&self, aggregate_id: &AggregateId) -> Result<EventStream>;

    /// Version of the last stored event, None for an unknown aggregate.
    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>>;
}

/// Conveniences layered on any [`EventStore`].
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// True once the aggregate has at least one stored event.
    async fn aggregate_exists(&self, aggregate_id: &AggregateId) -> Result<bool> {
        Ok(self.get_aggregate_version(aggregate_id).await?.is_some())
    }

    /// Reads an aggregate's whole stream into memory.
    async fn read_all(&self, aggregate_id: &AggregateId) -> Result<Vec<EventEnvelope>> {
        let stream = self.read_stream(aggregate_id).await?;
        Ok(stream.collect().await)
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Rejects batches that are empty, span aggregates or skip versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidAppend(
            "Cannot append empty event list".to_string(),
        ));
    };

    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "All events must be for the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "All events must have the same aggregate type".to_string(),
            ));
        }
    }

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "Event versions must be sequential. Expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}
