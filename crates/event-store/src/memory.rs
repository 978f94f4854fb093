use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::{RwLock, mpsc};

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// Default capacity of the hand-off channel used by [`EventStore::read_stream`].
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// In-memory event store keyed by aggregate stream.
///
/// Stands in for a durable store. Reads are served the way a database cursor
/// would be: a producer task pushes the stored events into a bounded channel
/// and the caller consumes them as a stream, in order, until the producer
/// closes its end.
#[derive(Clone)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<AggregateId, Vec<EventEnvelope>>>>,
    buffer: usize,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_STREAM_BUFFER)
    }

    /// Creates an empty store whose read streams use a channel of `buffer` slots.
    ///
    /// A zero buffer is bumped to 1 since tokio channels need capacity.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            streams: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Loads pre-existing history for a brand new stream.
    pub async fn seed(&self, events: Vec<EventEnvelope>) -> Result<Version> {
        self.append(events, AppendOptions::expect_new()).await
    }

    /// Returns the total number of events stored across all streams.
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first_event = &events[0];
        let aggregate_id = first_event.aggregate_id.clone();
        let first_new_version = first_event.version;

        let mut streams = self.streams.write().await;
        let current_version = streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Unique (aggregate_id, version) constraint simulation
        if first_new_version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: first_new_version.rewind(1),
                actual: current_version,
            });
        }

        let count = events.len();
        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(current_version);
        streams.entry(aggregate_id.clone()).or_default().extend(events);

        metrics::counter!("event_store_events_appended_total").increment(count as u64);
        tracing::debug!(%aggregate_id, count, version = %last_version, "appended events");

        Ok(last_version)
    }

    async fn read_stream(&self, aggregate_id: &AggregateId) -> Result<EventStream> {
        let events = self
            .streams
            .read()
            .await
            .get(aggregate_id)
            .cloned()
            .unwrap_or_default();

        let (tx, rx) = mpsc::channel(self.buffer);
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    // Reader went away
                    break;
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.version))
    }
}
