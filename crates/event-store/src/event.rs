use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregateId, EventId, EventStoreError, Result};

/// Position of an event within its aggregate stream.
///
/// The first event of a stream is at 1; an empty stream sits at 0. Appends
/// carry the version they expect the stream to be at, which is how
/// concurrent writers are detected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Version of a stream with no events.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version of the opening event of a stream.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Steps back over `count` events, stopping at [`Version::initial`].
    pub fn rewind(&self, count: usize) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(count).max(0))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored event: an opaque JSON payload plus the stream bookkeeping around it.
///
/// The store only reads `aggregate_id` and `version`; decoding `payload`
/// by `event_type` is left to the owning aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Tag naming the payload shape, e.g. "FlightRecorded".
    pub event_type: String,

    pub aggregate_id: AggregateId,

    /// e.g. "FrequentFlierAccount".
    pub aggregate_type: String,

    /// Stream version this event moves the aggregate to.
    pub version: Version,

    /// Set when the envelope is built.
    pub timestamp: DateTime<Utc>,

    pub payload: serde_json::Value,

    /// Free-form annotations, never interpreted by the store.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelope {
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }
}

/// Assembles an [`EventEnvelope`] field by field.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    version: Option<Version>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelopeBuilder {
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Encodes `payload` as JSON.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Uses an already encoded payload as is.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Stamps the envelope with the current time and returns it.
    ///
    /// Every field except metadata is required; the first one missing is
    /// reported as [`EventStoreError::IncompleteEnvelope`].
    pub fn build(self) -> Result<EventEnvelope> {
        let missing = EventStoreError::IncompleteEnvelope;
        Ok(EventEnvelope {
            event_id: self.event_id.ok_or(missing("event_id"))?,
            event_type: self.event_type.ok_or(missing("event_type"))?,
            aggregate_id: self.aggregate_id.ok_or(missing("aggregate_id"))?,
            aggregate_type: self.aggregate_type.ok_or(missing("aggregate_type"))?,
            version: self.version.ok_or(missing("version"))?,
            timestamp: Utc::now(),
            payload: self.payload.ok_or(missing("payload"))?,
            metadata: self.metadata,
        })
    }
}
