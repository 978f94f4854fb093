//! Event identifier generation.
//!
//! Id generation is an injected capability so aggregates can be driven with
//! deterministic ids in tests and random ids in production.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::EventId;

/// Source of fresh, never-reused event identifiers.
pub trait IdGenerator: std::fmt::Debug + Send + Sync {
    /// Returns a new event identifier.
    fn next_event_id(&self) -> EventId;
}

/// Generates random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_event_id(&self) -> EventId {
        EventId::new(Uuid::new_v4().to_string())
    }
}

/// Generates `"{prefix}-{n}"` identifiers with `n` counting up from 1.
///
/// Unique within one generator instance only.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first id is `"{prefix}-1"`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_event_id(&self) -> EventId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        EventId::new(format!("{}-{}", self.prefix, n))
    }
}
