//! Shared types for the frequent-flier event-sourcing workspace.

mod ids;
mod types;

pub use ids::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use types::{AggregateId, EventId};
