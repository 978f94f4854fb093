pub mod error;
pub mod event;
pub mod memory;
pub mod store;

pub use common::{AggregateId, EventId};
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, Version};
pub use memory::InMemoryEventStore;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
