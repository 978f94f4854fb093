//! Event-sourced aggregate traits.

use common::{AggregateId, EventId};
use event_store::Version;

/// A recorded fact about an aggregate, named in the past tense.
pub trait DomainEvent: std::fmt::Display + Clone + Send + Sync {
    /// Tag stored next to the payload; selects the decoder on replay.
    fn event_type(&self) -> &str;

    /// Identifier drawn when the event was recorded.
    fn event_id(&self) -> &EventId;
}

/// State derived entirely from an ordered event history.
///
/// Operations record new events and fold them through [`apply`](Self::apply),
/// the same path replay takes, so a reloaded instance always matches the one
/// that recorded the events.
pub trait Aggregate: Send + Sync + Sized {
    type Event: DomainEvent;

    /// Written to every envelope as `aggregate_type`.
    fn aggregate_type() -> &'static str;

    /// None until an opening event has been folded.
    fn id(&self) -> Option<&AggregateId>;

    /// Count of events folded so far, recognised or not.
    fn version(&self) -> Version;

    /// Folds one event and advances the version by one. Never fails.
    fn apply(&mut self, event: &Self::Event);

    /// Folds `events` in iteration order.
    fn apply_events<'a>(&mut self, events: impl IntoIterator<Item = &'a Self::Event>)
    where
        Self::Event: 'a,
    {
        for event in events {
            self.apply(event);
        }
    }
}
