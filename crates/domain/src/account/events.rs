//! Frequent-flier account domain events.

use common::{AggregateId, EventId};
use event_store::{EventEnvelope, EventStoreError, Version};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::aggregate::{Aggregate, DomainEvent};

use super::{FrequentFlierAccount, Status};

/// Events that can occur on a frequent-flier account.
///
/// The first four variants are the closed set this build knows about.
/// `Unrecognized` carries a stored event whose tag (or payload) this build
/// cannot decode; replay skips it instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    /// Account was opened.
    AccountOpened(AccountOpened),

    /// Status was matched from another programme.
    StatusMatched(StatusMatched),

    /// A flight was credited to the account.
    FlightRecorded(FlightRecorded),

    /// Account was promoted to Gold.
    PromotedToGold(PromotedToGold),

    /// Stored event outside the known set.
    Unrecognized(UnrecognizedEvent),
}

/// Data for AccountOpened event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    #[serde(skip, default = "unassigned_event_id")]
    event_id: EventId,
    account_id: AggregateId,
    opening_miles: i64,
    opening_tier_points: i64,
}

impl AccountOpened {
    /// The opened account.
    pub fn account_id(&self) -> &AggregateId {
        &self.account_id
    }

    /// Miles balance at opening.
    pub fn opening_miles(&self) -> i64 {
        self.opening_miles
    }

    /// Tier-point balance at opening.
    pub fn opening_tier_points(&self) -> i64 {
        self.opening_tier_points
    }
}

/// Data for StatusMatched event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMatched {
    #[serde(skip, default = "unassigned_event_id")]
    event_id: EventId,
    new_status: Status,
}

impl StatusMatched {
    /// The status granted by the match.
    pub fn new_status(&self) -> Status {
        self.new_status
    }
}

/// Data for FlightRecorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecorded {
    #[serde(skip, default = "unassigned_event_id")]
    event_id: EventId,
    miles_added: i64,
    tier_points_added: i64,
}

impl FlightRecorded {
    /// Miles credited for the flight.
    pub fn miles_added(&self) -> i64 {
        self.miles_added
    }

    /// Tier points credited for the flight.
    pub fn tier_points_added(&self) -> i64 {
        self.tier_points_added
    }
}

/// Data for PromotedToGold event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotedToGold {
    #[serde(skip, default = "unassigned_event_id")]
    event_id: EventId,
}

/// A stored event this build does not understand.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedEvent {
    event_id: EventId,
    event_type: String,
    payload: serde_json::Value,
}

impl UnrecognizedEvent {
    /// Creates a placeholder for a stored event that could not be decoded.
    pub fn new(event_id: EventId, event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            payload,
        }
    }

    /// The raw stored payload.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

/// The id lives on the envelope, not in the payload; decoding fills it in.
fn unassigned_event_id() -> EventId {
    EventId::new(String::new())
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &str {
        match self {
            AccountEvent::AccountOpened(_) => "AccountOpened",
            AccountEvent::StatusMatched(_) => "StatusMatched",
            AccountEvent::FlightRecorded(_) => "FlightRecorded",
            AccountEvent::PromotedToGold(_) => "PromotedToGold",
            AccountEvent::Unrecognized(data) => &data.event_type,
        }
    }

    fn event_id(&self) -> &EventId {
        match self {
            AccountEvent::AccountOpened(data) => &data.event_id,
            AccountEvent::StatusMatched(data) => &data.event_id,
            AccountEvent::FlightRecorded(data) => &data.event_id,
            AccountEvent::PromotedToGold(data) => &data.event_id,
            AccountEvent::Unrecognized(data) => &data.event_id,
        }
    }
}

impl std::fmt::Display for AccountEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountEvent::AccountOpened(data) => write!(
                f,
                "AccountOpened: event_id={:?} account_id={:?} opening_miles={} opening_tier_points={}",
                data.event_id.as_str(),
                data.account_id.as_str(),
                data.opening_miles,
                data.opening_tier_points
            ),
            AccountEvent::StatusMatched(data) => write!(
                f,
                "StatusMatched: event_id={:?} new_status={}",
                data.event_id.as_str(),
                data.new_status
            ),
            AccountEvent::FlightRecorded(data) => write!(
                f,
                "FlightRecorded: event_id={:?} miles_added={} tier_points_added={}",
                data.event_id.as_str(),
                data.miles_added,
                data.tier_points_added
            ),
            AccountEvent::PromotedToGold(data) => {
                write!(f, "PromotedToGold: event_id={:?}", data.event_id.as_str())
            }
            AccountEvent::Unrecognized(data) => write!(
                f,
                "{}: event_id={:?} payload={}",
                data.event_type,
                data.event_id.as_str(),
                data.payload
            ),
        }
    }
}

// Convenience constructors for events
impl AccountEvent {
    /// Creates an AccountOpened event.
    pub fn account_opened(
        event_id: EventId,
        account_id: AggregateId,
        opening_miles: i64,
        opening_tier_points: i64,
    ) -> Self {
        AccountEvent::AccountOpened(AccountOpened {
            event_id,
            account_id,
            opening_miles,
            opening_tier_points,
        })
    }

    /// Creates a StatusMatched event.
    pub fn status_matched(event_id: EventId, new_status: Status) -> Self {
        AccountEvent::StatusMatched(StatusMatched {
            event_id,
            new_status,
        })
    }

    /// Creates a FlightRecorded event.
    pub fn flight_recorded(event_id: EventId, miles_added: i64, tier_points_added: i64) -> Self {
        AccountEvent::FlightRecorded(FlightRecorded {
            event_id,
            miles_added,
            tier_points_added,
        })
    }

    /// Creates a PromotedToGold event.
    pub fn promoted_to_gold(event_id: EventId) -> Self {
        AccountEvent::PromotedToGold(PromotedToGold { event_id })
    }

    /// Replaces the event id with the one stored on the envelope.
    fn with_event_id(mut self, id: EventId) -> Self {
        match &mut self {
            AccountEvent::AccountOpened(data) => data.event_id = id,
            AccountEvent::StatusMatched(data) => data.event_id = id,
            AccountEvent::FlightRecorded(data) => data.event_id = id,
            AccountEvent::PromotedToGold(data) => data.event_id = id,
            AccountEvent::Unrecognized(data) => data.event_id = id,
        }
        self
    }

    /// Returns true for events outside the known set.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, AccountEvent::Unrecognized(_))
    }
}

// Envelope codec
impl AccountEvent {
    /// Wraps the event for the store as the given version of `aggregate_id`.
    pub fn to_envelope(
        &self,
        aggregate_id: &AggregateId,
        version: Version,
    ) -> Result<EventEnvelope, EventStoreError> {
        let builder = EventEnvelope::builder()
            .event_id(self.event_id().clone())
            .event_type(self.event_type())
            .aggregate_id(aggregate_id.clone())
            .aggregate_type(FrequentFlierAccount::aggregate_type())
            .version(version);

        let builder = match self {
            AccountEvent::AccountOpened(data) => builder.payload(data)?,
            AccountEvent::StatusMatched(data) => builder.payload(data)?,
            AccountEvent::FlightRecorded(data) => builder.payload(data)?,
            AccountEvent::PromotedToGold(data) => builder.payload(data)?,
            AccountEvent::Unrecognized(data) => builder.payload_raw(data.payload.clone()),
        };

        builder.build()
    }

    /// Decodes a stored envelope.
    ///
    /// Never fails: an unknown tag, or a known tag whose payload does not
    /// decode, comes back as [`AccountEvent::Unrecognized`].
    pub fn from_envelope(envelope: EventEnvelope) -> Self {
        let EventEnvelope {
            event_id,
            event_type,
            payload,
            ..
        } = envelope;

        match event_type.as_str() {
            "AccountOpened" => decode(event_id, event_type, payload, AccountEvent::AccountOpened),
            "StatusMatched" => decode(event_id, event_type, payload, AccountEvent::StatusMatched),
            "FlightRecorded" => decode(event_id, event_type, payload, AccountEvent::FlightRecorded),
            "PromotedToGold" => decode(event_id, event_type, payload, AccountEvent::PromotedToGold),
            _ => AccountEvent::Unrecognized(UnrecognizedEvent::new(event_id, event_type, payload)),
        }
    }
}

fn decode<T: DeserializeOwned>(
    event_id: EventId,
    event_type: String,
    payload: serde_json::Value,
    wrap: fn(T) -> AccountEvent,
) -> AccountEvent {
    match serde_json::from_value::<T>(payload.clone()) {
        Ok(data) => wrap(data).with_event_id(event_id),
        Err(error) => {
            tracing::warn!(%event_id, %event_type, %error, "undecodable event payload");
            AccountEvent::Unrecognized(UnrecognizedEvent::new(event_id, event_type, payload))
        }
    }
}
