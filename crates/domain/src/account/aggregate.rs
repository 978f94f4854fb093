//! Frequent-flier account aggregate implementation.

use std::sync::Arc;

use common::{AggregateId, IdGenerator, UuidGenerator};
use event_store::{EventEnvelope, Version};
use futures_util::{Stream, StreamExt, pin_mut};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

use super::{AccountError, AccountEvent, Status};

/// Tier-point balance an account must exceed to be promoted to Gold.
pub const GOLD_TIER_POINTS_THRESHOLD: i64 = 20;

/// Frequent-flier account aggregate root.
///
/// State is never assigned directly: it is folded from the account's event
/// history, and every business operation records new events that are folded
/// the same way and kept as pending until committed.
///
/// Not internally synchronized; one owner at a time.
#[derive(Debug, Clone)]
pub struct FrequentFlierAccount {
    /// Set by the opening event.
    id: Option<AggregateId>,

    miles: i64,
    tier_points: i64,
    status: Status,

    /// Number of events folded so far, used as the optimistic concurrency token.
    version: Version,

    /// Events recorded in this session but not yet committed.
    pending: Vec<AccountEvent>,

    ids: Arc<dyn IdGenerator>,
}

impl Default for FrequentFlierAccount {
    fn default() -> Self {
        Self::with_id_generator(Arc::new(UuidGenerator))
    }
}

impl Aggregate for FrequentFlierAccount {
    type Event = AccountEvent;

    fn aggregate_type() -> &'static str {
        "FrequentFlierAccount"
    }

    fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.transition(event);
        self.version = self.version.next();
    }
}

// Construction and replay
impl FrequentFlierAccount {
    /// Creates an empty account (version 0, no identity) using random event ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty account that draws new event ids from `ids`.
    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            id: None,
            miles: 0,
            tier_points: 0,
            status: Status::default(),
            version: Version::initial(),
            pending: Vec::new(),
            ids,
        }
    }

    /// Rebuilds an account by folding `history` in order.
    ///
    /// Replay reconstitutes already stored facts, so nothing is added to the
    /// pending changes.
    pub fn replay<'a>(history: impl IntoIterator<Item = &'a AccountEvent>) -> Self {
        let mut account = Self::new();
        account.apply_events(history);
        account.replayed()
    }

    /// Rebuilds an account from a stream of historical events.
    ///
    /// Waits for each event in turn and returns once the stream ends; a
    /// stream that never ends never returns.
    pub async fn from_history<S>(history: S) -> Self
    where
        S: Stream<Item = AccountEvent>,
    {
        Self::from_history_with_ids(history, Arc::new(UuidGenerator)).await
    }

    /// Same as [`from_history`](Self::from_history) with an injected id generator.
    pub async fn from_history_with_ids<S>(history: S, ids: Arc<dyn IdGenerator>) -> Self
    where
        S: Stream<Item = AccountEvent>,
    {
        let mut account = Self::with_id_generator(ids);

        pin_mut!(history);
        while let Some(event) = history.next().await {
            account.apply(&event);
        }

        account.replayed()
    }

    /// Reports a finished replay; every folded event counts.
    fn replayed(self) -> Self {
        metrics::counter!("account_events_replayed_total")
            .increment(self.version.as_i64().unsigned_abs());
        tracing::debug!(account_id = ?self.id, version = %self.version, "replayed history");
        self
    }
}

// Query methods
impl FrequentFlierAccount {
    /// Returns the mileage balance.
    pub fn miles(&self) -> i64 {
        self.miles
    }

    /// Returns the tier-point balance.
    pub fn tier_points(&self) -> i64 {
        self.tier_points
    }

    /// Returns the current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns events recorded since the last commit, oldest first.
    pub fn pending_changes(&self) -> &[AccountEvent] {
        &self.pending
    }

    /// Returns true if nothing has been folded into this account.
    ///
    /// A lookup of an unknown account yields such an instance.
    pub fn is_empty(&self) -> bool {
        self.version == Version::initial() && self.id.is_none()
    }
}

// Command methods (record events)
impl FrequentFlierAccount {
    /// Records that the customer has taken a flight.
    ///
    /// The miles and tier points are calculated externally and are not
    /// validated here. If the flight takes the account over the Gold
    /// threshold, a promotion is recorded straight after it.
    pub fn record_flight_taken(&mut self, miles: i64, tier_points: i64) {
        let flight = AccountEvent::flight_recorded(self.ids.next_event_id(), miles, tier_points);
        self.track_change(flight);

        if self.tier_points > GOLD_TIER_POINTS_THRESHOLD && self.status != Status::Gold {
            let promotion = AccountEvent::promoted_to_gold(self.ids.next_event_id());
            tracing::info!(
                account_id = ?self.id,
                tier_points = self.tier_points,
                "promoting account to gold"
            );
            metrics::counter!("account_promotions_total").increment(1);
            self.track_change(promotion);
        }
    }

    /// Opens a new account with its opening balances.
    pub fn open(
        &mut self,
        account_id: AggregateId,
        opening_miles: i64,
        opening_tier_points: i64,
    ) -> Result<(), AccountError> {
        if let Some(existing) = &self.id {
            return Err(AccountError::AlreadyOpened {
                account_id: existing.to_string(),
            });
        }

        let opened = AccountEvent::account_opened(
            self.ids.next_event_id(),
            account_id,
            opening_miles,
            opening_tier_points,
        );
        self.track_change(opened);
        Ok(())
    }

    /// Grants a status matched from another programme.
    pub fn match_status(&mut self, new_status: Status) -> Result<(), AccountError> {
        if self.id.is_none() {
            return Err(AccountError::NotOpened);
        }

        let matched = AccountEvent::status_matched(self.ids.next_event_id(), new_status);
        self.track_change(matched);
        Ok(())
    }

    /// Removes and returns the pending changes for persisting.
    ///
    /// The events stay folded into the state; only the buffer is drained.
    pub fn take_pending_changes(&mut self) -> PendingChanges {
        let events = std::mem::take(&mut self.pending);
        PendingChanges {
            aggregate_id: self.id.clone(),
            expected_version: self.version.rewind(events.len()),
            events,
        }
    }

    /// Puts changes taken by [`take_pending_changes`](Self::take_pending_changes)
    /// back in front of any recorded since.
    pub(crate) fn restore_pending_changes(&mut self, changes: PendingChanges) {
        let newer = std::mem::replace(&mut self.pending, changes.events);
        self.pending.extend(newer);
    }

    /// Records a new event: keep it as pending and fold it in.
    fn track_change(&mut self, event: AccountEvent) {
        self.apply(&event);
        self.pending.push(event);
    }
}

// Transition function
impl FrequentFlierAccount {
    fn transition(&mut self, event: &AccountEvent) {
        match event {
            AccountEvent::AccountOpened(data) => {
                tracing::debug!(event = %event, "transition");

                match &self.id {
                    None => self.id = Some(data.account_id().clone()),
                    Some(current) if current != data.account_id() => {
                        tracing::warn!(
                            account_id = %current,
                            ignored = %data.account_id(),
                            "account already opened, keeping identity"
                        );
                    }
                    Some(_) => {}
                }
                self.miles = data.opening_miles();
                self.tier_points = data.opening_tier_points();
                self.status = Status::Red;
            }
            AccountEvent::StatusMatched(data) => {
                tracing::debug!(event = %event, "transition");

                self.status = data.new_status();
            }
            AccountEvent::FlightRecorded(data) => {
                tracing::debug!(event = %event, "transition");

                self.miles = self.miles.saturating_add(data.miles_added());
                self.tier_points = self.tier_points.saturating_add(data.tier_points_added());
            }
            AccountEvent::PromotedToGold(_) => {
                tracing::debug!(event = %event, "transition");

                self.status = Status::Gold;
            }
            AccountEvent::Unrecognized(data) => {
                tracing::error!(
                    event_type = event.event_type(),
                    event_id = %event.event_id(),
                    payload = %data.payload(),
                    "dropping unknown event"
                );
                metrics::counter!("account_events_dropped_total").increment(1);
            }
        }
    }
}

impl std::fmt::Display for FrequentFlierAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FrequentFlierAccount={:?}, Miles={}, TierPoints={}, Status={} ExpectedVersion={} PendingChanges={}",
            self.id.as_ref().map(AggregateId::as_str).unwrap_or_default(),
            self.miles,
            self.tier_points,
            self.status,
            self.version,
            self.pending.len()
        )
    }
}

/// Changes drained from an account, ready to be committed.
#[derive(Debug, Clone)]
pub struct PendingChanges {
    /// The account the events belong to; None if it was never opened.
    pub aggregate_id: Option<AggregateId>,

    /// Version of the stream before these events.
    pub expected_version: Version,

    /// The new events, oldest first.
    pub events: Vec<AccountEvent>,
}

impl PendingChanges {
    /// Returns true if there is nothing to commit.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the number of events to commit.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Builds store envelopes numbered from `expected_version + 1`.
    pub fn to_envelopes(&self) -> Result<Vec<EventEnvelope>, DomainError> {
        let aggregate_id = self.aggregate_id.as_ref().ok_or(AccountError::NotOpened)?;

        let mut envelopes = Vec::with_capacity(self.events.len());
        let mut version = self.expected_version;
        for event in &self.events {
            version = version.next();
            envelopes.push(event.to_envelope(aggregate_id, version)?);
        }

        Ok(envelopes)
    }
}
