//! Demo driver for the frequent-flier account.
//!
//! Seeds an in-memory store with a known account history, replays it,
//! records one flight and commits the result.

pub mod config;
pub mod error;

use common::{AggregateId, EventId};
use domain::{AccountEvent, AccountService, FrequentFlierAccount, Status};
use event_store::{EventEnvelope, EventStoreError, InMemoryEventStore, Version};

pub use config::Config;
pub use error::AppError;

/// Stored history of the demo account, oldest first.
///
/// Opened with 10000 miles, matched to Silver, then four flights for a total
/// of 23637 miles and 18 tier points.
pub fn demo_history(account_id: &AggregateId) -> Result<Vec<EventEnvelope>, EventStoreError> {
    let events = [
        AccountEvent::account_opened(EventId::new("seed-1"), account_id.clone(), 10000, 0),
        AccountEvent::status_matched(EventId::new("seed-2"), Status::Silver),
        AccountEvent::flight_recorded(EventId::new("seed-3"), 2525, 5),
        AccountEvent::flight_recorded(EventId::new("seed-4"), 2512, 5),
        AccountEvent::flight_recorded(EventId::new("seed-5"), 5600, 5),
        AccountEvent::flight_recorded(EventId::new("seed-6"), 3000, 3),
    ];

    let mut envelopes = Vec::with_capacity(events.len());
    let mut version = Version::initial();
    for event in &events {
        version = version.next();
        envelopes.push(event.to_envelope(account_id, version)?);
    }
    Ok(envelopes)
}

/// Runs the demo: seed, load, record the configured flight, save.
///
/// Returns the account as it stands after the commit.
pub async fn run(config: &Config) -> Result<FrequentFlierAccount, AppError> {
    let account_id = AggregateId::new(config.account_id.clone());

    let store = InMemoryEventStore::with_buffer(config.replay_buffer);
    let seeded = store.seed(demo_history(&account_id)?).await?;
    tracing::info!(%account_id, version = %seeded, "seeded demo history");

    let mut service = AccountService::new(store);
    if let Some(timeout) = config.replay_timeout {
        service = service.with_replay_timeout(timeout);
    }

    let mut account = service.load(&account_id).await?;
    tracing::info!(%account, "loaded account");

    account.record_flight_taken(config.flight_miles, config.flight_tier_points);
    tracing::info!(%account, "recorded flight");

    let version = service.save(&mut account).await?;
    tracing::info!(%version, %account, "saved account");

    Ok(account)
}
