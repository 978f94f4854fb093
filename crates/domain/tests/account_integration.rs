//! Integration tests for the FrequentFlierAccount aggregate.
//!
//! These tests run accounts through the service against the in-memory store,
//! covering persistence, replay from stored streams, and concurrency handling.

use std::sync::Arc;

use common::{AggregateId, EventId, SequentialIdGenerator};
use domain::{
    AccountError, AccountEvent, AccountService, Aggregate, DomainError, DomainEvent,
    FrequentFlierAccount, MatchStatus, OpenAccount, RecordFlightTaken, Status,
};
use event_store::{
    EventEnvelope, EventStore, EventStoreError, EventStoreExt, InMemoryEventStore, Version,
};

/// Helper to create a test account service
fn create_service() -> AccountService<InMemoryEventStore> {
    AccountService::new(InMemoryEventStore::new())
        .with_id_generator(Arc::new(SequentialIdGenerator::new("evt")))
}

/// Stored history of account X: opened, matched to Silver, four flights.
fn seeded_history(account_id: &AggregateId) -> Vec<EventEnvelope> {
    let events = [
        AccountEvent::account_opened(EventId::new("h-1"), account_id.clone(), 10000, 0),
        AccountEvent::status_matched(EventId::new("h-2"), Status::Silver),
        AccountEvent::flight_recorded(EventId::new("h-3"), 2525, 5),
        AccountEvent::flight_recorded(EventId::new("h-4"), 2512, 5),
        AccountEvent::flight_recorded(EventId::new("h-5"), 5600, 5),
        AccountEvent::flight_recorded(EventId::new("h-6"), 3000, 3),
    ];

    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            event
                .to_envelope(account_id, Version::new(i as i64 + 1))
                .unwrap()
        })
        .collect()
}

mod account_lifecycle {
    use super::*;

    #[tokio::test]
    async fn open_match_and_fly_to_gold() {
        let service = create_service();
        let account_id = AggregateId::new("acc-1");

        let result = service
            .open_account(OpenAccount::new(account_id.clone(), 10000, 0))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), Status::Red);
        assert_eq!(result.new_version, Version::first());

        let result = service
            .match_status(MatchStatus::new(account_id.clone(), Status::Silver))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), Status::Silver);

        for _ in 0..4 {
            service
                .record_flight_taken(RecordFlightTaken::new(account_id.clone(), 1500, 5))
                .await
                .unwrap();
        }

        let account = service.load(&account_id).await.unwrap();
        assert_eq!(account.tier_points(), 20);
        assert_eq!(account.status(), Status::Silver);
        assert_eq!(account.version(), Version::new(6));

        let result = service
            .record_flight_taken(RecordFlightTaken::new(account_id.clone(), 1500, 1))
            .await
            .unwrap();
        assert_eq!(result.aggregate.status(), Status::Gold);
        assert_eq!(result.aggregate.miles(), 17500);
        assert_eq!(result.new_version, Version::new(8));
    }

    #[tokio::test]
    async fn operations_on_unopened_account_fail() {
        let service = create_service();

        let result = service
            .match_status(MatchStatus::new("ghost", Status::Gold))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Account(AccountError::NotOpened))
        ));
        assert_eq!(service.store().event_count().await, 0);
    }
}

mod replay_from_store {
    use super::*;

    #[tokio::test]
    async fn seeded_history_reaches_gold_on_next_flight() {
        let service = create_service();
        let account_id = AggregateId::new("9fd16a83-f0b1-4301-9d63-f3f151ae2dbd");
        service
            .store()
            .seed(seeded_history(&account_id))
            .await
            .unwrap();

        let mut account = service.load(&account_id).await.unwrap();
        assert_eq!(account.miles(), 23637);
        assert_eq!(account.tier_points(), 18);
        assert_eq!(account.status(), Status::Silver);
        assert_eq!(account.version(), Version::new(6));

        account.record_flight_taken(1000, 3);
        assert_eq!(account.miles(), 24637);
        assert_eq!(account.tier_points(), 21);
        assert_eq!(account.status(), Status::Gold);
        assert_eq!(account.version(), Version::new(8));

        let new_version = service.save(&mut account).await.unwrap();
        assert_eq!(new_version, Version::new(8));

        let stored = service.store().read_all(&account_id).await.unwrap();
        let types: Vec<_> = stored[6..].iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["FlightRecorded", "PromotedToGold"]);
        assert_eq!(stored[6].event_id, EventId::new("evt-1"));
        assert_eq!(stored[7].event_id, EventId::new("evt-2"));
    }

    #[tokio::test]
    async fn reloaded_account_matches_in_memory_state() {
        let service = create_service();
        let account_id = AggregateId::new("acc-1");
        service
            .open_account(OpenAccount::new(account_id.clone(), 0, 19))
            .await
            .unwrap();
        let result = service
            .record_flight_taken(RecordFlightTaken::new(account_id.clone(), 400, 2))
            .await
            .unwrap();

        let reloaded = service.load(&account_id).await.unwrap();
        assert_eq!(reloaded.miles(), result.aggregate.miles());
        assert_eq!(reloaded.tier_points(), result.aggregate.tier_points());
        assert_eq!(reloaded.status(), Status::Gold);
        assert_eq!(reloaded.version(), result.new_version);
        assert!(reloaded.pending_changes().is_empty());
    }

    #[tokio::test]
    async fn small_channel_buffer_replays_full_history() {
        let service = AccountService::new(InMemoryEventStore::with_buffer(1));
        let account_id = AggregateId::new("acc-1");
        service
            .store()
            .seed(seeded_history(&account_id))
            .await
            .unwrap();

        let account = service.load(&account_id).await.unwrap();
        assert_eq!(account.miles(), 23637);
        assert_eq!(account.version(), Version::new(6));
    }
}

mod forward_compatibility {
    use super::*;

    #[tokio::test]
    async fn unknown_stored_event_is_skipped_but_counted() {
        let service = create_service();
        let account_id = AggregateId::new("acc-1");
        let mut history = seeded_history(&account_id);
        history.push(
            EventEnvelope::builder()
                .event_id(EventId::new("h-7"))
                .event_type("LoungeVisited")
                .aggregate_id(account_id.clone())
                .aggregate_type(FrequentFlierAccount::aggregate_type())
                .version(Version::new(7))
                .payload_raw(serde_json::json!({"lounge": "LHR"}))
                .build()
                .unwrap(),
        );
        service.store().seed(history).await.unwrap();

        let mut account = service.load(&account_id).await.unwrap();
        assert_eq!(account.miles(), 23637);
        assert_eq!(account.status(), Status::Silver);
        assert_eq!(account.version(), Version::new(7));

        account.record_flight_taken(100, 1);
        assert_eq!(service.save(&mut account).await.unwrap(), Version::new(8));
    }

    #[tokio::test]
    async fn malformed_known_payload_is_treated_as_unknown() {
        let service = create_service();
        let account_id = AggregateId::new("acc-1");
        let mut history = seeded_history(&account_id);
        history.truncate(2);
        history.push(
            EventEnvelope::builder()
                .event_id(EventId::new("h-3"))
                .event_type("FlightRecorded")
                .aggregate_id(account_id.clone())
                .aggregate_type(FrequentFlierAccount::aggregate_type())
                .version(Version::new(3))
                .payload_raw(serde_json::json!({"miles": "lots"}))
                .build()
                .unwrap(),
        );
        service.store().seed(history).await.unwrap();

        let account = service.load(&account_id).await.unwrap();
        assert_eq!(account.miles(), 10000);
        assert_eq!(account.version(), Version::new(3));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn stale_writer_gets_conflict_and_keeps_changes() {
        let service = create_service();
        let account_id = AggregateId::new("acc-1");
        service
            .store()
            .seed(seeded_history(&account_id))
            .await
            .unwrap();

        let mut first = service.load(&account_id).await.unwrap();
        let mut stale = service.load(&account_id).await.unwrap();

        first.record_flight_taken(1000, 3);
        service.save(&mut first).await.unwrap();

        stale.record_flight_taken(200, 1);
        let result = service.save(&mut stale).await;

        match result {
            Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict {
                expected,
                actual,
                ..
            })) => {
                assert_eq!(expected, Version::new(6));
                assert_eq!(actual, Version::new(8));
            }
            other => panic!("expected concurrency conflict, got {other:?}"),
        }

        assert_eq!(stale.pending_changes().len(), 1);
        assert_eq!(stale.pending_changes()[0].event_type(), "FlightRecorded");
        assert_eq!(
            service.store().get_aggregate_version(&account_id).await.unwrap(),
            Some(Version::new(8))
        );
    }

    #[tokio::test]
    async fn concurrent_flights_on_separate_accounts() {
        let service = Arc::new(create_service());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let account_id = AggregateId::new(format!("acc-{i}"));
                    service
                        .open_account(OpenAccount::new(account_id.clone(), 0, 0))
                        .await
                        .unwrap();
                    service
                        .record_flight_taken(RecordFlightTaken::new(account_id, 100, 21))
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.aggregate.status(), Status::Gold);
            assert_eq!(result.new_version, Version::new(3));
        }

        assert_eq!(service.store().event_count().await, 24);
    }
}
