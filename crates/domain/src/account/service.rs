//! Account service composing the aggregate with an event store.

use std::sync::Arc;
use std::time::Duration;

use common::{AggregateId, IdGenerator, UuidGenerator};
use event_store::{AppendOptions, EventStore, Version};
use futures_util::StreamExt;

use crate::aggregate::Aggregate;
use crate::command::{Command, CommandResult};
use crate::error::DomainError;

use super::{AccountError, AccountEvent, FrequentFlierAccount, MatchStatus, OpenAccount, RecordFlightTaken};

/// Service for managing frequent-flier accounts.
///
/// Loads an account by replaying its stream, runs one operation on it and
/// commits the resulting pending changes with optimistic concurrency.
/// Conflicts are reported, never retried.
pub struct AccountService<S: EventStore> {
    store: S,
    ids: Arc<dyn IdGenerator>,
    replay_timeout: Option<Duration>,
}

impl<S: EventStore> AccountService<S> {
    /// Creates a new account service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: Arc::new(UuidGenerator),
            replay_timeout: None,
        }
    }

    /// Uses `ids` for every event recorded through this service.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Bounds how long a replay may wait on the store's stream.
    pub fn with_replay_timeout(mut self, timeout: Duration) -> Self {
        self.replay_timeout = Some(timeout);
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an account by replaying its stored history.
    ///
    /// An unknown account yields an empty aggregate, not an error.
    #[tracing::instrument(skip(self), fields(account_id = %account_id))]
    pub async fn load(&self, account_id: &AggregateId) -> Result<FrequentFlierAccount, DomainError> {
        let stream = self.store.read_stream(account_id).await?;
        let history = stream.map(AccountEvent::from_envelope);
        let replay = FrequentFlierAccount::from_history_with_ids(history, self.ids.clone());

        let account = match self.replay_timeout {
            Some(timeout) => tokio::time::timeout(timeout, replay).await.map_err(|_| {
                DomainError::ReplayTimeout {
                    account_id: account_id.clone(),
                    timeout,
                }
            })?,
            None => replay.await,
        };

        tracing::debug!(version = %account.version(), "account loaded");
        Ok(account)
    }

    /// Loads an account, returning None if it doesn't exist.
    pub async fn load_existing(
        &self,
        account_id: &AggregateId,
    ) -> Result<Option<FrequentFlierAccount>, DomainError> {
        let account = self.load(account_id).await?;
        if account.is_empty() {
            Ok(None)
        } else {
            Ok(Some(account))
        }
    }

    /// Commits the account's pending changes.
    ///
    /// On failure the changes are put back on the account so the caller can
    /// inspect or drop them.
    #[tracing::instrument(skip(self, account), fields(account_id = ?account.id()))]
    pub async fn save(&self, account: &mut FrequentFlierAccount) -> Result<Version, DomainError> {
        let changes = account.take_pending_changes();
        if changes.is_empty() {
            return Ok(account.version());
        }

        let envelopes = match changes.to_envelopes() {
            Ok(envelopes) => envelopes,
            Err(e) => {
                account.restore_pending_changes(changes);
                return Err(e);
            }
        };

        let options = AppendOptions::expect_version(changes.expected_version);
        match self.store.append(envelopes, options).await {
            Ok(version) => {
                tracing::info!(%version, count = changes.len(), "committed pending changes");
                Ok(version)
            }
            Err(e) => {
                tracing::warn!(error = %e, "commit failed, keeping pending changes");
                account.restore_pending_changes(changes);
                Err(e.into())
            }
        }
    }

    /// Opens a new account.
    #[tracing::instrument(skip(self))]
    pub async fn open_account(
        &self,
        cmd: OpenAccount,
    ) -> Result<CommandResult<FrequentFlierAccount>, DomainError> {
        let account_id = cmd.account_id.clone();
        self.execute(&cmd, |account| {
            account.open(account_id, cmd.opening_miles, cmd.opening_tier_points)
        })
        .await
    }

    /// Grants a matched status to an account.
    #[tracing::instrument(skip(self))]
    pub async fn match_status(
        &self,
        cmd: MatchStatus,
    ) -> Result<CommandResult<FrequentFlierAccount>, DomainError> {
        self.execute(&cmd, |account| account.match_status(cmd.new_status))
            .await
    }

    /// Credits a flight to an account, promoting it when the threshold is crossed.
    #[tracing::instrument(skip(self))]
    pub async fn record_flight_taken(
        &self,
        cmd: RecordFlightTaken,
    ) -> Result<CommandResult<FrequentFlierAccount>, DomainError> {
        self.execute(&cmd, |account| {
            account.record_flight_taken(cmd.miles, cmd.tier_points);
            Ok(())
        })
        .await
    }

    /// Loads the command's account, runs `command_fn` on it and commits.
    async fn execute<C, F>(
        &self,
        cmd: &C,
        command_fn: F,
    ) -> Result<CommandResult<FrequentFlierAccount>, DomainError>
    where
        C: Command<Aggregate = FrequentFlierAccount>,
        F: FnOnce(&mut FrequentFlierAccount) -> Result<(), AccountError>,
    {
        let mut account = self.load(cmd.aggregate_id()).await?;

        command_fn(&mut account)?;

        let events = account.pending_changes().to_vec();
        let new_version = self.save(&mut account).await?;

        Ok(CommandResult {
            aggregate: account,
            events,
            new_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Status;
    use crate::aggregate::DomainEvent;
    use common::SequentialIdGenerator;
    use async_trait::async_trait;
    use event_store::{EventStoreError, EventStoreExt, EventStream, InMemoryEventStore};

    /// Store whose streams never end.
    struct StalledStore;

    #[async_trait]
    impl EventStore for StalledStore {
        async fn append(
            &self,
            _events: Vec<event_store::EventEnvelope>,
            _options: AppendOptions,
        ) -> event_store::Result<Version> {
            Ok(Version::initial())
        }

        async fn read_stream(&self, _aggregate_id: &AggregateId) -> event_store::Result<EventStream> {
            Ok(Box::pin(futures_util::stream::pending()))
        }

        async fn get_aggregate_version(
            &self,
            _aggregate_id: &AggregateId,
        ) -> event_store::Result<Option<Version>> {
            Ok(None)
        }
    }

    fn create_service() -> AccountService<InMemoryEventStore> {
        AccountService::new(InMemoryEventStore::new())
            .with_id_generator(Arc::new(SequentialIdGenerator::new("evt")))
    }

    #[tokio::test]
    async fn test_open_account() {
        let service = create_service();

        let result = service
            .open_account(OpenAccount::new("acc-1", 10000, 0))
            .await
            .unwrap();

        assert_eq!(result.aggregate.id(), Some(&AggregateId::new("acc-1")));
        assert_eq!(result.aggregate.miles(), 10000);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.new_version, Version::first());
        assert!(result.aggregate.pending_changes().is_empty());
    }

    #[tokio::test]
    async fn test_open_existing_account_fails() {
        let service = create_service();
        service
            .open_account(OpenAccount::new("acc-1", 0, 0))
            .await
            .unwrap();

        let result = service.open_account(OpenAccount::new("acc-1", 0, 0)).await;
        assert!(matches!(
            result,
            Err(DomainError::Account(AccountError::AlreadyOpened { .. }))
        ));
    }

    #[tokio::test]
    async fn test_record_flight_persists_flight_and_promotion() {
        let service = create_service();
        service
            .open_account(OpenAccount::new("acc-1", 0, 18))
            .await
            .unwrap();

        let result = service
            .record_flight_taken(RecordFlightTaken::new("acc-1", 1000, 3))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), Status::Gold);
        assert_eq!(result.new_version, Version::new(3));
        let types: Vec<_> = result.events.iter().map(|e| e.event_type().to_string()).collect();
        assert_eq!(types, vec!["FlightRecorded", "PromotedToGold"]);

        let stored = service.store().read_all(&AggregateId::new("acc-1")).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].event_type, "PromotedToGold");
    }

    #[tokio::test]
    async fn test_load_existing_returns_none_for_unknown_account() {
        let service = create_service();
        let result = service
            .load_existing(&AggregateId::new("missing"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_save_without_changes_is_noop() {
        let service = create_service();
        let mut account = service.load(&AggregateId::new("missing")).await.unwrap();

        let version = service.save(&mut account).await.unwrap();
        assert_eq!(version, Version::initial());
        assert_eq!(service.store().event_count().await, 0);
    }

    #[tokio::test]
    async fn test_conflicting_save_keeps_pending_changes() {
        let service = create_service();
        let account_id = AggregateId::new("acc-1");
        service
            .open_account(OpenAccount::new("acc-1", 0, 0))
            .await
            .unwrap();

        let mut first = service.load(&account_id).await.unwrap();
        let mut second = service.load(&account_id).await.unwrap();

        first.record_flight_taken(100, 1);
        service.save(&mut first).await.unwrap();

        second.match_status(Status::Silver).unwrap();
        let result = service.save(&mut second).await;

        assert!(matches!(
            result,
            Err(DomainError::EventStore(
                EventStoreError::ConcurrencyConflict { .. }
            ))
        ));
        assert_eq!(second.pending_changes().len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_replay_times_out() {
        let service =
            AccountService::new(StalledStore).with_replay_timeout(Duration::from_millis(20));

        let result = service.load(&AggregateId::new("acc-1")).await;

        match result {
            Err(DomainError::ReplayTimeout { account_id, timeout }) => {
                assert_eq!(account_id, AggregateId::new("acc-1"));
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("expected replay timeout, got {other:?}"),
        }
    }
}
