//! Account commands.

use common::AggregateId;

use crate::command::Command;

use super::{FrequentFlierAccount, Status};

/// Command to open a new account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The account to open.
    pub account_id: AggregateId,

    /// Miles balance at opening.
    pub opening_miles: i64,

    /// Tier-point balance at opening.
    pub opening_tier_points: i64,
}

impl OpenAccount {
    /// Creates a new OpenAccount command.
    pub fn new(
        account_id: impl Into<AggregateId>,
        opening_miles: i64,
        opening_tier_points: i64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            opening_miles,
            opening_tier_points,
        }
    }
}

impl Command for OpenAccount {
    type Aggregate = FrequentFlierAccount;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to grant a status matched from another programme.
#[derive(Debug, Clone)]
pub struct MatchStatus {
    /// The account to update.
    pub account_id: AggregateId,

    /// The status to grant.
    pub new_status: Status,
}

impl MatchStatus {
    /// Creates a new MatchStatus command.
    pub fn new(account_id: impl Into<AggregateId>, new_status: Status) -> Self {
        Self {
            account_id: account_id.into(),
            new_status,
        }
    }
}

impl Command for MatchStatus {
    type Aggregate = FrequentFlierAccount;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to credit a flight to an account.
#[derive(Debug, Clone)]
pub struct RecordFlightTaken {
    /// The account to credit.
    pub account_id: AggregateId,

    /// Miles earned on the flight.
    pub miles: i64,

    /// Tier points earned on the flight.
    pub tier_points: i64,
}

impl RecordFlightTaken {
    /// Creates a new RecordFlightTaken command.
    pub fn new(account_id: impl Into<AggregateId>, miles: i64, tier_points: i64) -> Self {
        Self {
            account_id: account_id.into(),
            miles,
            tier_points,
        }
    }
}

impl Command for RecordFlightTaken {
    type Aggregate = FrequentFlierAccount;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}
