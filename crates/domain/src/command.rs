//! Command plumbing shared by the account operations.

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;

/// Outcome of a committed command.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// State after the new events were folded in, with nothing pending.
    pub aggregate: A,

    /// What the command recorded, in commit order. May be empty.
    pub events: Vec<A::Event>,

    /// Stream version after the commit.
    pub new_version: Version,
}

/// A request addressed to exactly one aggregate stream.
pub trait Command: Send + Sync {
    type Aggregate: Aggregate;

    /// Stream the command is loaded against and committed to.
    fn aggregate_id(&self) -> &AggregateId;
}
