//! Frequent-flier account aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod status;

pub use aggregate::{FrequentFlierAccount, GOLD_TIER_POINTS_THRESHOLD, PendingChanges};
pub use commands::*;
pub use events::{
    AccountEvent, AccountOpened, FlightRecorded, PromotedToGold, StatusMatched, UnrecognizedEvent,
};
pub use service::AccountService;
pub use status::Status;

use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The account has already been opened.
    #[error("Account already opened: {account_id}")]
    AlreadyOpened { account_id: String },

    /// The operation needs an opened account.
    #[error("Account has not been opened")]
    NotOpened,
}
