//! Domain layer for the frequent-flier event-sourcing system.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandResult for command processing
//! - FrequentFlierAccount aggregate with its events and promotion rule

pub mod account;
pub mod aggregate;
pub mod command;
pub mod error;

pub use account::{
    AccountError, AccountEvent, AccountService, FrequentFlierAccount, GOLD_TIER_POINTS_THRESHOLD,
    MatchStatus, OpenAccount, PendingChanges, RecordFlightTaken, Status,
};
pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandResult};
pub use error::DomainError;
