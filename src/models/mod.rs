//! Data models for the susu ledger services
//!
//! This module organizes the persisted entities, status enums and listing
//! structs shared across the service layer. Result structs that only one
//! service produces live next to that service instead.

pub mod balance;
pub mod client;
pub mod collector;
pub mod page;
pub mod payout;
pub mod schedule;
pub mod transaction;

// Re-export commonly used types for convenience
pub use balance::ClientBalance;
pub use client::Client;
pub use collector::Collector;
pub use page::Page;
pub use payout::{Payout, PayoutListItem, PayoutStatus, PayoutType};
pub use schedule::{
    ClientScheduleSummary, PositionAssignment, PositionedClient, RotationSchedule, ScheduleEntry,
};
pub use transaction::{
    FlagSeverity, SubmissionType, Transaction, TransactionFeedItem, TransactionStatus, TrustLevel,
    ValidationFlag,
};
