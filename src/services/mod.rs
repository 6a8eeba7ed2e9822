//! Service layer. Every ledger operation callers may invoke lives here;
//! the db layer below it never enforces business rules on its own.

pub mod balance_service;
pub mod dashboard_service;
pub mod notifier;
pub mod payout_service;
pub mod schedule_service;
pub mod sms_parser;
pub mod transaction_service;
pub mod validator;
