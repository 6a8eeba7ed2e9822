//! Ledger core for collector-run susu savings groups: mobile-money SMS
//! evidence parsing, trust validation, confirmation workflows, live
//! balances, payout lifecycles and rotation scheduling, multi-tenant by
//! collector throughout.

pub mod db;
pub mod models;
pub mod services;
pub mod utils;
