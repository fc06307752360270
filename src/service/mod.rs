//! Ledger service facade and boundary views.
//!
//! This module exposes [`LedgerService`], the entry point hosts call for
//! balances, period breakdowns, alerts and leave decisions, and the view
//! types those hosts serialize.

mod ledger_service;
pub mod views;

pub use ledger_service::LedgerService;
pub use views::{BalanceView, ErrorView, PeriodView};
