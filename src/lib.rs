//! Statutory Leave Entitlement Ledger
//!
//! This crate computes statutory annual paid-leave entitlements: when days
//! are granted, how many, when each grant expires, how approved and pending
//! leave reduce the balance, how balances carry between grant periods, and
//! which employees risk missing their mandatory minimum consumption.
//!
//! Accrual rules live in versioned YAML policies loaded by
//! [`config::ConfigLoader`]; the pure computations are in [`calculation`],
//! and [`service::LedgerService`] ties them to the storage seams in
//! [`store`].

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;
