//! Accrual policy configuration for the leave ledger.
//!
//! This module loads versioned accrual policy documents from YAML files and
//! resolves them by version, with the active version as the default.
//!
//! # Example
//!
//! ```no_run
//! use leave_ledger::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/leave_policy").unwrap();
//! println!("Active policy: {:?}", loader.registry().active_version());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AccrualPolicy, ActivePolicyPointer, AlertCheckpoint, BaselineRule, BeyondTable,
    ConsumptionOrder, ExpiryRule, GrantTableRow, PartTimeTable, PolicyRegistry, RoundingMode,
    RoundingRule, SUPPORTED_SCHEMA_VERSION, WorkdayRange,
};
