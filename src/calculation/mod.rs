//! Calculation logic for the leave entitlement ledger.
//!
//! This module contains the pure ledger computations: grant dates and tenure,
//! grant table lookup, lot materialization and usage attribution, the period
//! walk, balances and mandatory-consumption alerts. Every function takes the
//! governing [`AccrualPolicy`](crate::config::AccrualPolicy) explicitly.

mod alerts;
mod balance;
mod grant_schedule;
mod grant_table;
mod lot_ledger;
mod periods;

pub use alerts::{checkpoint_triggered, evaluate_alert};
pub use balance::{balance_as_of, pending_split, resolve_balance};
pub use grant_schedule::{
    DAYS_PER_YEAR, expiry_date_for, first_grant_date, grant_date_at, grant_dates_up_to,
    grant_index_on_or_before, next_grant_date, previous_grant_date, snap_to_half_year,
    tenure_years_at,
};
pub use grant_table::{
    FULL_TIME_GRANT_CLAUSE, GrantTableLookup, PART_TIME_GRANT_CLAUSE, TableSource,
    days_for_tenure, lookup_grant_days, select_table,
};
pub use lot_ledger::{
    INTEGRITY_TARGET, LotDraw, MaterializeOutcome, UsageApplication, apply_approved_usage,
    build_lot, check_integrity, materialize_lots_up_to, remaining_as_of,
};
pub use periods::{LedgerSnapshot, periods_for};
