//! Balance, period breakdown and alert result models.
//!
//! These are the outputs of the balance aggregator. All day quantities are
//! already rounded to the governing policy's unit.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the figures of a [`LeaveBalance`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// Computed from grant lots and leave requests.
    Lots,
    /// Taken from the legacy balance source during migration.
    Legacy,
    /// The employee has not reached a first grant.
    NoGrant,
}

/// Balance figures imported from a pre-ledger system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBalance {
    /// Days granted according to the legacy system.
    pub granted: Decimal,
    /// Days used according to the legacy system.
    pub used: Decimal,
    /// Days remaining according to the legacy system.
    pub remaining: Decimal,
}

impl LegacyBalance {
    /// Returns true if any of the totals is non-zero.
    pub fn has_entitlement(&self) -> bool {
        !(self.granted.is_zero() && self.used.is_zero() && self.remaining.is_zero())
    }
}

/// Pending days split by the grant period they fall into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSplit {
    /// Pending days starting before the next grant date.
    pub current_period: Decimal,
    /// Pending days starting on or after the next grant date.
    pub next_period: Decimal,
}

impl PendingSplit {
    /// Total pending days across both periods.
    pub fn total(&self) -> Decimal {
        self.current_period + self.next_period
    }
}

/// An employee's leave balance as of a date.
///
/// `remaining` is always `max(0, granted - used - pending)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// The employee.
    pub employee_id: String,
    /// The date the balance describes.
    pub as_of: NaiveDate,
    /// Policy version that governed the computation.
    pub policy_version: String,
    /// Carry-over plus the current grant.
    pub granted: Decimal,
    /// Approved days in the current grant period.
    pub used: Decimal,
    /// Pending days in the current grant period.
    pub pending: Decimal,
    /// Days still available.
    pub remaining: Decimal,
    /// Pending days reserved against the next grant period.
    pub pending_next_period: Decimal,
    /// Start of the current grant period.
    pub current_grant_date: Option<NaiveDate>,
    /// Start of the next grant period.
    pub next_grant_date: Option<NaiveDate>,
    /// Carried-over days that lapse at the next grant if still unused.
    pub expiring_at_next_grant: Decimal,
    /// Where the figures came from.
    pub source: BalanceSource,
}

impl LeaveBalance {
    /// An all-zero balance for an employee before the first grant.
    pub fn before_first_grant(
        employee_id: &str,
        as_of: NaiveDate,
        policy_version: &str,
        next_grant_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            as_of,
            policy_version: policy_version.to_string(),
            granted: Decimal::ZERO,
            used: Decimal::ZERO,
            pending: Decimal::ZERO,
            remaining: Decimal::ZERO,
            pending_next_period: Decimal::ZERO,
            current_grant_date: None,
            next_grant_date,
            expiring_at_next_grant: Decimal::ZERO,
            source: BalanceSource::NoGrant,
        }
    }
}

/// Position of a period relative to the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodKind {
    /// The period containing the reference date.
    Current,
    /// A completed period, `periods_back` steps before the current one.
    Previous {
        /// Distance from the current period (1 = last period).
        periods_back: u32,
    },
    /// The upcoming period, projected from today's figures.
    Next,
}

/// One grant period of an employee's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Position relative to the reference date.
    pub kind: PeriodKind,
    /// Grant date that opens the period.
    pub start_date: NaiveDate,
    /// Grant date that closes the period (exclusive).
    pub end_date: NaiveDate,
    /// Expiry date of the lot granted at `start_date`.
    pub grant_expiry_date: NaiveDate,
    /// Snapped tenure at `start_date`.
    pub tenure_years: Decimal,
    /// Days newly granted at `start_date`.
    pub days_granted: Decimal,
    /// Days carried in from the previous period.
    pub carry_over_in: Decimal,
    /// Carry-over plus the new grant.
    pub total_at_grant_date: Decimal,
    /// Approved days starting within the period.
    pub days_used: Decimal,
    /// Pending days starting within the period.
    pub days_pending: Decimal,
    /// Days carried into the next period.
    pub carry_over_out: Decimal,
    /// Carried-in days that lapse unused at the end of the period.
    pub days_expiring: Decimal,
}

/// A checkpoint whose consumption minimum is not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointHit {
    /// Window width of the checkpoint, in months before the next grant.
    pub months_before_next_grant: u32,
    /// Days that should have been consumed.
    pub min_consumed_days: Decimal,
    /// Days still missing to reach the minimum.
    pub shortfall: Decimal,
}

/// Mandatory-consumption evaluation for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAlert {
    /// The employee.
    pub employee_id: String,
    /// Policy version that governed the evaluation.
    pub policy_version: String,
    /// Evaluation date.
    pub as_of: NaiveDate,
    /// Grant date of the most recent lot.
    pub latest_grant_date: NaiveDate,
    /// Days granted by the most recent lot.
    pub latest_grant_days: Decimal,
    /// Approved days in the current period.
    pub used_this_period: Decimal,
    /// Deadline of the current consumption obligation.
    pub next_grant_date: NaiveDate,
    /// Days missing to the statutory annual minimum (0 when met).
    pub legal_minimum_shortfall: Decimal,
    /// Checkpoints currently triggered.
    pub triggered_checkpoints: Vec<CheckpointHit>,
    /// True if any checkpoint is triggered.
    pub flagged: bool,
}

/// An employee whose evaluation failed during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFailure {
    /// The employee.
    pub employee_id: String,
    /// The error rendered as text.
    pub message: String,
}

/// Result of evaluating alerts for every employee under a policy version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertBatch {
    /// Correlation id for the run, also present in log fields.
    pub correlation_id: Uuid,
    /// Policy version evaluated.
    pub policy_version: String,
    /// Evaluation date.
    pub as_of: NaiveDate,
    /// Number of employees evaluated.
    pub evaluated: usize,
    /// Flagged employees.
    pub alerts: Vec<EmployeeAlert>,
    /// Employees whose evaluation failed.
    pub failures: Vec<EmployeeFailure>,
}
