//! Boundary views of ledger results.
//!
//! Host layers hand these to their own transports. Every date appears twice:
//! `YYYY-MM-DD` under the plain field name and `YYYY/MM/DD` under a
//! `_display` suffix. Errors become an [`ErrorView`] with a stable code.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::models::{
    BalanceSource, LeaveBalance, PeriodKind, PeriodSummary, display_date, option_display_date,
};

/// Error body for host layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorView {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorView {
    /// Creates a new error view.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new error view with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Returns true if the error is caused by the caller's input rather
    /// than by configuration, storage or the ledger itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code.as_str(),
            "EMPLOYEE_NOT_FOUND"
                | "POLICY_NOT_FOUND"
                | "INVALID_DATE"
                | "INVALID_LEAVE_REQUEST"
                | "INVALID_TRANSITION"
        )
    }
}

impl From<&LedgerError> for ErrorView {
    fn from(error: &LedgerError) -> Self {
        let message = error.to_string();
        match error {
            LedgerError::ConfigNotFound { .. } | LedgerError::ConfigParseError { .. } => {
                ErrorView::new("CONFIG_ERROR", message)
            }
            LedgerError::ConfigurationMissing => ErrorView::with_details(
                "CONFIGURATION_MISSING",
                message,
                "Publish and activate an accrual policy version",
            ),
            LedgerError::PolicyNotFound { .. } => ErrorView::new("POLICY_NOT_FOUND", message),
            LedgerError::InvalidPolicy { .. } => ErrorView::new("INVALID_POLICY", message),
            LedgerError::EmployeeNotFound { .. } => ErrorView::new("EMPLOYEE_NOT_FOUND", message),
            LedgerError::UnknownAccrualPattern { .. } => ErrorView::with_details(
                "UNKNOWN_ACCRUAL_PATTERN",
                message,
                "The policy has no grant table for this working pattern",
            ),
            LedgerError::InvalidDate { .. } => ErrorView::new("INVALID_DATE", message),
            LedgerError::InvalidLeaveRequest { .. } => {
                ErrorView::new("INVALID_LEAVE_REQUEST", message)
            }
            LedgerError::InvalidTransition { .. } => ErrorView::new("INVALID_TRANSITION", message),
            LedgerError::StorageError { .. } => ErrorView::new("STORAGE_ERROR", message),
            LedgerError::CalculationError { .. } => ErrorView::new("CALCULATION_ERROR", message),
        }
    }
}

impl From<LedgerError> for ErrorView {
    fn from(error: LedgerError) -> Self {
        ErrorView::from(&error)
    }
}

/// A balance with machine and display dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    /// The employee.
    pub employee_id: String,
    /// Balance date.
    pub as_of: NaiveDate,
    /// Balance date for display.
    #[serde(with = "display_date")]
    pub as_of_display: NaiveDate,
    /// Governing policy version.
    pub policy_version: String,
    /// Carry-over plus the current grant.
    pub granted: Decimal,
    /// Approved days in the current period.
    pub used: Decimal,
    /// Pending days in the current period.
    pub pending: Decimal,
    /// Days still available.
    pub remaining: Decimal,
    /// Pending days reserved against the next period.
    pub pending_next_period: Decimal,
    /// Days lapsing at the next grant if unused.
    pub expiring_at_next_grant: Decimal,
    /// Start of the current period.
    pub current_grant_date: Option<NaiveDate>,
    /// Start of the current period for display.
    #[serde(with = "option_display_date")]
    pub current_grant_date_display: Option<NaiveDate>,
    /// Next grant date.
    pub next_grant_date: Option<NaiveDate>,
    /// Next grant date for display.
    #[serde(with = "option_display_date")]
    pub next_grant_date_display: Option<NaiveDate>,
    /// Where the figures came from.
    pub source: BalanceSource,
}

impl From<&LeaveBalance> for BalanceView {
    fn from(balance: &LeaveBalance) -> Self {
        Self {
            employee_id: balance.employee_id.clone(),
            as_of: balance.as_of,
            as_of_display: balance.as_of,
            policy_version: balance.policy_version.clone(),
            granted: balance.granted,
            used: balance.used,
            pending: balance.pending,
            remaining: balance.remaining,
            pending_next_period: balance.pending_next_period,
            expiring_at_next_grant: balance.expiring_at_next_grant,
            current_grant_date: balance.current_grant_date,
            current_grant_date_display: balance.current_grant_date,
            next_grant_date: balance.next_grant_date,
            next_grant_date_display: balance.next_grant_date,
            source: balance.source,
        }
    }
}

/// A period row with machine and display dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodView {
    /// Position relative to the reference date.
    #[serde(flatten)]
    pub kind: PeriodKind,
    /// Period start.
    pub start_date: NaiveDate,
    /// Period start for display.
    #[serde(with = "display_date")]
    pub start_date_display: NaiveDate,
    /// Period end (exclusive).
    pub end_date: NaiveDate,
    /// Period end for display.
    #[serde(with = "display_date")]
    pub end_date_display: NaiveDate,
    /// Expiry of the period's grant.
    pub grant_expiry_date: NaiveDate,
    /// Expiry of the period's grant for display.
    #[serde(with = "display_date")]
    pub grant_expiry_date_display: NaiveDate,
    /// Snapped tenure at the start.
    pub tenure_years: Decimal,
    /// Days newly granted.
    pub days_granted: Decimal,
    /// Days carried in.
    pub carry_over_in: Decimal,
    /// Carry-in plus the new grant.
    pub total_at_grant_date: Decimal,
    /// Approved days.
    pub days_used: Decimal,
    /// Pending days.
    pub days_pending: Decimal,
    /// Days carried out.
    pub carry_over_out: Decimal,
    /// Days lapsing at the end of the period.
    pub days_expiring: Decimal,
}

impl From<&PeriodSummary> for PeriodView {
    fn from(period: &PeriodSummary) -> Self {
        Self {
            kind: period.kind,
            start_date: period.start_date,
            start_date_display: period.start_date,
            end_date: period.end_date,
            end_date_display: period.end_date,
            grant_expiry_date: period.grant_expiry_date,
            grant_expiry_date_display: period.grant_expiry_date,
            tenure_years: period.tenure_years,
            days_granted: period.days_granted,
            carry_over_in: period.carry_over_in,
            total_at_grant_date: period.total_at_grant_date,
            days_used: period.days_used,
            days_pending: period.days_pending,
            carry_over_out: period.carry_over_out,
            days_expiring: period.days_expiring,
        }
    }
}
