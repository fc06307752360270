//! Leave request model and its status lifecycle.
//!
//! Requests are created by the (external) submission flow in the `Pending`
//! state and move exactly once to `Approved` or `Rejected`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RoundingRule;
use crate::error::{LedgerError, LedgerResult};

/// Status of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Submitted, awaiting a decision. Reserves days without consuming them.
    Pending,
    /// Approved. Consumes days from the employee's lots.
    Approved,
    /// Rejected. No ledger effect.
    Rejected,
}

impl LeaveStatus {
    /// Returns true for the terminal states.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A request to take paid leave.
///
/// # Example
///
/// ```
/// use leave_ledger::models::{LeaveRequest, LeaveStatus};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut request = LeaveRequest {
///     id: "req_001".to_string(),
///     employee_id: "emp_001".to_string(),
///     start_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
///     total_days: Decimal::TWO,
///     status: LeaveStatus::Pending,
/// };
///
/// request.approve().unwrap();
/// assert_eq!(request.status, LeaveStatus::Approved);
/// assert!(request.reject().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: String,
    /// The requesting employee.
    pub employee_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Days requested, already rounded to the policy unit.
    pub total_days: Decimal,
    /// Current status.
    pub status: LeaveStatus,
}

impl LeaveRequest {
    /// Checks date order and that `total_days` is a positive multiple of the
    /// rounding unit.
    pub fn validate(&self, rounding: &RoundingRule) -> LedgerResult<()> {
        if self.end_date < self.start_date {
            return Err(self.invalid(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        if self.total_days <= Decimal::ZERO {
            return Err(self.invalid("total_days must be positive"));
        }
        if !rounding.is_aligned(self.total_days) {
            return Err(self.invalid(format!(
                "total_days {} is not a multiple of {}",
                self.total_days, rounding.unit
            )));
        }
        Ok(())
    }

    /// Moves the request from `Pending` to `Approved`.
    pub fn approve(&mut self) -> LedgerResult<()> {
        self.transition(LeaveStatus::Approved)
    }

    /// Moves the request from `Pending` to `Rejected`.
    pub fn reject(&mut self) -> LedgerResult<()> {
        self.transition(LeaveStatus::Rejected)
    }

    /// Returns true if the request starts within `[start, end)`.
    pub fn starts_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date >= start && self.start_date < end
    }

    fn transition(&mut self, to: LeaveStatus) -> LedgerResult<()> {
        if self.status.is_terminal() {
            return Err(LedgerError::InvalidTransition {
                request_id: self.id.clone(),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> LedgerError {
        LedgerError::InvalidLeaveRequest {
            request_id: self.id.clone(),
            message: message.into(),
        }
    }
}
