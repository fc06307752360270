//! Grant lot model.
//!
//! A [`GrantLot`] is the batch of leave days granted at one accrual event.
//! Lots are created once per (employee, grant date) and afterwards only their
//! remaining balance changes, downward, as approved leave is consumed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage uniqueness key of a lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LotKey {
    /// Owning employee.
    pub employee_id: String,
    /// Grant date of the lot.
    pub grant_date: NaiveDate,
}

/// A dated batch of granted leave days with its own expiry.
///
/// # Example
///
/// ```
/// use leave_ledger::models::GrantLot;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let lot = GrantLot {
///     id: Uuid::new_v4(),
///     employee_id: "emp_001".to_string(),
///     policy_version: "2024-04-01".to_string(),
///     grant_date: NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
///     expiry_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
///     tenure_years: Decimal::new(5, 1),
///     days_granted: Decimal::TEN,
///     days_remaining: Decimal::new(6, 0),
/// };
///
/// assert!(!lot.is_expired(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
/// assert!(lot.is_expired(NaiveDate::from_ymd_opt(2025, 10, 2).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantLot {
    /// Unique identifier of the lot.
    pub id: Uuid,
    /// Owning employee.
    pub employee_id: String,
    /// Policy version that produced the grant.
    pub policy_version: String,
    /// Date the days were granted.
    pub grant_date: NaiveDate,
    /// Last date on which the days may be used.
    pub expiry_date: NaiveDate,
    /// Snapped tenure used for the table lookup.
    pub tenure_years: Decimal,
    /// Days granted at the grant date.
    pub days_granted: Decimal,
    /// Days not yet consumed.
    pub days_remaining: Decimal,
}

impl GrantLot {
    /// Returns the storage uniqueness key.
    pub fn key(&self) -> LotKey {
        LotKey {
            employee_id: self.employee_id.clone(),
            grant_date: self.grant_date,
        }
    }

    /// A lot is expired strictly after its expiry date.
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        as_of > self.expiry_date
    }

    /// A lot is active once granted and until it expires.
    pub fn is_active(&self, as_of: NaiveDate) -> bool {
        self.grant_date <= as_of && !self.is_expired(as_of)
    }

    /// Remaining days clamped into `0..=days_granted`.
    pub fn clamped_remaining(&self) -> Decimal {
        self.days_remaining
            .min(self.days_granted)
            .max(Decimal::ZERO)
    }

    /// Days consumed so far, derived from the clamped remaining balance.
    pub fn days_consumed(&self) -> Decimal {
        self.days_granted.max(Decimal::ZERO) - self.clamped_remaining()
    }
}

/// The kind of inconsistency found in a stored lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityFaultKind {
    /// More days remain than were ever granted.
    RemainingExceedsGranted,
    /// The remaining balance is below zero.
    NegativeRemaining,
}

/// A lot whose stored state violates `0 <= remaining <= granted`.
///
/// Faults are clamped on read and reported for investigation; they never
/// surface as user-facing errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFault {
    /// Owning employee.
    pub employee_id: String,
    /// Grant date of the faulty lot.
    pub grant_date: NaiveDate,
    /// Stored granted days.
    pub days_granted: Decimal,
    /// Stored remaining days.
    pub days_remaining: Decimal,
    /// What is wrong.
    pub kind: IntegrityFaultKind,
}
