//! Employee model and accrual patterns.
//!
//! The ledger treats employees as read-only input: it consumes the join date,
//! the accrual pattern and an optional policy pin, and never writes back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which grant table governs an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccrualPattern {
    /// Standard full-time schedule.
    FullTime,
    /// Reduced schedule granted from a proportional table.
    PartTime {
        /// Scheduled working days per week.
        weekly_days: u8,
        /// Scheduled working days per year, for irregular weekly patterns.
        #[serde(default)]
        annual_workdays: Option<u16>,
    },
}

impl fmt::Display for AccrualPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccrualPattern::FullTime => write!(f, "full_time"),
            AccrualPattern::PartTime {
                weekly_days,
                annual_workdays: Some(annual),
            } => write!(f, "part_time({weekly_days} days/week, {annual} days/year)"),
            AccrualPattern::PartTime { weekly_days, .. } => {
                write!(f, "part_time({weekly_days} days/week)")
            }
        }
    }
}

/// Represents an employee whose leave entitlement is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// The date the employee joined.
    pub join_date: NaiveDate,
    /// Which grant table applies.
    pub accrual_pattern: AccrualPattern,
    /// Pins a policy version; `None` follows the active version.
    #[serde(default)]
    pub policy_version: Option<String>,
}

impl Employee {
    /// Returns true if the employee accrues on the full-time table.
    ///
    /// # Examples
    ///
    /// ```
    /// use leave_ledger::models::{AccrualPattern, Employee};
    /// use chrono::NaiveDate;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     name: "Aiko Tanaka".to_string(),
    ///     join_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
    ///     accrual_pattern: AccrualPattern::FullTime,
    ///     policy_version: None,
    /// };
    /// assert!(employee.is_full_time());
    /// ```
    pub fn is_full_time(&self) -> bool {
        self.accrual_pattern == AccrualPattern::FullTime
    }

    /// Returns true if the employee follows the given policy version, with
    /// unpinned employees following `active_version`.
    pub fn governed_by(&self, version: &str, active_version: Option<&str>) -> bool {
        match self.policy_version.as_deref() {
            Some(pinned) => pinned == version,
            None => active_version == Some(version),
        }
    }
}
