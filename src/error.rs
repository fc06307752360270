//! Error types for the leave entitlement ledger.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while resolving policies and
//! computing leave balances.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the leave entitlement ledger.
///
/// All ledger operations return this error type. Errors that concern a single
/// employee (unknown accrual pattern, missing employee record) are local to
/// that employee's query and never abort a batch computation.
///
/// # Example
///
/// ```
/// use leave_ledger::error::LedgerError;
///
/// let error = LedgerError::PolicyNotFound {
///     version: "2019-04-01".to_string(),
/// };
/// assert_eq!(error.to_string(), "Accrual policy version not found: 2019-04-01");
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No accrual policy version is active, so no balance can be computed.
    #[error("No active accrual policy is configured")]
    ConfigurationMissing,

    /// A specific policy version was requested but is not published.
    #[error("Accrual policy version not found: {version}")]
    PolicyNotFound {
        /// The requested version.
        version: String,
    },

    /// A policy document loaded but violates a structural rule.
    #[error("Invalid accrual policy '{version}': {message}")]
    InvalidPolicy {
        /// The offending policy version.
        version: String,
        /// What rule the policy breaks.
        message: String,
    },

    /// The employee is not known to the employee directory.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The employee identifier that was looked up.
        employee_id: String,
    },

    /// No grant table of the policy matches the employee's accrual pattern.
    #[error("No grant table matches accrual pattern '{pattern}' in policy '{version}'")]
    UnknownAccrualPattern {
        /// A description of the accrual pattern.
        pattern: String,
        /// The policy version that was searched.
        version: String,
    },

    /// A date string or date computation was invalid.
    #[error("Invalid date '{value}': {message}")]
    InvalidDate {
        /// The input that could not be interpreted.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// A leave request carries inconsistent data.
    #[error("Invalid leave request '{request_id}': {message}")]
    InvalidLeaveRequest {
        /// The ID of the request.
        request_id: String,
        /// A description of what made the request invalid.
        message: String,
    },

    /// A leave request status change that is not allowed.
    #[error("Leave request '{request_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        /// The ID of the request.
        request_id: String,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// The storage collaborator failed.
    #[error("Storage error: {message}")]
    StorageError {
        /// A description of the storage failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error on {date}: {message}")]
    CalculationError {
        /// The date being computed when the error occurred.
        date: NaiveDate,
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
