//! Core data models for the leave entitlement ledger.
//!
//! This module contains all the domain models used throughout the ledger.

mod audit;
mod balance;
mod calendar_date;
mod employee;
mod grant_lot;
mod leave_request;

pub use audit::AuditStep;
pub use balance::{
    AlertBatch, BalanceSource, CheckpointHit, EmployeeAlert, EmployeeFailure, LeaveBalance,
    LegacyBalance, PendingSplit, PeriodKind, PeriodSummary,
};
pub use calendar_date::{
    DISPLAY_DATE_FORMAT, MACHINE_DATE_FORMAT, display_date, option_display_date,
    parse_calendar_date, to_display_format, to_machine_format,
};
pub use employee::{AccrualPattern, Employee};
pub use grant_lot::{GrantLot, IntegrityFault, IntegrityFaultKind, LotKey};
pub use leave_request::{LeaveRequest, LeaveStatus};
