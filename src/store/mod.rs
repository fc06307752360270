//! Storage seams of the ledger.
//!
//! The ledger computes on demand over four kinds of data: grant lots, the
//! employee directory, leave requests and (during migration) legacy balances.
//! Each is reached through a `Send + Sync` trait so hosts can plug in their
//! own storage; [`InMemoryStore`] implements all of them.

mod memory;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calculation::UsageApplication;
use crate::config::{ConsumptionOrder, RoundingRule};
use crate::error::LedgerResult;
use crate::models::{Employee, GrantLot, LeaveRequest, LegacyBalance};

pub use memory::InMemoryStore;

/// Outcome of a conflict-tolerant lot insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The lot was stored.
    Inserted,
    /// A lot with the same key already existed and was kept unchanged.
    AlreadyPresent,
}

/// Storage of grant lots, unique per (employee id, grant date).
pub trait LotStore: Send + Sync {
    /// Returns all lots of an employee, oldest grant first.
    fn lots_for(&self, employee_id: &str) -> LedgerResult<Vec<GrantLot>>;

    /// Inserts a lot unless one with the same key exists.
    ///
    /// A duplicate key is not an error: the stored lot, including its
    /// `days_remaining`, is left as it is.
    fn insert_if_absent(&self, lot: GrantLot) -> LedgerResult<InsertOutcome>;

    /// Atomically attributes `days` across the employee's lots active on
    /// `on_date`, in `order`.
    ///
    /// Planning and writing happen as one step, so concurrent callers each
    /// see the other's draws. Days no lot can cover come back as
    /// unattributed.
    fn consume_in_order(
        &self,
        employee_id: &str,
        on_date: NaiveDate,
        days: Decimal,
        order: ConsumptionOrder,
        rounding: &RoundingRule,
    ) -> LedgerResult<UsageApplication>;
}

/// Read-only access to employee records.
pub trait EmployeeDirectory: Send + Sync {
    /// Looks up one employee.
    fn employee(&self, employee_id: &str) -> LedgerResult<Option<Employee>>;

    /// Lists every employee.
    fn employees(&self) -> LedgerResult<Vec<Employee>>;
}

/// Storage of leave requests.
pub trait LeaveRequestStore: Send + Sync {
    /// Returns all requests of an employee, in start-date order.
    fn requests_for(&self, employee_id: &str) -> LedgerResult<Vec<LeaveRequest>>;

    /// Looks up one request.
    fn request(&self, request_id: &str) -> LedgerResult<Option<LeaveRequest>>;

    /// Inserts or replaces a request.
    fn save(&self, request: LeaveRequest) -> LedgerResult<()>;
}

/// Balances carried over from a pre-ledger system.
pub trait LegacyBalanceSource: Send + Sync {
    /// Returns the legacy balance of an employee, if one was imported.
    fn legacy_balance(&self, employee_id: &str) -> LedgerResult<Option<LegacyBalance>>;
}
