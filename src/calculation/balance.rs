//! Balance aggregation.
//!
//! A balance is read from the current grant period of the period walk.
//! Only lots still live on the query date count: `granted` is what those
//! lots opened the period with, `used` the period's approved days less the
//! draws on lots that have since expired, and `pending` the pending days
//! before the next grant.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::RoundingRule;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    BalanceSource, LeaveBalance, LeaveRequest, LeaveStatus, LegacyBalance, PendingSplit,
};

use super::grant_schedule::{grant_index_on_or_before, next_grant_date};
use super::periods::{LedgerSnapshot, walk_periods};

/// Splits pending days around the next grant date.
///
/// Pending requests starting on or after `next_grant_date` are reserved
/// against the next period and do not reduce the current balance. Without a
/// next grant date every pending day counts against the current period.
pub fn pending_split(requests: &[LeaveRequest], next_grant_date: Option<NaiveDate>) -> PendingSplit {
    requests
        .iter()
        .filter(|request| request.status == LeaveStatus::Pending)
        .fold(PendingSplit::default(), |mut split, request| {
            match next_grant_date {
                Some(next) if request.start_date >= next => split.next_period += request.total_days,
                _ => split.current_period += request.total_days,
            }
            split
        })
}

/// Computes an employee's balance on `as_of` from lots and requests.
///
/// Before the first grant the balance is all zero with the first grant date
/// as `next_grant_date`.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::{LedgerSnapshot, balance_as_of};
/// # use leave_ledger::config::ConfigLoader;
/// use leave_ledger::models::{AccrualPattern, Employee};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// # let policy = ConfigLoader::load("./config/leave_policy").unwrap().active_policy().unwrap();
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: "Aiko".to_string(),
///     join_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     accrual_pattern: AccrualPattern::FullTime,
///     policy_version: None,
/// };
/// let snapshot = LedgerSnapshot { employee: &employee, policy: &policy, lots: &[], requests: &[] };
///
/// let balance = balance_as_of(&snapshot, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()).unwrap();
/// assert_eq!(balance.remaining, Decimal::ZERO);
/// assert_eq!(balance.next_grant_date, NaiveDate::from_ymd_opt(2025, 7, 1));
/// ```
pub fn balance_as_of(snapshot: &LedgerSnapshot<'_>, as_of: NaiveDate) -> LedgerResult<LeaveBalance> {
    let employee = snapshot.employee;
    let policy = snapshot.policy;
    let rounding = &policy.rounding;

    let Some(current) = grant_index_on_or_before(employee.join_date, policy, as_of) else {
        let next = next_grant_date(employee.join_date, policy, as_of);
        debug!(
            employee_id = %employee.id,
            as_of = %as_of,
            "Employee has not reached the first grant"
        );
        return Ok(LeaveBalance::before_first_grant(
            &employee.id,
            as_of,
            &policy.version,
            next,
        ));
    };

    let walked = walk_periods(snapshot, current)?;
    let period = walked.last().ok_or_else(|| LedgerError::CalculationError {
        date: as_of,
        message: "Period walk produced no current period".to_string(),
    })?;
    let summary = &period.summary;

    let mut granted = Decimal::ZERO;
    let mut drawn_from_expired = Decimal::ZERO;
    for (opening, closing) in period.opening.iter().zip(&period.closing) {
        if as_of <= opening.expiry_date {
            granted += opening.remaining;
        } else {
            drawn_from_expired += opening.remaining - closing.remaining;
        }
    }
    let granted = rounding.apply(granted);
    let used = rounding.apply((summary.days_used - drawn_from_expired).max(Decimal::ZERO));
    let split = pending_split(snapshot.requests, Some(summary.end_date));
    let pending = rounding.apply(split.current_period);
    let remaining = (granted - used - pending).max(Decimal::ZERO);

    Ok(LeaveBalance {
        employee_id: employee.id.clone(),
        as_of,
        policy_version: policy.version.clone(),
        granted,
        used,
        pending,
        remaining,
        pending_next_period: rounding.apply(split.next_period),
        current_grant_date: Some(summary.start_date),
        next_grant_date: Some(summary.end_date),
        expiring_at_next_grant: summary.days_expiring,
        source: BalanceSource::Lots,
    })
}

/// Chooses between the lot-based balance and a legacy balance.
///
/// The legacy figures are used only when the lot-based balance granted
/// nothing and the legacy record holds a non-zero total. Pending days always
/// come from the ledger.
pub fn resolve_balance(
    computed: LeaveBalance,
    legacy: Option<LegacyBalance>,
    rounding: &RoundingRule,
) -> LeaveBalance {
    if !computed.granted.is_zero() {
        return computed;
    }
    let Some(legacy) = legacy.filter(LegacyBalance::has_entitlement) else {
        return computed;
    };

    let granted = rounding.apply(legacy.granted);
    let used = rounding.apply(legacy.used);
    let remaining = (granted - used - computed.pending).max(Decimal::ZERO);
    info!(
        employee_id = %computed.employee_id,
        as_of = %computed.as_of,
        legacy_granted = %granted,
        legacy_used = %used,
        "Lot-based balance is empty, falling back to legacy balance"
    );

    LeaveBalance {
        granted,
        used,
        remaining,
        source: BalanceSource::Legacy,
        ..computed
    }
}
