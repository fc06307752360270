//! Grant lot ledger.
//!
//! This module creates grant lots at grant-date boundaries, attributes
//! approved leave across a period's lots and reads lots back with expiry and
//! integrity clamping applied.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AccrualPolicy, ConsumptionOrder, RoundingRule};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AuditStep, Employee, GrantLot, IntegrityFault, IntegrityFaultKind};
use crate::store::{InsertOutcome, LotStore};

use super::grant_schedule::{expiry_date_for, grant_dates_up_to, tenure_years_at};
use super::grant_table::lookup_grant_days;

/// Tracing target for data-integrity reports.
pub const INTEGRITY_TARGET: &str = "leave_ledger::integrity";

/// Result of materializing an employee's lots.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    /// Lots inserted by this call.
    pub created: usize,
    /// Grant dates whose lot already existed.
    pub existing: usize,
    /// One audit step per inserted lot.
    pub audit_steps: Vec<AuditStep>,
}

/// Days drawn from one lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotDraw {
    /// Grant date of the lot drawn from.
    pub grant_date: NaiveDate,
    /// Days drawn.
    pub days: Decimal,
}

/// How an amount of approved leave was attributed across lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageApplication {
    /// Days to attribute, rounded per policy.
    pub requested: Decimal,
    /// Days the lots covered.
    pub applied: Decimal,
    /// Days no lot could cover.
    pub unattributed: Decimal,
    /// Individual draws, in attribution order.
    pub draws: Vec<LotDraw>,
}

/// Builds the lot for one grant date, without storing it.
pub fn build_lot(
    employee: &Employee,
    policy: &AccrualPolicy,
    grant_date: NaiveDate,
    step_number: u32,
) -> LedgerResult<(GrantLot, AuditStep)> {
    let tenure = tenure_years_at(employee.join_date, grant_date);
    let lookup = lookup_grant_days(&employee.accrual_pattern, tenure, policy, step_number)?;
    let expiry_date =
        expiry_date_for(grant_date, policy).ok_or_else(|| LedgerError::CalculationError {
            date: grant_date,
            message: format!(
                "Expiry of {} years overflows the calendar",
                policy.expiry_rule.years
            ),
        })?;

    let lot = GrantLot {
        id: Uuid::new_v4(),
        employee_id: employee.id.clone(),
        policy_version: policy.version.clone(),
        grant_date,
        expiry_date,
        tenure_years: lookup.tenure_years,
        days_granted: lookup.days,
        days_remaining: lookup.days,
    };
    Ok((lot, lookup.audit_step))
}

/// Ensures one lot exists per grant date on or before `reference`.
///
/// Safe to call repeatedly and concurrently: existing lots are never
/// rebuilt, and an insert racing another caller's insert for the same grant
/// date is absorbed by the store.
pub fn materialize_lots_up_to(
    store: &dyn LotStore,
    employee: &Employee,
    policy: &AccrualPolicy,
    reference: NaiveDate,
) -> LedgerResult<MaterializeOutcome> {
    let existing_dates: Vec<NaiveDate> = store
        .lots_for(&employee.id)?
        .iter()
        .map(|lot| lot.grant_date)
        .collect();

    let mut outcome = MaterializeOutcome::default();
    for grant_date in grant_dates_up_to(employee.join_date, policy, reference) {
        if existing_dates.contains(&grant_date) {
            outcome.existing += 1;
            continue;
        }

        let step_number = outcome.audit_steps.len() as u32 + 1;
        let (lot, audit_step) = build_lot(employee, policy, grant_date, step_number)?;
        debug!(
            employee_id = %employee.id,
            grant_date = %grant_date,
            days_granted = %lot.days_granted,
            "Materializing lot"
        );
        match store.insert_if_absent(lot)? {
            InsertOutcome::Inserted => {
                outcome.created += 1;
                outcome.audit_steps.push(audit_step);
            }
            InsertOutcome::AlreadyPresent => outcome.existing += 1,
        }
    }

    if outcome.created > 0 {
        info!(
            employee_id = %employee.id,
            version = %policy.version,
            created = outcome.created,
            existing = outcome.existing,
            "Materialized grant lots"
        );
    }
    Ok(outcome)
}

/// Attributes `used` days across a period's active lots.
///
/// Lots are drawn in `order` by grant date. Each lot keeps
/// `0 <= days_remaining <= days_granted`; whatever the lots cannot cover is
/// returned as unattributed instead of driving a balance negative.
pub fn apply_approved_usage(
    lots: &mut [GrantLot],
    used: Decimal,
    order: ConsumptionOrder,
    rounding: &RoundingRule,
) -> UsageApplication {
    let requested = rounding.apply(used.max(Decimal::ZERO));

    let mut indices: Vec<usize> = (0..lots.len()).collect();
    match order {
        ConsumptionOrder::NewestFirst => {
            indices.sort_by(|a, b| lots[*b].grant_date.cmp(&lots[*a].grant_date))
        }
        ConsumptionOrder::OldestFirst => {
            indices.sort_by(|a, b| lots[*a].grant_date.cmp(&lots[*b].grant_date))
        }
    }

    let mut outstanding = requested;
    let mut draws = Vec::new();
    for index in indices {
        if outstanding <= Decimal::ZERO {
            break;
        }
        let lot = &mut lots[index];
        let available = lot.clamped_remaining();
        let drawn = outstanding.min(available);
        lot.days_remaining = rounding.apply(available - drawn);
        if drawn > Decimal::ZERO {
            outstanding -= drawn;
            draws.push(LotDraw {
                grant_date: lot.grant_date,
                days: drawn,
            });
        }
    }

    let applied = requested - outstanding;
    if outstanding > Decimal::ZERO {
        warn!(
            requested = %requested,
            unattributed = %outstanding,
            "Approved usage exceeds the remaining days of active lots"
        );
    }

    UsageApplication {
        requested,
        applied,
        unattributed: outstanding,
        draws,
    }
}

/// Days a lot contributes to a balance on `as_of`.
///
/// Zero before the grant date and after expiry; otherwise the stored
/// remaining balance clamped into `0..=days_granted`.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::remaining_as_of;
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
/// assert_eq!(remaining_as_of(&lot, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()), Decimal::new(6, 0));
/// assert_eq!(remaining_as_of(&lot, NaiveDate::from_ymd_opt(2025, 10, 2).unwrap()), Decimal::ZERO);
/// ```
pub fn remaining_as_of(lot: &GrantLot, as_of: NaiveDate) -> Decimal {
    if lot.is_active(as_of) {
        lot.clamped_remaining()
    } else {
        Decimal::ZERO
    }
}

/// Checks a stored lot against `0 <= days_remaining <= days_granted`.
///
/// A fault is logged on the [`INTEGRITY_TARGET`] target and returned; the
/// lot itself is left for investigation.
pub fn check_integrity(lot: &GrantLot) -> Option<IntegrityFault> {
    let kind = if lot.days_remaining < Decimal::ZERO {
        IntegrityFaultKind::NegativeRemaining
    } else if lot.days_remaining > lot.days_granted {
        IntegrityFaultKind::RemainingExceedsGranted
    } else {
        return None;
    };

    warn!(
        target: INTEGRITY_TARGET,
        employee_id = %lot.employee_id,
        grant_date = %lot.grant_date,
        days_granted = %lot.days_granted,
        days_remaining = %lot.days_remaining,
        kind = ?kind,
        "Grant lot violates its balance bounds; clamping on read"
    );

    Some(IntegrityFault {
        employee_id: lot.employee_id.clone(),
        grant_date: lot.grant_date,
        days_granted: lot.days_granted,
        days_remaining: lot.days_remaining,
        kind,
    })
}
