//! Grant period breakdown.
//!
//! A grant period runs from one grant date up to (excluding) the next. The
//! breakdown is a single forward walk over the grant dates: each period
//! opens with the previous period's carry-over plus its own new grant, and
//! approved leave starting inside the period is attributed across the open
//! lots in the policy's consumption order.
//!
//! Lots still open at a period's end date are carried out; lots whose expiry
//! falls on or before it lapse with the period and are reported as expiring.
//! A lot expiring exactly on a grant date stays usable through that day, so
//! the next period opens with it but does not count it as carry-over.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{AccrualPolicy, ConsumptionOrder};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Employee, GrantLot, LeaveRequest, LeaveStatus, PeriodKind, PeriodSummary};

use super::grant_schedule::{
    expiry_date_for, grant_date_at, grant_index_on_or_before, tenure_years_at,
};
use super::grant_table::lookup_grant_days;

/// Everything the period walk reads for one employee.
#[derive(Debug, Clone, Copy)]
pub struct LedgerSnapshot<'a> {
    /// The employee.
    pub employee: &'a Employee,
    /// The governing policy.
    pub policy: &'a AccrualPolicy,
    /// Stored lots; a stored lot's grant overrides the table value.
    pub lots: &'a [GrantLot],
    /// All of the employee's leave requests.
    pub requests: &'a [LeaveRequest],
}

/// Remaining days of one lot during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bucket {
    pub expiry_date: NaiveDate,
    pub remaining: Decimal,
}

/// A walked period with its lots before and after attribution.
///
/// `opening` and `closing` hold the same lots in the same order.
#[derive(Debug, Clone)]
pub(crate) struct WalkedPeriod {
    pub index: u32,
    pub summary: PeriodSummary,
    pub opening: Vec<Bucket>,
    pub closing: Vec<Bucket>,
}

struct Grant {
    days: Decimal,
    tenure_years: Decimal,
    expiry_date: NaiveDate,
}

fn grant_date(snapshot: &LedgerSnapshot<'_>, index: u32) -> LedgerResult<NaiveDate> {
    let join_date = snapshot.employee.join_date;
    grant_date_at(join_date, snapshot.policy, index).ok_or_else(|| LedgerError::CalculationError {
        date: join_date,
        message: format!("Grant number {} overflows the calendar", index + 1),
    })
}

fn grant_on(snapshot: &LedgerSnapshot<'_>, grant_date: NaiveDate) -> LedgerResult<Grant> {
    if let Some(lot) = snapshot.lots.iter().find(|lot| lot.grant_date == grant_date) {
        return Ok(Grant {
            days: lot.days_granted.max(Decimal::ZERO),
            tenure_years: lot.tenure_years,
            expiry_date: lot.expiry_date,
        });
    }

    let policy = snapshot.policy;
    let tenure = tenure_years_at(snapshot.employee.join_date, grant_date);
    let lookup = lookup_grant_days(&snapshot.employee.accrual_pattern, tenure, policy, 1)?;
    let expiry_date =
        expiry_date_for(grant_date, policy).ok_or_else(|| LedgerError::CalculationError {
            date: grant_date,
            message: "Lot expiry overflows the calendar".to_string(),
        })?;
    Ok(Grant {
        days: lookup.days,
        tenure_years: lookup.tenure_years,
        expiry_date,
    })
}

/// Draws `days` from the buckets still open on `on_date`.
fn attribute(buckets: &mut [Bucket], days: Decimal, on_date: NaiveDate, order: ConsumptionOrder) {
    let mut outstanding = days.max(Decimal::ZERO);
    let mut draw = |bucket: &mut Bucket| {
        if outstanding > Decimal::ZERO && on_date <= bucket.expiry_date {
            let drawn = outstanding.min(bucket.remaining);
            bucket.remaining -= drawn;
            outstanding -= drawn;
        }
    };
    match order {
        ConsumptionOrder::NewestFirst => buckets.iter_mut().rev().for_each(&mut draw),
        ConsumptionOrder::OldestFirst => buckets.iter_mut().for_each(&mut draw),
    }
}

fn sum_where(buckets: &[Bucket], keep: impl Fn(&Bucket) -> bool) -> Decimal {
    buckets
        .iter()
        .filter(|bucket| keep(bucket))
        .map(|bucket| bucket.remaining)
        .sum()
}

/// Walks every period from the first grant through `last_index`.
pub(crate) fn walk_periods(
    snapshot: &LedgerSnapshot<'_>,
    last_index: u32,
) -> LedgerResult<Vec<WalkedPeriod>> {
    let policy = snapshot.policy;
    let rounding = &policy.rounding;

    let mut requests: Vec<&LeaveRequest> = snapshot
        .requests
        .iter()
        .filter(|request| request.employee_id == snapshot.employee.id)
        .collect();
    requests.sort_by_key(|request| request.start_date);

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut walked = Vec::new();
    let mut end = grant_date(snapshot, 0)?;

    for index in 0..=last_index {
        let start = end;
        end = grant_date(snapshot, index + 1)?;

        buckets.retain(|bucket| bucket.expiry_date >= start);
        let carry_over_in = sum_where(&buckets, |bucket| bucket.expiry_date > start);

        let grant = grant_on(snapshot, start)?;
        buckets.push(Bucket {
            expiry_date: grant.expiry_date,
            remaining: grant.days,
        });
        let opening = buckets.clone();

        let mut days_used = Decimal::ZERO;
        let mut days_pending = Decimal::ZERO;
        for request in requests.iter().filter(|r| r.starts_within(start, end)) {
            match request.status {
                LeaveStatus::Approved => {
                    days_used += request.total_days;
                    attribute(
                        &mut buckets,
                        request.total_days,
                        request.start_date,
                        policy.consumption_order,
                    );
                }
                LeaveStatus::Pending => days_pending += request.total_days,
                LeaveStatus::Rejected => {}
            }
        }

        let carry_over_out = sum_where(&buckets, |bucket| bucket.expiry_date > end);
        let days_expiring = sum_where(&buckets, |bucket| {
            bucket.expiry_date > start && bucket.expiry_date <= end
        });

        walked.push(WalkedPeriod {
            index,
            summary: PeriodSummary {
                kind: PeriodKind::Current,
                start_date: start,
                end_date: end,
                grant_expiry_date: grant.expiry_date,
                tenure_years: grant.tenure_years,
                days_granted: rounding.apply(grant.days),
                carry_over_in: rounding.apply(carry_over_in),
                total_at_grant_date: rounding.apply(carry_over_in + grant.days),
                days_used: rounding.apply(days_used),
                days_pending: rounding.apply(days_pending),
                carry_over_out: rounding.apply(carry_over_out),
                days_expiring: rounding.apply(days_expiring),
            },
            opening,
            closing: buckets.clone(),
        });
    }

    Ok(walked)
}

/// Returns the period breakdown around `reference`, oldest first.
///
/// The list holds up to `max_periods_back` completed periods, the current
/// period and a projection of the next one. An employee before the first
/// grant gets only the projection of the first period.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::{LedgerSnapshot, periods_for};
/// # use leave_ledger::config::ConfigLoader;
/// use leave_ledger::models::{AccrualPattern, Employee, PeriodKind};
/// use chrono::NaiveDate;
///
/// # let policy = ConfigLoader::load("./config/leave_policy").unwrap().active_policy().unwrap();
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: "Aiko".to_string(),
///     join_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
///     accrual_pattern: AccrualPattern::FullTime,
///     policy_version: None,
/// };
/// let snapshot = LedgerSnapshot { employee: &employee, policy: &policy, lots: &[], requests: &[] };
///
/// let periods = periods_for(&snapshot, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 1).unwrap();
/// assert_eq!(periods.len(), 3);
/// assert_eq!(periods[1].kind, PeriodKind::Current);
/// assert_eq!(periods[1].carry_over_in, periods[0].carry_over_out);
/// ```
pub fn periods_for(
    snapshot: &LedgerSnapshot<'_>,
    reference: NaiveDate,
    max_periods_back: u32,
) -> LedgerResult<Vec<PeriodSummary>> {
    let join_date = snapshot.employee.join_date;
    let Some(current) = grant_index_on_or_before(join_date, snapshot.policy, reference) else {
        let mut first = walk_periods(snapshot, 0)?;
        return Ok(first
            .pop()
            .map(|period| PeriodSummary {
                kind: PeriodKind::Next,
                ..period.summary
            })
            .into_iter()
            .collect());
    };

    let walked = walk_periods(snapshot, current + 1)?;
    Ok(walked
        .into_iter()
        .filter_map(|period| {
            let kind = if period.index > current {
                PeriodKind::Next
            } else if period.index == current {
                PeriodKind::Current
            } else {
                let periods_back = current - period.index;
                if periods_back > max_periods_back {
                    return None;
                }
                PeriodKind::Previous { periods_back }
            };
            Some(PeriodSummary {
                kind,
                ..period.summary
            })
        })
        .collect())
}
