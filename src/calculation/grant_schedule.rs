//! Grant schedule calculation.
//!
//! Grant dates follow `join + initial_grant_after_months`, then every
//! `cycle_months`. Every date is computed directly from the join date, so a
//! month-end join (e.g. 31 August) clamps to shorter months without drifting
//! in later cycles.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::config::AccrualPolicy;

/// Average days per year used for tenure.
pub const DAYS_PER_YEAR: Decimal = Decimal::from_parts(36525, 0, 0, false, 2);

const HALF_YEAR: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Returns the grant date with the given zero-based index.
///
/// `None` only if the date overflows the calendar.
pub fn grant_date_at(join_date: NaiveDate, policy: &AccrualPolicy, index: u32) -> Option<NaiveDate> {
    let rule = &policy.baseline_rule;
    let months = index
        .checked_mul(rule.cycle_months)?
        .checked_add(rule.initial_grant_after_months)?;
    join_date.checked_add_months(Months::new(months))
}

/// Returns the first grant date of an employee.
pub fn first_grant_date(join_date: NaiveDate, policy: &AccrualPolicy) -> Option<NaiveDate> {
    grant_date_at(join_date, policy, 0)
}

/// Returns the index of the latest grant date on or before `reference`.
///
/// `None` if the employee has not reached the first grant.
pub fn grant_index_on_or_before(
    join_date: NaiveDate,
    policy: &AccrualPolicy,
    reference: NaiveDate,
) -> Option<u32> {
    let first = first_grant_date(join_date, policy)?;
    if reference < first {
        return None;
    }

    // Estimate from whole calendar months, then correct for day-of-month.
    let months_since_first = (reference.year() - first.year()) * 12
        + reference.month() as i32
        - first.month() as i32;
    let cycle = policy.baseline_rule.cycle_months.max(1);
    let mut index = u32::try_from(months_since_first.max(0)).ok()? / cycle;

    while index > 0 && grant_date_at(join_date, policy, index).is_none_or(|d| d > reference) {
        index -= 1;
    }
    loop {
        match grant_date_at(join_date, policy, index + 1) {
            Some(next) if next <= reference => index += 1,
            _ => break,
        }
    }

    Some(index)
}

/// Returns the latest grant date on or before `reference`.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::previous_grant_date;
/// # use leave_ledger::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// # let policy = ConfigLoader::load("./config/leave_policy").unwrap().active_policy().unwrap();
/// let join = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(
///     previous_grant_date(join, &policy, reference),
///     NaiveDate::from_ymd_opt(2023, 10, 1)
/// );
/// ```
pub fn previous_grant_date(
    join_date: NaiveDate,
    policy: &AccrualPolicy,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    let index = grant_index_on_or_before(join_date, policy, reference)?;
    grant_date_at(join_date, policy, index)
}

/// Returns the earliest grant date strictly after `reference`.
pub fn next_grant_date(
    join_date: NaiveDate,
    policy: &AccrualPolicy,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    match grant_index_on_or_before(join_date, policy, reference) {
        Some(index) => grant_date_at(join_date, policy, index.checked_add(1)?),
        None => first_grant_date(join_date, policy),
    }
}

/// Returns every grant date on or before `reference`, oldest first.
pub fn grant_dates_up_to(
    join_date: NaiveDate,
    policy: &AccrualPolicy,
    reference: NaiveDate,
) -> Vec<NaiveDate> {
    let Some(last) = grant_index_on_or_before(join_date, policy, reference) else {
        return Vec::new();
    };
    (0..=last)
        .filter_map(|index| grant_date_at(join_date, policy, index))
        .collect()
}

/// Returns the expiry date of a lot granted on `grant_date`.
pub fn expiry_date_for(grant_date: NaiveDate, policy: &AccrualPolicy) -> Option<NaiveDate> {
    let months = policy.expiry_rule.years.checked_mul(12)?;
    grant_date.checked_add_months(Months::new(months))
}

/// Snaps a fractional tenure to its half-year table step (0.5, 1.5, ...).
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::snap_to_half_year;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let tenure = Decimal::from_str("1.5003").unwrap();
/// assert_eq!(snap_to_half_year(tenure), Decimal::from_str("1.5").unwrap());
/// ```
pub fn snap_to_half_year(tenure: Decimal) -> Decimal {
    tenure.max(Decimal::ZERO).floor() + HALF_YEAR
}

/// Tenure at `on_date`: elapsed days since joining over 365.25, snapped to
/// the half-year step.
pub fn tenure_years_at(join_date: NaiveDate, on_date: NaiveDate) -> Decimal {
    let elapsed_days = (on_date - join_date).num_days();
    snap_to_half_year(Decimal::from(elapsed_days) / DAYS_PER_YEAR)
}
