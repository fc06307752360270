//! Mandatory-consumption alerts.
//!
//! The statutory obligation to take a minimum number of days attaches to
//! each grant, so only the most recent lot is checked, never the running
//! balance. A checkpoint fires once the time left before the next grant is
//! shorter than its window and the employee has used fewer days than the
//! checkpoint requires.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::config::AlertCheckpoint;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{CheckpointHit, EmployeeAlert};

use super::grant_schedule::grant_index_on_or_before;
use super::periods::{LedgerSnapshot, walk_periods};

/// Evaluates one checkpoint.
///
/// # Arguments
///
/// * `checkpoint` - The window and the minimum days expected within it
/// * `latest_grant_days` - Days granted by the most recent lot
/// * `used` - Approved days in the current grant period
/// * `as_of` - The evaluation date
/// * `next_grant_date` - The deadline of the current obligation
/// * `alert_min_grant_days` - Grants smaller than this carry no obligation
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::checkpoint_triggered;
/// use leave_ledger::config::AlertCheckpoint;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let checkpoint = AlertCheckpoint {
///     months_before_next_grant: 3,
///     min_consumed_days: Decimal::from(5),
/// };
/// let next_grant = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
/// let ten_weeks_before = next_grant - chrono::Duration::weeks(10);
///
/// let hit = checkpoint_triggered(
///     &checkpoint,
///     Decimal::from(10),
///     Decimal::from(2),
///     ten_weeks_before,
///     next_grant,
///     Decimal::from(10),
/// );
/// assert_eq!(hit.map(|h| h.shortfall), Some(Decimal::from(3)));
/// ```
pub fn checkpoint_triggered(
    checkpoint: &AlertCheckpoint,
    latest_grant_days: Decimal,
    used: Decimal,
    as_of: NaiveDate,
    next_grant_date: NaiveDate,
    alert_min_grant_days: Decimal,
) -> Option<CheckpointHit> {
    if latest_grant_days < alert_min_grant_days || used >= checkpoint.min_consumed_days {
        return None;
    }
    let window_start =
        next_grant_date.checked_sub_months(Months::new(checkpoint.months_before_next_grant))?;
    if as_of <= window_start || as_of >= next_grant_date {
        return None;
    }

    Some(CheckpointHit {
        months_before_next_grant: checkpoint.months_before_next_grant,
        min_consumed_days: checkpoint.min_consumed_days,
        shortfall: checkpoint.min_consumed_days - used,
    })
}

/// Evaluates an employee's consumption obligation on `as_of`.
///
/// Returns `None` for an employee without any grant yet. The returned alert
/// is `flagged` when at least one checkpoint fires.
pub fn evaluate_alert(
    snapshot: &LedgerSnapshot<'_>,
    as_of: NaiveDate,
) -> LedgerResult<Option<EmployeeAlert>> {
    let employee = snapshot.employee;
    let policy = snapshot.policy;
    let Some(current) = grant_index_on_or_before(employee.join_date, policy, as_of) else {
        return Ok(None);
    };

    let walked = walk_periods(snapshot, current)?;
    let summary = walked
        .last()
        .map(|period| &period.summary)
        .ok_or_else(|| LedgerError::CalculationError {
            date: as_of,
            message: "Period walk produced no current period".to_string(),
        })?;

    let latest_grant_days = summary.days_granted;
    let used = summary.days_used;
    let obligated = latest_grant_days >= policy.alert_min_grant_days;

    let legal_minimum_shortfall = if obligated {
        (policy.min_legal_use_days_per_year - used).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let triggered_checkpoints: Vec<CheckpointHit> = policy
        .alert_checkpoints
        .iter()
        .filter_map(|checkpoint| {
            checkpoint_triggered(
                checkpoint,
                latest_grant_days,
                used,
                as_of,
                summary.end_date,
                policy.alert_min_grant_days,
            )
        })
        .collect();

    Ok(Some(EmployeeAlert {
        employee_id: employee.id.clone(),
        policy_version: policy.version.clone(),
        as_of,
        latest_grant_date: summary.start_date,
        latest_grant_days,
        used_this_period: used,
        next_grant_date: summary.end_date,
        legal_minimum_shortfall,
        flagged: !triggered_checkpoints.is_empty(),
        triggered_checkpoints,
    }))
}
