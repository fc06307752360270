//! Grant table lookup.
//!
//! This module resolves how many days are granted at a given tenure for an
//! employee's accrual pattern, using the full-time table or the part-time
//! table matching the employee's weekly working days.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{AccrualPolicy, BeyondTable, GrantTableRow};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccrualPattern, AuditStep};

use super::grant_schedule::snap_to_half_year;

/// Statute clause for the full-time grant schedule.
pub const FULL_TIME_GRANT_CLAUSE: &str = "39(1)-(2)";

/// Statute clause for proportional part-time grants.
pub const PART_TIME_GRANT_CLAUSE: &str = "39(3)";

/// Which table a lookup used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum TableSource {
    /// The full-time table.
    FullTime,
    /// A part-time table.
    PartTime {
        /// The weekly working days of the selected table.
        weekly_days: u8,
    },
}

/// The result of a grant table lookup, including the audit step.
#[derive(Debug, Clone)]
pub struct GrantTableLookup {
    /// Days granted, rounded per policy.
    pub days: Decimal,
    /// The snapped tenure that was looked up.
    pub tenure_years: Decimal,
    /// The table used.
    pub source: TableSource,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

/// Selects the grant table for an accrual pattern.
///
/// Part-time patterns match on weekly working days first; if no table has
/// that weekly count, the annual workday range is used.
pub fn select_table<'a>(
    pattern: &AccrualPattern,
    policy: &'a AccrualPolicy,
) -> LedgerResult<(TableSource, &'a [GrantTableRow])> {
    match *pattern {
        AccrualPattern::FullTime => Ok((TableSource::FullTime, &policy.full_time_table)),
        AccrualPattern::PartTime {
            weekly_days,
            annual_workdays,
        } => {
            let by_weekly = policy
                .part_time_tables
                .iter()
                .find(|table| table.weekly_days == weekly_days);
            let table = by_weekly.or_else(|| {
                let annual = annual_workdays?;
                policy
                    .part_time_tables
                    .iter()
                    .find(|table| table.annual_workdays.contains(annual))
            });

            table
                .map(|table| {
                    (
                        TableSource::PartTime {
                            weekly_days: table.weekly_days,
                        },
                        table.rows.as_slice(),
                    )
                })
                .ok_or_else(|| LedgerError::UnknownAccrualPattern {
                    pattern: pattern.to_string(),
                    version: policy.version.clone(),
                })
        }
    }
}

/// Returns the days granted at `tenure_years` for the pattern.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::days_for_tenure;
/// # use leave_ledger::config::ConfigLoader;
/// use leave_ledger::models::AccrualPattern;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// # let policy = ConfigLoader::load("./config/leave_policy").unwrap().active_policy().unwrap();
/// let days = days_for_tenure(&AccrualPattern::FullTime, Decimal::from_str("1.5").unwrap(), &policy).unwrap();
/// assert_eq!(days, Decimal::from(11));
/// ```
pub fn days_for_tenure(
    pattern: &AccrualPattern,
    tenure_years: Decimal,
    policy: &AccrualPolicy,
) -> LedgerResult<Decimal> {
    lookup_grant_days(pattern, tenure_years, policy, 1).map(|lookup| lookup.days)
}

/// Looks up the grant for a tenure and records the decision.
///
/// Tenures off the half-year grid are snapped first. Lookups never
/// interpolate: a tenure before the first row grants nothing, and a tenure
/// past the last row follows the policy's `beyond_table` declaration.
pub fn lookup_grant_days(
    pattern: &AccrualPattern,
    tenure_years: Decimal,
    policy: &AccrualPolicy,
    step_number: u32,
) -> LedgerResult<GrantTableLookup> {
    let (source, rows) = select_table(pattern, policy)?;
    let tenure = snap_to_half_year(tenure_years);

    let (raw_days, basis) = match rows.iter().find(|row| row.tenure_years == tenure) {
        Some(row) => (row.days, "exact_row"),
        None => match (rows.first(), rows.last()) {
            (Some(first), _) if tenure < first.tenure_years => (Decimal::ZERO, "before_first_row"),
            (_, Some(last)) if tenure > last.tenure_years => match policy.beyond_table {
                BeyondTable::LastEntry => (last.days, "beyond_table_last_entry"),
                BeyondTable::Zero => (Decimal::ZERO, "beyond_table_zero"),
            },
            _ => (Decimal::ZERO, "no_matching_row"),
        },
    };
    let days = policy.rounding.apply(raw_days);

    let clause_ref = match source {
        TableSource::FullTime => FULL_TIME_GRANT_CLAUSE,
        TableSource::PartTime { .. } => PART_TIME_GRANT_CLAUSE,
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "grant_table_lookup".to_string(),
        rule_name: "Grant Table Lookup".to_string(),
        clause_ref: clause_ref.to_string(),
        input: serde_json::json!({
            "accrual_pattern": pattern.to_string(),
            "tenure_years": tenure_years.to_string(),
            "policy_version": policy.version,
        }),
        output: serde_json::json!({
            "days": days.to_string(),
            "snapped_tenure_years": tenure.to_string(),
            "table": source,
            "basis": basis,
        }),
        reasoning: format!(
            "Tenure {} years on the {} table grants {} days ({})",
            tenure, pattern, days, basis
        ),
    };

    Ok(GrantTableLookup {
        days,
        tenure_years: tenure,
        source,
        audit_step,
    })
}
