//! Fixtures shared by unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::config::{
    AccrualPolicy, AlertCheckpoint, BaselineRule, BeyondTable, ConsumptionOrder, ExpiryRule,
    GrantTableRow, PartTimeTable, RoundingMode, RoundingRule, WorkdayRange,
};
use crate::models::{AccrualPattern, Employee, LeaveRequest, LeaveStatus};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn rows(days: &[i64]) -> Vec<GrantTableRow> {
    days.iter()
        .enumerate()
        .map(|(i, d)| GrantTableRow {
            tenure_years: Decimal::new(i as i64 * 10 + 5, 1),
            days: Decimal::from(*d),
        })
        .collect()
}

/// The statutory schedule: 6 months then every 12, two-year expiry,
/// half-day rounding.
pub fn statutory_policy() -> AccrualPolicy {
    AccrualPolicy {
        schema_version: 1,
        version: "2024-04-01".to_string(),
        name: "Statutory annual paid leave".to_string(),
        statute: Some("Labor Standards Act Art. 39".to_string()),
        effective_from: date("2024-04-01"),
        baseline_rule: BaselineRule {
            initial_grant_after_months: 6,
            cycle_months: 12,
        },
        expiry_rule: ExpiryRule { years: 2 },
        rounding: RoundingRule {
            unit: dec("0.5"),
            mode: RoundingMode::Floor,
        },
        min_legal_use_days_per_year: dec("5"),
        alert_min_grant_days: dec("10"),
        beyond_table: BeyondTable::LastEntry,
        consumption_order: ConsumptionOrder::NewestFirst,
        full_time_table: rows(&[10, 11, 12, 14, 16, 18, 20]),
        part_time_tables: vec![
            PartTimeTable {
                weekly_days: 4,
                annual_workdays: WorkdayRange { min: 169, max: 216 },
                rows: rows(&[7, 8, 9, 10, 12, 13, 15]),
            },
            PartTimeTable {
                weekly_days: 3,
                annual_workdays: WorkdayRange { min: 121, max: 168 },
                rows: rows(&[5, 6, 6, 8, 9, 10, 11]),
            },
            PartTimeTable {
                weekly_days: 2,
                annual_workdays: WorkdayRange { min: 73, max: 120 },
                rows: rows(&[3, 4, 4, 5, 6, 6, 7]),
            },
            PartTimeTable {
                weekly_days: 1,
                annual_workdays: WorkdayRange { min: 48, max: 72 },
                rows: rows(&[1, 2, 2, 2, 3, 3, 3]),
            },
        ],
        alert_checkpoints: vec![
            AlertCheckpoint {
                months_before_next_grant: 6,
                min_consumed_days: dec("2"),
            },
            AlertCheckpoint {
                months_before_next_grant: 3,
                min_consumed_days: dec("5"),
            },
        ],
    }
}

/// A policy with only the three-row table used in worked examples.
pub fn short_table_policy() -> AccrualPolicy {
    let mut policy = statutory_policy();
    policy.full_time_table = rows(&[10, 11, 12]);
    policy
}

pub fn full_time_employee(id: &str, join_date: &str) -> Employee {
    Employee {
        id: id.to_string(),
        name: format!("Employee {id}"),
        join_date: date(join_date),
        accrual_pattern: AccrualPattern::FullTime,
        policy_version: None,
    }
}

pub fn request(
    id: &str,
    employee_id: &str,
    start: &str,
    days: &str,
    status: LeaveStatus,
) -> LeaveRequest {
    LeaveRequest {
        id: id.to_string(),
        employee_id: employee_id.to_string(),
        start_date: date(start),
        end_date: date(start),
        total_days: dec(days),
        status,
    }
}
