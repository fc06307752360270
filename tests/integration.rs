//! Integration tests for the leave entitlement ledger.
//!
//! This test suite drives the ledger through the shipped policy configuration
//! and the in-memory store:
//! - Grant schedule and first grants
//! - Expiry of unused lots
//! - Carry-over between grant periods
//! - Employees before their first grant
//! - Mandatory-consumption alerts
//! - Part-time grants
//! - Approval and rejection flow
//! - Error cases

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use leave_ledger::calculation::{next_grant_date, previous_grant_date, remaining_as_of};
use leave_ledger::config::ConfigLoader;
use leave_ledger::error::LedgerError;
use leave_ledger::models::{
    AccrualPattern, BalanceSource, Employee, LeaveRequest, LeaveStatus, PeriodKind,
};
use leave_ledger::service::{BalanceView, ErrorView, LedgerService, PeriodView};
use leave_ledger::store::{InMemoryStore, LeaveRequestStore};

// =============================================================================
// Test Helpers
// =============================================================================

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn create_employee(id: &str, join_date: &str, accrual_pattern: AccrualPattern) -> Employee {
    Employee {
        id: id.to_string(),
        name: format!("Employee {}", id),
        join_date: date(join_date),
        accrual_pattern,
        policy_version: None,
    }
}

fn create_request(
    id: &str,
    employee_id: &str,
    start: &str,
    end: &str,
    days: &str,
) -> LeaveRequest {
    LeaveRequest {
        id: id.to_string(),
        employee_id: employee_id.to_string(),
        start_date: date(start),
        end_date: date(end),
        total_days: decimal(days),
        status: LeaveStatus::Pending,
    }
}

fn create_service(employees: Vec<Employee>) -> (LedgerService, Arc<InMemoryStore>) {
    let registry = ConfigLoader::load("./config/leave_policy")
        .expect("Failed to load config")
        .into_registry();
    let store = Arc::new(InMemoryStore::new());
    for employee in employees {
        store.add_employee(employee).unwrap();
    }
    let service = LedgerService::new(registry, store.clone()).with_legacy_source(store.clone());
    (service, store)
}

// =============================================================================
// Grant Schedule
// =============================================================================

#[test]
fn test_first_two_grants_full_time() {
    let (service, _) = create_service(vec![create_employee(
        "emp_001",
        "2023-04-01",
        AccrualPattern::FullTime,
    )]);

    let lots = {
        service.materialize_lots("emp_001", date("2024-10-01")).unwrap();
        service.get_lots("emp_001").unwrap()
    };
    assert_eq!(lots.len(), 2);
    assert_eq!(lots[0].grant_date, date("2023-10-01"));
    assert_eq!(lots[0].days_granted, decimal("10"));
    assert_eq!(lots[1].grant_date, date("2024-10-01"));
    assert_eq!(lots[1].days_granted, decimal("11"));
    assert_eq!(lots[1].policy_version, "2024-04-01");
}

#[test]
fn test_previous_and_next_grant_dates_are_consistent() {
    let (service, _) = create_service(vec![]);
    let policy = service.get_active_policy(None).unwrap();
    let join = date("2021-08-31");

    for reference in ["2021-09-15", "2022-02-28", "2023-03-01", "2026-12-31"] {
        let next = next_grant_date(join, &policy, date(reference)).unwrap();
        assert_eq!(previous_grant_date(join, &policy, next), Some(next));
    }
}

#[test]
fn test_lots_are_not_duplicated_by_repeated_queries() {
    let (service, store) = create_service(vec![create_employee(
        "emp_001",
        "2020-04-01",
        AccrualPattern::FullTime,
    )]);

    for _ in 0..3 {
        service.get_balance("emp_001", date("2024-12-01")).unwrap();
    }
    assert_eq!(store.lot_count().unwrap(), 5);
}

// =============================================================================
// Expiry
// =============================================================================

#[test]
fn test_unused_lot_expires_after_two_years() {
    let (service, _) = create_service(vec![create_employee(
        "emp_001",
        "2023-04-01",
        AccrualPattern::FullTime,
    )]);
    service.materialize_lots("emp_001", date("2023-10-01")).unwrap();
    let lot = service.get_lots("emp_001").unwrap().remove(0);

    assert_eq!(lot.expiry_date, date("2025-10-01"));
    assert_eq!(remaining_as_of(&lot, date("2025-10-01")), decimal("10"));
    assert_eq!(remaining_as_of(&lot, date("2025-10-02")), decimal("0"));
}

// =============================================================================
// Carry-over
// =============================================================================

#[test]
fn test_carry_over_is_new_grant_minus_used() {
    let (service, store) = create_service(vec![create_employee(
        "emp_001",
        "2023-04-01",
        AccrualPattern::FullTime,
    )]);
    store
        .save(create_request("req_1", "emp_001", "2024-12-02", "2024-12-05", "4"))
        .unwrap();
    service.record_approval("req_1").unwrap();

    let periods = service
        .get_period_breakdown("emp_001", date("2025-03-01"), 2)
        .unwrap();
    let kinds: Vec<PeriodKind> = periods.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PeriodKind::Previous { periods_back: 1 },
            PeriodKind::Current,
            PeriodKind::Next
        ]
    );

    let current = &periods[1];
    assert_eq!(current.days_granted, decimal("11"));
    assert_eq!(current.days_used, decimal("4"));
    assert_eq!(current.carry_over_in, decimal("10"));
    assert_eq!(current.carry_over_out, decimal("7"));
    assert_eq!(periods[2].carry_over_in, decimal("7"));
    assert_eq!(periods[2].days_granted, decimal("12"));
}

#[test]
fn test_balance_splits_pending_by_period() {
    let (service, store) = create_service(vec![create_employee(
        "emp_001",
        "2023-04-01",
        AccrualPattern::FullTime,
    )]);
    store
        .save(create_request("req_1", "emp_001", "2024-11-04", "2024-11-05", "2"))
        .unwrap();
    store
        .save(create_request("req_2", "emp_001", "2025-02-03", "2025-02-03", "0.5"))
        .unwrap();
    store
        .save(create_request("req_3", "emp_001", "2025-10-20", "2025-10-21", "2"))
        .unwrap();
    service.record_approval("req_1").unwrap();

    let balance = service.get_balance("emp_001", date("2025-01-10")).unwrap();
    assert_eq!(balance.granted, decimal("21"));
    assert_eq!(balance.used, decimal("2"));
    assert_eq!(balance.pending, decimal("0.5"));
    assert_eq!(balance.pending_next_period, decimal("2"));
    assert_eq!(balance.remaining, decimal("18.5"));
    assert_eq!(
        balance.remaining,
        (balance.granted - balance.used - balance.pending).max(Decimal::ZERO)
    );
    assert_eq!(balance.expiring_at_next_grant, decimal("10"));
}

// =============================================================================
// Before First Grant
// =============================================================================

#[test]
fn test_employee_before_first_grant_has_zero_balance() {
    let (service, _) = create_service(vec![create_employee(
        "emp_new",
        "2025-01-01",
        AccrualPattern::FullTime,
    )]);

    let balance = service.get_balance("emp_new", date("2025-03-01")).unwrap();
    assert_eq!(balance.granted, Decimal::ZERO);
    assert_eq!(balance.used, Decimal::ZERO);
    assert_eq!(balance.pending, Decimal::ZERO);
    assert_eq!(balance.remaining, Decimal::ZERO);
    assert_eq!(balance.next_grant_date, Some(date("2025-07-01")));
    assert_eq!(balance.source, BalanceSource::NoGrant);

    let view = serde_json::to_value(BalanceView::from(&balance)).unwrap();
    assert_eq!(view["next_grant_date"], "2025-07-01");
    assert_eq!(view["next_grant_date_display"], "2025/07/01");
}

// =============================================================================
// Alerts
// =============================================================================

#[test]
fn test_alert_ten_weeks_before_next_grant() {
    let (service, store) = create_service(vec![
        create_employee("emp_001", "2024-01-15", AccrualPattern::FullTime),
        create_employee("emp_002", "2024-01-15", AccrualPattern::FullTime),
    ]);
    store
        .save(create_request("req_1", "emp_001", "2024-09-02", "2024-09-03", "2"))
        .unwrap();
    store
        .save(create_request("req_2", "emp_002", "2024-09-02", "2024-09-06", "5"))
        .unwrap();
    service.record_approval("req_1").unwrap();
    service.record_approval("req_2").unwrap();

    let as_of = date("2025-07-15") - chrono::Duration::weeks(10);
    let batch = service.get_alert_candidates(None, as_of).unwrap();

    assert_eq!(batch.evaluated, 2);
    assert_eq!(batch.alerts.len(), 1);
    let alert = &batch.alerts[0];
    assert_eq!(alert.employee_id, "emp_001");
    assert_eq!(alert.latest_grant_days, decimal("10"));
    assert_eq!(alert.used_this_period, decimal("2"));
    assert_eq!(alert.next_grant_date, date("2025-07-15"));
    assert!(alert.flagged);
    assert_eq!(alert.legal_minimum_shortfall, decimal("3"));
    assert!(batch.failures.is_empty());
}

#[test]
fn test_part_time_small_grant_is_not_alerted() {
    let (service, _) = create_service(vec![create_employee(
        "emp_pt",
        "2024-01-15",
        AccrualPattern::PartTime {
            weekly_days: 3,
            annual_workdays: None,
        },
    )]);

    let batch = service
        .get_alert_candidates(None, date("2025-06-01"))
        .unwrap();
    assert_eq!(batch.evaluated, 1);
    assert!(batch.alerts.is_empty());
}

// =============================================================================
// Part-time Grants
// =============================================================================

#[test]
fn test_part_time_grants_follow_weekly_table() {
    let (service, _) = create_service(vec![create_employee(
        "emp_pt",
        "2022-04-01",
        AccrualPattern::PartTime {
            weekly_days: 4,
            annual_workdays: Some(190),
        },
    )]);

    let periods = service
        .get_period_breakdown("emp_pt", date("2024-11-01"), 5)
        .unwrap();
    let granted: Vec<Decimal> = periods.iter().map(|p| p.days_granted).collect();
    assert_eq!(
        granted,
        vec![decimal("7"), decimal("8"), decimal("9"), decimal("10")]
    );

    let view = serde_json::to_value(PeriodView::from(&periods[0])).unwrap();
    assert_eq!(view["start_date"], "2022-10-01");
    assert_eq!(view["start_date_display"], "2022/10/01");
}

// =============================================================================
// Approval Flow
// =============================================================================

#[test]
fn test_rejected_request_has_no_effect() {
    let (service, store) = create_service(vec![create_employee(
        "emp_001",
        "2023-04-01",
        AccrualPattern::FullTime,
    )]);
    store
        .save(create_request("req_1", "emp_001", "2024-02-05", "2024-02-07", "3"))
        .unwrap();
    service.record_rejection("req_1").unwrap();

    assert!(matches!(
        service.record_approval("req_1"),
        Err(LedgerError::InvalidTransition { .. })
    ));
    let balance = service.get_balance("emp_001", date("2024-03-01")).unwrap();
    assert_eq!(balance.remaining, decimal("10"));
    assert_eq!(
        store.request("req_1").unwrap().map(|r| r.status),
        Some(LeaveStatus::Rejected)
    );
}

#[test]
fn test_pinned_policy_consumes_oldest_first() {
    let mut employee = create_employee("emp_old", "2019-04-01", AccrualPattern::FullTime);
    employee.policy_version = Some("2019-04-01".to_string());
    let (service, store) = create_service(vec![employee]);
    store
        .save(create_request("req_1", "emp_old", "2021-01-11", "2021-01-13", "3"))
        .unwrap();
    service.record_approval("req_1").unwrap();

    let lots = service.get_lots("emp_old").unwrap();
    assert_eq!(lots[0].days_remaining, decimal("7"));
    assert_eq!(lots[1].days_remaining, decimal("11"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn test_unknown_employee_maps_to_error_code() {
    let (service, _) = create_service(vec![]);
    let error = service.get_balance("emp_404", date("2025-01-01")).unwrap_err();
    let view = ErrorView::from(&error);
    assert_eq!(view.code, "EMPLOYEE_NOT_FOUND");
    assert!(view.is_client_error());
}

#[test]
fn test_unknown_policy_override() {
    let (service, _) = create_service(vec![]);
    match service.get_active_policy(Some("1999-01-01")) {
        Err(LedgerError::PolicyNotFound { version }) => assert_eq!(version, "1999-01-01"),
        other => panic!("Expected PolicyNotFound, got {:?}", other.map(|p| p.version.clone())),
    }
}

#[test]
fn test_missing_config_directory() {
    match ConfigLoader::load("./config/does_not_exist") {
        Err(LedgerError::ConfigNotFound { path }) => assert!(path.contains("does_not_exist")),
        Err(other) => panic!("Expected ConfigNotFound, got {:?}", other),
        Ok(_) => panic!("Expected ConfigNotFound, got a loader"),
    }
}
