//! In-memory implementation of every storage seam.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::debug;

use crate::calculation::{UsageApplication, apply_approved_usage};
use crate::config::{ConsumptionOrder, RoundingRule};
use crate::error::LedgerResult;
use crate::models::{Employee, GrantLot, LeaveRequest, LegacyBalance, LotKey};

use super::{EmployeeDirectory, InsertOutcome, LeaveRequestStore, LegacyBalanceSource, LotStore};

/// A thread-safe in-memory store.
///
/// Lots are keyed by [`LotKey`], so the uniqueness of (employee id, grant
/// date) is enforced by the map itself. Every write happens under the map's
/// write lock.
///
/// # Example
///
/// ```
/// use leave_ledger::models::{AccrualPattern, Employee};
/// use leave_ledger::store::{EmployeeDirectory, InMemoryStore};
/// use chrono::NaiveDate;
///
/// let store = InMemoryStore::new();
/// store.add_employee(Employee {
///     id: "emp_001".to_string(),
///     name: "Aiko".to_string(),
///     join_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
///     accrual_pattern: AccrualPattern::FullTime,
///     policy_version: None,
/// }).unwrap();
///
/// assert!(store.employee("emp_001").unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    lots: RwLock<BTreeMap<LotKey, GrantLot>>,
    employees: RwLock<BTreeMap<String, Employee>>,
    requests: RwLock<BTreeMap<String, LeaveRequest>>,
    legacy: RwLock<BTreeMap<String, LegacyBalance>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee record.
    pub fn add_employee(&self, employee: Employee) -> LedgerResult<()> {
        let mut employees = self.employees.write();
        employees.insert(employee.id.clone(), employee);
        Ok(())
    }

    /// Records a legacy balance for an employee.
    pub fn set_legacy_balance(&self, employee_id: &str, balance: LegacyBalance) -> LedgerResult<()> {
        let mut legacy = self.legacy.write();
        legacy.insert(employee_id.to_string(), balance);
        Ok(())
    }

    /// Overwrites a stored lot regardless of its current state.
    ///
    /// Only meant for data repair and for seeding faulty rows in tests; the
    /// ledger itself never replaces lots.
    pub fn replace_lot(&self, lot: GrantLot) -> LedgerResult<()> {
        let mut lots = self.lots.write();
        lots.insert(lot.key(), lot);
        Ok(())
    }

    /// Total number of stored lots across all employees.
    pub fn lot_count(&self) -> LedgerResult<usize> {
        Ok(self.lots.read().len())
    }
}

impl LotStore for InMemoryStore {
    fn lots_for(&self, employee_id: &str) -> LedgerResult<Vec<GrantLot>> {
        let lots = self.lots.read();
        Ok(lots
            .values()
            .filter(|lot| lot.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn insert_if_absent(&self, lot: GrantLot) -> LedgerResult<InsertOutcome> {
        let mut lots = self.lots.write();
        let key = lot.key();
        if lots.contains_key(&key) {
            debug!(
                employee_id = %key.employee_id,
                grant_date = %key.grant_date,
                "Lot already present, keeping stored row"
            );
            return Ok(InsertOutcome::AlreadyPresent);
        }
        lots.insert(key, lot);
        Ok(InsertOutcome::Inserted)
    }

    fn consume_in_order(
        &self,
        employee_id: &str,
        on_date: NaiveDate,
        days: Decimal,
        order: ConsumptionOrder,
        rounding: &RoundingRule,
    ) -> LedgerResult<UsageApplication> {
        let mut lots = self.lots.write();
        let mut active: Vec<GrantLot> = lots
            .values()
            .filter(|lot| lot.employee_id == employee_id && lot.is_active(on_date))
            .cloned()
            .collect();

        let application = apply_approved_usage(&mut active, days, order, rounding);
        for draw in &application.draws {
            let key = LotKey {
                employee_id: employee_id.to_string(),
                grant_date: draw.grant_date,
            };
            if let (Some(stored), Some(updated)) = (
                lots.get_mut(&key),
                active.iter().find(|lot| lot.grant_date == draw.grant_date),
            ) {
                stored.days_remaining = updated.days_remaining;
            }
        }
        Ok(application)
    }
}

impl EmployeeDirectory for InMemoryStore {
    fn employee(&self, employee_id: &str) -> LedgerResult<Option<Employee>> {
        let employees = self.employees.read();
        Ok(employees.get(employee_id).cloned())
    }

    fn employees(&self) -> LedgerResult<Vec<Employee>> {
        let employees = self.employees.read();
        Ok(employees.values().cloned().collect())
    }
}

impl LeaveRequestStore for InMemoryStore {
    fn requests_for(&self, employee_id: &str) -> LedgerResult<Vec<LeaveRequest>> {
        let requests = self.requests.read();
        let mut found: Vec<LeaveRequest> = requests
            .values()
            .filter(|request| request.employee_id == employee_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    fn request(&self, request_id: &str) -> LedgerResult<Option<LeaveRequest>> {
        let requests = self.requests.read();
        Ok(requests.get(request_id).cloned())
    }

    fn save(&self, request: LeaveRequest) -> LedgerResult<()> {
        let mut requests = self.requests.write();
        requests.insert(request.id.clone(), request);
        Ok(())
    }
}

impl LegacyBalanceSource for InMemoryStore {
    fn legacy_balance(&self, employee_id: &str) -> LedgerResult<Option<LegacyBalance>> {
        let legacy = self.legacy.read();
        Ok(legacy.get(employee_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundingMode;
    use crate::models::LeaveStatus;
    use crate::test_support::{date, dec, full_time_employee, request};
    use uuid::Uuid;

    const NEWEST: ConsumptionOrder = ConsumptionOrder::NewestFirst;

    fn rounding() -> RoundingRule {
        RoundingRule {
            unit: dec("0.5"),
            mode: RoundingMode::Floor,
        }
    }

    fn lot(employee_id: &str, grant: &str, granted: &str, remaining: &str) -> GrantLot {
        let grant_date = date(grant);
        GrantLot {
            id: Uuid::new_v4(),
            employee_id: employee_id.to_string(),
            policy_version: "2024-04-01".to_string(),
            grant_date,
            expiry_date: grant_date
                .checked_add_months(chrono::Months::new(24))
                .unwrap(),
            tenure_years: dec("0.5"),
            days_granted: dec(granted),
            days_remaining: dec(remaining),
        }
    }

    #[test]
    fn test_insert_if_absent_keeps_existing_row() {
        let store = InMemoryStore::new();
        let original = lot("emp_001", "2023-10-01", "10", "10");
        assert_eq!(
            store.insert_if_absent(original.clone()).unwrap(),
            InsertOutcome::Inserted
        );
        store
            .consume_in_order("emp_001", date("2024-01-15"), dec("3"), NEWEST, &rounding())
            .unwrap();

        let duplicate = lot("emp_001", "2023-10-01", "10", "10");
        assert_eq!(
            store.insert_if_absent(duplicate).unwrap(),
            InsertOutcome::AlreadyPresent
        );

        let lots = store.lots_for("emp_001").unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, original.id);
        assert_eq!(lots[0].days_remaining, dec("7"));
    }

    #[test]
    fn test_lots_for_is_oldest_first_and_per_employee() {
        let store = InMemoryStore::new();
        store.insert_if_absent(lot("emp_001", "2024-10-01", "11", "11")).unwrap();
        store.insert_if_absent(lot("emp_002", "2023-10-01", "10", "10")).unwrap();
        store.insert_if_absent(lot("emp_001", "2023-10-01", "10", "10")).unwrap();

        let lots = store.lots_for("emp_001").unwrap();
        let dates: Vec<_> = lots.iter().map(|l| l.grant_date).collect();
        assert_eq!(dates, vec![date("2023-10-01"), date("2024-10-01")]);
        assert_eq!(store.lot_count().unwrap(), 3);
    }

    #[test]
    fn test_consume_never_goes_negative() {
        let store = InMemoryStore::new();
        store.insert_if_absent(lot("emp_001", "2023-10-01", "10", "2.5")).unwrap();

        let application = store
            .consume_in_order("emp_001", date("2024-01-15"), dec("4"), NEWEST, &rounding())
            .unwrap();
        assert_eq!(application.applied, dec("2.5"));
        assert_eq!(application.unattributed, dec("1.5"));
        assert_eq!(store.lots_for("emp_001").unwrap()[0].days_remaining, dec("0"));
    }

    #[test]
    fn test_consume_clamps_faulty_remaining_first() {
        let store = InMemoryStore::new();
        store.replace_lot(lot("emp_001", "2023-10-01", "10", "12")).unwrap();

        let application = store
            .consume_in_order("emp_001", date("2024-01-15"), dec("1"), NEWEST, &rounding())
            .unwrap();
        assert_eq!(application.applied, dec("1"));
        assert_eq!(store.lots_for("emp_001").unwrap()[0].days_remaining, dec("9"));
    }

    #[test]
    fn test_consume_spills_into_older_lot_in_order() {
        let store = InMemoryStore::new();
        store.insert_if_absent(lot("emp_001", "2023-10-01", "10", "10")).unwrap();
        store.insert_if_absent(lot("emp_001", "2024-10-01", "11", "11")).unwrap();
        store.insert_if_absent(lot("emp_002", "2024-10-01", "11", "11")).unwrap();

        let application = store
            .consume_in_order("emp_001", date("2024-12-02"), dec("13"), NEWEST, &rounding())
            .unwrap();
        assert_eq!(application.unattributed, dec("0"));

        let remaining: Vec<_> = store
            .lots_for("emp_001")
            .unwrap()
            .iter()
            .map(|l| l.days_remaining)
            .collect();
        assert_eq!(remaining, vec![dec("8"), dec("0")]);
        assert_eq!(store.lots_for("emp_002").unwrap()[0].days_remaining, dec("11"));
    }

    #[test]
    fn test_consume_skips_lots_not_active_on_date() {
        let store = InMemoryStore::new();
        store.insert_if_absent(lot("emp_001", "2023-10-01", "10", "10")).unwrap();
        store.insert_if_absent(lot("emp_001", "2025-10-01", "12", "12")).unwrap();

        // The 2023 lot expired the day before.
        let application = store
            .consume_in_order("emp_001", date("2025-10-02"), dec("1"), NEWEST, &rounding())
            .unwrap();
        assert_eq!(application.applied, dec("1"));
        let lots = store.lots_for("emp_001").unwrap();
        assert_eq!(lots[0].days_remaining, dec("10"));
        assert_eq!(lots[1].days_remaining, dec("11"));

        let application = store
            .consume_in_order("emp_001", date("2023-09-01"), dec("1"), NEWEST, &rounding())
            .unwrap();
        assert_eq!(application.unattributed, dec("1"));
    }

    #[test]
    fn test_concurrent_consumption_spills_into_older_lot() {
        let store = InMemoryStore::new();
        store.insert_if_absent(lot("emp_001", "2023-10-01", "10", "10")).unwrap();
        store.insert_if_absent(lot("emp_001", "2024-10-01", "11", "11")).unwrap();

        let applications: Vec<UsageApplication> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        store
                            .consume_in_order(
                                "emp_001",
                                date("2024-12-02"),
                                dec("8"),
                                NEWEST,
                                &rounding(),
                            )
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for application in &applications {
            assert_eq!(application.applied, dec("8"));
            assert_eq!(application.unattributed, dec("0"));
        }
        let total: Decimal = store
            .lots_for("emp_001")
            .unwrap()
            .iter()
            .map(|l| l.days_remaining)
            .sum();
        assert_eq!(total, dec("5"));
        assert_eq!(store.lots_for("emp_001").unwrap()[1].days_remaining, dec("0"));
    }

    #[test]
    fn test_concurrent_inserts_store_one_lot() {
        let store = InMemoryStore::new();
        let outcomes: Vec<InsertOutcome> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        store
                            .insert_if_absent(lot("emp_001", "2023-10-01", "10", "10"))
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let inserted = outcomes
            .iter()
            .filter(|o| **o == InsertOutcome::Inserted)
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(store.lot_count().unwrap(), 1);
    }

    #[test]
    fn test_requests_sorted_by_start_date() {
        let store = InMemoryStore::new();
        store
            .save(request("req_2", "emp_001", "2024-05-10", "1", LeaveStatus::Pending))
            .unwrap();
        store
            .save(request("req_1", "emp_001", "2024-02-01", "1", LeaveStatus::Approved))
            .unwrap();
        store
            .save(request("req_3", "emp_002", "2024-01-01", "1", LeaveStatus::Approved))
            .unwrap();

        let ids: Vec<_> = store
            .requests_for("emp_001")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["req_1", "req_2"]);
        assert!(store.request("req_3").unwrap().is_some());
    }

    #[test]
    fn test_directory_and_legacy_lookup() {
        let store = InMemoryStore::new();
        store.add_employee(full_time_employee("emp_001", "2023-04-01")).unwrap();
        store
            .set_legacy_balance(
                "emp_001",
                LegacyBalance {
                    granted: dec("12"),
                    used: dec("2"),
                    remaining: dec("10"),
                },
            )
            .unwrap();

        assert_eq!(store.employees().unwrap().len(), 1);
        assert!(store.employee("emp_999").unwrap().is_none());
        assert_eq!(
            store.legacy_balance("emp_001").unwrap().map(|b| b.granted),
            Some(dec("12"))
        );
    }
}
