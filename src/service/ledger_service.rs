//! The ledger facade.
//!
//! [`LedgerService`] ties the policy registry to the storage seams and
//! exposes the query operations hosts call. It is cheap to clone: all state
//! sits behind `Arc`s.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    LedgerSnapshot, MaterializeOutcome, balance_as_of, check_integrity, evaluate_alert,
    materialize_lots_up_to, periods_for, resolve_balance,
};
use crate::config::{AccrualPolicy, PolicyRegistry};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AlertBatch, Employee, EmployeeAlert, EmployeeFailure, GrantLot, IntegrityFault, LeaveBalance,
    LeaveRequest, PeriodSummary,
};
use crate::store::{EmployeeDirectory, LeaveRequestStore, LegacyBalanceSource, LotStore};

/// Query and recording facade over the ledger.
///
/// # Example
///
/// ```
/// use leave_ledger::config::ConfigLoader;
/// use leave_ledger::models::{AccrualPattern, Employee};
/// use leave_ledger::service::LedgerService;
/// use leave_ledger::store::InMemoryStore;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::sync::Arc;
///
/// let registry = ConfigLoader::load("./config/leave_policy").unwrap().into_registry();
/// let store = Arc::new(InMemoryStore::new());
/// store.add_employee(Employee {
///     id: "emp_001".to_string(),
///     name: "Aiko".to_string(),
///     join_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
///     accrual_pattern: AccrualPattern::FullTime,
///     policy_version: None,
/// }).unwrap();
///
/// let service = LedgerService::new(registry, store);
/// let balance = service
///     .get_balance("emp_001", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
///     .unwrap();
/// assert_eq!(balance.granted, Decimal::from(10));
/// ```
#[derive(Clone)]
pub struct LedgerService {
    registry: Arc<PolicyRegistry>,
    lots: Arc<dyn LotStore>,
    employees: Arc<dyn EmployeeDirectory>,
    requests: Arc<dyn LeaveRequestStore>,
    legacy: Option<Arc<dyn LegacyBalanceSource>>,
    faults: Arc<Mutex<Vec<IntegrityFault>>>,
}

impl LedgerService {
    /// Creates a service over a single store implementing every seam.
    pub fn new<S>(registry: PolicyRegistry, store: Arc<S>) -> Self
    where
        S: LotStore + EmployeeDirectory + LeaveRequestStore + 'static,
    {
        Self::with_stores(registry, store.clone(), store.clone(), store)
    }

    /// Creates a service over separate stores.
    pub fn with_stores(
        registry: PolicyRegistry,
        lots: Arc<dyn LotStore>,
        employees: Arc<dyn EmployeeDirectory>,
        requests: Arc<dyn LeaveRequestStore>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            lots,
            employees,
            requests,
            legacy: None,
            faults: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a legacy balance source for employees migrating into the ledger.
    pub fn with_legacy_source(mut self, legacy: Arc<dyn LegacyBalanceSource>) -> Self {
        self.legacy = Some(legacy);
        self
    }

    /// Returns the policy registry.
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Resolves a policy version, defaulting to the active one.
    ///
    /// Fails with [`LedgerError::ConfigurationMissing`] when no override is
    /// given and no version is active.
    pub fn get_active_policy(
        &self,
        version_override: Option<&str>,
    ) -> LedgerResult<Arc<AccrualPolicy>> {
        self.registry.resolve(version_override)
    }

    /// Resolves the policy governing an employee.
    pub fn policy_for(&self, employee: &Employee) -> LedgerResult<Arc<AccrualPolicy>> {
        self.registry.resolve(employee.policy_version.as_deref())
    }

    fn employee(&self, employee_id: &str) -> LedgerResult<Employee> {
        self.employees
            .employee(employee_id)?
            .ok_or_else(|| LedgerError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    /// Ensures the employee's lots exist for every grant date up to `as_of`.
    pub fn materialize_lots(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
    ) -> LedgerResult<MaterializeOutcome> {
        let employee = self.employee(employee_id)?;
        let policy = self.policy_for(&employee)?;
        materialize_lots_up_to(self.lots.as_ref(), &employee, &policy, as_of)
    }

    /// Returns the employee's stored lots with remaining days clamped.
    ///
    /// Lots that violate their bounds are reported to the fault log.
    pub fn get_lots(&self, employee_id: &str) -> LedgerResult<Vec<GrantLot>> {
        let lots = self.lots.lots_for(employee_id)?;
        Ok(lots
            .into_iter()
            .map(|mut lot| {
                if let Some(fault) = check_integrity(&lot) {
                    self.record_fault(fault);
                }
                lot.days_remaining = lot.clamped_remaining();
                lot
            })
            .collect())
    }

    /// Returns the employee's balance on `as_of`.
    ///
    /// Lots are materialized on demand. When the ledger shows no grant but a
    /// legacy source holds figures for the employee, those are used instead.
    pub fn get_balance(&self, employee_id: &str, as_of: NaiveDate) -> LedgerResult<LeaveBalance> {
        let employee = self.employee(employee_id)?;
        let policy = self.policy_for(&employee)?;
        let (lots, requests) = self.load_ledger(&employee, &policy, as_of)?;
        let snapshot = LedgerSnapshot {
            employee: &employee,
            policy: &policy,
            lots: &lots,
            requests: &requests,
        };

        let computed = balance_as_of(&snapshot, as_of)?;
        let legacy = match &self.legacy {
            Some(source) => source.legacy_balance(employee_id)?,
            None => None,
        };
        let balance = resolve_balance(computed, legacy, &policy.rounding);

        debug!(
            employee_id = %employee_id,
            as_of = %as_of,
            version = %policy.version,
            granted = %balance.granted,
            remaining = %balance.remaining,
            "Computed balance"
        );
        Ok(balance)
    }

    /// Returns the period breakdown around `as_of`, oldest first.
    pub fn get_period_breakdown(
        &self,
        employee_id: &str,
        as_of: NaiveDate,
        max_periods_back: u32,
    ) -> LedgerResult<Vec<PeriodSummary>> {
        let employee = self.employee(employee_id)?;
        let policy = self.policy_for(&employee)?;
        let (lots, requests) = self.load_ledger(&employee, &policy, as_of)?;
        let snapshot = LedgerSnapshot {
            employee: &employee,
            policy: &policy,
            lots: &lots,
            requests: &requests,
        };
        periods_for(&snapshot, as_of, max_periods_back)
    }

    /// Evaluates mandatory-consumption alerts for every employee governed by
    /// a policy version (the active one by default).
    ///
    /// A failure for one employee is collected in the batch and does not
    /// stop the others.
    pub fn get_alert_candidates(
        &self,
        policy_version: Option<&str>,
        as_of: NaiveDate,
    ) -> LedgerResult<AlertBatch> {
        let policy = self.registry.resolve(policy_version)?;
        let correlation_id = Uuid::new_v4();
        let start_time = Instant::now();
        info!(
            correlation_id = %correlation_id,
            version = %policy.version,
            as_of = %as_of,
            "Evaluating alert candidates"
        );

        let active_version = self.registry.active_version();
        let employees: Vec<Employee> = self
            .employees
            .employees()?
            .into_iter()
            .filter(|employee| employee.governed_by(&policy.version, active_version))
            .collect();

        let mut alerts = Vec::new();
        let mut failures = Vec::new();
        for employee in &employees {
            match self.evaluate_employee(employee, &policy, as_of) {
                Ok(Some(alert)) if alert.flagged => alerts.push(alert),
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        employee_id = %employee.id,
                        error = %err,
                        "Alert evaluation failed for employee"
                    );
                    failures.push(EmployeeFailure {
                        employee_id: employee.id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            correlation_id = %correlation_id,
            evaluated = employees.len(),
            flagged = alerts.len(),
            failed = failures.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Alert evaluation completed"
        );

        Ok(AlertBatch {
            correlation_id,
            policy_version: policy.version.clone(),
            as_of,
            evaluated: employees.len(),
            alerts,
            failures,
        })
    }

    fn evaluate_employee(
        &self,
        employee: &Employee,
        policy: &AccrualPolicy,
        as_of: NaiveDate,
    ) -> LedgerResult<Option<EmployeeAlert>> {
        let (lots, requests) = self.load_ledger(employee, policy, as_of)?;
        let snapshot = LedgerSnapshot {
            employee,
            policy,
            lots: &lots,
            requests: &requests,
        };
        evaluate_alert(&snapshot, as_of)
    }

    /// Approves a pending request and draws its days from the lots active on
    /// its start date.
    ///
    /// The status change is stored before any lot is touched, so a retried
    /// approval fails with [`LedgerError::InvalidTransition`] instead of
    /// consuming twice.
    pub fn record_approval(&self, request_id: &str) -> LedgerResult<LeaveRequest> {
        let mut request = self.request(request_id)?;
        let employee = self.employee(&request.employee_id)?;
        let policy = self.policy_for(&employee)?;

        request.validate(&policy.rounding)?;
        request.approve()?;
        self.requests.save(request.clone())?;

        // Future-dated leave needs the lot of the period it falls in, so that
        // lot is stored ahead of its grant date. Balance reads ignore it until
        // the grant date is reached.
        materialize_lots_up_to(self.lots.as_ref(), &employee, &policy, request.start_date)?;
        let application = self.lots.consume_in_order(
            &employee.id,
            request.start_date,
            request.total_days,
            policy.consumption_order,
            &policy.rounding,
        )?;
        let drawn = application.applied;

        if application.unattributed > Decimal::ZERO {
            warn!(
                employee_id = %employee.id,
                request_id = %request.id,
                unattributed = %application.unattributed,
                "Approved leave exceeds the days left in active lots"
            );
        }
        info!(
            employee_id = %employee.id,
            request_id = %request.id,
            total_days = %request.total_days,
            drawn = %drawn,
            "Recorded leave approval"
        );
        Ok(request)
    }

    /// Rejects a pending request. Lots are not touched.
    pub fn record_rejection(&self, request_id: &str) -> LedgerResult<LeaveRequest> {
        let mut request = self.request(request_id)?;
        request.reject()?;
        self.requests.save(request.clone())?;
        info!(
            employee_id = %request.employee_id,
            request_id = %request.id,
            "Recorded leave rejection"
        );
        Ok(request)
    }

    /// Returns the integrity faults reported since the service was created.
    pub fn integrity_faults(&self) -> Vec<IntegrityFault> {
        self.faults.lock().clone()
    }

    fn request(&self, request_id: &str) -> LedgerResult<LeaveRequest> {
        self.requests
            .request(request_id)?
            .ok_or_else(|| LedgerError::InvalidLeaveRequest {
                request_id: request_id.to_string(),
                message: "request not found".to_string(),
            })
    }

    fn load_ledger(
        &self,
        employee: &Employee,
        policy: &AccrualPolicy,
        as_of: NaiveDate,
    ) -> LedgerResult<(Vec<GrantLot>, Vec<LeaveRequest>)> {
        materialize_lots_up_to(self.lots.as_ref(), employee, policy, as_of)?;
        let lots = self.get_lots(&employee.id)?;
        let requests = self.requests.requests_for(&employee.id)?;
        Ok((lots, requests))
    }

    fn record_fault(&self, fault: IntegrityFault) {
        let mut faults = self.faults.lock();
        if !faults.contains(&fault) {
            faults.push(fault);
        }
    }
}
