//! Configuration types for leave accrual policies.
//!
//! This module contains the strongly-typed policy structures that are
//! deserialized from YAML documents, together with the validation rules a
//! published policy must satisfy.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{LedgerError, LedgerResult};

/// The only policy document schema this crate understands.
///
/// Documents with any other `schema_version` must be migrated before they
/// can be loaded.
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// How the grant dates of an employee are derived from the join date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRule {
    /// Months between the join date and the first grant.
    pub initial_grant_after_months: u32,
    /// Months between consecutive grants after the first one.
    pub cycle_months: u32,
}

/// Lifetime of a grant lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRule {
    /// Whole years from the grant date until the lot expires.
    pub years: u32,
}

/// Rounding mode for fractional day quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half away from zero.
    Round,
    /// Round toward negative infinity.
    Floor,
    /// Round toward positive infinity.
    Ceil,
}

/// Rounding applied to every day quantity the ledger stores or reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingRule {
    /// The smallest representable quantity of leave (e.g. 0.5 for half days).
    pub unit: Decimal,
    /// How values between two units are resolved.
    pub mode: RoundingMode,
}

impl RoundingRule {
    /// Rounds a day quantity to a whole multiple of `unit`.
    ///
    /// # Example
    ///
    /// ```
    /// use leave_ledger::config::{RoundingMode, RoundingRule};
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let rule = RoundingRule { unit: Decimal::from_str("0.5").unwrap(), mode: RoundingMode::Floor };
    /// assert_eq!(rule.apply(Decimal::from_str("7.9").unwrap()), Decimal::from_str("7.5").unwrap());
    /// ```
    pub fn apply(&self, days: Decimal) -> Decimal {
        if self.unit <= Decimal::ZERO {
            return days;
        }
        let strategy = match self.mode {
            RoundingMode::Round => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundingMode::Ceil => RoundingStrategy::ToPositiveInfinity,
        };
        let units = (days / self.unit).round_dp_with_strategy(0, strategy);
        (units * self.unit).normalize()
    }

    /// Returns true if `days` is already a whole multiple of `unit`.
    pub fn is_aligned(&self, days: Decimal) -> bool {
        self.unit > Decimal::ZERO && (days % self.unit).is_zero()
    }
}

/// What a tenure beyond the last table row is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeyondTable {
    /// Keep granting the amount of the last row.
    #[default]
    LastEntry,
    /// Grant nothing.
    Zero,
}

/// The order in which consumption is attributed across active lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionOrder {
    /// Usage draws on the most recent grant before any carried-over days.
    #[default]
    NewestFirst,
    /// Usage draws on the oldest (soonest-expiring) lot first.
    OldestFirst,
}

/// One row of a grant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTableRow {
    /// Tenure in half-year steps (0.5, 1.5, 2.5, ...).
    pub tenure_years: Decimal,
    /// Days granted at that tenure.
    pub days: Decimal,
}

/// An inclusive range of scheduled annual working days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdayRange {
    /// Lowest annual workday count covered.
    pub min: u16,
    /// Highest annual workday count covered.
    pub max: u16,
}

impl WorkdayRange {
    /// Returns true if `days` falls within the range (inclusive).
    pub fn contains(&self, days: u16) -> bool {
        days >= self.min && days <= self.max
    }
}

/// Grant table for employees working a fixed number of days per week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartTimeTable {
    /// Scheduled working days per week this table applies to.
    pub weekly_days: u8,
    /// Annual workday range used when the weekly count is not fixed.
    pub annual_workdays: WorkdayRange,
    /// Tenure rows in ascending order.
    pub rows: Vec<GrantTableRow>,
}

/// A threshold used to flag employees at risk of missing mandatory consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCheckpoint {
    /// Width of the window before the next grant date, in months.
    pub months_before_next_grant: u32,
    /// Days that should have been consumed once inside the window.
    pub min_consumed_days: Decimal,
}

fn default_alert_min_grant_days() -> Decimal {
    Decimal::TEN
}

/// A published, immutable accrual policy.
///
/// Policies are never edited in place: a new version is published and then
/// activated. Every ledger operation receives the policy explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualPolicy {
    /// Document schema version (see [`SUPPORTED_SCHEMA_VERSION`]).
    pub schema_version: u32,
    /// Opaque version identifier.
    pub version: String,
    /// Human-readable policy name.
    pub name: String,
    /// The statute the policy implements, if any.
    #[serde(default)]
    pub statute: Option<String>,
    /// Date the policy was published for.
    pub effective_from: NaiveDate,
    /// Grant schedule rule.
    pub baseline_rule: BaselineRule,
    /// Lot lifetime rule.
    pub expiry_rule: ExpiryRule,
    /// Rounding applied to all day quantities.
    pub rounding: RoundingRule,
    /// Statutory minimum consumption per grant cycle.
    pub min_legal_use_days_per_year: Decimal,
    /// Grant size at or above which the minimum-consumption obligation applies.
    #[serde(default = "default_alert_min_grant_days")]
    pub alert_min_grant_days: Decimal,
    /// Behaviour for tenures past the last table row.
    #[serde(default)]
    pub beyond_table: BeyondTable,
    /// Attribution order for consumption across lots.
    #[serde(default)]
    pub consumption_order: ConsumptionOrder,
    /// Grant table for full-time employees.
    pub full_time_table: Vec<GrantTableRow>,
    /// Grant tables for part-time weekly patterns.
    #[serde(default)]
    pub part_time_tables: Vec<PartTimeTable>,
    /// Alerting thresholds.
    #[serde(default)]
    pub alert_checkpoints: Vec<AlertCheckpoint>,
}

impl AccrualPolicy {
    /// Checks the structural rules every published policy must satisfy.
    ///
    /// # Returns
    ///
    /// `Ok(())` for a valid policy, or `InvalidPolicy` naming the first
    /// violated rule.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(self.invalid(format!(
                "unsupported schema_version {} (expected {})",
                self.schema_version, SUPPORTED_SCHEMA_VERSION
            )));
        }
        if self.version.trim().is_empty() {
            return Err(self.invalid("version must not be empty"));
        }
        if self.baseline_rule.cycle_months == 0 {
            return Err(self.invalid("baseline_rule.cycle_months must be greater than zero"));
        }
        if self.expiry_rule.years == 0 {
            return Err(self.invalid("expiry_rule.years must be greater than zero"));
        }
        if self.rounding.unit <= Decimal::ZERO {
            return Err(self.invalid("rounding.unit must be greater than zero"));
        }
        if self.min_legal_use_days_per_year < Decimal::ZERO {
            return Err(self.invalid("min_legal_use_days_per_year must not be negative"));
        }

        self.validate_rows("full_time_table", &self.full_time_table)?;

        let mut seen_weekly = Vec::with_capacity(self.part_time_tables.len());
        for table in &self.part_time_tables {
            let label = format!("part_time_tables[weekly_days={}]", table.weekly_days);
            if !(1..=7).contains(&table.weekly_days) {
                return Err(self.invalid(format!("{label}: weekly_days must be within 1..=7")));
            }
            if seen_weekly.contains(&table.weekly_days) {
                return Err(self.invalid(format!("{label}: duplicate weekly_days")));
            }
            seen_weekly.push(table.weekly_days);
            if table.annual_workdays.min > table.annual_workdays.max {
                return Err(self.invalid(format!("{label}: annual_workdays.min exceeds max")));
            }
            self.validate_rows(&label, &table.rows)?;
        }

        for checkpoint in &self.alert_checkpoints {
            if checkpoint.months_before_next_grant == 0 {
                return Err(self.invalid("alert checkpoint months_before_next_grant must be positive"));
            }
            if checkpoint.min_consumed_days < Decimal::ZERO {
                return Err(self.invalid("alert checkpoint min_consumed_days must not be negative"));
            }
        }

        Ok(())
    }

    fn validate_rows(&self, table: &str, rows: &[GrantTableRow]) -> LedgerResult<()> {
        if rows.is_empty() {
            return Err(self.invalid(format!("{table} has no rows")));
        }
        let half = Decimal::new(5, 1);
        let mut previous: Option<Decimal> = None;
        for row in rows {
            let offset = row.tenure_years - half;
            if offset < Decimal::ZERO || !offset.fract().is_zero() {
                return Err(self.invalid(format!(
                    "{table}: tenure {} is not a half-year step",
                    row.tenure_years
                )));
            }
            if let Some(prev) = previous {
                if row.tenure_years - prev != Decimal::ONE {
                    return Err(self.invalid(format!(
                        "{table}: tenure {} does not follow {} by one year",
                        row.tenure_years, prev
                    )));
                }
            }
            if row.days < Decimal::ZERO || !self.rounding.is_aligned(row.days) {
                return Err(self.invalid(format!(
                    "{table}: {} days at tenure {} is negative or not a multiple of {}",
                    row.days, row.tenure_years, self.rounding.unit
                )));
            }
            previous = Some(row.tenure_years);
        }
        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> LedgerError {
        LedgerError::InvalidPolicy {
            version: self.version.clone(),
            message: message.into(),
        }
    }
}

/// Contents of the `active.yaml` pointer document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivePolicyPointer {
    /// The version currently governing employees without a pin.
    #[serde(default)]
    pub active_version: Option<String>,
}

/// All published policy versions plus the active-version pointer.
///
/// Resolution is a cheap map lookup returning shared handles, so callers can
/// cache or clone the result freely.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, Arc<AccrualPolicy>>,
    active_version: Option<String>,
}

impl PolicyRegistry {
    /// Builds a registry from validated policies.
    ///
    /// Fails if a policy is invalid, a version is published twice, or the
    /// active pointer names an unknown version.
    pub fn new(policies: Vec<AccrualPolicy>, active_version: Option<String>) -> LedgerResult<Self> {
        let mut map = BTreeMap::new();
        for policy in policies {
            policy.validate()?;
            let version = policy.version.clone();
            if map.insert(version.clone(), Arc::new(policy)).is_some() {
                return Err(LedgerError::InvalidPolicy {
                    version,
                    message: "version published more than once".to_string(),
                });
            }
        }
        if let Some(active) = &active_version {
            if !map.contains_key(active) {
                return Err(LedgerError::PolicyNotFound {
                    version: active.clone(),
                });
            }
        }
        Ok(Self {
            policies: map,
            active_version,
        })
    }

    /// Returns the active version identifier, if one is set.
    pub fn active_version(&self) -> Option<&str> {
        self.active_version.as_deref()
    }

    /// Returns all published versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// Looks up a published version.
    pub fn get(&self, version: &str) -> LedgerResult<Arc<AccrualPolicy>> {
        self.policies
            .get(version)
            .cloned()
            .ok_or_else(|| LedgerError::PolicyNotFound {
                version: version.to_string(),
            })
    }

    /// Returns the active policy, or `ConfigurationMissing` when none is set.
    pub fn active(&self) -> LedgerResult<Arc<AccrualPolicy>> {
        let version = self
            .active_version
            .as_deref()
            .ok_or(LedgerError::ConfigurationMissing)?;
        self.get(version)
    }

    /// Resolves an optional version pin, defaulting to the active policy.
    pub fn resolve(&self, version_override: Option<&str>) -> LedgerResult<Arc<AccrualPolicy>> {
        match version_override {
            Some(version) => self.get(version),
            None => self.active(),
        }
    }
}
