//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading accrual policy
//! documents from YAML files into a [`PolicyRegistry`].

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};

use super::types::{AccrualPolicy, ActivePolicyPointer, PolicyRegistry};

/// Loads and provides access to published accrual policies.
///
/// # Directory Structure
///
/// ```text
/// config/leave_policy/
/// ├── active.yaml            # active_version: "2024-04-01" (optional)
/// └── policies/
///     ├── 2019-04-01.yaml    # one document per published version
///     └── 2024-04-01.yaml
/// ```
///
/// A missing `active.yaml` is not a load failure: the registry loads, and
/// every query that needs the active policy reports `ConfigurationMissing`.
///
/// # Example
///
/// ```no_run
/// use leave_ledger::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/leave_policy")?;
/// let policy = loader.active_policy()?;
/// println!("Active policy: {} ({})", policy.name, policy.version);
/// # Ok::<(), leave_ledger::error::LedgerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    registry: PolicyRegistry,
}

impl ConfigLoader {
    /// Loads every policy document and the active pointer from a directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The `policies` directory is missing or empty
    /// - Any document is invalid YAML or fails policy validation
    /// - The active pointer names a version that is not published
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();

        let policies = Self::load_policies(&path.join("policies"))?;

        let active_path = path.join("active.yaml");
        let pointer = if active_path.exists() {
            Self::load_yaml::<ActivePolicyPointer>(&active_path)?
        } else {
            ActivePolicyPointer::default()
        };

        let registry = PolicyRegistry::new(policies, pointer.active_version)?;
        info!(
            path = %path.display(),
            versions = registry.versions().count(),
            active_version = registry.active_version().unwrap_or("<none>"),
            "Loaded accrual policies"
        );

        Ok(Self { registry })
    }

    /// Parses a single policy document.
    ///
    /// `origin` is used in error messages only.
    pub fn parse_policy(content: &str, origin: &str) -> LedgerResult<AccrualPolicy> {
        let policy: AccrualPolicy =
            serde_yaml::from_str(content).map_err(|e| LedgerError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> LedgerResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| LedgerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| LedgerError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all policy documents from the policies directory.
    fn load_policies(policies_dir: &Path) -> LedgerResult<Vec<AccrualPolicy>> {
        let dir_str = policies_dir.display().to_string();

        let entries = fs::read_dir(policies_dir).map_err(|_| LedgerError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| LedgerError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut policies = Vec::with_capacity(paths.len());
        for path in paths {
            let policy = Self::load_yaml::<AccrualPolicy>(&path)?;
            policy.validate()?;
            debug!(path = %path.display(), version = %policy.version, "Parsed policy document");
            policies.push(policy);
        }

        if policies.is_empty() {
            return Err(LedgerError::ConfigNotFound {
                path: format!("{} (no policy files found)", dir_str),
            });
        }

        Ok(policies)
    }

    /// Returns the loaded policy registry.
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Consumes the loader, returning the registry.
    pub fn into_registry(self) -> PolicyRegistry {
        self.registry
    }

    /// Returns the active policy.
    pub fn active_policy(&self) -> LedgerResult<Arc<AccrualPolicy>> {
        self.registry.active()
    }
}
