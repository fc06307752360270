//! Audit trace records.
//!
//! Grant decisions are legally significant, so every table lookup and lot
//! creation records the rule applied, its statute clause, and the JSON
//! inputs and outputs that produced it.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a ledger decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Reference to the statute clause for this rule.
    pub clause_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}
