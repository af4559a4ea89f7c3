//! Batch evaluation of many rules against many records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::record::EvaluationRecord;
use crate::rule::{evaluate, Node};

/// Identifier of a stored rule
pub type RuleId = u64;

/// Outcome of one (record, rule) pair.
///
/// Serializes as a bare boolean or the error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleOutcome {
    Matched(bool),
    Failed(String),
}

impl RuleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RuleOutcome::Failed(_))
    }
}

/// One record with its per-rule outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub data: EvaluationRecord,
    pub results: BTreeMap<RuleId, RuleOutcome>,
}

/// Evaluate every rule against every record.
///
/// Entries follow the record order. A failing pair is recorded as
/// `RuleOutcome::Failed` and never stops the remaining pairs.
pub fn evaluate_batch(rules: &[(RuleId, &Node)], records: &[EvaluationRecord]) -> Vec<BatchEntry> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let results = rules
                .iter()
                .map(|(rule_id, node)| {
                    let outcome = match evaluate(node, record) {
                        Ok(matched) => RuleOutcome::Matched(matched),
                        Err(e) => {
                            warn!(rule_id, record = index, error = %e, "rule evaluation failed");
                            RuleOutcome::Failed(e.to_string())
                        }
                    };
                    (*rule_id, outcome)
                })
                .collect();

            BatchEntry {
                data: record.clone(),
                results,
            }
        })
        .collect()
}
