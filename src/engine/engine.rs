//! Configured rule engine

use crate::config::EngineConfig;
use crate::engine::batch::{evaluate_batch, BatchEntry, RuleId};
use crate::error::Result;
use crate::record::EvaluationRecord;
use crate::rule::{self, LogicOp, Node, NodeDocument};

/// Rule engine bound to one configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a rule string into an AST
    pub fn compile(&self, rule_string: &str) -> Result<Node> {
        rule::parse(rule_string, self.config.parse_mode)
    }

    /// Compile a rule string straight into its document form
    pub fn compile_document(&self, rule_string: &str) -> Result<NodeDocument> {
        Ok(NodeDocument::from(&self.compile(rule_string)?))
    }

    /// Evaluate an AST against a record
    pub fn evaluate(&self, node: &Node, record: &EvaluationRecord) -> Result<bool> {
        rule::evaluate(node, record)
    }

    /// Evaluate a persisted document against a record
    pub fn evaluate_document(
        &self,
        document: &NodeDocument,
        record: &EvaluationRecord,
    ) -> Result<bool> {
        let node = Node::try_from(document)?;
        rule::evaluate(&node, record)
    }

    /// Build a composite rule string; the caller compiles the result
    pub fn combine<S: AsRef<str>>(&self, rule_strings: &[S], op: LogicOp) -> Result<String> {
        rule::combine(rule_strings, op, self.config.combine_style)
    }

    /// Evaluate every rule against every record
    pub fn evaluate_batch(
        &self,
        rules: &[(RuleId, &Node)],
        records: &[EvaluationRecord],
    ) -> Vec<BatchEntry> {
        evaluate_batch(rules, records)
    }
}
