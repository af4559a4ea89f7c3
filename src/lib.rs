//! Rule Engine Core - compiler and evaluator for conditional business rules
//!
//! Rules are parenthesized boolean/comparison strings such as
//! `((age > 30) AND (department = 'Sales'))`. They are compiled once into
//! an AST and evaluated repeatedly against flat records.
//!
//! ```
//! use rule_engine_core::{compile, evaluate, EvaluationRecord};
//!
//! let rule = compile("((age > 30) AND (department = 'Sales'))").unwrap();
//! let record = EvaluationRecord::from_json(r#"{"age": 35, "department": "Sales"}"#).unwrap();
//! assert!(evaluate(&rule, &record).unwrap());
//! ```
//!
//! Python bindings via PyO3 are available behind the `python` feature.

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod rule;

#[cfg(feature = "python")]
mod bindings;

pub use crate::config::{CombineStyle, EngineConfig, ParseMode};
pub use crate::engine::{BatchEntry, Engine, RuleId, RuleOutcome, RuleRegistry, StoredRule};
pub use crate::error::{Result, RuleError};
pub use crate::record::{EvaluationRecord, Value};
pub use crate::rule::{evaluate, tokenize, CompOp, LogicOp, Node, NodeDocument, NodeKind};

/// Compile a rule string with the default (strict) configuration
pub fn compile(rule_string: &str) -> Result<Node> {
    Engine::default().compile(rule_string)
}

/// Combine rule strings with the default (chained) configuration.
/// The result still has to be compiled.
pub fn combine<S: AsRef<str>>(rule_strings: &[S], op: LogicOp) -> Result<String> {
    Engine::default().combine(rule_strings, op)
}
