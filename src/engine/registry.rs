//! In-process rule registry
//!
//! Keeps compiled rules under numeric ids and offers the rule lifecycle
//! of the service layer (create, list, delete, combine, evaluate) without
//! any transport or database.

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::engine::batch::{evaluate_batch, BatchEntry, RuleId};
use crate::engine::Engine;
use crate::error::{Result, RuleError};
use crate::record::EvaluationRecord;
use crate::rule::{LogicOp, Node, NodeDocument};

/// A compiled rule and its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRule {
    pub rule_id: RuleId,
    pub name: String,
    pub description: String,
    pub rule_string: String,
    #[serde(serialize_with = "serialize_ast")]
    pub ast: Node,
}

fn serialize_ast<S: Serializer>(ast: &Node, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    NodeDocument::from(ast).serialize(serializer)
}

/// Thread-safe store of compiled rules
#[derive(Debug)]
pub struct RuleRegistry {
    engine: Engine,
    rules: RwLock<AHashMap<RuleId, StoredRule>>,
    next_id: AtomicU64,
}

impl RuleRegistry {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            rules: RwLock::new(AHashMap::with_capacity(64)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compile and store a new rule. Nothing is stored if compilation fails.
    pub fn create(&self, name: &str, description: &str, rule_string: &str) -> Result<StoredRule> {
        let ast = self.engine.compile(rule_string)?;
        let rule_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let rule = StoredRule {
            rule_id,
            name: name.to_string(),
            description: description.to_string(),
            rule_string: rule_string.to_string(),
            ast,
        };
        self.rules.write().insert(rule_id, rule.clone());

        info!(rule_id, name, "rule created");
        Ok(rule)
    }

    /// All rules ordered by id
    pub fn list(&self) -> Vec<StoredRule> {
        let mut rules: Vec<StoredRule> = self.rules.read().values().cloned().collect();
        rules.sort_by_key(|r| r.rule_id);
        rules
    }

    pub fn get(&self, rule_id: RuleId) -> Result<StoredRule> {
        self.rules
            .read()
            .get(&rule_id)
            .cloned()
            .ok_or(RuleError::RuleNotFound(rule_id))
    }

    pub fn delete(&self, rule_id: RuleId) -> Result<()> {
        match self.rules.write().remove(&rule_id) {
            Some(_) => {
                info!(rule_id, "rule deleted");
                Ok(())
            }
            None => Err(RuleError::RuleNotFound(rule_id)),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Combine stored rules, in the order given, into a new stored rule
    pub fn combine(
        &self,
        rule_ids: &[RuleId],
        op: LogicOp,
        name: &str,
        description: &str,
    ) -> Result<StoredRule> {
        let rule_strings = {
            let rules = self.rules.read();
            rule_ids
                .iter()
                .map(|id| {
                    rules
                        .get(id)
                        .map(|r| r.rule_string.clone())
                        .ok_or(RuleError::RuleNotFound(*id))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let combined = self.engine.combine(&rule_strings, op)?;
        self.create(name, description, &combined)
    }

    /// Evaluate one stored rule against a record
    pub fn evaluate(&self, rule_id: RuleId, record: &EvaluationRecord) -> Result<bool> {
        let rules = self.rules.read();
        let rule = rules.get(&rule_id).ok_or(RuleError::RuleNotFound(rule_id))?;
        self.engine.evaluate(&rule.ast, record)
    }

    /// Evaluate stored rules against records. Unknown ids fail the whole
    /// call before anything is evaluated; evaluation failures do not.
    pub fn evaluate_batch(
        &self,
        rule_ids: &[RuleId],
        records: &[EvaluationRecord],
    ) -> Result<Vec<BatchEntry>> {
        let rules = self.rules.read();
        let selected = rule_ids
            .iter()
            .map(|id| {
                rules
                    .get(id)
                    .map(|r| (*id, &r.ast))
                    .ok_or(RuleError::RuleNotFound(*id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(evaluate_batch(&selected, records))
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new(Engine::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::batch::RuleOutcome;
    use crate::record::Value;

    fn employee(age: i64, department: &str, salary: f64) -> EvaluationRecord {
        [
            ("age", Value::from(age)),
            ("department", Value::from(department)),
            ("salary", Value::from(salary)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let registry = RuleRegistry::default();
        let a = registry.create("senior", "age check", "age > 30").unwrap();
        let b = registry.create("sales", "dept check", "department = 'Sales'").unwrap();
        assert_eq!(a.rule_id, 1);
        assert_eq!(b.rule_id, 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(2).unwrap().name, "sales");
    }

    #[test]
    fn test_create_invalid_rule_stores_nothing() {
        let registry = RuleRegistry::default();
        assert!(registry.create("bad", "", "(age >").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_and_delete() {
        let registry = RuleRegistry::default();
        for i in 0..3 {
            registry.create(&format!("r{}", i), "", &format!("age > {}", i)).unwrap();
        }
        registry.delete(2).unwrap();
        let ids: Vec<RuleId> = registry.list().iter().map(|r| r.rule_id).collect();
        assert_eq!(ids, vec![1u64, 3]);
        assert_eq!(registry.delete(2), Err(RuleError::RuleNotFound(2)));
    }

    #[test]
    fn test_combine_and_evaluate() {
        let registry = RuleRegistry::default();
        let age = registry.create("senior", "", "age > 30").unwrap();
        let dept = registry.create("sales", "", "(department = 'Sales')").unwrap();

        let combined = registry
            .combine(&[age.rule_id, dept.rule_id], LogicOp::And, "senior sales", "")
            .unwrap();
        assert_eq!(combined.rule_string, "((age > 30) AND ((department = 'Sales')))");

        assert!(registry
            .evaluate(combined.rule_id, &employee(35, "Sales", 1000.0))
            .unwrap());
        assert!(!registry
            .evaluate(combined.rule_id, &employee(35, "HR", 1000.0))
            .unwrap());
    }

    #[test]
    fn test_combine_unknown_rule() {
        let registry = RuleRegistry::default();
        registry.create("senior", "", "age > 30").unwrap();
        let err = registry.combine(&[1, 42], LogicOp::Or, "x", "").unwrap_err();
        assert_eq!(err, RuleError::RuleNotFound(42));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_legacy_combine_is_rejected_by_lenient_parser() {
        // The legacy string starts with the operator and cannot compile
        let registry = RuleRegistry::new(Engine::new(EngineConfig::legacy()));
        registry.create("a", "", "a > 1").unwrap();
        registry.create("b", "", "b > 2").unwrap();
        assert!(registry.combine(&[1, 2], LogicOp::And, "ab", "").is_err());
    }

    #[test]
    fn test_evaluate_batch() {
        let registry = RuleRegistry::default();
        registry.create("senior", "", "age > 30").unwrap();
        registry.create("rich", "", "bonus > 100").unwrap();

        let records = [employee(35, "Sales", 1.0), employee(25, "HR", 2.0)];
        let entries = registry.evaluate_batch(&[1, 2], &records).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].results[&1], RuleOutcome::Matched(true));
        assert_eq!(entries[1].results[&1], RuleOutcome::Matched(false));
        assert!(entries.iter().all(|e| e.results[&2].is_failure()));

        assert_eq!(
            registry.evaluate_batch(&[1, 9], &records).unwrap_err(),
            RuleError::RuleNotFound(9)
        );
    }

    #[test]
    fn test_stored_rule_serializes_document() {
        let registry = RuleRegistry::default();
        let rule = registry.create("senior", "age check", "age > 30").unwrap();
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["rule_id"], 1);
        assert_eq!(json["ast"]["type"], "comparison");
        assert_eq!(json["ast"]["left"]["value"], "age");
    }

    #[test]
    fn test_concurrent_creates() {
        let registry = std::sync::Arc::new(RuleRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry
                        .create(&format!("r{}", i), "", &format!("age > {}", i))
                        .unwrap()
                        .rule_id
                })
            })
            .collect();

        let mut ids: Vec<RuleId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8u64).collect::<Vec<_>>());
    }
}
