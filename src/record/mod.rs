//! Evaluation records
//!
//! A record is the flat field -> scalar mapping a compiled rule is
//! evaluated against. It is supplied fresh per evaluation and never owned
//! by the AST.

mod value;

pub use value::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Flat mapping from field name to scalar value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationRecord {
    fields: BTreeMap<String, Value>,
}

impl EvaluationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Insert or replace a field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for EvaluationRecord
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
