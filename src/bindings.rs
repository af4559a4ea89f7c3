//! Python bindings
//!
//! Exposes compile/evaluate/combine and batch evaluation to a Python host
//! that owns the HTTP layer and rule persistence. ASTs cross the boundary
//! in their document form as plain dicts.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyFloat, PyInt, PyList, PyString};

use crate::config::{CombineStyle, EngineConfig, ParseMode};
use crate::engine::{evaluate_batch as run_batch, BatchEntry, Engine, RuleId, RuleOutcome};
use crate::record::{EvaluationRecord, Value};
use crate::rule::{self, DocumentType, LogicOp, Node, NodeDocument};

// ============================================================================
// Cached Configuration
// ============================================================================

/// Process-wide engine configuration
static ENGINE: OnceCell<RwLock<Engine>> = OnceCell::new();

fn current_engine() -> Engine {
    ENGINE.get().map(|e| *e.read()).unwrap_or_default()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_setting<T: serde::de::DeserializeOwned>(name: &str, text: String) -> PyResult<T> {
    serde_json::from_value(serde_json::Value::String(text.clone()))
        .map_err(|_| PyValueError::new_err(format!("Invalid {}: {}", name, text)))
}

fn extract_config(config: &Bound<'_, PyDict>) -> PyResult<EngineConfig> {
    let mut result = EngineConfig::default();
    if let Some(mode) = config.get_item("parse_mode")? {
        result.parse_mode = parse_setting::<ParseMode>("parse_mode", mode.extract()?)?;
    }
    if let Some(style) = config.get_item("combine_style")? {
        result.combine_style = parse_setting::<CombineStyle>("combine_style", style.extract()?)?;
    }
    Ok(result)
}

fn document_from_py(obj: &Bound<'_, PyAny>, depth: usize) -> PyResult<NodeDocument> {
    rule::check_document_depth(depth)?;
    let dict = obj
        .downcast::<PyDict>()
        .map_err(|_| PyTypeError::new_err("AST node must be a dict"))?;

    let node_type: String = dict
        .get_item("type")?
        .ok_or_else(|| PyValueError::new_err("AST node without type"))?
        .extract()?;
    let node_type = match node_type.as_str() {
        "operator" => DocumentType::Operator,
        "comparison" => DocumentType::Comparison,
        "operand" => DocumentType::Operand,
        other => return Err(PyValueError::new_err(format!("Unknown node type: {}", other))),
    };

    let value: Option<String> = match dict.get_item("value")? {
        Some(v) if !v.is_none() => Some(v.extract()?),
        _ => None,
    };

    let child = |key: &str| -> PyResult<Option<Box<NodeDocument>>> {
        match dict.get_item(key)? {
            Some(v) if !v.is_none() => Ok(Some(Box::new(document_from_py(&v, depth + 1)?))),
            _ => Ok(None),
        }
    };

    Ok(NodeDocument {
        node_type,
        value,
        left: child("left")?,
        right: child("right")?,
    })
}

fn document_to_py<'py>(py: Python<'py>, doc: &NodeDocument) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    let node_type = match doc.node_type {
        DocumentType::Operator => "operator",
        DocumentType::Comparison => "comparison",
        DocumentType::Operand => "operand",
    };
    dict.set_item("type", node_type)?;
    dict.set_item("value", doc.value.as_deref())?;
    if let Some(left) = &doc.left {
        dict.set_item("left", document_to_py(py, left)?)?;
    }
    if let Some(right) = &doc.right {
        dict.set_item("right", document_to_py(py, right)?)?;
    }
    Ok(dict)
}

fn node_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Node> {
    Ok(Node::try_from(document_from_py(obj, 0)?)?)
}

fn record_from_py(obj: &Bound<'_, PyAny>) -> PyResult<EvaluationRecord> {
    let dict = obj
        .downcast::<PyDict>()
        .map_err(|_| PyTypeError::new_err("Evaluation data must be a dict"))?;

    let mut record = EvaluationRecord::new();
    for (key, value) in dict.iter() {
        let field: String = key.extract()?;
        let value = if value.is_instance_of::<PyInt>() {
            Value::Integer(value.extract()?)
        } else if value.is_instance_of::<PyFloat>() {
            Value::Float(value.extract()?)
        } else if value.is_instance_of::<PyString>() {
            Value::Text(value.extract()?)
        } else {
            return Err(PyTypeError::new_err(format!(
                "Field {} must be a number or a string",
                field
            )));
        };
        record.insert(field, value);
    }
    Ok(record)
}

fn record_to_py<'py>(py: Python<'py>, record: &EvaluationRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (field, value) in record.iter() {
        match value {
            Value::Integer(i) => dict.set_item(field, *i)?,
            Value::Float(f) => dict.set_item(field, *f)?,
            Value::Text(s) => dict.set_item(field, s)?,
        }
    }
    Ok(dict)
}

fn entries_to_py<'py>(py: Python<'py>, entries: &[BatchEntry]) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty(py);
    for entry in entries {
        let results = PyDict::new(py);
        for (rule_id, outcome) in &entry.results {
            match outcome {
                RuleOutcome::Matched(matched) => results.set_item(*rule_id, *matched)?,
                RuleOutcome::Failed(message) => results.set_item(*rule_id, message)?,
            }
        }
        let item = PyDict::new(py);
        item.set_item("data", record_to_py(py, &entry.data)?)?;
        item.set_item("results", results)?;
        list.append(item)?;
    }
    Ok(list)
}

/// Extract `{rule_id: ast}` and the record list while holding the GIL
fn extract_batch(
    rules: &Bound<'_, PyDict>,
    data_list: &Bound<'_, PyList>,
) -> PyResult<(Vec<(RuleId, Node)>, Vec<EvaluationRecord>)> {
    let mut compiled = Vec::with_capacity(rules.len());
    for (key, value) in rules.iter() {
        compiled.push((key.extract::<RuleId>()?, node_from_py(&value)?));
    }
    compiled.sort_by_key(|(id, _)| *id);

    let records = data_list
        .iter()
        .map(|item| record_from_py(&item))
        .collect::<PyResult<Vec<_>>>()?;

    Ok((compiled, records))
}

fn run_owned_batch(rules: &[(RuleId, Node)], records: &[EvaluationRecord]) -> Vec<BatchEntry> {
    let borrowed: Vec<(RuleId, &Node)> = rules.iter().map(|(id, node)| (*id, node)).collect();
    run_batch(&borrowed, records)
}

// ============================================================================
// Python Classes
// ============================================================================

/// Result of an asynchronous batch evaluation, held in Rust memory
#[pyclass]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

#[pymethods]
impl BatchResult {
    /// Number of evaluated records
    fn __len__(&self) -> usize {
        self.entries.len()
    }

    /// Entries as `[{"data": {...}, "results": {rule_id: bool | str}}]`
    fn to_list<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        entries_to_py(py, &self.entries)
    }

    /// Entries serialized as JSON
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.entries).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}

// ============================================================================
// Python Functions
// ============================================================================

/// Install the engine configuration (call once at startup)
///
/// # Arguments
/// * `config` - Optional dict with `parse_mode` ("strict" | "lenient") and
///   `combine_style` ("chained" | "legacy")
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_config(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let config = match config {
        Some(dict) => extract_config(dict)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config);

    // If already initialized, update the config
    if let Some(existing) = ENGINE.get() {
        *existing.write() = engine;
    } else {
        let _ = ENGINE.set(RwLock::new(engine));
    }
    Ok(())
}

/// Check if config is initialized
#[pyfunction]
fn is_config_initialized() -> bool {
    ENGINE.get().is_some()
}

/// Install a tracing subscriber writing to stderr
///
/// Returns False when a subscriber was already installed.
#[pyfunction]
#[pyo3(signature = (filter=None))]
fn init_logging(filter: Option<String>) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = filter
        .map(EnvFilter::new)
        .unwrap_or_else(|| {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Split a rule string into tokens
#[pyfunction]
fn tokenize(rule_string: &str) -> Vec<String> {
    rule::tokenize(rule_string)
        .iter()
        .map(|t| t.to_string())
        .collect()
}

/// Compile a rule string into its AST document
///
/// # Raises
/// ValueError if the rule is malformed or uses an unsupported operator
#[pyfunction]
fn compile<'py>(py: Python<'py>, rule_string: &str) -> PyResult<Bound<'py, PyDict>> {
    let document = current_engine().compile_document(rule_string)?;
    document_to_py(py, &document)
}

/// Evaluate an AST document against a data dict
///
/// # Raises
/// KeyError for missing fields, TypeError for non-numeric literals compared
/// against numeric fields, ValueError for invalid ASTs
#[pyfunction]
fn evaluate(ast: &Bound<'_, PyAny>, data: &Bound<'_, PyAny>) -> PyResult<bool> {
    let node = node_from_py(ast)?;
    let record = record_from_py(data)?;
    Ok(current_engine().evaluate(&node, &record)?)
}

/// Combine rule strings with "AND" or "OR"
#[pyfunction]
fn combine(rules: Vec<String>, operator: &str) -> PyResult<String> {
    let op: LogicOp = operator.parse()?;
    Ok(current_engine().combine(&rules, op)?)
}

/// Evaluate `{rule_id: ast}` against every dict of `data_list`
///
/// Failures are reported per pair as the error message.
#[pyfunction]
fn evaluate_batch<'py>(
    py: Python<'py>,
    rules: &Bound<'py, PyDict>,
    data_list: &Bound<'py, PyList>,
) -> PyResult<Bound<'py, PyList>> {
    let (compiled, records) = extract_batch(rules, data_list)?;
    let entries = run_owned_batch(&compiled, &records);
    entries_to_py(py, &entries)
}

/// Evaluate a batch on a background thread
///
/// # Returns
/// A Python awaitable that resolves to a BatchResult object
#[pyfunction]
fn evaluate_batch_async<'py>(
    py: Python<'py>,
    rules: &Bound<'py, PyDict>,
    data_list: &Bound<'py, PyList>,
) -> PyResult<Bound<'py, PyAny>> {
    // Python objects stay on this thread
    let (compiled, records) = extract_batch(rules, data_list)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let entries = tokio::task::spawn_blocking(move || run_owned_batch(&compiled, &records))
            .await
            .map_err(|e| PyRuntimeError::new_err(format!("Batch task panicked: {}", e)))?;

        Ok(BatchResult { entries })
    })
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_config, m)?)?;
    m.add_function(wrap_pyfunction!(is_config_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add_function(wrap_pyfunction!(tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(compile, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(combine, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_batch, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_batch_async, m)?)?;
    m.add_class::<BatchResult>()?;
    Ok(())
}
