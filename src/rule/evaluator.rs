//! Rule evaluator

use std::cmp::Ordering;
use tracing::trace;

use crate::error::{Result, RuleError};
use crate::record::{EvaluationRecord, Value};
use crate::rule::ast::{CompOp, LogicOp, Node};

/// Evaluate an AST against a record.
///
/// Both sides of an operator are always evaluated, so an error on either
/// side fails the whole rule even when the other side decides the result.
pub fn evaluate(node: &Node, record: &EvaluationRecord) -> Result<bool> {
    match node {
        Node::Operator { op, left, right } => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            Ok(match op {
                LogicOp::And => left && right,
                LogicOp::Or => left || right,
            })
        }
        Node::Comparison { op, field, literal } => evaluate_comparison(*op, field, literal, record),
        Node::Operand(text) => Err(RuleError::InvalidNode(format!(
            "operand '{}' cannot be evaluated as a rule",
            text
        ))),
    }
}

fn evaluate_comparison(
    op: CompOp,
    field: &str,
    literal: &str,
    record: &EvaluationRecord,
) -> Result<bool> {
    let actual = record.get(field).ok_or_else(|| RuleError::FieldNotFound {
        field: field.to_string(),
    })?;

    let result = compare(op, actual, field, literal)?;
    trace!(field, op = op.as_str(), literal, result, "comparison");
    Ok(result)
}

/// Compare a record value against a literal using the value's type
pub fn compare(op: CompOp, actual: &Value, field: &str, literal: &str) -> Result<bool> {
    let expected = strip_quotes(literal);

    match actual {
        Value::Integer(actual) => {
            let number = parse_number(field, expected)?;
            if !number.is_finite() {
                return Err(type_mismatch(field, expected));
            }
            Ok(compare_integer(op, *actual, number.trunc()))
        }
        Value::Float(actual) => {
            let number = parse_number(field, expected)?;
            Ok(op.apply(actual, &number))
        }
        Value::Text(actual) => Ok(op.apply(actual.as_str(), expected)),
    }
}

/// Lower bound of `i64` as `f64`; exact, so the upper bound is its negation
const I64_MIN_F64: f64 = i64::MIN as f64;

/// Compare an integral field against an already truncated literal.
///
/// Literals beyond the `i64` range order the comparison by sign instead of
/// saturating when cast.
fn compare_integer(op: CompOp, actual: i64, truncated: f64) -> bool {
    if truncated >= -I64_MIN_F64 {
        op.apply(&Ordering::Less, &Ordering::Equal)
    } else if truncated < I64_MIN_F64 {
        op.apply(&Ordering::Greater, &Ordering::Equal)
    } else {
        op.apply(&actual, &(truncated as i64))
    }
}

/// Remove surrounding single quotes, then surrounding double quotes
#[inline]
pub fn strip_quotes(literal: &str) -> &str {
    literal.trim_matches('\'').trim_matches('"')
}

fn parse_number(field: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| type_mismatch(field, text))
}

/// `text` is the literal with its quotes already stripped
fn type_mismatch(field: &str, text: &str) -> RuleError {
    RuleError::TypeMismatch {
        field: field.to_string(),
        literal: text.to_string(),
    }
}
