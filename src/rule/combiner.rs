//! Builds composite rule strings from existing ones

use tracing::debug;

use crate::config::CombineStyle;
use crate::error::{Result, RuleError};
use crate::rule::ast::LogicOp;

/// Combine rule strings with a boolean operator.
///
/// `Chained` produces `(((r1) OP (r2)) OP (r3))`, which the parser always
/// accepts when the inputs are valid rules. `Legacy` reproduces the old
/// construction `" OP(r1) (r2) ..."` verbatim; it does not follow the
/// grammar and is only kept to regenerate previously stored strings.
pub fn combine<S: AsRef<str>>(rules: &[S], op: LogicOp, style: CombineStyle) -> Result<String> {
    if rules.is_empty() {
        return Err(RuleError::MalformedRule("No rules to combine".to_string()));
    }

    let combined = match style {
        CombineStyle::Chained => chain(rules, op),
        CombineStyle::Legacy => legacy(rules, op),
    };

    debug!(count = rules.len(), op = op.as_str(), ?style, combined = %combined, "combined rules");
    Ok(combined)
}

fn chain<S: AsRef<str>>(rules: &[S], op: LogicOp) -> String {
    let mut iter = rules.iter().map(|r| r.as_ref().trim());
    let first = iter.next().unwrap_or_default();

    if rules.len() == 1 {
        return first.to_string();
    }

    iter.fold(format!("({})", first), |acc, rule| {
        format!("({} {} ({}))", acc, op, rule)
    })
}

fn legacy<S: AsRef<str>>(rules: &[S], op: LogicOp) -> String {
    let joined = rules
        .iter()
        .map(|r| format!("({})", r.as_ref()))
        .collect::<Vec<_>>()
        .join(" ");
    format!(" {}{}", op, joined)
}
