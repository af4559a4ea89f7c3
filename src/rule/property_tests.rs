//! Property tests for the rule module

use proptest::prelude::*;

use crate::config::{CombineStyle, ParseMode};
use crate::error::RuleError;
use crate::record::{EvaluationRecord, Value};
use crate::rule::ast::{CompOp, LogicOp, Node};
use crate::rule::combiner::combine;
use crate::rule::document::NodeDocument;
use crate::rule::evaluator::{compare, evaluate};
use crate::rule::parser::parse;
use crate::rule::tokenizer::tokenize;

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

const FIELDS: [&str; 3] = ["age", "salary", "score"];

fn field_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIELDS.to_vec())
}

fn comp_op_strategy() -> impl Strategy<Value = CompOp> {
    prop::sample::select(CompOp::ALL.to_vec())
}

fn logic_op_strategy() -> impl Strategy<Value = LogicOp> {
    prop_oneof![Just(LogicOp::And), Just(LogicOp::Or)]
}

/// Comparison against an integer literal, optionally quoted
fn comparison_strategy() -> impl Strategy<Value = Node> {
    (field_strategy(), comp_op_strategy(), -100..=100i64, any::<bool>()).prop_map(
        |(field, op, value, quoted)| {
            let literal = if quoted {
                format!("'{}'", value)
            } else {
                value.to_string()
            };
            Node::comparison(field, op, literal)
        },
    )
}

/// Arbitrary well-formed rule trees
fn tree_strategy() -> impl Strategy<Value = Node> {
    comparison_strategy().prop_recursive(4, 16, 2, |inner| {
        (inner.clone(), logic_op_strategy(), inner)
            .prop_map(|(left, op, right)| Node::operator(op, left, right))
    })
}

/// Record containing every generated field
fn record_strategy() -> impl Strategy<Value = EvaluationRecord> {
    (-100..=100i64, -100.0..100.0f64, -100..=100i64).prop_map(|(age, salary, score)| {
        [
            ("age", Value::Integer(age)),
            ("salary", Value::Float(salary)),
            ("score", Value::Integer(score)),
        ]
        .into_iter()
        .collect()
    })
}

fn compile(rule: &str) -> Node {
    parse(rule, ParseMode::Strict).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Parentheses always end up as single tokens and nothing else is lost
    #[test]
    fn prop_tokenizer_isolates_parens(input in "[a-z0-9()<>=' \t]{0,40}") {
        let tokens = tokenize(&input);
        for token in &tokens {
            prop_assert!(!token.is_empty());
            if token.contains('(') || token.contains(')') {
                prop_assert_eq!(token.len(), 1, "token {:?} in {:?}", token, input);
            }
        }
        let squashed: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        prop_assert_eq!(tokens.concat(), squashed);
    }

    /// Rendering a tree and compiling it again gives the same tree
    #[test]
    fn prop_rendered_rule_compiles_back(tree in tree_strategy()) {
        let rule = tree.to_string();
        prop_assert_eq!(compile(&rule), tree);
    }

    /// Document form round-trips losslessly through JSON
    #[test]
    fn prop_document_round_trip(tree in tree_strategy()) {
        let json = NodeDocument::from(&tree).to_json().unwrap();
        let back = Node::try_from(NodeDocument::from_json(&json).unwrap()).unwrap();
        prop_assert_eq!(back, tree);
    }

    /// Integer fields compare exactly like Rust integers
    #[test]
    fn prop_integer_comparison(actual in -1000..=1000i64, threshold in -1000..=1000i64, op in comp_op_strategy()) {
        let result = compare(op, &Value::Integer(actual), "score", &threshold.to_string()).unwrap();
        prop_assert_eq!(result, op.apply(&actual, &threshold));
    }

    /// Float fields compare against the parsed literal
    #[test]
    fn prop_float_comparison(actual in -1000.0..1000.0f64, threshold in -1000..=1000i32, op in comp_op_strategy()) {
        let literal = format!("\"{}\"", threshold);
        let result = compare(op, &Value::Float(actual), "salary", &literal).unwrap();
        prop_assert_eq!(result, op.apply(&actual, &(threshold as f64)));
    }

    /// Text fields compare lexicographically against the unquoted literal
    #[test]
    fn prop_text_comparison(actual in "[a-z]{1,8}", expected in "[a-z]{1,8}", op in comp_op_strategy()) {
        let literal = format!("'{}'", expected);
        let result = compare(op, &Value::Text(actual.clone()), "name", &literal).unwrap();
        prop_assert_eq!(result, op.apply(actual.as_str(), expected.as_str()));
    }

    /// Combining two rules with AND agrees with evaluating both
    #[test]
    fn prop_combine_and_matches_conjunction(
        r1 in tree_strategy(),
        r2 in tree_strategy(),
        data in record_strategy()
    ) {
        let rules = [r1.to_string(), r2.to_string()];
        let combined = combine(&rules, LogicOp::And, CombineStyle::Chained).unwrap();
        let expected = evaluate(&r1, &data).unwrap() && evaluate(&r2, &data).unwrap();
        let actual = evaluate(&compile(&combined), &data).unwrap();
        prop_assert_eq!(actual, expected, "rule: {}", combined);
    }

    /// Combining two rules with OR agrees with evaluating either
    #[test]
    fn prop_combine_or_matches_disjunction(
        r1 in tree_strategy(),
        r2 in tree_strategy(),
        data in record_strategy()
    ) {
        let rules = [r1.to_string(), r2.to_string()];
        let combined = combine(&rules, LogicOp::Or, CombineStyle::Chained).unwrap();
        let expected = evaluate(&r1, &data).unwrap() || evaluate(&r2, &data).unwrap();
        let actual = evaluate(&compile(&combined), &data).unwrap();
        prop_assert_eq!(actual, expected, "rule: {}", combined);
    }

    /// Chaining any number of rules folds like all()/any()
    #[test]
    fn prop_chained_combine_many(
        rules in prop::collection::vec(tree_strategy(), 1..=6),
        data in record_strategy()
    ) {
        let strings: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        let results: Vec<bool> = rules.iter().map(|r| evaluate(r, &data).unwrap()).collect();

        let all = combine(&strings, LogicOp::And, CombineStyle::Chained).unwrap();
        prop_assert_eq!(evaluate(&compile(&all), &data).unwrap(), results.iter().all(|r| *r));

        let any = combine(&strings, LogicOp::Or, CombineStyle::Chained).unwrap();
        prop_assert_eq!(evaluate(&compile(&any), &data).unwrap(), results.iter().any(|r| *r));
    }

    /// A comparison on a field absent from the record always fails
    #[test]
    fn prop_missing_field_fails(tree in tree_strategy()) {
        let result = evaluate(&tree, &EvaluationRecord::new());
        prop_assert!(
            matches!(result, Err(RuleError::FieldNotFound { .. })),
            "got {:?}",
            result
        );
    }
}
