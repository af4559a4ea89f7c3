//! Recursive descent parser for rule strings
//!
//! Grammar:
//!
//! ```text
//! Rule        := '(' Rule Operator Rule ')' | '(' Rule ')' | Comparison
//! Comparison  := FIELD CompOp LITERAL
//! Operator    := 'AND' | 'OR'
//! CompOp      := '>' | '<' | '=' | '>=' | '<='
//! ```
//!
//! There is no precedence: every binary rule must be parenthesized.

use tracing::debug;

use crate::config::ParseMode;
use crate::error::{Result, RuleError};
use crate::rule::ast::{CompOp, LogicOp, Node};
use crate::rule::tokenizer::tokenize;

/// Maximum parenthesis nesting accepted before giving up
pub const MAX_DEPTH: usize = 256;

/// Parse a rule string into an AST
pub fn parse(rule: &str, mode: ParseMode) -> Result<Node> {
    let tokens = tokenize(rule);
    if tokens.is_empty() {
        return Err(RuleError::MalformedRule("Empty rule string".to_string()));
    }

    let mut parser = Parser::new(&tokens, mode);
    let node = parser.parse_rule()?;

    if !parser.is_exhausted() {
        match mode {
            ParseMode::Strict => {
                return Err(RuleError::MalformedRule(format!(
                    "unexpected trailing tokens at {}: {}",
                    parser.position(),
                    parser.remaining().join(" ")
                )));
            }
            ParseMode::Lenient => {
                debug!(
                    ignored = parser.remaining().len(),
                    "ignoring trailing tokens in lenient mode"
                );
            }
        }
    }

    debug!(rule, comparisons = node.comparison_count(), "compiled rule");
    Ok(node)
}

/// Cursor over an immutable token sequence.
///
/// The tokens are never consumed destructively, so after a failed parse
/// `position` and `remaining` still describe where parsing stopped.
#[derive(Debug)]
pub struct Parser<'t, 's> {
    tokens: &'t [&'s str],
    pos: usize,
    depth: usize,
    mode: ParseMode,
}

impl<'t, 's> Parser<'t, 's> {
    pub fn new(tokens: &'t [&'s str], mode: ParseMode) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            mode,
        }
    }

    /// Index of the next unread token
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Tokens not consumed yet
    pub fn remaining(&self) -> &'t [&'s str] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parse one rule starting at the cursor
    pub fn parse_rule(&mut self) -> Result<Node> {
        let token = self.next_token("a field name or '('")?;

        if token == "(" {
            self.depth += 1;
            if self.depth > MAX_DEPTH {
                return Err(RuleError::MalformedRule(format!(
                    "nesting deeper than {} levels",
                    MAX_DEPTH
                )));
            }
            let node = self.parse_group()?;
            self.depth -= 1;
            Ok(node)
        } else {
            self.parse_comparison(token)
        }
    }

    /// Rest of a parenthesized rule, after the opening '('
    fn parse_group(&mut self) -> Result<Node> {
        let left = self.parse_rule()?;

        // '(' Rule ')' only groups
        if self.peek() == Some(")") {
            self.pos += 1;
            return Ok(left);
        }

        let op: LogicOp = self.next_token("AND or OR")?.parse()?;
        let right = self.parse_rule()?;

        let close = self.next_token("')'")?;
        if self.mode == ParseMode::Strict && close != ")" {
            return Err(RuleError::MalformedRule(format!(
                "expected ')' at {}, found '{}'",
                self.pos - 1,
                close
            )));
        }

        Ok(Node::operator(op, left, right))
    }

    fn parse_comparison(&mut self, field: &'s str) -> Result<Node> {
        if self.mode == ParseMode::Strict && field == ")" {
            return Err(RuleError::MalformedRule(format!(
                "unexpected ')' at {}",
                self.pos - 1
            )));
        }

        let op: CompOp = self.next_token("a comparison operator")?.parse()?;
        let literal = self.next_token("a value")?;

        if self.mode == ParseMode::Strict && (literal == "(" || literal == ")") {
            return Err(RuleError::MalformedRule(format!(
                "expected a value for '{}' at {}, found '{}'",
                field,
                self.pos - 1,
                literal
            )));
        }

        Ok(Node::comparison(field, op, literal))
    }

    fn peek(&self) -> Option<&'s str> {
        self.tokens.get(self.pos).copied()
    }

    fn next_token(&mut self, expected: &str) -> Result<&'s str> {
        match self.tokens.get(self.pos).copied() {
            Some(token) => {
                self.pos += 1;
                Ok(token)
            }
            None => Err(RuleError::MalformedRule(format!(
                "expected {} at {}, but the rule ended",
                expected, self.pos
            ))),
        }
    }
}
