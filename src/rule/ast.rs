//! Abstract Syntax Tree for rule expressions

use std::fmt;
use std::str::FromStr;

use crate::error::RuleError;

/// AST node for rule expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Two sub-rules joined by AND/OR
    Operator {
        op: LogicOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Single condition like "age > 30"
    Comparison {
        op: CompOp,
        field: String,
        literal: String,
    },
    /// Field name or literal text
    Operand(String),
}

/// Node kinds, as named in the document form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Operator,
    Comparison,
    Operand,
}

impl Node {
    pub fn operator(op: LogicOp, left: Node, right: Node) -> Self {
        Node::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn comparison(field: impl Into<String>, op: CompOp, literal: impl Into<String>) -> Self {
        Node::Comparison {
            op,
            field: field.into(),
            literal: literal.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Operator { .. } => NodeKind::Operator,
            Node::Comparison { .. } => NodeKind::Comparison,
            Node::Operand(_) => NodeKind::Operand,
        }
    }

    /// Number of comparisons in the tree
    pub fn comparison_count(&self) -> usize {
        match self {
            Node::Operator { left, right, .. } => {
                left.comparison_count() + right.comparison_count()
            }
            Node::Comparison { .. } => 1,
            Node::Operand(_) => 0,
        }
    }
}

/// Renders the node back into rule syntax
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operator { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Node::Comparison { op, field, literal } => write!(f, "{} {} {}", field, op, literal),
            Node::Operand(text) => f.write_str(text),
        }
    }
}

/// Boolean operators joining sub-rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicOp::And => "AND",
            LogicOp::Or => "OR",
        }
    }
}

impl FromStr for LogicOp {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(LogicOp::And),
            "OR" => Ok(LogicOp::Or),
            other => Err(RuleError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Equal (=)
    Equal,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
}

impl CompOp {
    pub const ALL: [CompOp; 5] = [
        CompOp::Greater,
        CompOp::Less,
        CompOp::Equal,
        CompOp::GreaterEqual,
        CompOp::LessEqual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompOp::Greater => ">",
            CompOp::Less => "<",
            CompOp::Equal => "=",
            CompOp::GreaterEqual => ">=",
            CompOp::LessEqual => "<=",
        }
    }

    /// Apply the operator to two ordered values
    #[inline]
    pub fn apply<T: PartialOrd + ?Sized>(self, actual: &T, expected: &T) -> bool {
        match self {
            CompOp::Greater => actual > expected,
            CompOp::Less => actual < expected,
            CompOp::Equal => actual == expected,
            CompOp::GreaterEqual => actual >= expected,
            CompOp::LessEqual => actual <= expected,
        }
    }
}

impl FromStr for CompOp {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(CompOp::Greater),
            "<" => Ok(CompOp::Less),
            "=" => Ok(CompOp::Equal),
            ">=" => Ok(CompOp::GreaterEqual),
            "<=" => Ok(CompOp::LessEqual),
            other => Err(RuleError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
