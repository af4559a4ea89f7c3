//! Serialized document form of the AST
//!
//! This is the shape persisted and transmitted by callers:
//! `{"type": "comparison", "value": ">", "left": {...}, "right": {...}}`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::rule::ast::{Node, NodeKind};
use crate::rule::parser::MAX_DEPTH;

/// Node type tag in the document form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Operator,
    Comparison,
    Operand,
}

impl From<NodeKind> for DocumentType {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Operator => DocumentType::Operator,
            NodeKind::Comparison => DocumentType::Comparison,
            NodeKind::Operand => DocumentType::Operand,
        }
    }
}

/// Nested key-value form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(rename = "type")]
    pub node_type: DocumentType,
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<NodeDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<NodeDocument>>,
}

impl NodeDocument {
    fn operand(text: &str) -> Self {
        Self {
            node_type: DocumentType::Operand,
            value: Some(text.to_string()),
            left: None,
            right: None,
        }
    }

    /// Parse a document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&Node> for NodeDocument {
    fn from(node: &Node) -> Self {
        match node {
            Node::Operator { op, left, right } => NodeDocument {
                node_type: DocumentType::from(node.kind()),
                value: Some(op.as_str().to_string()),
                left: Some(Box::new(NodeDocument::from(left.as_ref()))),
                right: Some(Box::new(NodeDocument::from(right.as_ref()))),
            },
            Node::Comparison { op, field, literal } => NodeDocument {
                node_type: DocumentType::from(node.kind()),
                value: Some(op.as_str().to_string()),
                left: Some(Box::new(NodeDocument::operand(field))),
                right: Some(Box::new(NodeDocument::operand(literal))),
            },
            Node::Operand(text) => NodeDocument::operand(text),
        }
    }
}

impl TryFrom<&NodeDocument> for Node {
    type Error = RuleError;

    fn try_from(doc: &NodeDocument) -> Result<Self> {
        node_from_document(doc, 0)
    }
}

impl TryFrom<NodeDocument> for Node {
    type Error = RuleError;

    fn try_from(doc: NodeDocument) -> Result<Self> {
        Node::try_from(&doc)
    }
}

/// Reject documents nested deeper than the parser would accept.
/// Every node counts, operands included.
pub(crate) fn check_document_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(RuleError::InvalidDocument(format!(
            "nesting deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

fn node_from_document(doc: &NodeDocument, depth: usize) -> Result<Node> {
    check_document_depth(depth)?;
    match doc.node_type {
        DocumentType::Operator => {
            let op = required_value(doc, "operator")?.parse()?;
            let left = rule_child(doc.left.as_deref(), "left", depth)?;
            let right = rule_child(doc.right.as_deref(), "right", depth)?;
            Ok(Node::operator(op, left, right))
        }
        DocumentType::Comparison => {
            let op = required_value(doc, "comparison")?.parse()?;
            let field = operand_child(doc.left.as_deref(), "left", depth)?;
            let literal = operand_child(doc.right.as_deref(), "right", depth)?;
            Ok(Node::Comparison { op, field, literal })
        }
        DocumentType::Operand => Ok(Node::Operand(operand_text(doc)?)),
    }
}

fn operand_text(doc: &NodeDocument) -> Result<String> {
    if doc.left.is_some() || doc.right.is_some() {
        return Err(RuleError::InvalidDocument(
            "operand must not have children".to_string(),
        ));
    }
    Ok(required_value(doc, "operand")?.to_string())
}

fn required_value<'a>(doc: &'a NodeDocument, what: &str) -> Result<&'a str> {
    doc.value
        .as_deref()
        .ok_or_else(|| RuleError::InvalidDocument(format!("{} node without value", what)))
}

/// Child of an operator node: must itself be an operator or comparison
fn rule_child(child: Option<&NodeDocument>, side: &str, depth: usize) -> Result<Node> {
    let child = child.ok_or_else(|| {
        RuleError::InvalidDocument(format!("operator node missing {} child", side))
    })?;
    if child.node_type == DocumentType::Operand {
        return Err(RuleError::InvalidDocument(format!(
            "operator node has operand as {} child",
            side
        )));
    }
    node_from_document(child, depth + 1)
}

/// Child of a comparison node: must be an operand
fn operand_child(child: Option<&NodeDocument>, side: &str, depth: usize) -> Result<String> {
    check_document_depth(depth + 1)?;
    let child = child.ok_or_else(|| {
        RuleError::InvalidDocument(format!("comparison node missing {} operand", side))
    })?;
    if child.node_type != DocumentType::Operand {
        return Err(RuleError::InvalidDocument(format!(
            "comparison {} child must be an operand",
            side
        )));
    }
    operand_text(child)
}
