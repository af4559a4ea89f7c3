//! Rule compilation and evaluation module
//!
//! This module handles tokenizing rule strings like
//! "((age > 30) AND (department = 'Sales'))", parsing them into an AST
//! and evaluating that AST against evaluation records.

mod ast;
pub mod combiner;
mod document;
mod evaluator;
pub mod parser;
pub mod tokenizer;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use combiner::*;
pub use document::*;
pub use evaluator::*;
pub use parser::*;
pub use tokenizer::*;

pub(crate) use document::check_document_depth;
