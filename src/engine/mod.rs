//! Rule engine module

pub mod batch;
mod engine;
pub mod registry;

pub use batch::*;
pub use engine::*;
pub use registry::*;
