//! Front end: source spans and the loop-nest DSL parser.

pub mod parser;
pub mod span;
