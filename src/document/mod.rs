//! Text to document-tree parsing

pub mod parser;

pub use parser::{parse_documents, split_documents, ParseError};
