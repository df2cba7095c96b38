//! YAML/JSON text to `serde_yaml::Value`
//!
//! JSON is accepted as a YAML subset. Multi-document text is folded into a
//! mapping with synthetic `document_1`, `document_2`, ... keys, which the
//! extraction normalizer splits back apart.

use crate::extraction::normalizer::DOCUMENT_KEY_PREFIX;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid YAML in document {document}: {source}")]
    Yaml {
        document: usize,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Parses every document of `text`, in order
///
/// Empty documents (a bare `---`) are kept as `Value::Null`.
pub fn split_documents(text: &str) -> Result<Vec<Value>, ParseError> {
    serde_yaml::Deserializer::from_str(text)
        .enumerate()
        .map(|(i, de)| {
            Value::deserialize(de).map_err(|source| ParseError::Yaml {
                document: i + 1,
                source,
            })
        })
        .collect()
}

/// Parses `text` into a single tree
///
/// No documents gives `Null`, one document is returned as is, several are
/// wrapped in a `document_<n>` mapping.
pub fn parse_documents(text: &str) -> Result<Value, ParseError> {
    let mut docs = split_documents(text)?;
    match docs.len() {
        0 => Ok(Value::Null),
        1 => Ok(docs.remove(0)),
        _ => {
            let mut map = Mapping::new();
            for (i, doc) in docs.into_iter().enumerate() {
                map.insert(
                    Value::String(format!("{}{}", DOCUMENT_KEY_PREFIX, i + 1)),
                    doc,
                );
            }
            Ok(Value::Mapping(map))
        }
    }
}
