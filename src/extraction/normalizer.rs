//! Turns parsed input into an ordered list of documents
//!
//! The parsing collaborator represents multi-document YAML as a mapping with
//! synthetic `document_1`, `document_2`, ... keys. Anything else is a single
//! document.

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

/// Prefix of the synthetic keys produced for multi-document input
pub const DOCUMENT_KEY_PREFIX: &str = "document_";

fn document_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^document_(\d+)$").expect("valid regex"))
}

/// Index of a synthetic multi-document key, if `key` is one
fn document_index(key: &Value) -> Option<u64> {
    let key = key.as_str()?;
    document_key_re()
        .captures(key)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Splits parsed input into documents
///
/// Multi-document form is recognized only when the root is a mapping with
/// more than one key and every key is `document_<n>`; documents are then
/// ordered by `<n>`. Null input becomes a single empty mapping.
pub fn normalize(input: Value) -> Vec<Value> {
    match input {
        Value::Null => vec![Value::Mapping(Mapping::new())],
        Value::Mapping(map) if is_multi_document(&map) => {
            let mut docs: Vec<(u64, Value)> = map
                .into_iter()
                .filter_map(|(key, doc)| document_index(&key).map(|idx| (idx, doc)))
                .collect();
            docs.sort_by_key(|(idx, _)| *idx);
            docs.into_iter().map(|(_, doc)| doc).collect()
        }
        other => vec![other],
    }
}

fn is_multi_document(map: &Mapping) -> bool {
    map.len() > 1 && map.keys().all(|key| document_index(key).is_some())
}
