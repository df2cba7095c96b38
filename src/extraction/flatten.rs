//! Dotted-path view over a configuration document

use super::value::key_to_string;
use serde::Serialize;
use serde_yaml::Value;

/// One leaf of a flattened document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatField {
    pub path: String,
    pub value: Value,
}

/// Leaf scalars of a document keyed by dotted path, in document order
///
/// Nested mapping keys are joined with `.`, sequence items are addressed as
/// `field[i]`. Empty mappings and sequences contribute no leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlattenedView {
    fields: Vec<FlatField>,
}

impl FlattenedView {
    pub fn from_document(document: &Value) -> Self {
        let mut fields = Vec::new();
        match document {
            Value::Mapping(_) | Value::Sequence(_) => flatten_into(document, "", &mut fields),
            _ => {}
        }
        Self { fields }
    }

    /// Appends the leaves of a later document; earlier paths keep precedence
    /// in [`FlattenedView::get`]
    pub fn append(&mut self, other: FlattenedView) {
        self.fields.extend(other.fields);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatField> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }

    /// Value of the first field with exactly this path
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.path == path)
            .map(|f| &f.value)
    }
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Vec<FlatField>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let Some(key) = key_to_string(key) else {
                    continue;
                };
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, out);
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(item, &format!("{}[{}]", prefix, i), out);
            }
        }
        Value::Tagged(tagged) => flatten_into(&tagged.value, prefix, out),
        scalar => out.push(FlatField {
            path: prefix.to_string(),
            value: scalar.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(yaml: &str) -> FlattenedView {
        FlattenedView::from_document(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_nested_keys_are_dotted() {
        let view = flatten(
            r#"
spring:
  datasource:
    primary:
      url: jdbc:postgresql://localhost/db
server:
  port: 8080
"#,
        );
        let keys: Vec<&str> = view.keys().collect();
        assert_eq!(keys, vec!["spring.datasource.primary.url", "server.port"]);
        assert_eq!(view.get("server.port").and_then(|v| v.as_u64()), Some(8080));
    }

    #[test]
    fn test_sequences_use_index_suffix() {
        let view = flatten(
            r#"
app:
  services:
    - billing
    - name: shipping
      url: http://shipping
"#,
        );
        let keys: Vec<&str> = view.keys().collect();
        assert_eq!(
            keys,
            vec![
                "app.services[0]",
                "app.services[1].name",
                "app.services[1].url"
            ]
        );
    }

    #[test]
    fn test_null_leaves_are_kept() {
        let view = flatten("spring:\n  redis:\n    password:\n");
        assert_eq!(view.get("spring.redis.password"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_containers_have_no_leaves() {
        let view = flatten("a: {}\nb: []\nc: 1\n");
        assert_eq!(view.len(), 1);
        assert!(view.get("c").is_some());
    }

    #[test]
    fn test_scalar_document_is_empty() {
        assert!(flatten("just text").is_empty());
    }

    #[test]
    fn test_append_keeps_first_document_precedence() {
        let mut view = flatten("server:\n  port: 8080\n");
        view.append(flatten("server:\n  port: 9090\nname: b\n"));
        assert_eq!(view.len(), 3);
        assert_eq!(view.get("server.port"), Some(&Value::Number(8080.into())));
        assert!(view.get("name").is_some());
    }
}
