//! Result types produced by the extraction engine

use super::infrastructure::InfrastructureKind;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Confidence reported for fields found through known nesting
pub const STRUCTURAL_CONFIDENCE: u8 = 100;

/// Outcome of resolving one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub value: String,

    /// Dotted path of the key that produced the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_field: Option<String>,

    /// Similarity score 0-100; structural matches always carry 100
    pub confidence: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FieldMatch {
    pub fn structural(value: impl Into<String>, matched_field: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            matched_field: Some(matched_field.into()),
            confidence: STRUCTURAL_CONFIDENCE,
            reason: None,
        }
    }

    pub fn fuzzy(value: impl Into<String>, matched_field: impl Into<String>, confidence: u8) -> Self {
        Self {
            value: value.into(),
            matched_field: Some(matched_field.into()),
            confidence,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Application protocol a service is exposed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Another service this one calls or exchanges messages with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentServiceEntry {
    pub name: String,

    /// Tag such as `kafka-topic` or `queue`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl DependentServiceEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: None,
            details: None,
        }
    }

    pub fn with_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A database, cache, broker or search engine the service needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentInfrastructureEntry {
    #[serde(rename = "type")]
    pub kind: InfrastructureKind,

    /// Dotted path that located this entry
    pub configuration_key: String,

    /// Kind-specific sub-fields (url, host, bootstrap servers, ...)
    #[serde(default)]
    pub details: Mapping,

    /// Whole configuration sub-tree, when found structurally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl DependentInfrastructureEntry {
    /// Builds an entry, extracting details according to `kind`
    pub fn new(kind: InfrastructureKind, configuration_key: impl Into<String>, value: &Value) -> Self {
        let details = kind.extract_details(value);
        Self {
            kind,
            configuration_key: configuration_key.into(),
            details,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Secondary metadata gathered alongside the main fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_path: Option<String>,

    /// Actuator endpoints exposed over the web
    #[serde(default)]
    pub endpoints: Vec<String>,

    #[serde(default)]
    pub queues: Vec<String>,

    #[serde(default)]
    pub kafka_topics: Vec<String>,

    /// Names referenced through `${NAME}` / `${NAME:default}` placeholders
    #[serde(default)]
    pub environment_variables: Vec<String>,
}

impl AdditionalData {
    pub fn is_empty(&self) -> bool {
        self.context_path.is_none()
            && self.endpoints.is_empty()
            && self.queues.is_empty()
            && self.kafka_topics.is_empty()
            && self.environment_variables.is_empty()
    }
}

/// Aggregate extraction result for one logical input
///
/// `service_name` and `version` are representatives: the first distinct
/// value seen across documents. When documents disagree, every candidate is
/// listed in `service_names` / `versions` in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub service_name: Option<FieldMatch>,

    #[serde(default)]
    pub service_names: Vec<String>,

    pub version: Option<String>,

    #[serde(default)]
    pub versions: Vec<String>,

    pub port: Option<FieldMatch>,

    pub protocol: FieldMatch,

    #[serde(default)]
    pub profiles: Vec<String>,

    #[serde(default)]
    pub dependent_services: Vec<DependentServiceEntry>,

    #[serde(default)]
    pub dependent_infrastructure: Vec<DependentInfrastructureEntry>,

    #[serde(default)]
    pub additional_data: AdditionalData,

    /// Number of documents merged into this record
    pub documents: usize,
}

impl ServiceRecord {
    pub fn service_name_value(&self) -> Option<&str> {
        self.service_name.as_ref().map(|m| m.value.as_str())
    }

    pub fn port_value(&self) -> Option<&str> {
        self.port.as_ref().map(|m| m.value.as_str())
    }

    pub fn is_ambiguous(&self) -> bool {
        self.service_names.len() > 1
    }

    pub fn has_infrastructure(&self, kind: &InfrastructureKind) -> bool {
        self.dependent_infrastructure.iter().any(|e| &e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_match_has_full_confidence() {
        let m = FieldMatch::structural("svc", "spring.application.name");
        assert_eq!(m.confidence, 100);
        assert_eq!(m.matched_field.as_deref(), Some("spring.application.name"));
    }

    #[test]
    fn test_field_match_skips_empty_optionals() {
        let m = FieldMatch {
            value: "http".to_string(),
            matched_field: None,
            confidence: 90,
            reason: None,
        };
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"value":"http","confidence":90}"#
        );
    }

    #[test]
    fn test_dependent_service_serializes_type_tag() {
        let entry = DependentServiceEntry::new("orders").with_type("kafka-topic");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "kafka-topic");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_infrastructure_entry_extracts_details() {
        let block: Value = serde_yaml::from_str("host: cache\nport: 6379\n").unwrap();
        let entry = DependentInfrastructureEntry::new(InfrastructureKind::Redis, "spring.redis", &block)
            .with_raw(block.clone());
        assert_eq!(entry.details.get("host").and_then(|v| v.as_str()), Some("cache"));
        assert_eq!(entry.raw, Some(block));

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "redis");
        assert_eq!(json["configuration_key"], "spring.redis");
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::Https.to_string(), "https");
        assert_eq!(Protocol::Http.as_str(), "http");
    }

    #[test]
    fn test_additional_data_is_empty() {
        let mut data = AdditionalData::default();
        assert!(data.is_empty());
        data.queues.push("orders".to_string());
        assert!(!data.is_empty());
    }
}
