//! Fuzzy resolution of fields over a flattened document
//!
//! Flattened keys are compared against per-category synonym tables using the
//! Indel similarity ratio `2 * LCS / (|a| + |b|)`, scaled to 0-100. Only candidates at or above the
//! threshold are returned, together with the score and the matched key.

use super::flatten::FlattenedView;
use super::infrastructure::InfrastructureKind;
use super::types::{DependentInfrastructureEntry, DependentServiceEntry, FieldMatch, Protocol};
use super::value::scalar_to_string;
use rapidfuzz::fuzz;
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;
use tracing::debug;

/// Minimum similarity for a fuzzy match
pub const DEFAULT_THRESHOLD: u8 = 70;

/// Confidence of an `https` verdict from a security-looking key
pub const SECURE_INDICATOR_CONFIDENCE: u8 = 80;

/// Confidence of the `http` fallback
pub const DEFAULT_PROTOCOL_CONFIDENCE: u8 = 90;

pub const DEFAULT_PROTOCOL_REASON: &str = "default protocol policy";

const SECURE_INDICATORS: &[&str] = &["ssl", "https", "tls", "security"];

/// Field families with their own synonym table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    ServiceName,
    Port,
    Protocol,
    DependentServices,
    DependentInfrastructure,
}

impl FieldCategory {
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            FieldCategory::ServiceName => &[
                "spring.application.name",
                "application.name",
                "app.name",
                "service.name",
                "name",
                "servicename",
                "applicationname",
                "appname",
            ],
            FieldCategory::Port => &[
                "server.port",
                "port",
                "serverport",
                "application.port",
                "app.port",
            ],
            FieldCategory::Protocol => &["protocol", "scheme", "transport", "server.protocol"],
            FieldCategory::DependentServices => &[
                "external-services",
                "external.services",
                "dependencies.services",
                "dependentservices",
                "services",
                "microservices",
                "external",
            ],
            FieldCategory::DependentInfrastructure => &[
                "datasource",
                "redis",
                "rabbitmq",
                "kafka",
                "activemq",
                "database",
                "cache",
                "queue",
                "messaging",
                "infrastructure",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::ServiceName => "service_name",
            FieldCategory::Port => "port",
            FieldCategory::Protocol => "protocol",
            FieldCategory::DependentServices => "dependent_services",
            FieldCategory::DependentInfrastructure => "dependent_infrastructure",
        }
    }
}

/// Best flattened key for a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMatch {
    pub key: String,
    pub synonym: &'static str,
    pub score: u8,
}

/// Outcome of fuzzy port resolution
#[derive(Debug, Clone, PartialEq)]
pub enum PortResolution {
    Resolved(FieldMatch),
    /// A port-like key matched but its value holds no digits
    UnresolvedValue {
        matched_field: String,
        confidence: u8,
        raw: Option<String>,
    },
    NotFound,
}

impl PortResolution {
    pub fn into_match(self) -> Option<FieldMatch> {
        match self {
            PortResolution::Resolved(m) => Some(m),
            _ => None,
        }
    }
}

/// Similarity of two keys, 0-100; case-sensitive
///
/// Scores are floored so that gating at an integer threshold accepts
/// exactly the pairs whose real ratio reaches it.
pub fn similarity(a: &str, b: &str) -> u8 {
    let score = fuzz::ratio(a.chars(), b.chars());
    (score * 100.0 + 1e-9).floor().clamp(0.0, 100.0) as u8
}

fn env_default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{[^}]*?:(\d+)\}").expect("valid regex"))
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

/// Extracts a port number from a raw configuration value
///
/// A numeric default in `${NAME:DEFAULT}` wins; otherwise the first run of
/// digits anywhere in the value is used. Leading zeros are dropped.
pub fn extract_port_number(value: &Value) -> Option<String> {
    let raw = scalar_to_string(value)?;

    let digits = env_default_re()
        .captures(&raw)
        .and_then(|cap| cap.get(1))
        .or_else(|| digits_re().find(&raw))?
        .as_str();

    Some(
        digits
            .parse::<u64>()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| digits.to_string()),
    )
}

/// Synonym-table resolver for fields the structural walk missed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyResolver {
    threshold: u8,
}

impl Default for FuzzyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl FuzzyResolver {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Finds the flattened key closest to any synonym of `category`
    ///
    /// For each synonym the first key with the highest score is taken; a
    /// later synonym only replaces the current best with a strictly higher
    /// score.
    pub fn find_best_match(&self, category: FieldCategory, view: &FlattenedView) -> Option<KeyMatch> {
        let mut best: Option<KeyMatch> = None;

        for &synonym in category.synonyms() {
            let mut candidate: Option<(&str, u8)> = None;
            for key in view.keys() {
                let score = similarity(synonym, key);
                if score < self.threshold {
                    continue;
                }
                if candidate.map_or(true, |(_, s)| score > s) {
                    candidate = Some((key, score));
                }
            }

            if let Some((key, score)) = candidate {
                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(KeyMatch {
                        key: key.to_string(),
                        synonym,
                        score,
                    });
                }
            }
        }

        if let Some(ref m) = best {
            debug!(
                category = category.as_str(),
                key = %m.key,
                synonym = m.synonym,
                score = m.score,
                "fuzzy match"
            );
        }
        best
    }

    pub fn resolve_service_name(&self, view: &FlattenedView) -> Option<FieldMatch> {
        let m = self.find_best_match(FieldCategory::ServiceName, view)?;
        let value = view.get(&m.key).and_then(scalar_to_string)?;
        Some(FieldMatch::fuzzy(value, m.key, m.score))
    }

    pub fn resolve_port(&self, view: &FlattenedView) -> PortResolution {
        let Some(m) = self.find_best_match(FieldCategory::Port, view) else {
            return PortResolution::NotFound;
        };
        let raw = view.get(&m.key);

        match raw.and_then(extract_port_number) {
            Some(port) => PortResolution::Resolved(FieldMatch::fuzzy(port, m.key, m.score)),
            None => {
                debug!(key = %m.key, "port key matched but value has no digits");
                PortResolution::UnresolvedValue {
                    matched_field: m.key,
                    confidence: m.score,
                    raw: raw.and_then(scalar_to_string),
                }
            }
        }
    }

    /// Protocol verdict from security-looking keys; never fails
    pub fn resolve_protocol(&self, view: &FlattenedView) -> FieldMatch {
        let secure_key = view.keys().find(|key| {
            let lower = key.to_lowercase();
            SECURE_INDICATORS.iter().any(|ind| lower.contains(ind))
        });

        match secure_key {
            Some(key) => FieldMatch::fuzzy(Protocol::Https.as_str(), key, SECURE_INDICATOR_CONFIDENCE)
                .with_reason(format!("SSL/TLS configuration detected at {}", key)),
            None => default_protocol(),
        }
    }

    pub fn resolve_dependent_services(&self, view: &FlattenedView) -> Vec<DependentServiceEntry> {
        let Some(m) = self.find_best_match(FieldCategory::DependentServices, view) else {
            return Vec::new();
        };

        view.get(&m.key)
            .and_then(scalar_to_string)
            .map(|name| vec![DependentServiceEntry::new(name)])
            .unwrap_or_default()
    }

    /// Signature scan over keys and string values, plus one synonym match
    ///
    /// Every alias hit yields an entry, so the same field may be reported
    /// under several kinds or several times.
    pub fn resolve_dependent_infrastructure(
        &self,
        view: &FlattenedView,
    ) -> Vec<DependentInfrastructureEntry> {
        let mut entries = Vec::new();

        for kind in InfrastructureKind::all_variants() {
            for alias in kind.aliases() {
                for field in view.iter() {
                    let key_hit = field.path.to_lowercase().contains(alias);
                    let value_hit = field
                        .value
                        .as_str()
                        .map(|s| s.to_lowercase().contains(alias))
                        .unwrap_or(false);
                    if key_hit || value_hit {
                        entries.push(DependentInfrastructureEntry::new(
                            kind.clone(),
                            field.path.clone(),
                            &field.value,
                        ));
                    }
                }
            }
        }

        if let Some(m) = self.find_best_match(FieldCategory::DependentInfrastructure, view) {
            let value = view.get(&m.key).cloned().unwrap_or(Value::Null);
            entries.push(DependentInfrastructureEntry::new(
                InfrastructureKind::Custom("custom".to_string()),
                m.key,
                &value,
            ));
        }

        entries
    }
}

/// `http` with the default-policy reason
pub fn default_protocol() -> FieldMatch {
    FieldMatch {
        value: Protocol::Http.as_str().to_string(),
        matched_field: None,
        confidence: DEFAULT_PROTOCOL_CONFIDENCE,
        reason: Some(DEFAULT_PROTOCOL_REASON.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn flatten(yaml: &str) -> FlattenedView {
        FlattenedView::from_document(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("app.name", "app.name"), 100);
        assert_eq!(similarity("abc", "xyz"), 0);
        assert!(similarity("APP.NAME", "app.name") < 50);
    }

    #[parameterized(
        nested_port = { "server.port", "server.http.port", 81 },
        plural = { "app.name", "app.names", 94 },
        list_index = { "services", "services[0]", 84 },
    )]
    fn test_similarity_is_indel_ratio(a: &str, b: &str, expected: u8) {
        assert_eq!(similarity(a, b), expected);
    }

    #[test]
    fn test_resolve_port_from_nested_http_section() {
        let resolver = FuzzyResolver::default();
        let view = flatten("server:\n  http:\n    port: 8080\n");
        let m = resolver.resolve_port(&view).into_match().unwrap();
        assert_eq!(m.value, "8080");
        assert_eq!(m.matched_field.as_deref(), Some("server.http.port"));
        assert_eq!(m.confidence, 81);
    }

    #[parameterized(
        env_default = { "${SERVER_PORT:8080}", Some("8080") },
        plain_number = { "8080", Some("8080") },
        embedded_digits = { "port-9090-x", Some("9090") },
        env_non_numeric_default = { "${HOST:localhost}:7000", Some("7000") },
        leading_zeros = { "08080", Some("8080") },
        no_digits = { "noport", None },
        env_without_default = { "${SERVER_PORT}", None },
    )]
    fn test_extract_port_number(raw: &str, expected: Option<&str>) {
        let value = Value::String(raw.to_string());
        assert_eq!(extract_port_number(&value).as_deref(), expected);
    }

    #[test]
    fn test_extract_port_number_from_integer() {
        let value: Value = serde_yaml::from_str("8080").unwrap();
        assert_eq!(extract_port_number(&value).as_deref(), Some("8080"));
    }

    #[test]
    fn test_extract_port_number_rejects_structures() {
        let value: Value = serde_yaml::from_str("port: 8080").unwrap();
        assert_eq!(extract_port_number(&value), None);
        assert_eq!(extract_port_number(&Value::Null), None);
    }

    #[parameterized(
        app_name = { "app:\n  name: orders\n", "app.name" },
        appname = { "appname: orders\n", "appname" },
        service_name = { "service:\n  name: orders\n", "service.name" },
        bare_name = { "name: orders\n", "name" },
    )]
    fn test_service_name_synonyms(yaml: &str, expected_key: &str) {
        let resolver = FuzzyResolver::default();
        let m = resolver.resolve_service_name(&flatten(yaml)).unwrap();
        assert_eq!(m.value, "orders");
        assert_eq!(m.matched_field.as_deref(), Some(expected_key));
        assert!(m.confidence >= DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_service_name_unresolved_below_threshold() {
        let resolver = FuzzyResolver::default();
        let view = flatten("logging:\n  level:\n    root: INFO\n");
        assert!(resolver.resolve_service_name(&view).is_none());
    }

    #[test]
    fn test_exact_synonym_beats_partial() {
        let resolver = FuzzyResolver::default();
        let view = flatten("app:\n  names: x\n  name: orders\n");
        let m = resolver.find_best_match(FieldCategory::ServiceName, &view).unwrap();
        assert_eq!(m.key, "app.name");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_higher_threshold_rejects_near_matches() {
        let strict = FuzzyResolver::new(100);
        let view = flatten("app:\n  names: orders\n");
        assert!(strict.resolve_service_name(&view).is_none());
        assert!(FuzzyResolver::default().resolve_service_name(&view).is_some());
    }

    #[test]
    fn test_resolve_port_from_env_placeholder() {
        let resolver = FuzzyResolver::default();
        let view = flatten("server:\n  port: ${SERVER_PORT:8080}\n");
        let m = resolver.resolve_port(&view).into_match().unwrap();
        assert_eq!(m.value, "8080");
        assert_eq!(m.matched_field.as_deref(), Some("server.port"));
        assert_eq!(m.confidence, 100);
    }

    #[test]
    fn test_resolve_port_key_without_digits() {
        let resolver = FuzzyResolver::default();
        let view = flatten("server:\n  port: noport\n");
        match resolver.resolve_port(&view) {
            PortResolution::UnresolvedValue {
                matched_field, raw, ..
            } => {
                assert_eq!(matched_field, "server.port");
                assert_eq!(raw.as_deref(), Some("noport"));
            }
            other => panic!("expected unresolved value, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_port_not_found() {
        let resolver = FuzzyResolver::default();
        let view = flatten("spring:\n  application:\n    name: svc\n");
        assert_eq!(resolver.resolve_port(&view), PortResolution::NotFound);
    }

    #[test]
    fn test_protocol_https_from_ssl_key() {
        let resolver = FuzzyResolver::default();
        let view = flatten(
            "spring:\n  kafka:\n    ssl:\n      key-store-location: /etc/ks\nserver:\n  port: 8443\n",
        );
        let m = resolver.resolve_protocol(&view);
        assert_eq!(m.value, "https");
        assert_eq!(m.confidence, SECURE_INDICATOR_CONFIDENCE);
        assert_eq!(
            m.matched_field.as_deref(),
            Some("spring.kafka.ssl.key-store-location")
        );
    }

    #[test]
    fn test_protocol_first_indicator_in_flattening_order() {
        let resolver = FuzzyResolver::default();
        let view = flatten("security:\n  enabled: true\nserver:\n  ssl:\n    enabled: true\n");
        let m = resolver.resolve_protocol(&view);
        assert_eq!(m.matched_field.as_deref(), Some("security.enabled"));
    }

    #[test]
    fn test_protocol_defaults_to_http() {
        let resolver = FuzzyResolver::default();
        let m = resolver.resolve_protocol(&flatten("server:\n  port: 8080\n"));
        assert_eq!(m.value, "http");
        assert_eq!(m.confidence, DEFAULT_PROTOCOL_CONFIDENCE);
        assert_eq!(m.reason.as_deref(), Some(DEFAULT_PROTOCOL_REASON));
        assert!(m.matched_field.is_none());
    }

    #[test]
    fn test_dependent_services_from_list() {
        let resolver = FuzzyResolver::default();
        let view = flatten("services:\n  - billing\n");
        let services = resolver.resolve_dependent_services(&view);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "billing");
    }

    #[test]
    fn test_infrastructure_signature_scan_hits_keys_and_values() {
        let resolver = FuzzyResolver::default();
        let view = flatten(
            "db:\n  url: jdbc:postgresql://localhost/app\ncache:\n  redis-host: localhost\n",
        );
        let entries = resolver.resolve_dependent_infrastructure(&view);

        let postgres: Vec<_> = entries
            .iter()
            .filter(|e| e.kind == InfrastructureKind::PostgreSql)
            .collect();
        // "postgresql", "postgres" and "jdbc:postgresql" all hit the same value
        assert_eq!(postgres.len(), 3);
        assert!(postgres.iter().all(|e| e.configuration_key == "db.url"));

        assert!(entries
            .iter()
            .any(|e| e.kind == InfrastructureKind::Redis && e.configuration_key == "cache.redis-host"));
    }

    #[test]
    fn test_infrastructure_synonym_match_is_custom() {
        let resolver = FuzzyResolver::default();
        let view = flatten("cache: on\n");
        let entries = resolver.resolve_dependent_infrastructure(&view);
        let custom = entries.last().unwrap();
        assert_eq!(custom.kind, InfrastructureKind::Custom("custom".to_string()));
        assert_eq!(custom.configuration_key, "cache");
        assert!(custom.details.is_empty());
    }

    #[test]
    fn test_empty_view_resolves_nothing() {
        let resolver = FuzzyResolver::default();
        let view = FlattenedView::default();
        assert!(resolver.resolve_service_name(&view).is_none());
        assert_eq!(resolver.resolve_port(&view), PortResolution::NotFound);
        assert!(resolver.resolve_dependent_services(&view).is_empty());
        assert!(resolver.resolve_dependent_infrastructure(&view).is_empty());
        assert_eq!(resolver.resolve_protocol(&view).value, "http");
    }
}
