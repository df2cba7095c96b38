//! Structural walk of every document, fuzzy gap filling, one merged record

use super::additional::{extract_additional, merge_additional};
use super::flatten::FlattenedView;
use super::fuzzy::{default_protocol, FuzzyResolver, PortResolution, DEFAULT_THRESHOLD};
use super::normalizer::normalize;
use super::ordered::OrderedSet;
use super::types::{AdditionalData, FieldMatch, Protocol, ServiceRecord};
use super::walker::{DocumentFindings, StructuredWalker};
use crate::config::ExtractorConfig;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

/// Entry point of the extraction engine
///
/// Holds only immutable settings, so one extractor can be shared across
/// threads and reused for any number of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceExtractor {
    walker: StructuredWalker,
    resolver: FuzzyResolver,
    fuzzy_fallback: bool,
}

impl Default for ServiceExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, true)
    }
}

impl From<&ExtractorConfig> for ServiceExtractor {
    fn from(config: &ExtractorConfig) -> Self {
        Self::new(config.fuzzy_threshold, config.fuzzy_fallback)
    }
}

/// Everything extracted from one document before merging
#[derive(Debug, Default)]
struct DocumentResult {
    findings: DocumentFindings,
    additional: AdditionalData,
}

impl ServiceExtractor {
    pub fn new(threshold: u8, fuzzy_fallback: bool) -> Self {
        Self {
            walker: StructuredWalker::new(),
            resolver: FuzzyResolver::new(threshold),
            fuzzy_fallback,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.resolver.threshold()
    }

    pub fn fuzzy_fallback(&self) -> bool {
        self.fuzzy_fallback
    }

    /// Extracts a record from parsed input, single or multi-document
    pub fn extract(&self, input: Value) -> ServiceRecord {
        self.extract_documents(normalize(input))
    }

    /// Extracts and merges an already split list of documents
    pub fn extract_documents(&self, documents: Vec<Value>) -> ServiceRecord {
        let documents = if documents.is_empty() {
            vec![Value::Mapping(Mapping::new())]
        } else {
            documents
        };
        let count = documents.len();

        let mut combined = FlattenedView::default();
        let mut results: Vec<DocumentResult> = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| self.walk_document(index, doc, &mut combined))
            .collect();

        if self.fuzzy_fallback {
            if let Some(fallback) = self.fallback(&results, &combined) {
                results.push(fallback);
            }
        }

        let record = compose(results, count);
        info!(
            service = record.service_name_value().unwrap_or("<unknown>"),
            port = record.port_value().unwrap_or("<none>"),
            protocol = %record.protocol.value,
            documents = count,
            infrastructure = record.dependent_infrastructure.len(),
            "extraction complete"
        );
        record
    }

    /// Structural pass over one document; its leaves are added to `combined`
    fn walk_document(
        &self,
        index: usize,
        document: &Value,
        combined: &mut FlattenedView,
    ) -> DocumentResult {
        let findings = match self.walker.walk(document) {
            Ok(findings) => findings,
            Err(e) => {
                warn!(document = index + 1, error = %e, "skipping document");
                return DocumentResult::default();
            }
        };

        let view = FlattenedView::from_document(document);
        let additional = extract_additional(document, &view);
        combined.append(view);

        DocumentResult {
            findings,
            additional,
        }
    }

    /// Fuzzy findings for the categories no document resolved structurally
    ///
    /// Runs over the leaves of every document in order, so an earlier
    /// document wins ties. Merged after the structural results, it only
    /// ever fills gaps.
    fn fallback(
        &self,
        results: &[DocumentResult],
        view: &FlattenedView,
    ) -> Option<DocumentResult> {
        if view.is_empty() {
            return None;
        }
        let structural = results.iter().map(|r| &r.findings);
        let mut findings = DocumentFindings::default();

        if structural.clone().all(|f| f.service_name.is_none()) {
            findings.service_name = self.resolver.resolve_service_name(view);
        }

        if structural.clone().all(|f| f.port.is_none()) {
            match self.resolver.resolve_port(view) {
                PortResolution::Resolved(m) => findings.port = Some(m),
                PortResolution::UnresolvedValue {
                    matched_field, raw, ..
                } => {
                    debug!(key = %matched_field, raw = ?raw, "port left unresolved");
                }
                PortResolution::NotFound => {}
            }
        }

        if structural.clone().all(|f| f.protocol.is_none()) {
            let protocol = self.resolver.resolve_protocol(view);
            if protocol.value == Protocol::Https.as_str() {
                findings.protocol = Some(protocol);
            }
        }

        if structural.clone().all(|f| f.dependent_services.is_empty()) {
            findings.dependent_services = self.resolver.resolve_dependent_services(view);
        }

        if structural.clone().all(|f| f.dependent_infrastructure.is_empty()) {
            findings.dependent_infrastructure = self.resolver.resolve_dependent_infrastructure(view);
        }

        Some(DocumentResult {
            findings,
            additional: AdditionalData::default(),
        })
    }
}

fn compose(results: Vec<DocumentResult>, documents: usize) -> ServiceRecord {
    let mut service_names: OrderedSet<String> = OrderedSet::new();
    let mut service_name: Option<FieldMatch> = None;
    let mut versions: OrderedSet<String> = OrderedSet::new();
    let mut profiles: OrderedSet<String> = OrderedSet::new();
    let mut ports: OrderedSet<String> = OrderedSet::new();
    let mut port: Option<FieldMatch> = None;
    let mut protocol: Option<FieldMatch> = None;
    let mut dependent_services = Vec::new();
    let mut dependent_infrastructure = Vec::new();
    let mut additional_data = AdditionalData::default();

    for DocumentResult {
        findings,
        additional,
    } in results
    {
        if let Some(name) = findings.service_name {
            if service_names.insert(name.value.clone()) && service_name.is_none() {
                service_name = Some(name);
            }
        }
        if let Some(version) = findings.version {
            versions.insert(version);
        }
        profiles.extend(findings.profiles);

        if let Some(found) = findings.port {
            if ports.insert(found.value.clone()) && port.is_none() {
                port = Some(found);
            }
        }

        if protocol.is_none() {
            protocol = findings.protocol;
        }

        dependent_services.extend(findings.dependent_services);
        dependent_infrastructure.extend(findings.dependent_infrastructure);
        merge_additional(&mut additional_data, additional);
    }

    if service_names.len() > 1 {
        warn!(
            candidates = ?service_names.iter().collect::<Vec<_>>(),
            "documents disagree on service name, keeping the first"
        );
    }
    if !ports.is_empty() {
        debug!(ports = ?ports.iter().collect::<Vec<_>>(), "discovered ports");
    }

    let versions = versions.into_vec();
    ServiceRecord {
        service_name,
        service_names: service_names.into_vec(),
        version: versions.first().cloned(),
        versions,
        port,
        protocol: protocol.unwrap_or_else(default_protocol),
        profiles: profiles.into_vec(),
        dependent_services,
        dependent_infrastructure,
        additional_data,
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::fuzzy::DEFAULT_PROTOCOL_REASON;
    use crate::extraction::infrastructure::InfrastructureKind;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_structural_fields_win() {
        let record = ServiceExtractor::default().extract(yaml(
            r#"
spring:
  application:
    name: orders
server:
  port: 8081
"#,
        ));
        let name = record.service_name.as_ref().unwrap();
        assert_eq!(name.value, "orders");
        assert_eq!(name.confidence, 100);
        assert_eq!(record.port_value(), Some("8081"));
        assert_eq!(record.protocol.value, "http");
        assert_eq!(record.protocol.reason.as_deref(), Some(DEFAULT_PROTOCOL_REASON));
        assert_eq!(record.documents, 1);
    }

    #[test]
    fn test_fuzzy_fallback_fills_missing_fields() {
        let record = ServiceExtractor::default().extract(yaml(
            "service:\n  name: billing\napplication:\n  port: ${PORT:9000}\n",
        ));
        let name = record.service_name.unwrap();
        assert_eq!(name.value, "billing");
        assert_eq!(name.matched_field.as_deref(), Some("service.name"));
        let port = record.port.unwrap();
        assert_eq!(port.value, "9000");
        assert_eq!(port.matched_field.as_deref(), Some("application.port"));
    }

    #[test]
    fn test_fuzzy_disabled_leaves_fields_empty() {
        let record = ServiceExtractor::new(70, false)
            .extract(yaml("service:\n  name: billing\napplication:\n  port: 9000\n"));
        assert!(record.service_name.is_none());
        assert!(record.port.is_none());
        assert_eq!(record.protocol.value, "http");
    }

    #[test]
    fn test_multi_document_merge() {
        let record = ServiceExtractor::default().extract(yaml(
            r#"
document_1:
  spring:
    application:
      name: orders
    profiles:
      active: dev
  server:
    port: 8080
document_2:
  spring:
    application:
      name: orders-v2
    profiles:
      active: dev,prod
  server:
    port: 9090
    ssl:
      enabled: true
"#,
        ));
        assert_eq!(record.service_name_value(), Some("orders"));
        assert_eq!(record.service_names, vec!["orders", "orders-v2"]);
        assert!(record.is_ambiguous());
        assert_eq!(record.port_value(), Some("8080"));
        assert_eq!(record.profiles, vec!["dev", "prod"]);
        assert_eq!(record.protocol.value, "https");
        assert_eq!(record.documents, 2);
    }

    #[test]
    fn test_first_document_name_and_port_win() {
        let record = ServiceExtractor::default().extract_documents(vec![
            yaml("spring:\n  application:\n    name: svc-a\nserver:\n  port: 8080\n"),
            yaml("server:\n  port: 9090\n"),
        ]);
        assert_eq!(record.service_name_value(), Some("svc-a"));
        assert_eq!(record.service_names, vec!["svc-a"]);
        assert!(!record.is_ambiguous());
        assert_eq!(record.port_value(), Some("8080"));
    }

    #[test]
    fn test_profile_document_does_not_trigger_infrastructure_scan() {
        let record = ServiceExtractor::default().extract_documents(vec![
            yaml("spring:\n  application:\n    name: svc\n  redis:\n    host: c\n"),
            yaml("spring:\n  profiles:\n    active: prod\n"),
        ]);
        assert_eq!(record.dependent_infrastructure.len(), 1);
        assert_eq!(record.dependent_infrastructure[0].kind, InfrastructureKind::Redis);
        assert_eq!(record.dependent_infrastructure[0].configuration_key, "spring.redis");
    }

    #[test]
    fn test_fuzzy_name_not_added_when_any_document_has_one() {
        let record = ServiceExtractor::default().extract_documents(vec![
            yaml("spring:\n  application:\n    name: orders\n"),
            yaml("app:\n  name: legacy-orders\n"),
        ]);
        assert_eq!(record.service_names, vec!["orders"]);
    }

    #[test]
    fn test_fallback_spans_all_documents() {
        let record = ServiceExtractor::default().extract_documents(vec![
            yaml("logging:\n  level:\n    root: INFO\n"),
            yaml("app:\n  name: billing\n"),
        ]);
        let name = record.service_name.unwrap();
        assert_eq!(name.value, "billing");
        assert_eq!(name.matched_field.as_deref(), Some("app.name"));
    }

    #[test]
    fn test_bad_document_does_not_abort_siblings() {
        let record = ServiceExtractor::default().extract_documents(vec![
            yaml("- just\n- a list\n"),
            yaml("spring:\n  application:\n    name: survivor\n"),
        ]);
        assert_eq!(record.service_name_value(), Some("survivor"));
        assert_eq!(record.documents, 2);
    }

    #[test]
    fn test_empty_input() {
        let record = ServiceExtractor::default().extract(Value::Null);
        assert!(record.service_name.is_none());
        assert!(record.port.is_none());
        assert_eq!(record.protocol.value, "http");
        assert!(record.dependent_infrastructure.is_empty());
        assert_eq!(record.documents, 1);
    }

    #[test]
    fn test_infrastructure_concatenates_across_documents() {
        let record = ServiceExtractor::default().extract_documents(vec![
            yaml("spring:\n  redis:\n    host: cache\n"),
            yaml("spring:\n  redis:\n    host: cache\n"),
        ]);
        assert_eq!(record.dependent_infrastructure.len(), 2);
        assert!(record.has_infrastructure(&InfrastructureKind::Redis));
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let extractor = ServiceExtractor::default();
        let input = yaml("spring:\n  application:\n    name: orders\nserver:\n  port: 8080\n");
        assert_eq!(extractor.extract(input.clone()), extractor.extract(input));
    }

    #[test]
    fn test_extractor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServiceExtractor>();
    }
}
