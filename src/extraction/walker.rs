//! Structural walk over the well-known Spring Boot nesting shapes

use super::fuzzy::extract_port_number;
use super::infrastructure::InfrastructureKind;
use super::types::{
    DependentInfrastructureEntry, DependentServiceEntry, FieldMatch, Protocol,
};
use super::value::{entries, get, get_mapping, get_path, scalar_to_string};
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

/// Why a document could not be walked; the document counts as empty
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document root is a {0}, expected a mapping")]
    NotAMapping(&'static str),
}

/// Fields found in a single document by the structural walk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFindings {
    pub service_name: Option<FieldMatch>,
    pub version: Option<String>,
    pub port: Option<FieldMatch>,
    /// Only set when the document positively signals TLS
    pub protocol: Option<FieldMatch>,
    pub profiles: Vec<String>,
    pub dependent_services: Vec<DependentServiceEntry>,
    pub dependent_infrastructure: Vec<DependentInfrastructureEntry>,
}

/// Sections under `spring` that map one-to-one to an infrastructure kind
const SPRING_INFRASTRUCTURE: &[(&[&str], InfrastructureKind)] = &[
    (&["redis"], InfrastructureKind::Redis),
    (&["rabbitmq"], InfrastructureKind::RabbitMq),
    (&["kafka"], InfrastructureKind::Kafka),
    (&["activemq"], InfrastructureKind::ActiveMq),
    (&["data", "redis"], InfrastructureKind::Redis),
    (&["data", "mongodb"], InfrastructureKind::MongoDb),
    (&["elasticsearch"], InfrastructureKind::Elasticsearch),
];

/// Service lists under `app` and the tag their entries receive
const SERVICE_SECTIONS: &[(&str, Option<&str>)] = &[
    ("external-services", None),
    ("kafka-topics", Some("kafka-topic")),
    ("queues", Some("queue")),
];

/// Direct, schema-aware extraction; never consults the fuzzy resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredWalker;

impl StructuredWalker {
    pub fn new() -> Self {
        Self
    }

    pub fn walk(&self, document: &Value) -> Result<DocumentFindings, DocumentError> {
        match document {
            Value::Mapping(_) => {}
            Value::Null => return Ok(DocumentFindings::default()),
            Value::Sequence(_) => return Err(DocumentError::NotAMapping("sequence")),
            Value::Tagged(tagged) => return self.walk(&tagged.value),
            _ => return Err(DocumentError::NotAMapping("scalar")),
        }

        let mut findings = DocumentFindings::default();
        let spring = get(document, "spring");

        if let Some(spring) = spring {
            walk_application(spring, &mut findings);
            walk_profiles(spring, &mut findings);
            walk_datasource(spring, &mut findings);
            walk_spring_infrastructure(spring, &mut findings);
        }

        let server_sections = [
            ("server", get(document, "server")),
            ("spring.server", spring.and_then(|s| get(s, "server"))),
        ];
        for (prefix, section) in server_sections {
            if let Some(section) = section {
                walk_server(prefix, section, &mut findings);
            }
        }

        let app_sections = [
            ("app", get(document, "app")),
            ("spring.app", spring.and_then(|s| get(s, "app"))),
        ];
        for (prefix, section) in app_sections {
            if let Some(section) = section {
                walk_app(prefix, section, &mut findings);
            }
        }

        Ok(findings)
    }
}

fn walk_application(spring: &Value, findings: &mut DocumentFindings) {
    if let Some(name) = get_path(spring, &["application", "name"]).and_then(scalar_to_string) {
        debug!(service_name = %name, "found spring.application.name");
        findings.service_name = Some(FieldMatch::structural(name, "spring.application.name"));
    }
    findings.version = get_path(spring, &["application", "version"]).and_then(scalar_to_string);
}

fn walk_profiles(spring: &Value, findings: &mut DocumentFindings) {
    let Some(active) = get_path(spring, &["profiles", "active"]) else {
        return;
    };

    let raw: Vec<String> = match active {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };

    findings.profiles.extend(
        raw.iter()
            .flat_map(|p| p.split(','))
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    );
}

fn walk_server(prefix: &str, server: &Value, findings: &mut DocumentFindings) {
    if findings.port.is_none() {
        if let Some(raw) = get(server, "port") {
            match extract_port_number(raw) {
                Some(port) => {
                    findings.port = Some(FieldMatch::structural(port, format!("{}.port", prefix)));
                }
                None => debug!(key = %format!("{}.port", prefix), "port value has no digits"),
            }
        }
    }

    if findings.protocol.is_none() && get(server, "ssl").is_some() {
        findings.protocol = Some(
            FieldMatch::structural(Protocol::Https.as_str(), format!("{}.ssl", prefix))
                .with_reason("SSL configuration under server"),
        );
    }
}

fn walk_app(prefix: &str, app: &Value, findings: &mut DocumentFindings) {
    for (section, tag) in SERVICE_SECTIONS {
        if let Some(value) = get(app, section) {
            let found = collect_services(value, *tag);
            debug!(section = %format!("{}.{}", prefix, section), count = found.len(), "found dependent services");
            findings.dependent_services.extend(found);
        }
    }
}

/// Mapping entries become `name -> details`; list items are names or
/// mappings carrying a `name` field
fn collect_services(value: &Value, tag: Option<&str>) -> Vec<DependentServiceEntry> {
    let tagged = |entry: DependentServiceEntry| match tag {
        Some(t) => entry.with_type(t),
        None => entry,
    };

    match value {
        Value::Mapping(_) => entries(value)
            .into_iter()
            .map(|(name, details)| {
                let entry = DependentServiceEntry::new(name);
                let entry = if details.is_null() {
                    entry
                } else {
                    entry.with_details(details.clone())
                };
                tagged(entry)
            })
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .filter_map(|item| {
                if let Some(name) = scalar_to_string(item) {
                    return Some(tagged(DependentServiceEntry::new(name)));
                }
                let name = get(item, "name").and_then(scalar_to_string)?;
                Some(tagged(DependentServiceEntry::new(name).with_details(item.clone())))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// One entry per map-valued sub-key of `spring.datasource`
///
/// `primary`/`secondary` take their engine from the driver and URL; any other
/// sub-key names the engine itself. A flat block with its own `url` is also
/// reported, keyed by `spring.datasource`.
fn walk_datasource(spring: &Value, findings: &mut DocumentFindings) {
    let Some(datasource) = get_mapping(spring, &["datasource"]) else {
        return;
    };

    if get(datasource, "url").and_then(scalar_to_string).is_some() {
        let kind = InfrastructureKind::from_datasource_hints(datasource)
            .unwrap_or_else(|| InfrastructureKind::Custom("datasource".to_string()));
        findings.dependent_infrastructure.push(
            DependentInfrastructureEntry::new(kind, "spring.datasource", datasource)
                .with_raw(datasource.clone()),
        );
    }

    for (sub_key, block) in entries(datasource) {
        if !block.is_mapping() {
            continue;
        }

        let kind = if sub_key == "primary" || sub_key == "secondary" {
            InfrastructureKind::from_datasource_hints(block)
        } else {
            InfrastructureKind::from_name(&sub_key)
        }
        .unwrap_or_else(|| InfrastructureKind::Custom(sub_key.clone()));

        debug!(key = %sub_key, kind = %kind, "found datasource");
        findings.dependent_infrastructure.push(
            DependentInfrastructureEntry::new(kind, format!("spring.datasource.{}", sub_key), block)
                .with_raw(block.clone()),
        );
    }
}

fn walk_spring_infrastructure(spring: &Value, findings: &mut DocumentFindings) {
    for (path, kind) in SPRING_INFRASTRUCTURE {
        let Some(section) = get_path(spring, path).filter(|v| !v.is_null()) else {
            continue;
        };
        let key = format!("spring.{}", path.join("."));
        debug!(key = %key, kind = %kind, "found infrastructure section");
        findings.dependent_infrastructure.push(
            DependentInfrastructureEntry::new(kind.clone(), key, section).with_raw(section.clone()),
        );
    }
}
