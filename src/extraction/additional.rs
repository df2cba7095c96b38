//! Secondary metadata: context path, actuator endpoints, queue and topic
//! names, referenced environment variables

use super::flatten::FlattenedView;
use super::types::AdditionalData;
use super::value::{entries, get, get_path, scalar_to_string};
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

const ENDPOINT_EXPOSURE_KEY: &str = "management.endpoints.web.exposure.include";

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.\-]*)(?::[^}]*)?\}").expect("valid regex")
    })
}

/// Gathers additional data from one document
pub fn extract_additional(document: &Value, view: &FlattenedView) -> AdditionalData {
    let mut data = AdditionalData::default();
    let spring = get(document, "spring");

    data.context_path = [
        get_path(document, &["server", "servlet", "context-path"]),
        get_path(document, &["server", "context-path"]),
        spring.and_then(|s| get_path(s, &["server", "servlet", "context-path"])),
    ]
    .into_iter()
    .flatten()
    .find_map(scalar_to_string);

    for field in view.iter() {
        if field.path.to_lowercase().starts_with(ENDPOINT_EXPOSURE_KEY) {
            if let Some(raw) = scalar_to_string(&field.value) {
                push_unique_all(
                    &mut data.endpoints,
                    raw.split(',').map(|ep| ep.trim().to_string()),
                );
            }
        }

        if let Some(raw) = field.value.as_str() {
            push_unique_all(
                &mut data.environment_variables,
                placeholder_re()
                    .captures_iter(raw)
                    .filter_map(|cap| cap.get(1))
                    .map(|m| m.as_str().to_string()),
            );
        }
    }

    for app in [get(document, "app"), spring.and_then(|s| get(s, "app"))]
        .into_iter()
        .flatten()
    {
        if let Some(queues) = get(app, "queues") {
            push_unique_all(&mut data.queues, section_names(queues));
        }
        if let Some(topics) = get(app, "kafka-topics") {
            push_unique_all(&mut data.kafka_topics, section_names(topics));
        }
    }

    data
}

/// Folds `other` into `target`, keeping the first context path and
/// deduplicating lists in first-seen order
pub fn merge_additional(target: &mut AdditionalData, other: AdditionalData) {
    if target.context_path.is_none() {
        target.context_path = other.context_path;
    }
    push_unique_all(&mut target.endpoints, other.endpoints);
    push_unique_all(&mut target.queues, other.queues);
    push_unique_all(&mut target.kafka_topics, other.kafka_topics);
    push_unique_all(&mut target.environment_variables, other.environment_variables);
}

fn section_names(section: &Value) -> Vec<String> {
    match section {
        Value::Mapping(_) => entries(section).into_iter().map(|(name, _)| name).collect(),
        Value::Sequence(items) => items
            .iter()
            .filter_map(|item| scalar_to_string(item).or_else(|| get(item, "name").and_then(scalar_to_string)))
            .collect(),
        _ => Vec::new(),
    }
}

fn push_unique_all(target: &mut Vec<String>, values: impl IntoIterator<Item = String>) {
    for value in values {
        if !value.is_empty() && !target.contains(&value) {
            target.push(value);
        }
    }
}
