//! Output formatting for JSON, YAML and human-readable text

use anyhow::{Context, Result};
use std::fmt::Write as _;

use crate::config::ExtractorConfig;
use crate::extraction::{FieldMatch, FlattenedView, ServiceRecord};
use crate::scan::{FileReport, ScanReport};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_record(&self, record: &ServiceRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(record).context("Failed to serialize record to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(record).context("Failed to serialize record to YAML")
            }
            OutputFormat::Human => Ok(self.record_human(record)),
        }
    }

    /// Formats the reports of one or more scanned sources
    pub fn format_reports(&self, reports: &[ScanReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(reports).context("Failed to serialize reports to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(reports).context("Failed to serialize reports to YAML")
            }
            OutputFormat::Human => {
                let mut output = String::new();
                for report in reports {
                    for file in &report.files {
                        output.push_str(&self.file_human(&report.source, file));
                        output.push('\n');
                    }
                }
                Ok(output)
            }
        }
    }

    pub fn format_flattened(&self, documents: &[FlattenedView]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(documents)
                .context("Failed to serialize flattened view to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(documents)
                .context("Failed to serialize flattened view to YAML"),
            OutputFormat::Human => {
                let mut output = String::new();
                for (i, view) in documents.iter().enumerate() {
                    if documents.len() > 1 {
                        let _ = writeln!(output, "# document {}", i + 1);
                    }
                    for field in view.iter() {
                        let _ = writeln!(output, "{} = {}", field.path, scalar_display(&field.value));
                    }
                }
                Ok(output)
            }
        }
    }

    pub fn format_config(&self, config: &ExtractorConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn file_human(&self, source: &str, file: &FileReport) -> String {
        let mut output = String::new();
        match (&file.record, &file.error) {
            (Some(record), _) => {
                let _ = writeln!(output, "\u{2713} {} ({})", file.path, source);
                output.push_str(&self.record_human(record));
            }
            (None, Some(error)) => {
                let _ = writeln!(output, "\u{2717} {} ({})", file.path, source);
                let _ = writeln!(output, "  Error: {}", error);
            }
            (None, None) => {
                let _ = writeln!(output, "? {} ({})", file.path, source);
            }
        }
        output
    }

    fn record_human(&self, record: &ServiceRecord) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}", RULE);

        let _ = writeln!(output, "Service:   {}", field_display(record.service_name.as_ref()));
        if record.is_ambiguous() {
            let _ = writeln!(output, "\u{26A0} Candidates: {}", record.service_names.join(", "));
        }
        let _ = writeln!(
            output,
            "Version:   {}",
            record.version.as_deref().unwrap_or("(not found)")
        );
        let _ = writeln!(output, "Port:      {}", field_display(record.port.as_ref()));
        let _ = writeln!(output, "Protocol:  {}", field_display(Some(&record.protocol)));
        if !record.profiles.is_empty() {
            let _ = writeln!(output, "Profiles:  {}", record.profiles.join(", "));
        }
        let _ = writeln!(output, "Documents: {}", record.documents);

        if !record.dependent_services.is_empty() {
            output.push_str("\nDependent Services:\n");
            push_tree(
                &mut output,
                record.dependent_services.iter().map(|s| match &s.service_type {
                    Some(t) => format!("{} [{}]", s.name, t),
                    None => s.name.clone(),
                }),
            );
        }

        if !record.dependent_infrastructure.is_empty() {
            output.push_str("\nDependent Infrastructure:\n");
            push_tree(
                &mut output,
                record
                    .dependent_infrastructure
                    .iter()
                    .map(|i| format!("{:<14} {}", i.kind.name(), i.configuration_key)),
            );
        }

        let extra = &record.additional_data;
        if !extra.is_empty() {
            output.push_str("\nAdditional Data:\n");
            if let Some(ref path) = extra.context_path {
                let _ = writeln!(output, "  Context Path: {}", path);
            }
            for (label, values) in [
                ("Endpoints", &extra.endpoints),
                ("Queues", &extra.queues),
                ("Kafka Topics", &extra.kafka_topics),
                ("Env Vars", &extra.environment_variables),
            ] {
                if !values.is_empty() {
                    let _ = writeln!(output, "  {}: {}", label, values.join(", "));
                }
            }
        }

        output
    }
}

fn field_display(field: Option<&FieldMatch>) -> String {
    match field {
        None => "(not found)".to_string(),
        Some(m) => {
            let mut text = format!("{} ({}%", m.value, m.confidence);
            if let Some(ref key) = m.matched_field {
                let _ = write!(text, ", {}", key);
            }
            if let Some(ref reason) = m.reason {
                let _ = write!(text, ", {}", reason);
            }
            text.push(')');
            text
        }
    }
}

fn push_tree(output: &mut String, lines: impl ExactSizeIterator<Item = String>) {
    let count = lines.len();
    for (i, line) in lines.enumerate() {
        let connector = if i + 1 == count { "\u{2514}" } else { "\u{251C}" };
        let _ = writeln!(output, "{}\u{2500} {}", connector, line);
    }
}

fn scalar_display(value: &serde_yaml::Value) -> String {
    crate::extraction::value::scalar_to_string(value).unwrap_or_else(|| "null".to_string())
}
