//! Fetch, parse and extract every configuration file of a source

use crate::document::{parse_documents, ParseError};
use crate::extraction::{ServiceExtractor, ServiceRecord};
use crate::source::{ConfigSource, SourceError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome for a single file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ServiceRecord>,

    /// Why the file could not be fetched or parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome for a whole source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub source: String,
    pub files: Vec<FileReport>,
}

impl ScanReport {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }

    pub fn records(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.files.iter().filter_map(|f| f.record.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryScanner {
    extractor: ServiceExtractor,
}

impl RepositoryScanner {
    pub fn new(extractor: ServiceExtractor) -> Self {
        Self { extractor }
    }

    /// Parses and extracts one file's text
    pub fn extract_text(&self, text: &str) -> Result<ServiceRecord, ParseError> {
        let value = parse_documents(text)?;
        Ok(self.extractor.extract(value))
    }

    /// Scans every file the source lists
    ///
    /// Only a failed listing is fatal; a file that cannot be fetched or
    /// parsed is reported and the scan moves on.
    pub fn scan(&self, source: &dyn ConfigSource) -> Result<ScanReport, SourceError> {
        let origin = source.describe();
        let paths = source.list_files()?;
        info!(source = %origin, files = paths.len(), "scanning configuration files");

        let files = paths
            .into_iter()
            .map(|path| self.scan_file(source, path))
            .collect::<Vec<_>>();

        let report = ScanReport {
            source: origin,
            files,
        };
        if report.failures() > 0 {
            warn!(
                source = %report.source,
                failures = report.failures(),
                "some files could not be processed"
            );
        }
        Ok(report)
    }

    fn scan_file(&self, source: &dyn ConfigSource, path: String) -> FileReport {
        debug!(file = %path, "extracting");

        let result = source
            .read_file(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| self.extract_text(&text).map_err(|e| e.to_string()));

        match result {
            Ok(record) => FileReport {
                path,
                record: Some(record),
                error: None,
            },
            Err(error) => {
                warn!(file = %path, error = %error, "skipping file");
                FileReport {
                    path,
                    record: None,
                    error: Some(error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;

    #[test]
    fn test_scan_reports_each_file() {
        let source = MockSource::new()
            .with_file(
                "application.yml",
                "spring:\n  application:\n    name: orders\nserver:\n  port: 8080\n",
            )
            .with_file("broken.yml", "a: [unclosed\n");

        let report = RepositoryScanner::default().scan(&source).unwrap();
        assert_eq!(report.source, "mock");
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failures(), 1);

        let ok = &report.files[0];
        assert_eq!(ok.path, "application.yml");
        assert_eq!(
            ok.record.as_ref().and_then(|r| r.service_name_value()),
            Some("orders")
        );

        let broken = &report.files[1];
        assert!(broken.record.is_none());
        assert!(broken.error.is_some());
    }

    #[test]
    fn test_extract_text_multi_document() {
        let record = RepositoryScanner::default()
            .extract_text("server:\n  port: 8080\n---\nserver:\n  port: 9090\n")
            .unwrap();
        assert_eq!(record.documents, 2);
        assert_eq!(record.port_value(), Some("8080"));
    }
}
