use super::{is_config_file, ConfigSource, SourceError};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory source for tests
#[derive(Debug, Default)]
pub struct MockSource {
    files: RwLock<BTreeMap<String, String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&self, path: &str, content: &str) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.to_string(), content.to_string());
        }
    }
}

impl ConfigSource for MockSource {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn list_files(&self) -> Result<Vec<String>, SourceError> {
        let files = self
            .files
            .read()
            .map(|files| {
                files
                    .keys()
                    .filter(|path| is_config_file(path))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<String, SourceError> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(path).cloned())
            .ok_or_else(|| SourceError::NotFound(path.to_string()))
    }
}
