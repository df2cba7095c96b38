use super::{is_config_file, ConfigSource, SourceError};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration files on the local disk
///
/// The root may be a single file or a directory. Directories are walked
/// with `.gitignore` rules applied; hidden entries are skipped.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if self.root.is_file() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

impl ConfigSource for LocalSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list_files(&self) -> Result<Vec<String>, SourceError> {
        if self.root.is_file() {
            let name = self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.root.display().to_string());
            return Ok(vec![name]);
        }

        if !self.root.is_dir() {
            return Err(SourceError::NotFound(self.root.display().to_string()));
        }

        let mut files = Vec::new();
        for result in WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .require_git(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let relative = relative.to_string_lossy().replace('\\', "/");
            if is_config_file(&relative) {
                files.push(relative);
            }
        }

        debug!(root = %self.root.display(), count = files.len(), "listed local files");
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<String, SourceError> {
        let full = self.resolve(path);
        fs::read_to_string(&full).map_err(|source| SourceError::Io { path: full, source })
    }
}
