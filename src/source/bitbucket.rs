use super::{is_config_file, ConfigSource, SourceError};
use crate::config::DEFAULT_BITBUCKET_API;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One page of a `/src` directory listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryListing {
    #[serde(default)]
    pub values: Vec<ListingEntry>,

    /// URL of the next page, absent on the last one
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    pub path: String,

    #[serde(rename = "type")]
    pub entry_type: String,
}

impl ListingEntry {
    pub fn is_file(&self) -> bool {
        self.entry_type == "commit_file"
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type == "commit_directory"
    }
}

impl DirectoryListing {
    pub fn parse(url: &str, body: &str) -> Result<Self, SourceError> {
        serde_json::from_str(body).map_err(|e| SourceError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Authenticated GET returning the response body
trait Transport: Send + Sync {
    fn get(&self, url: &str, token: &str) -> Result<String, SourceError>;
}

struct HttpTransport {
    client: Client,
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, token: &str) -> Result<String, SourceError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .map_err(|source| SourceError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|source| SourceError::Request {
            url: url.to_string(),
            source,
        })
    }
}

/// Configuration files in a Bitbucket Cloud repository
///
/// Talks to the REST API with a bearer token. Listing walks the whole tree
/// of the chosen branch, following pagination.
pub struct BitbucketSource {
    api_base: String,
    workspace: String,
    repository: String,
    branch: String,
    token: String,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for BitbucketSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitbucketSource")
            .field("api_base", &self.api_base)
            .field("workspace", &self.workspace)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl BitbucketSource {
    pub fn new(
        workspace: impl Into<String>,
        repository: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, SourceError> {
        Self::with_options(
            DEFAULT_BITBUCKET_API,
            workspace,
            repository,
            token,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_base: impl Into<String>,
        workspace: impl Into<String>,
        repository: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SourceError::MissingToken);
        }

        let api_base = api_base.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("svcscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SourceError::Request {
                url: api_base.clone(),
                source,
            })?;

        Ok(Self::with_transport(
            api_base,
            workspace,
            repository,
            token,
            Box::new(HttpTransport { client }),
        ))
    }

    fn with_transport(
        api_base: String,
        workspace: impl Into<String>,
        repository: impl Into<String>,
        token: String,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            api_base,
            workspace: workspace.into(),
            repository: repository.into(),
            branch: DEFAULT_BRANCH.to_string(),
            token,
            transport,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `/src` URL for a path on the configured branch; empty path is the root
    pub fn src_url(&self, path: &str) -> String {
        format!(
            "{}/repositories/{}/{}/src/{}/{}",
            self.api_base,
            self.workspace,
            self.repository,
            self.branch,
            path.trim_start_matches('/')
        )
    }

    fn get(&self, url: &str) -> Result<String, SourceError> {
        self.transport.get(url, &self.token)
    }

    /// All entries of one directory across its pages
    ///
    /// Page URLs already in `visited` are not fetched again, which ends
    /// pagination that points back at itself.
    fn list_directory(
        &self,
        path: &str,
        visited: &mut HashSet<String>,
    ) -> Result<Vec<ListingEntry>, SourceError> {
        let mut entries = Vec::new();
        let mut next = Some(self.src_url(path));

        while let Some(url) = next {
            if !visited.insert(url.clone()) {
                warn!(url = %url, "listing page already visited, stopping");
                break;
            }
            let page = DirectoryListing::parse(&url, &self.get(&url)?)?;
            entries.extend(page.values);
            next = page.next;
        }
        Ok(entries)
    }
}

impl ConfigSource for BitbucketSource {
    fn describe(&self) -> String {
        format!("bitbucket:{}/{}@{}", self.workspace, self.repository, self.branch)
    }

    fn list_files(&self) -> Result<Vec<String>, SourceError> {
        let mut files = Vec::new();
        let mut pending = vec![String::new()];
        let mut visited = HashSet::new();

        while let Some(dir) = pending.pop() {
            for entry in self.list_directory(&dir, &mut visited)? {
                if entry.is_directory() {
                    pending.push(format!("{}/", entry.path.trim_end_matches('/')));
                } else if entry.is_file() && is_config_file(&entry.path) {
                    files.push(entry.path);
                }
            }
        }

        files.sort();
        info!(source = %self.describe(), count = files.len(), "listed repository files");
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<String, SourceError> {
        self.get(&self.src_url(path))
    }
}
