//! svcscope - service topology extraction from Spring Boot configuration
//!
//! Reads loosely structured YAML/JSON configuration and produces a
//! confidence-annotated [`ServiceRecord`]: service name, version, port,
//! protocol, active profiles, dependent services and dependent
//! infrastructure. Well-known nesting is read directly; everything else is
//! found by fuzzy matching flattened keys against synonym tables.
//!
//! # Example
//!
//! ```
//! use svcscope::{parse_documents, ServiceExtractor};
//!
//! let text = "spring:\n  application:\n    name: orders\nserver:\n  port: ${PORT:8080}\n";
//! let record = ServiceExtractor::default().extract(parse_documents(text).unwrap());
//!
//! assert_eq!(record.service_name_value(), Some("orders"));
//! assert_eq!(record.port_value(), Some("8080"));
//! assert_eq!(record.protocol.value, "http");
//! ```
//!
//! # Project Structure
//!
//! - [`extraction`]: normalizer, structured walker, fuzzy resolver, composer
//! - [`document`]: text to document tree
//! - [`source`]: local, in-memory and Bitbucket file sources
//! - [`scan`]: per-file fetch, parse and extract over a source

pub mod cli;
pub mod config;
pub mod document;
pub mod extraction;
pub mod scan;
pub mod source;
pub mod util;

pub use config::{ConfigError, ExtractorConfig};
pub use document::{parse_documents, ParseError};
pub use extraction::{
    DependentInfrastructureEntry, DependentServiceEntry, FieldMatch, FlattenedView,
    InfrastructureKind, Protocol, ServiceExtractor, ServiceRecord,
};
pub use scan::{FileReport, RepositoryScanner, ScanReport};
pub use source::{BitbucketSource, ConfigSource, LocalSource, MockSource, SourceError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_svcscope() {
        assert_eq!(NAME, "svcscope");
    }
}
