//! Subcommand handlers; each returns the process exit code

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::commands::{BitbucketArgs, ConfigArgs, ExtractArgs, FlattenArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::ExtractorConfig;
use crate::document::split_documents;
use crate::extraction::{FlattenedView, ServiceExtractor};
use crate::scan::{RepositoryScanner, ScanReport};
use crate::source::{BitbucketSource, ConfigSource, LocalSource};

pub const BITBUCKET_TOKEN_VAR: &str = "BITBUCKET_ACCESS_TOKEN";

fn exit_code<T>(result: Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn load_config() -> Result<ExtractorConfig> {
    let config = ExtractorConfig::from_env().context("Invalid environment configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn extractor_for(config: &ExtractorConfig, threshold: Option<u8>, no_fuzzy: bool) -> ServiceExtractor {
    ServiceExtractor::new(
        threshold.unwrap_or(config.fuzzy_threshold),
        config.fuzzy_fallback && !no_fuzzy,
    )
}

fn emit(output: &str, destination: Option<&Path>) -> Result<()> {
    match destination {
        Some(path) => {
            fs::write(path, output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => print!("{}", output),
    }
    Ok(())
}

/// Ok(true) when every file was processed
fn write_reports(
    reports: &[ScanReport],
    format: OutputFormat,
    destination: Option<&Path>,
) -> Result<bool> {
    let output = OutputFormatter::new(format).format_reports(reports)?;
    emit(&output, destination)?;
    Ok(reports.iter().all(|r| r.failures() == 0))
}

pub fn handle_extract(args: &ExtractArgs) -> i32 {
    match run_extract(args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => exit_code::<()>(Err(e)),
    }
}

fn run_extract(args: &ExtractArgs) -> Result<bool> {
    let config = load_config()?;
    let scanner = RepositoryScanner::new(extractor_for(&config, args.threshold, args.no_fuzzy));
    debug!(paths = ?args.paths, "extract");

    let mut reports = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let source = LocalSource::new(path);
        let report = scanner
            .scan(&source)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        reports.push(report);
    }

    write_reports(&reports, args.format.into(), args.output.as_deref())
}

pub fn handle_flatten(args: &FlattenArgs) -> i32 {
    exit_code(run_flatten(args))
}

fn run_flatten(args: &FlattenArgs) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let documents = split_documents(&text)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let views: Vec<FlattenedView> = documents.iter().map(FlattenedView::from_document).collect();
    let output = OutputFormatter::new(args.format.into()).format_flattened(&views)?;
    emit(&output, None)
}

pub fn handle_bitbucket(args: &BitbucketArgs) -> i32 {
    match run_bitbucket(args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => exit_code::<()>(Err(e)),
    }
}

fn run_bitbucket(args: &BitbucketArgs) -> Result<bool> {
    let config = load_config()?;
    let token = env::var(BITBUCKET_TOKEN_VAR)
        .with_context(|| format!("{} is not set", BITBUCKET_TOKEN_VAR))?;

    let timeout = args
        .timeout
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.request_timeout());
    let source = BitbucketSource::with_options(
        config.bitbucket_api.clone(),
        args.workspace.clone(),
        args.repository.clone(),
        token,
        timeout,
    )?
    .with_branch(args.branch.clone());

    let scanner = RepositoryScanner::new(extractor_for(&config, args.threshold, args.no_fuzzy));
    let report = scanner
        .scan(&source)
        .with_context(|| format!("Failed to list {}", source.describe()))?;

    write_reports(&[report], args.format.into(), args.output.as_deref())
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    exit_code(run_config(args))
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config()?;
    let output = OutputFormatter::new(args.format.into()).format_config(&config)?;
    emit(&output, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::OutputFormatArg;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_extractor_for_overrides() {
        let config = ExtractorConfig {
            fuzzy_threshold: 70,
            fuzzy_fallback: true,
            log_level: "info".to_string(),
            request_timeout_secs: 30,
            bitbucket_api: "https://api.bitbucket.org/2.0".to_string(),
        };
        let extractor = extractor_for(&config, Some(90), true);
        assert_eq!(extractor.threshold(), 90);
        assert!(!extractor.fuzzy_fallback());

        let extractor = extractor_for(&config, None, false);
        assert_eq!(extractor.threshold(), 70);
        assert!(extractor.fuzzy_fallback());
    }

    #[test]
    #[serial]
    fn test_run_extract_writes_output_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("application.yml");
        fs::write(&input, "spring:\n  application:\n    name: orders\n").unwrap();
        let out = dir.path().join("out.json");

        let args = ExtractArgs {
            paths: vec![input],
            format: OutputFormatArg::Json,
            threshold: None,
            no_fuzzy: false,
            output: Some(out.clone()),
        };
        assert!(run_extract(&args).unwrap());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(
            written[0]["files"][0]["record"]["service_name"]["value"],
            "orders"
        );
    }

    #[test]
    #[serial]
    fn test_run_extract_reports_parse_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.yml"), "a: [unclosed\n").unwrap();

        let args = ExtractArgs {
            paths: vec![dir.path().to_path_buf()],
            format: OutputFormatArg::Json,
            threshold: None,
            no_fuzzy: false,
            output: Some(dir.path().join("out.json")),
        };
        assert!(!run_extract(&args).unwrap());
    }
}
