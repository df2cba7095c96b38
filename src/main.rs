use svcscope::cli::commands::{CliArgs, Commands};
use svcscope::cli::handlers::{handle_bitbucket, handle_config, handle_extract, handle_flatten};
use svcscope::util::logging::{init_logging, level_or_default, LoggingConfig};
use svcscope::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("svcscope v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Extract(extract_args) => handle_extract(extract_args),
        Commands::Flatten(flatten_args) => handle_flatten(flatten_args),
        Commands::Bitbucket(bitbucket_args) => handle_bitbucket(bitbucket_args),
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        level_or_default(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("SVCSCOPE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        level_or_default(&level_str)
    };

    let use_json = env::var("SVCSCOPE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::default()
    });
}
