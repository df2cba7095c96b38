pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BitbucketArgs, CliArgs, Commands, ConfigArgs, ExtractArgs, FlattenArgs};
pub use output::{OutputFormat, OutputFormatter};
