use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Service-topology extraction from Spring Boot configuration
#[derive(Parser, Debug)]
#[command(
    name = "svcscope",
    about = "Extract service topology metadata from Spring Boot configuration files",
    version,
    author,
    long_about = "svcscope reads Spring-Boot-style YAML/JSON configuration and reports the \
                  service name, version, port, protocol, profiles, dependent services and \
                  dependent infrastructure it describes. Known nesting patterns are read \
                  directly; anything else is found by fuzzy key matching."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Extract service records from local files or directories",
        long_about = "Extracts one service record per configuration file. Directories are \
                      walked recursively for .yml, .yaml and .json files.\n\n\
                      Examples:\n  \
                      svcscope extract src/main/resources/application.yml\n  \
                      svcscope extract ./config --format json\n  \
                      svcscope extract app.yml --no-fuzzy --threshold 85"
    )]
    Extract(ExtractArgs),

    #[command(
        about = "Print the flattened dotted-path view of a file",
        long_about = "Prints every leaf of every document as a dotted path, which is what \
                      the fuzzy resolver matches against.\n\n\
                      Examples:\n  \
                      svcscope flatten application.yml"
    )]
    Flatten(FlattenArgs),

    #[command(
        about = "Extract service records from a Bitbucket Cloud repository",
        long_about = "Lists the configuration files of a Bitbucket repository branch and \
                      extracts each one. The access token is read from BITBUCKET_ACCESS_TOKEN.\n\n\
                      Examples:\n  \
                      svcscope bitbucket --workspace acme --repository orders\n  \
                      svcscope bitbucket -w acme -r orders --branch develop --format yaml"
    )]
    Bitbucket(BitbucketArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(value_name = "PATH", required = true, help = "Files or directories to read")]
    pub paths: Vec<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 't',
        long,
        value_name = "SCORE",
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Minimum fuzzy similarity (0-100) [env: SVCSCOPE_FUZZY_THRESHOLD]"
    )]
    pub threshold: Option<u8>,

    #[arg(long, help = "Structural extraction only, no fuzzy fallback")]
    pub no_fuzzy: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct FlattenArgs {
    #[arg(value_name = "FILE", help = "Configuration file to flatten")]
    pub file: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct BitbucketArgs {
    #[arg(short = 'w', long, help = "Bitbucket workspace")]
    pub workspace: String,

    #[arg(short = 'r', long, help = "Repository slug")]
    pub repository: String,

    #[arg(short = 'b', long, default_value = "main", help = "Branch to read")]
    pub branch: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 't',
        long,
        value_name = "SCORE",
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Minimum fuzzy similarity (0-100)"
    )]
    pub threshold: Option<u8>,

    #[arg(long, help = "Structural extraction only, no fuzzy fallback")]
    pub no_fuzzy: bool,

    #[arg(long, value_name = "SECONDS", help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
