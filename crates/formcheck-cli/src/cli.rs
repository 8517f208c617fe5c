//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Formcheck CLI - schema-driven form validation
///
/// Validates form submissions against declarative schemas, prints the
/// cleaned values and explains every failure.
#[derive(Parser, Debug)]
#[command(
    name = "formcheck",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FORMCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a submission against a form schema
    Validate(ValidateArgs),

    /// Print a schema with every default filled in
    Normalize(NormalizeArgs),

    /// Print the view model a renderer would receive
    View(ViewArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Documents backing the engine's collaborators
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Dictionary file (JSON, YAML or TOML) overriding the configured one
    #[arg(long, value_name = "FILE")]
    pub dictionary: Option<PathBuf>,

    /// Option rows for `fromModel` fields, keyed by model name
    #[arg(long = "option-rows", value_name = "FILE")]
    pub option_rows: Option<PathBuf>,

    /// Treat labels as dictionary keys
    #[arg(long)]
    pub localize_labels: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the form schema (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Path to the submission document (JSON or YAML)
    #[arg(value_name = "SUBMISSION")]
    pub submission: PathBuf,

    /// Form name, defaults to the schema file name
    #[arg(short, long)]
    pub form: Option<String>,

    /// Record id used to finalize stored upload names
    #[arg(long)]
    pub record_id: Option<String>,

    /// Show sensitive values in the cleaned output
    #[arg(long)]
    pub reveal: bool,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Arguments for the normalize command
#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Path to the form schema (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to")]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Arguments for the view command
#[derive(Parser, Debug)]
pub struct ViewArgs {
    /// Path to the form schema (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Submission to redisplay; its values are injected into the fields
    #[arg(short, long, value_name = "SUBMISSION")]
    pub submission: Option<PathBuf>,

    /// Form name, defaults to the schema file name
    #[arg(short, long)]
    pub form: Option<String>,

    #[command(flatten)]
    pub sources: SourceArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show current configuration values
    Show(ConfigShowArgs),

    /// List the locations searched for a configuration file
    Paths,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Initialize user config instead of project config (.formcheck.yaml)
    #[arg(long)]
    pub user: bool,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: OutputFormat::Human,
            no_color: false,
            command: Commands::Normalize(NormalizeArgs {
                schema: PathBuf::from("form.signup.json"),
                output_file: None,
                sources: SourceArgs::default(),
            }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli {
            verbose: 2,
            quiet: true,
            ..cli
        };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_validate_arguments() {
        let cli = Cli::parse_from([
            "formcheck",
            "-o",
            "json-pretty",
            "validate",
            "signup.yaml",
            "post.json",
            "--record-id",
            "42",
            "--dictionary",
            "en.yaml",
        ]);
        assert_eq!(cli.output, OutputFormat::JsonPretty);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.schema, PathBuf::from("signup.yaml"));
                assert_eq!(args.record_id.as_deref(), Some("42"));
                assert_eq!(args.sources.dictionary, Some(PathBuf::from("en.yaml")));
                assert!(!args.reveal);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
