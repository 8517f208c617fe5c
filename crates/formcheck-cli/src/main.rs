//! Formcheck CLI - Command-line interface for schema-driven form validation
//!
//! This is the main entry point for the Formcheck CLI application, providing
//! commands for validating submissions, normalizing schemas and previewing
//! the view model of a form.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;
mod storage;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Load configuration before logging so the file can pick the log level
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, cli.use_color()),
    };

    // Set up colored output
    control::set_override(cli.use_color() && config.output.color);

    // Initialize logging
    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli, config) {
        Ok(()) => process::exit(0),
        Err(e) => exit_with(&e, control::SHOULD_COLORIZE.should_colorize()),
    }
}

fn exit_with(e: &error::Error, use_color: bool) -> ! {
    eprintln!("{}", error::format_error(e, use_color));

    if e.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    process::exit(e.exit_code());
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command, request_id = logging::current_request_id()))]
fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let use_color = cli.use_color() && config.output.color;
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet, cli.verbosity_level());

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Validate(args) => handlers::handle_validate(args, &config, &mut output),
        Commands::Normalize(args) => handlers::handle_normalize(args, &config, &mut output),
        Commands::View(args) => handlers::handle_view(args, &config, &mut output),
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());

    // Without -v flags the config file decides
    if cli.verbosity_level() == 0 {
        logging_config.level = config.logging.level.clone();
        logging_config.format = config.logging.format;
    }

    // Apply environment overrides
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
