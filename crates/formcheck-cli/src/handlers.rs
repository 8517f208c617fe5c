//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

pub mod completions;
pub mod config;
pub mod normalize;
pub mod utils;
pub mod validate;
pub mod view;

pub use completions::handle_completions;
pub use config::handle_config;
pub use normalize::handle_normalize;
pub use validate::handle_validate;
pub use view::handle_view;
