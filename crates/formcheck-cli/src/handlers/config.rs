//! Configuration command handlers

use crate::cli::{
    ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs, OutputFormat,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::Path;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Paths => handle_config_paths(output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        Config::project_config_path()
    };
    write_default_config(&path, args.force, output)
}

fn write_default_config(path: &Path, force: bool, output: &mut OutputWriter) -> Result<()> {
    if path.exists() && !force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to point at your dictionary and upload directory.")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let content = render_config(config, args.format)?;
    output.writeln(content.trim_end())
}

fn render_config(config: &Config, format: ConfigFormat) -> Result<String> {
    Ok(match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Handle config paths subcommand
fn handle_config_paths(output: &mut OutputWriter) -> Result<()> {
    let paths = Config::default_config_paths();
    output.debug(&format!("{} candidate locations", paths.len()))?;

    if output.format() != OutputFormat::Human {
        let found: Vec<serde_json::Value> = paths
            .iter()
            .map(|path| serde_json::json!({"path": path, "exists": path.exists()}))
            .collect();
        return output.data(&found);
    }

    let rows = paths
        .iter()
        .map(|path| {
            let status = if path.exists() { "found" } else { "-" };
            vec![path.display().to_string(), status.to_string()]
        })
        .collect();
    output.table(&["LOCATION", "STATUS"], rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn silent() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, true, 0, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_respects_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("formcheck.yaml");

        write_default_config(&path, false, &mut silent()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, "storage:\n  allow_overwrite: true\n").unwrap();
        write_default_config(&path, false, &mut silent()).unwrap();
        assert!(Config::from_file(&path).unwrap().storage.allow_overwrite);

        write_default_config(&path, true, &mut silent()).unwrap();
        assert!(!Config::from_file(&path).unwrap().storage.allow_overwrite);
    }

    #[test]
    fn test_render_config_formats() {
        let config = Config::default();
        assert!(render_config(&config, ConfigFormat::Toml)
            .unwrap()
            .contains("[storage]"));
        assert!(render_config(&config, ConfigFormat::Yaml)
            .unwrap()
            .contains("allow_overwrite: false"));
        let json: serde_json::Value =
            serde_json::from_str(&render_config(&config, ConfigFormat::Json).unwrap()).unwrap();
        assert_eq!(json["logging"]["format"], serde_json::json!("compact"));
    }
}
