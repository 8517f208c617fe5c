//! Normalize command handler

use super::utils::{load_form, Sources};
use crate::cli::{NormalizeArgs, OutputFormat};
use crate::config::Config;
use crate::error::{ErrorContext, Result};
use crate::output::{OutputFormatter, OutputWriter};
use std::fs;
use tracing::{debug, instrument};

/// Handle the normalize command
#[instrument(skip(config, output), fields(schema = %args.schema.display()))]
pub fn handle_normalize(args: NormalizeArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let sources = Sources::load(config, &args.sources)?;
    let mut form = load_form(&args.schema, None, sources.localize_labels)?;
    form.normalize(&sources.dictionary);
    debug!(fields = form.inputs().len(), "schema normalized");

    match args.output_file {
        Some(path) => {
            let format = match output.format() {
                OutputFormat::Human => OutputFormat::JsonPretty,
                other => other,
            };
            fs::write(&path, format.format(form.inputs())?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output.success(&format!("✓ Normalized schema saved to {}", path.display()))?;
        }
        None => output.data(form.inputs())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SourceArgs;
    use crate::config::ConfigBuilder;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn test_normalized_schema_is_saved() {
        let dir = tempdir().unwrap();
        let schema = dir.path().join("form.contact.json");
        fs::write(
            &schema,
            json!({
                "nick": {"tag": "input", "attributes": {"placeholder": "Nickname"}},
                "topic": {"tag": "select", "label": "Topic"}
            })
            .to_string(),
        )
        .unwrap();
        let saved = dir.path().join("normalized.json");

        let config = ConfigBuilder::new().upload_root(dir.path().join("store")).build();
        let mut output = OutputWriter::with_writer(
            OutputFormat::Human,
            false,
            true,
            0,
            Box::new(std::io::sink()),
        );
        handle_normalize(
            NormalizeArgs {
                schema,
                output_file: Some(saved.clone()),
                sources: SourceArgs::default(),
            },
            &config,
            &mut output,
        )
        .unwrap();

        let normalized: Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
        assert_eq!(normalized["nick"]["errorLabel"], json!("Nickname"));
        assert_eq!(normalized["topic"]["tag"], json!("select"));
        let names: Vec<&String> = normalized.as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["nick", "topic"]);
    }
}
