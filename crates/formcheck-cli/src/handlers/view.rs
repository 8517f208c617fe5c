//! View command handler

use super::utils::{load_form, read_document, Sources, SubmissionDocument};
use crate::cli::ViewArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use tracing::{debug, instrument};

/// Handle the view command
///
/// With a submission, the form is validated first so that the view shows
/// the submitted values the way a redisplayed form would.
#[instrument(skip(config, output), fields(schema = %args.schema.display()))]
pub fn handle_view(args: ViewArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let sources = Sources::load(config, &args.sources)?;
    let mut form = load_form(&args.schema, args.form.as_deref(), sources.localize_labels)?;

    if let Some(path) = &args.submission {
        let document: SubmissionDocument = read_document(path)?;
        sources.register_challenges(form.name(), &document.challenges);
        let valid = form.is_valid(&document.submission, sources.services())?;
        debug!(valid, "submission replayed before preparing the view");
    }

    let view = form.prepare_view(sources.services())?;
    output.view(&view)
}
