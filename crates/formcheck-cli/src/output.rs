//! Output formatting and writing utilities
//!
//! This module formats command results as JSON, YAML or human-readable
//! text, with specialized rendering for submission reports and form views.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use formcheck_core::{Failures, FormView, Values};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Outcome of one `validate` run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    pub form: String,
    pub valid: bool,
    /// Cleaned values, absent when the submission was empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Values>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Failures>,
    /// Aggregated failure message
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stored_uploads: Vec<StoredUploadSummary>,
}

/// An upload stored while processing the submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUploadSummary {
    pub field: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the outcome of a submission
    fn format_report(&self, report: &SubmissionReport) -> Result<String>;

    /// Format a prepared form view
    fn format_view(&self, view: &FormView) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_report(&self, report: &SubmissionReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_report_human(report)),
            _ => self.format(report),
        }
    }

    fn format_view(&self, view: &FormView) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_view_human(view)),
            _ => self.format(view),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self::with_writer(format, use_color, quiet, verbose, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            verbose,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if self.verbose > 1 {
            let mut value_json = serde_json::to_value(value)?;
            redaction::redact_json_value(&mut value_json);
            trace!(
                "Outputting data: {}",
                serde_json::to_string(&value_json)
                    .unwrap_or_else(|_| "[failed to serialize]".to_string())
            );
        }

        let formatted = self.format.format(value)?;
        self.emit(&formatted)
    }

    /// Write a submission report
    pub fn report(&mut self, report: &SubmissionReport) -> Result<()> {
        let formatted = self.format.format_report(report)?;
        self.emit(&formatted)
    }

    /// Write a prepared form view
    pub fn view(&mut self, view: &FormView) -> Result<()> {
        let formatted = self.format.format_view(view)?;
        self.emit(&formatted)
    }

    /// Write debug information if verbose mode is enabled
    pub fn debug(&mut self, message: &str) -> Result<()> {
        if self.verbose == 0 || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "DEBUG:".dimmed(), message.dimmed()))
        } else {
            self.writeln(&format!("DEBUG: {}", message))
        }
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        let rendered = render_table(headers, &rows);
        let mut lines = rendered.lines();
        if let Some(header) = lines.next() {
            if self.use_color {
                self.writeln(&header.bold().to_string())?;
            } else {
                self.writeln(header)?;
            }
        }
        for line in lines {
            self.writeln(line)?;
        }
        Ok(())
    }

    /// Machine formats are written as-is, human text line by line
    fn emit(&mut self, formatted: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => self.writeln(formatted),
            OutputFormat::Yaml => self.write(formatted),
            OutputFormat::Human => self.writeln(formatted.trim_end()),
        }
    }
}

/// Render rows under their headers with aligned columns
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = width),
                None => cell.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_row(headers.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

/// Turn the aggregated HTML message into plain lines
pub fn message_lines(message: &str) -> Vec<String> {
    static TAG_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let tags = TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").ok());

    message
        .split("</p>")
        .map(|paragraph| {
            let text = match tags {
                Some(regex) => regex.replace_all(paragraph, "").to_string(),
                None => paragraph.to_string(),
            };
            decode_entities(&text)
        })
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Format a submission report for human reading
fn format_report_human(report: &SubmissionReport) -> String {
    let mut output = String::new();

    if report.valid {
        output.push_str(&format!(
            "{} Submission accepted by form '{}'\n",
            "✓".green(),
            report.form
        ));
    } else {
        output.push_str(&format!(
            "{} Submission rejected by form '{}'\n",
            "✗".red(),
            report.form
        ));
    }

    let lines = message_lines(&report.message);
    if !lines.is_empty() {
        output.push_str(&format!("\n{}\n", "Failures:".bold()));
        for line in lines {
            output.push_str(&format!("  • {}\n", line));
        }
    }

    match &report.values {
        Some(values) if !values.is_empty() => {
            output.push_str(&format!("\n{}\n", "Cleaned values:".bold()));
            let rows = values
                .iter()
                .map(|(name, value)| vec![name.clone(), format_value_compact(value)])
                .collect::<Vec<_>>();
            output.push_str(&indent(&render_table(&["Field", "Value"], &rows)));
        }
        Some(_) => {}
        None => output.push_str("\nThe submission carried no values for this form.\n"),
    }

    if !report.stored_uploads.is_empty() {
        output.push_str(&format!("\n{}\n", "Stored uploads:".bold()));
        for upload in &report.stored_uploads {
            output.push_str(&format!(
                "  {} → #{} {}\n",
                upload.field,
                upload.id,
                upload.path.as_deref().unwrap_or("")
            ));
        }
    }

    output
}

/// Format a form view for human reading
fn format_view_human(view: &FormView) -> String {
    let mut output = format!("{} {}\n", "Form".bold(), view.name);

    let rows = view
        .fields
        .iter()
        .map(|field| {
            let value = field
                .file_path
                .clone()
                .or_else(|| field.spec.attribute("value").map(format_value_compact))
                .unwrap_or_default();
            vec![
                field.name.clone(),
                field.spec.kind.tag().to_string(),
                field.spec.display_label().to_string(),
                if field.spec.require { "*" } else { "" }.to_string(),
                value,
            ]
        })
        .collect::<Vec<_>>();
    output.push_str(&indent(&render_table(
        &["Field", "Tag", "Label", "Req", "Value"],
        &rows,
    )));

    let mut flags = Vec::new();
    if view.has_upload {
        flags.push("upload");
    }
    if view.has_date_picker {
        flags.push("date picker");
    }
    if view.has_color_picker {
        flags.push("color picker");
    }
    if !flags.is_empty() {
        output.push_str(&format!("\nNeeds: {}\n", flags.join(", ")));
    }
    if let Some(key) = view.mandatory_key {
        output.push_str(&format!(
            "Mandatory fields: {} ({})\n",
            view.mandatory_count, key
        ));
    }

    output
}

fn indent(block: &str) -> String {
    block.lines().map(|line| format!("  {}\n", line)).collect()
}

/// Format a JSON value in a compact, human-readable way
fn format_value_compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            if arr.len() <= 3 {
                format!(
                    "[{}]",
                    arr.iter()
                        .map(format_value_compact)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            } else {
                format!("[{} items]", arr.len())
            }
        }
        Value::Object(obj) => {
            if obj.len() <= 2 {
                let items: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, format_value_compact(v)))
                    .collect();
                format!("{{{}}}", items.join(", "))
            } else {
                format!("{{{} fields}}", obj.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
