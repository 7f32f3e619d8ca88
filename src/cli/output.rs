use crate::{Diagnostic, FileReport, Report};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonFile<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    diagnostics: &'a [Diagnostic],
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    files_checked: usize,
    total_errors: usize,
    files: Vec<JsonFile<'a>>,
}

pub fn render(report: &Report, colored_output: bool, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report, colored_output)),
        OutputFormat::Json => render_json(report),
    }
}

fn render_text(report: &Report, colored_output: bool) -> String {
    report
        .files
        .iter()
        .map(|file| render_file(file, colored_output))
        .collect()
}

/// Text for one file: a skip warning, the file's unknown words, or
/// nothing at all when the file is clean.
pub fn render_file(file: &FileReport, colored_output: bool) -> String {
    let mut out = String::new();
    let file_name = file.path.display().to_string();

    if let Err(e) = &file.outcome {
        let line = format!("warning: skipped {}: {}", file_name, e);
        if colored_output {
            out.push_str(&format!("{}\n", line.yellow()));
        } else {
            out.push_str(&format!("{}\n", line));
        }
        return out;
    }

    let diagnostics = file.diagnostics();
    if diagnostics.is_empty() {
        return out;
    }

    if colored_output {
        out.push_str(&format!("\n{}\n", file_name.bold().underline()));
    } else {
        out.push_str(&format!("\n{}\n", file_name));
    }

    for error in diagnostics {
        let line_info = format!("{}:{}", error.span.start.line, error.span.start.column);

        if colored_output {
            out.push_str(&format!("  {} {}\n", line_info.blue().bold(), error.word.red().bold()));
            if !error.suggestions.is_empty() {
                let suggestions = error
                    .suggestions
                    .iter()
                    .map(|s| s.green().to_string())
                    .collect::<Vec<_>>()
                    .join(&", ".dimmed().to_string());
                out.push_str(&format!("    {} {}\n", "→".dimmed(), suggestions));
            }
        } else {
            out.push_str(&format!("  {} {}\n", line_info, error.word));
            if !error.suggestions.is_empty() {
                out.push_str(&format!("    → {}\n", error.suggestions.join(", ")));
            }
        }
    }

    out
}

fn render_json(report: &Report) -> serde_json::Result<String> {
    let files = report
        .files
        .iter()
        .map(|f| JsonFile {
            file: f.path.display().to_string(),
            error: f.outcome.as_ref().err().map(|e| e.to_string()),
            diagnostics: f.diagnostics(),
        })
        .collect();

    let output = JsonOutput {
        files_checked: report.files_checked(),
        total_errors: report.error_count(),
        files,
    };

    serde_json::to_string_pretty(&output)
}

pub fn check_summary(total_errors: usize, files: usize, colored: bool) -> String {
    let file_word = if files == 1 { "file" } else { "files" };
    if total_errors == 0 {
        let message = "✓ No spelling errors found!";
        if colored {
            message.green().bold().to_string()
        } else {
            message.to_string()
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        if colored {
            format!(
                "{} {} {} found in {} {}",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word,
                files,
                file_word
            )
        } else {
            format!(
                "✗ {} {} found in {} {}",
                total_errors, error_word, files, file_word
            )
        }
    }
}
