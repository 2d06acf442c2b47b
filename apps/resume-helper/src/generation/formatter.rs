//! Post-processing of the raw tailoring reply: metadata lines, rationale split,
//! advisory validation, whitespace normalization, and the file write.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::resume::ResumeOutput;

fn metadata_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*\**\s*(company|role)\s*\**\s*:\s*(.*)$").expect("static regex")
    })
}

fn notes_heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t]*#{1,2}[ \t]*selection notes\b").expect("static regex"))
}

/// `COMPANY:` / `ROLE:` values the model emits ahead of the resume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMetadata {
    pub company: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub metadata: OutputMetadata,
    pub resume: ResumeOutput,
}

/// Splits a raw reply into metadata, resume body and selection notes.
pub fn parse_model_output(raw: &str) -> ParsedOutput {
    let (metadata, rest) = strip_metadata(raw);

    let resume = match notes_heading_pattern().find(rest) {
        Some(m) => ResumeOutput {
            resume_markdown: rest[..m.start()].to_string(),
            selection_notes: rest[m.start()..].trim().to_string(),
        },
        None => ResumeOutput {
            resume_markdown: rest.to_string(),
            selection_notes: String::new(),
        },
    };

    ParsedOutput { metadata, resume }
}

/// Consumes leading `COMPANY:`/`ROLE:` lines (blank lines between them allowed)
/// and returns the remainder of the text.
fn strip_metadata(raw: &str) -> (OutputMetadata, &str) {
    let mut metadata = OutputMetadata::default();
    let mut rest = raw;

    loop {
        let (line, tail) = match rest.find('\n') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };
        if line.trim().is_empty() {
            if tail.is_empty() {
                break;
            }
            rest = tail;
            continue;
        }
        let Some(caps) = metadata_pattern().captures(line) else {
            break;
        };
        let value = caps[2].trim().trim_matches('*').trim().to_string();
        let value = (!value.is_empty()).then_some(value);
        if caps[1].eq_ignore_ascii_case("company") {
            metadata.company = value;
        } else {
            metadata.role = value;
        }
        rest = tail;
    }

    (metadata, rest)
}

/// Right-trims every line, keeps at most two consecutive blank lines, trims the
/// whole text and ends it with exactly one newline.
pub fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                lines.push("");
            }
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }
    format!("{}\n", lines.join("\n").trim())
}

/// Logs the notes, validates the body (warning only), normalizes it and writes
/// it to `output_path`. Returns the text written.
pub fn write_resume(parsed: &ParsedOutput, output_path: &Path) -> Result<String, AppError> {
    if !parsed.resume.selection_notes.is_empty() {
        info!("{}", parsed.resume.selection_notes);
    }

    if let Err(e) = parsed.resume.validate() {
        warn!("LLM output validation failed: {e}");
    }

    let cleaned = normalize_whitespace(&parsed.resume.resume_markdown);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, &cleaned)?;
    info!("Resume written to: {}", output_path.display());

    Ok(cleaned)
}
