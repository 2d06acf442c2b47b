//! Advisory audit: which experiences in the resume are missing from the corpus.

use crate::errors::AppError;
use crate::importer::prompts::{COVERAGE_PROMPT_TEMPLATE, COVERAGE_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::LlmProvider;
use crate::models::project::ProjectRecord;

/// Returns one description per uncaptured experience; empty when fully covered.
pub async fn check_coverage(
    resume_text: &str,
    projects: &[ProjectRecord],
    llm: &dyn LlmProvider,
) -> Result<Vec<String>, AppError> {
    let db_summary = format_db_summary(projects);
    let user_prompt = fill_template(
        COVERAGE_PROMPT_TEMPLATE,
        &[("resume_text", resume_text.trim()), ("db_summary", &db_summary)],
    );

    let reply = llm.complete(COVERAGE_SYSTEM, &user_prompt).await?;
    Ok(parse_gaps(&reply))
}

/// `NONE` (any case) or blank means no gaps; otherwise every `-` line is a gap.
pub fn parse_gaps(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case("NONE") {
        return Vec::new();
    }
    reply
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(|line| line.trim_start_matches(|c: char| c == '-' || c == ' ').trim().to_string())
        .filter(|gap| !gap.is_empty())
        .collect()
}

pub fn format_db_summary(projects: &[ProjectRecord]) -> String {
    if projects.is_empty() {
        return "(empty)".to_string();
    }
    projects
        .iter()
        .map(|p| {
            if p.organization.is_empty() {
                format!("- {}", p.title)
            } else {
                format!("- {} ({})", p.title, p.organization)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
