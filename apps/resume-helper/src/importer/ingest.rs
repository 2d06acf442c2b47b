//! `import-projects`: resume → extracted records → duplicate resolution →
//! corpus merge → coverage audit.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::UserPaths;
use crate::corpus::merge::merge_projects;
use crate::corpus::store::load_projects_or_empty;
use crate::errors::AppError;
use crate::importer::coverage::check_coverage;
use crate::importer::dedup::resolve_duplicates;
use crate::importer::extractor::extract_projects;
use crate::llm_client::LlmProvider;
use crate::parsers::pdf::parse_resume;

#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    /// Overrides the profile's default resume.
    pub resume: Option<PathBuf>,
    /// Overrides the profile's corpus file.
    pub projects: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub extracted: usize,
    pub merged_duplicates: usize,
    pub added: usize,
    pub total: usize,
    /// Advisory only; empty when the audit passed or could not run.
    pub gaps: Vec<String>,
    pub projects_path: PathBuf,
}

pub async fn run_import(
    request: &ImportRequest,
    paths: &UserPaths,
    llm: &dyn LlmProvider,
) -> Result<ImportSummary, AppError> {
    paths.ensure_dirs()?;

    let resume_path = request.resume.as_deref().unwrap_or(&paths.resume);
    let projects_path = request.projects.as_deref().unwrap_or(&paths.projects);

    info!("Parsing resume: {}", resume_path.display());
    let resume_text = parse_resume(resume_path)?;

    import_resume_text(&resume_text, projects_path, llm).await
}

/// Everything after text extraction. The corpus at `projects_path` is read
/// once and rewritten once.
pub async fn import_resume_text(
    resume_text: &str,
    projects_path: &Path,
    llm: &dyn LlmProvider,
) -> Result<ImportSummary, AppError> {
    let new_projects = extract_projects(resume_text, llm).await?;
    let extracted = new_projects.len();
    info!("Extracted {extracted} project(s) from resume");

    let existing = load_projects_or_empty(projects_path)?;
    let resolution = resolve_duplicates(existing, new_projects, Some(llm)).await?;

    let outcome = merge_projects(
        resolution.updated_existing,
        resolution.truly_new,
        projects_path,
    )?;
    info!("Corpus updated: {}", projects_path.display());

    let gaps = match check_coverage(resume_text, &outcome.projects, llm).await {
        Ok(gaps) if gaps.is_empty() => {
            info!("Coverage check passed: all experience appears represented");
            gaps
        }
        Ok(gaps) => {
            warn!("The following resume experiences may not be fully captured:");
            for gap in &gaps {
                warn!("  - {gap}");
            }
            warn!("Review {} and add them manually if needed", projects_path.display());
            gaps
        }
        Err(e) => {
            warn!("Coverage check failed: {e}");
            Vec::new()
        }
    };

    Ok(ImportSummary {
        extracted,
        merged_duplicates: resolution.merged,
        added: outcome.added,
        total: outcome.projects.len(),
        gaps,
        projects_path: projects_path.to_path_buf(),
    })
}
