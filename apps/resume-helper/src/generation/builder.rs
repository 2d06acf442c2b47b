//! Resume tailoring: orchestrates the full `tailor` pipeline.
//!
//! Flow: base resume → job text → corpus (optionally filtered by role tag) →
//!       prompt → one free-text completion → parse/validate/normalize → write
//!       markdown → optional DOCX conversion.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::config::UserPaths;
use crate::corpus::store::{filter_by_role_tag, load_projects, load_projects_or_empty};
use crate::errors::AppError;
use crate::generation::formatter::{parse_model_output, write_resume, OutputMetadata};
use crate::generation::prompts::build_prompt;
use crate::llm_client::LlmProvider;
use crate::models::project::{ProjectRecord, RoleTag};
use crate::parsers::job::parse_job_input;
use crate::parsers::pdf::parse_resume;
use crate::render::convert_to_docx;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TailorRequest {
    /// URL or posting text. Stdin is resolved by the caller.
    pub job: String,
    pub resume: Option<PathBuf>,
    pub projects: Option<PathBuf>,
    pub role: Option<RoleTag>,
    pub output: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub docx: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TailorOutcome {
    pub markdown_path: PathBuf,
    /// Set only when conversion succeeded.
    pub docx_path: Option<PathBuf>,
    pub metadata: OutputMetadata,
    pub missing_sections: Vec<&'static str>,
    pub projects_used: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub async fn build_resume(
    request: &TailorRequest,
    paths: &UserPaths,
    llm: &dyn LlmProvider,
) -> Result<TailorOutcome, AppError> {
    let base_resume = load_base_resume(request.resume.as_deref(), &paths.resume)?;

    let job_text = parse_job_input(&request.job).await?;
    if job_text.is_empty() {
        return Err(AppError::Validation(
            "Job posting content is empty".to_string(),
        ));
    }

    let projects = load_candidates(request.projects.as_deref(), &paths.projects, request.role)?;

    let (system, user) = build_prompt(base_resume.as_deref(), &job_text, &projects);
    info!("Generating tailored resume via {}", llm.model_name());
    let raw = llm.complete(&system, &user).await?;

    let parsed = parse_model_output(&raw);
    let markdown_path = match &request.output {
        Some(path) => path.clone(),
        None => default_output_path(
            &paths.output_dir_md,
            &parsed.metadata,
            chrono::Local::now().naive_local(),
        ),
    };
    write_resume(&parsed, &markdown_path)?;

    let docx_path = if request.docx {
        let target = docx_path_for(&markdown_path, request.output.is_some(), &paths.output_dir_docx);
        match convert_to_docx(&markdown_path, &target, request.template.as_deref()).await {
            Ok(()) => Some(target),
            Err(e) => {
                warn!("DOCX conversion skipped: {e}");
                None
            }
        }
    } else {
        None
    };

    Ok(TailorOutcome {
        markdown_path,
        docx_path,
        missing_sections: parsed.resume.missing_sections(),
        metadata: parsed.metadata,
        projects_used: projects.len(),
    })
}

/// An explicit path must exist; the profile default is optional.
fn load_base_resume(explicit: Option<&Path>, default: &Path) -> Result<Option<String>, AppError> {
    match explicit {
        Some(path) => parse_resume(path).map(Some),
        None if default.is_file() => parse_resume(default).map(Some),
        None => {
            info!("No base resume at {}; building from projects", default.display());
            Ok(None)
        }
    }
}

fn load_candidates(
    explicit: Option<&Path>,
    default: &Path,
    role: Option<RoleTag>,
) -> Result<Vec<ProjectRecord>, AppError> {
    let projects = match explicit {
        Some(path) => load_projects(path)?,
        None => load_projects_or_empty(default)?,
    };

    let Some(tag) = role else {
        return Ok(projects);
    };
    let filtered = filter_by_role_tag(&projects, tag);
    info!(
        "{} of {} project(s) tagged {tag}",
        filtered.len(),
        projects.len()
    );
    if filtered.is_empty() {
        warn!("No projects tagged {tag}; tailoring from the base resume only");
    }
    Ok(filtered)
}

/// `<company>_<role>_<YYYYMMDD_HHMMSS>.md`, or `resume_<timestamp>.md` when the
/// model emitted no metadata.
pub fn default_output_path(dir: &Path, metadata: &OutputMetadata, now: NaiveDateTime) -> PathBuf {
    let stamp = now.format("%Y%m%d_%H%M%S");
    let name = if metadata.company.is_none() && metadata.role.is_none() {
        format!("resume_{stamp}.md")
    } else {
        let company = slug(metadata.company.as_deref(), "company");
        let role = slug(metadata.role.as_deref(), "role");
        format!("{company}_{role}_{stamp}.md")
    };
    dir.join(name)
}

fn docx_path_for(markdown: &Path, explicit_output: bool, docx_dir: &Path) -> PathBuf {
    if explicit_output {
        return markdown.with_extension("docx");
    }
    let stem = markdown
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    docx_dir.join(format!("{stem}.docx"))
}

/// Lower-case, runs of non-alphanumerics become one `_`.
fn slug(value: Option<&str>, fallback: &str) -> String {
    let mut out = String::new();
    for c in value.unwrap_or_default().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_');
    if out.is_empty() {
        fallback.to_string()
    } else {
        out.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::store::save_projects;
    use crate::llm_client::stub::ScriptedProvider;
    use chrono::NaiveDate;

    const REPLY: &str = "COMPANY: Acme Corp\nROLE: Data Scientist\n\n# Jane\n\n\
        ## Work Experience\nAcme\n\n## Project Experience\n### Churn\n\n\
        ## SELECTION NOTES\nChose churn.\n";

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    fn fixture() -> (tempfile::TempDir, UserPaths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = UserPaths::new(tmp.path(), "sam".to_string());
        (tmp, paths)
    }

    fn corpus() -> Vec<ProjectRecord> {
        let mut a = ProjectRecord::new("Churn Model", "churn", vec![RoleTag::DataScientist]).unwrap();
        a.id = "proj_001".to_string();
        let mut b = ProjectRecord::new("Pipelines", "etl", vec![RoleTag::DataEngineer]).unwrap();
        b.id = "proj_002".to_string();
        vec![a, b]
    }

    #[test]
    fn test_default_output_path_from_metadata() {
        let metadata = OutputMetadata {
            company: Some("Acme Corp.".to_string()),
            role: Some("Sr. Data Scientist (ML)".to_string()),
        };
        let path = default_output_path(Path::new("/out"), &metadata, at());
        assert_eq!(
            path,
            PathBuf::from("/out/acme_corp_sr_data_scientist_ml_20260314_090507.md")
        );
    }

    #[test]
    fn test_default_output_path_fallbacks() {
        let none = default_output_path(Path::new("/out"), &OutputMetadata::default(), at());
        assert_eq!(none, PathBuf::from("/out/resume_20260314_090507.md"));

        let company_only = OutputMetadata {
            company: Some("Globex".to_string()),
            role: None,
        };
        let path = default_output_path(Path::new("/out"), &company_only, at());
        assert_eq!(path, PathBuf::from("/out/globex_role_20260314_090507.md"));
    }

    #[test]
    fn test_docx_path_for() {
        assert_eq!(
            docx_path_for(Path::new("/x/custom.md"), true, Path::new("/docx")),
            PathBuf::from("/x/custom.docx")
        );
        assert_eq!(
            docx_path_for(Path::new("/md/acme_ds_1.md"), false, Path::new("/docx")),
            PathBuf::from("/docx/acme_ds_1.docx")
        );
    }

    #[tokio::test]
    async fn test_build_resume_writes_filtered_tailored_resume() {
        let (tmp, paths) = fixture();
        save_projects(&paths.projects, &corpus()).unwrap();
        let output = tmp.path().join("out.md");

        let llm = ScriptedProvider::new().with_text(REPLY);
        let request = TailorRequest {
            job: "Data Scientist at Acme".to_string(),
            role: Some(RoleTag::DataScientist),
            output: Some(output.clone()),
            ..Default::default()
        };

        let outcome = build_resume(&request, &paths, &llm).await.unwrap();
        assert_eq!(outcome.markdown_path, output);
        assert_eq!(outcome.projects_used, 1);
        assert!(outcome.missing_sections.is_empty());
        assert_eq!(outcome.metadata.company.as_deref(), Some("Acme Corp"));
        assert!(outcome.docx_path.is_none());

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("# Jane\n"));
        assert!(!written.contains("SELECTION NOTES"));
        assert!(!written.contains("COMPANY:"));

        let call = &llm.calls()[0];
        assert!(call.user.contains("No base resume provided."));
        assert!(call.user.contains("Project: Churn Model"));
        assert!(!call.user.contains("Project: Pipelines"));
    }

    #[tokio::test]
    async fn test_build_resume_names_output_from_metadata() {
        let (_tmp, paths) = fixture();
        let llm = ScriptedProvider::new().with_text(REPLY);
        let request = TailorRequest {
            job: "Some job".to_string(),
            ..Default::default()
        };

        let outcome = build_resume(&request, &paths, &llm).await.unwrap();
        assert!(outcome.markdown_path.starts_with(&paths.output_dir_md));
        let name = outcome.markdown_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("acme_corp_data_scientist_"));
        assert!(name.ends_with(".md"));
        assert!(outcome.markdown_path.is_file());
    }

    #[tokio::test]
    async fn test_build_resume_writes_invalid_output_anyway() {
        let (tmp, paths) = fixture();
        let output = tmp.path().join("out.md");
        let llm = ScriptedProvider::new().with_text("# Jane\n\nJust a summary.");
        let request = TailorRequest {
            job: "job".to_string(),
            output: Some(output.clone()),
            ..Default::default()
        };

        let outcome = build_resume(&request, &paths, &llm).await.unwrap();
        assert_eq!(
            outcome.missing_sections,
            vec!["Work Experience", "Project Experience"]
        );
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "# Jane\n\nJust a summary.\n");
    }

    #[tokio::test]
    async fn test_build_resume_uses_explicit_base_resume() {
        let (tmp, paths) = fixture();
        let resume = tmp.path().join("base.txt");
        std::fs::write(&resume, "Jane Smith, data scientist").unwrap();
        let llm = ScriptedProvider::new().with_text(REPLY);
        let request = TailorRequest {
            job: "job".to_string(),
            resume: Some(resume),
            output: Some(tmp.path().join("out.md")),
            ..Default::default()
        };

        build_resume(&request, &paths, &llm).await.unwrap();
        assert!(llm.calls()[0]
            .user
            .contains("BASE RESUME\n-----------\nJane Smith, data scientist"));
    }

    #[tokio::test]
    async fn test_build_resume_hard_errors() {
        let (tmp, paths) = fixture();
        let llm = ScriptedProvider::new();

        let missing_resume = TailorRequest {
            job: "job".to_string(),
            resume: Some(tmp.path().join("nope.pdf")),
            ..Default::default()
        };
        assert!(matches!(
            build_resume(&missing_resume, &paths, &llm).await,
            Err(AppError::InputNotFound(_))
        ));

        let empty_job = TailorRequest {
            job: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_resume(&empty_job, &paths, &llm).await,
            Err(AppError::Validation(_))
        ));

        let missing_projects = TailorRequest {
            job: "job".to_string(),
            projects: Some(tmp.path().join("nope.json")),
            ..Default::default()
        };
        assert!(matches!(
            build_resume(&missing_projects, &paths, &llm).await,
            Err(AppError::InputNotFound(_))
        ));

        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_docx_failure_is_not_fatal() {
        let (tmp, paths) = fixture();
        let output = tmp.path().join("out.md");
        let llm = ScriptedProvider::new().with_text(REPLY);
        let request = TailorRequest {
            job: "job".to_string(),
            output: Some(output.clone()),
            template: Some(tmp.path().join("missing_template.docx")),
            docx: true,
            ..Default::default()
        };

        // with or without pandoc installed the markdown artifact is produced
        let outcome = build_resume(&request, &paths, &llm).await.unwrap();
        assert!(output.is_file());
        if let Some(docx) = outcome.docx_path {
            assert_eq!(docx, tmp.path().join("out.docx"));
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug(Some("  Acme, Inc. "), "company"), "acme_inc");
        assert_eq!(slug(Some("***"), "role"), "role");
        assert_eq!(slug(None, "role"), "role");
    }
}
