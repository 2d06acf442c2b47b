//! Load, validate, filter, and persist the projects corpus file.
//!
//! The corpus is read once at the start of a run and rewritten wholesale at the
//! end. Writes go to a temp file in the target directory and are renamed over
//! the original, so a crash never leaves a half-written corpus behind.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::project::{ProjectRecord, ProjectsFile, RoleTag};

/// Loads and validates a corpus file. A missing file is `InputNotFound`;
/// a schema violation is `Validation`.
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>, AppError> {
    if !path.exists() {
        return Err(AppError::InputNotFound(format!(
            "Projects file not found: {}",
            path.display()
        )));
    }

    let raw = std::fs::read_to_string(path)?;
    let file: ProjectsFile = serde_json::from_str(&raw).map_err(|e| {
        AppError::Validation(format!(
            "{} validation error: {e}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "projects file".to_string())
        ))
    })?;

    for (index, project) in file.projects.iter().enumerate() {
        project
            .validate()
            .map_err(|e| AppError::Validation(format!("project #{index}: {e}")))?;
    }

    debug!("Loaded {} project(s) from {}", file.projects.len(), path.display());
    Ok(file.projects)
}

/// Like [`load_projects`] but treats a missing file as an empty corpus.
pub fn load_projects_or_empty(path: &Path) -> Result<Vec<ProjectRecord>, AppError> {
    match load_projects(path) {
        Err(AppError::InputNotFound(_)) => {
            info!("No projects file at {}; starting empty", path.display());
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Rewrites the whole corpus file: pretty-printed JSON, UTF-8, trailing newline.
/// Parent directories are created as needed.
pub fn save_projects(path: &Path, projects: &[ProjectRecord]) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let file = ProjectsFile {
        projects: projects.to_vec(),
    };
    let mut body = serde_json::to_string_pretty(&file)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize projects: {e}")))?;
    body.push('\n');

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(body.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| AppError::Io(e.error))?;

    debug!("Wrote {} project(s) to {}", projects.len(), path.display());
    Ok(())
}

/// Records whose role tags include `tag`, in corpus order.
pub fn filter_by_role_tag(projects: &[ProjectRecord], tag: RoleTag) -> Vec<ProjectRecord> {
    projects
        .iter()
        .filter(|p| p.has_role_tag(tag))
        .cloned()
        .collect()
}
