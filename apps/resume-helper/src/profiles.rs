//! User profiles: one directory per person under `<home>/users`.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{Config, UserPaths, DEFAULT_USER};
use crate::corpus::store::save_projects;
use crate::errors::AppError;

/// Sorted profile names; hidden directories are skipped and a missing
/// `users/` directory yields an empty list.
pub fn list_profiles(users_dir: &Path) -> Result<Vec<String>, AppError> {
    if !users_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(users_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Human-readable listing for `list-users`. `active` is the env-selected profile.
pub fn render_profile_list(profiles: &[String], active: Option<&str>) -> String {
    if profiles.is_empty() {
        return "No user profiles found. Run: resume-helper init-user <name>".to_string();
    }

    let mut lines = vec!["User profiles:".to_string()];
    for name in profiles {
        if Some(name.as_str()) == active {
            lines.push(format!("  * {name}  (active)"));
        } else if name == DEFAULT_USER && active.is_none() {
            lines.push(format!("    {name}  (default)"));
        } else {
            lines.push(format!("    {name}"));
        }
    }
    lines.join("\n")
}

pub fn list_users(config: &Config) -> Result<String, AppError> {
    let profiles = list_profiles(&config.users_dir())?;
    let active = config.env_user.as_deref();
    if let Some(active) = active {
        if !profiles.iter().any(|p| p == active) {
            warn!("RESUME_HELPER_USER='{active}' profile not found. Run: resume-helper init-user {active}");
        }
    }
    Ok(render_profile_list(&profiles, active))
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    Created(UserPaths),
    AlreadyExists(PathBuf),
}

/// Creates the profile tree and an empty corpus. An existing profile is left as is.
pub fn init_user(config: &Config, name: &str) -> Result<InitOutcome, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Profile name cannot be empty".to_string(),
        ));
    }
    if name.starts_with('.') || name.contains(|c: char| c == '/' || c == '\\') {
        return Err(AppError::Validation(format!(
            "Invalid profile name '{name}'"
        )));
    }

    let paths = UserPaths::new(&config.users_dir(), name.to_string());
    if paths.root.exists() {
        info!("User profile '{name}' already exists at {}", paths.root.display());
        return Ok(InitOutcome::AlreadyExists(paths.root));
    }

    paths.ensure_dirs()?;
    save_projects(&paths.projects, &[])?;
    info!("Created user profile '{name}'");
    info!("Drop your resume PDF at: {}", paths.resume.display());
    Ok(InitOutcome::Created(paths))
}
