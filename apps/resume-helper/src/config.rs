use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::llm_client::Provider;

pub const DEFAULT_USER: &str = "jayne_dough";
pub const DEFAULT_PROVIDER: Provider = Provider::Gemini;

/// Application configuration loaded from environment variables (and `.env`).
/// API keys stay optional until the matching provider is selected.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Root holding `users/` and `shared/`.
    pub home: PathBuf,
    /// Profile named by `RESUME_HELPER_USER`, if any.
    pub env_user: Option<String>,
    pub provider: Provider,
    pub reference_docx: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let home = match non_empty("RESUME_HELPER_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        };

        let provider = match non_empty("RESUME_HELPER_PROVIDER") {
            Some(p) => p
                .parse::<Provider>()
                .map_err(|e| anyhow!("RESUME_HELPER_PROVIDER: {e}"))?,
            None => DEFAULT_PROVIDER,
        };

        let reference_docx = non_empty("RESUME_HELPER_TEMPLATE")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("shared").join("pandoc_template.docx"));

        Ok(Config {
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            env_user: non_empty("RESUME_HELPER_USER"),
            provider,
            reference_docx,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            home,
        })
    }

    pub fn users_dir(&self) -> PathBuf {
        self.home.join("users")
    }

    /// Resolves the profile for this run: explicit flag, then env, then the default.
    pub fn user_paths(&self, explicit: Option<&str>) -> UserPaths {
        let user = explicit
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .or_else(|| self.env_user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        UserPaths::new(&self.users_dir(), user)
    }
}

/// Every per-profile location, resolved once and threaded through each pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPaths {
    pub user: String,
    pub root: PathBuf,
    pub resume: PathBuf,
    pub projects: PathBuf,
    pub output_dir_md: PathBuf,
    pub output_dir_docx: PathBuf,
}

impl UserPaths {
    pub fn new(users_dir: &Path, user: String) -> Self {
        let root = users_dir.join(&user);
        let enhanced = root.join("resumes").join("enhanced");
        Self {
            resume: root.join("resumes").join("legacy").join("resume_default.pdf"),
            projects: root.join("projects.json"),
            output_dir_md: enhanced.join("md"),
            output_dir_docx: enhanced.join("docx"),
            root,
            user,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.resume.parent(),
            Some(self.output_dir_md.as_path()),
            Some(self.output_dir_docx.as_path()),
        ]
        .into_iter()
        .flatten()
        {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = config_from(&[("RESUME_HELPER_HOME", "/srv/rh")]).unwrap();
        assert_eq!(config.provider, DEFAULT_PROVIDER);
        assert_eq!(config.rust_log, "info");
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(
            config.reference_docx,
            PathBuf::from("/srv/rh/shared/pandoc_template.docx")
        );
    }

    #[test]
    fn test_blank_values_are_treated_as_unset() {
        let config = config_from(&[
            ("RESUME_HELPER_HOME", "/srv/rh"),
            ("GEMINI_API_KEY", "   "),
            ("RESUME_HELPER_USER", ""),
        ])
        .unwrap();
        assert!(config.gemini_api_key.is_none());
        assert!(config.env_user.is_none());
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let err = config_from(&[
            ("RESUME_HELPER_HOME", "/srv/rh"),
            ("RESUME_HELPER_PROVIDER", "llama"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("llama"));
    }

    #[test]
    fn test_user_resolution_order() {
        let config = config_from(&[
            ("RESUME_HELPER_HOME", "/srv/rh"),
            ("RESUME_HELPER_USER", "sam"),
        ])
        .unwrap();
        assert_eq!(config.user_paths(Some("alex")).user, "alex");
        assert_eq!(config.user_paths(None).user, "sam");

        let config = config_from(&[("RESUME_HELPER_HOME", "/srv/rh")]).unwrap();
        assert_eq!(config.user_paths(Some("  ")).user, DEFAULT_USER);
    }

    #[test]
    fn test_user_paths_layout() {
        let paths = UserPaths::new(Path::new("/srv/rh/users"), "sam".to_string());
        assert_eq!(paths.root, PathBuf::from("/srv/rh/users/sam"));
        assert_eq!(
            paths.resume,
            PathBuf::from("/srv/rh/users/sam/resumes/legacy/resume_default.pdf")
        );
        assert_eq!(paths.projects, PathBuf::from("/srv/rh/users/sam/projects.json"));
        assert!(paths.output_dir_md.ends_with("resumes/enhanced/md"));
        assert!(paths.output_dir_docx.ends_with("resumes/enhanced/docx"));
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = UserPaths::new(tmp.path(), "sam".to_string());
        paths.ensure_dirs().unwrap();
        assert!(paths.resume.parent().unwrap().is_dir());
        assert!(paths.output_dir_md.is_dir());
        assert!(paths.output_dir_docx.is_dir());
    }
}
