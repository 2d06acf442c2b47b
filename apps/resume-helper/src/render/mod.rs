//! Markdown → DOCX conversion through the `pandoc` binary.

use std::ffi::OsString;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::AppError;

const PANDOC: &str = "pandoc";

/// Converts `input` to `output`. A `template` that exists is passed as
/// `--reference-doc`; one that does not is skipped with a warning.
pub async fn convert_to_docx(
    input: &Path,
    output: &Path,
    template: Option<&Path>,
) -> Result<(), AppError> {
    if !input.is_file() {
        return Err(AppError::Conversion(format!(
            "Input file '{}' not found",
            input.display()
        )));
    }

    let template = match template {
        Some(t) if t.is_file() => {
            info!("Using reference template: {}", t.display());
            Some(t)
        }
        Some(t) => {
            warn!("Template '{}' not found. Using pandoc defaults", t.display());
            None
        }
        None => None,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let args = pandoc_args(input, output, template);
    debug!("Running {PANDOC} {:?}", args);

    let result = Command::new(PANDOC)
        .args(&args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::Conversion("Pandoc is not installed or not in your PATH".to_string())
            }
            _ => AppError::Conversion(format!("Failed to run pandoc: {e}")),
        })?;

    if !result.status.success() {
        return Err(AppError::Conversion(format!(
            "Pandoc conversion failed: {}",
            String::from_utf8_lossy(&result.stderr).trim()
        )));
    }

    info!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}

fn pandoc_args(input: &Path, output: &Path, template: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![input.into(), "-o".into(), output.into()];
    if let Some(template) = template {
        let mut flag = OsString::from("--reference-doc=");
        flag.push(template);
        args.push(flag);
    }
    args
}
