use std::path::Path;

use tracing::debug;

use crate::errors::AppError;

/// Plain text of a resume document. PDFs go through `pdf-extract` with pages
/// separated by a blank line; `.txt` and `.md` files are read as-is.
pub fn parse_resume(path: &Path) -> Result<String, AppError> {
    if !path.is_file() {
        return Err(AppError::InputNotFound(format!(
            "Resume not found: {}",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match ext.as_str() {
        "txt" | "md" => std::fs::read_to_string(path)?.trim().to_string(),
        _ => parse_pdf(path)?,
    };

    debug!("Read {} chars from {}", text.len(), path.display());
    Ok(text)
}

fn parse_pdf(path: &Path) -> Result<String, AppError> {
    let bytes = std::fs::read(path)?;
    let raw = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        AppError::Validation(format!(
            "Could not extract text from {}: {e}",
            path.display()
        ))
    })?;
    Ok(join_pages(&raw))
}

/// Splits on form feeds, trims each page, drops empty ones, joins with a blank line.
fn join_pages(raw: &str) -> String {
    raw.split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
