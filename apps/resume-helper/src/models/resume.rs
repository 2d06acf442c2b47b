use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Section headings every tailored resume body must contain.
pub const REQUIRED_SECTIONS: [&str; 2] = ["Work Experience", "Project Experience"];

/// A generated resume split into the persisted body and the stripped rationale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeOutput {
    pub resume_markdown: String,
    pub selection_notes: String,
}

impl ResumeOutput {
    /// Required section markers absent from the body, in declaration order.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        REQUIRED_SECTIONS
            .into_iter()
            .filter(|marker| !self.resume_markdown.contains(marker))
            .collect()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let missing = self.missing_sections();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "resume_markdown is missing required sections: {}",
                missing.join(", ")
            )))
        }
    }
}
