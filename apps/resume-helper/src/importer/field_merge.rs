//! Combines a confirmed duplicate pair into one record.
//!
//! Free text (`summary`, `description_long`) is rewritten by one model call.
//! List fields are an ordered union, so merging the same values again is a no-op.

use crate::errors::AppError;
use crate::importer::prompts::{MERGE_PROMPT_TEMPLATE, MERGE_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::LlmProvider;
use crate::models::project::{MergedProjectText, ProjectRecord};

/// Asks the model for a consolidated summary and long description.
pub async fn synthesize_text(
    existing: &ProjectRecord,
    new_record: &ProjectRecord,
    llm: &dyn LlmProvider,
) -> Result<MergedProjectText, AppError> {
    let user_prompt = fill_template(
        MERGE_PROMPT_TEMPLATE,
        &[
            ("existing_summary", &existing.summary),
            ("existing_description", &existing.description_long),
            ("new_summary", &new_record.summary),
            ("new_description", &new_record.description_long),
        ],
    );

    Ok(llm
        .complete_structured_one::<MergedProjectText>(MERGE_SYSTEM, &user_prompt)
        .await?)
}

/// Returns a copy of `existing` with `new_record` folded in. `id`, `title`,
/// `organization` and every other scalar field keep the existing value.
pub fn merge_fields(
    existing: &ProjectRecord,
    new_record: &ProjectRecord,
    text: MergedProjectText,
) -> ProjectRecord {
    let mut merged = existing.clone();
    merged.summary = text.summary;
    merged.description_long = text.description_long;
    merged.skills = ordered_union(&existing.skills, &new_record.skills);
    merged.keywords = ordered_union(&existing.keywords, &new_record.keywords);
    merged.impact = ordered_union(&existing.impact, &new_record.impact);
    merged.role_tags = ordered_union(&existing.role_tags, &new_record.role_tags);
    merged.notes = merge_notes(&existing.notes, &new_record.notes);
    merged
}

/// Existing values first in their order, then unseen new values. Exact
/// equality, no normalization; repeated values already in `existing` collapse too.
pub fn ordered_union<T: Clone + PartialEq>(existing: &[T], new_values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(existing.len() + new_values.len());
    for value in existing.iter().chain(new_values) {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

pub fn merge_notes(existing: &str, new_notes: &str) -> String {
    if new_notes.is_empty() {
        return existing.to_string();
    }
    if existing.is_empty() {
        return new_notes.to_string();
    }
    format!("{existing}\n{new_notes}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::ScriptedProvider;
    use crate::models::project::RoleTag;
    use serde_json::json;

    fn text(summary: &str, description: &str) -> MergedProjectText {
        MergedProjectText {
            summary: summary.to_string(),
            description_long: description.to_string(),
        }
    }

    #[test]
    fn test_ordered_union_keeps_existing_order_then_new() {
        let merged = ordered_union(
            &["Python".to_string(), "Spark".to_string()],
            &["SQL".to_string(), "Python".to_string()],
        );
        assert_eq!(merged, vec!["Python", "Spark", "SQL"]);
    }

    #[test]
    fn test_ordered_union_is_idempotent() {
        let existing = vec!["a".to_string()];
        let new_values = vec!["b".to_string()];
        let once = ordered_union(&existing, &new_values);
        let twice = ordered_union(&once, &new_values);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ordered_union_is_case_sensitive() {
        let merged = ordered_union(&["sql".to_string()], &["SQL".to_string()]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_notes() {
        assert_eq!(merge_notes("", ""), "");
        assert_eq!(merge_notes("old", ""), "old");
        assert_eq!(merge_notes("", "new"), "new");
        assert_eq!(merge_notes("old", "new"), "old\nnew");
        // no dedup of note content
        assert_eq!(merge_notes("same", "same"), "same\nsame");
    }

    #[test]
    fn test_merge_fields_preserves_identity() {
        let mut existing =
            ProjectRecord::new("Old Project", "old", vec![RoleTag::DataScientist]).unwrap();
        existing.id = "proj_001".to_string();
        existing.organization = "Acme".to_string();
        existing.skills = vec!["Python".to_string()];
        existing.impact = vec!["10% improvement".to_string()];

        let mut new_record = ProjectRecord::new(
            "Old Project v2",
            "new",
            vec![RoleTag::DataScientist, RoleTag::DataAnalyst],
        )
        .unwrap();
        new_record.skills = vec!["Python".to_string(), "SQL".to_string()];
        new_record.impact = vec!["10% improvement".to_string(), "saved $1M".to_string()];

        let merged = merge_fields(&existing, &new_record, text("Merged.", "Long merged."));
        assert_eq!(merged.id, "proj_001");
        assert_eq!(merged.title, "Old Project");
        assert_eq!(merged.organization, "Acme");
        assert_eq!(merged.summary, "Merged.");
        assert_eq!(merged.description_long, "Long merged.");
        assert_eq!(merged.skills, vec!["Python", "SQL"]);
        assert_eq!(merged.impact, vec!["10% improvement", "saved $1M"]);
        assert_eq!(
            merged.role_tags,
            vec![RoleTag::DataScientist, RoleTag::DataAnalyst]
        );
        // the input is untouched
        assert_eq!(existing.skills, vec!["Python"]);
    }

    #[tokio::test]
    async fn test_synthesize_text_sends_both_versions() {
        let llm = ScriptedProvider::new().with_json(
            "MergedProjectText",
            json!({"summary": "S", "description_long": "D"}),
        );
        let mut existing = ProjectRecord::new("A", "old summary", vec![RoleTag::AiEngineer]).unwrap();
        existing.description_long = "old details".to_string();
        let new_record = ProjectRecord::new("A2", "new summary", vec![RoleTag::AiEngineer]).unwrap();

        let merged = synthesize_text(&existing, &new_record, &llm).await.unwrap();
        assert_eq!(merged, text("S", "D"));

        let call = &llm.calls()[0];
        assert!(call.user.contains("Existing summary: old summary"));
        assert!(call.user.contains("Existing description: old details"));
        assert!(call.user.contains("New summary: new summary"));
        assert!(call.user.ends_with("New description: "));
    }

    #[tokio::test]
    async fn test_summary_with_braces_is_not_substituted() {
        let llm = ScriptedProvider::new().with_json(
            "MergedProjectText",
            json!({"summary": "S", "description_long": "D"}),
        );
        let existing =
            ProjectRecord::new("A", "Rendered {new_summary} fields", vec![RoleTag::AiEngineer]).unwrap();
        let new_record = ProjectRecord::new("A", "fresh", vec![RoleTag::AiEngineer]).unwrap();

        synthesize_text(&existing, &new_record, &llm).await.unwrap();

        let call = &llm.calls()[0];
        assert!(call.user.contains("Existing summary: Rendered {new_summary} fields"));
        assert!(call.user.contains("New summary: fresh"));
    }

    #[tokio::test]
    async fn test_synthesize_text_malformed_reply() {
        let llm = ScriptedProvider::new().with_json("MergedProjectText", json!({"summary": "S"}));
        let existing = ProjectRecord::new("A", "s", vec![RoleTag::AiEngineer]).unwrap();
        let err = synthesize_text(&existing, &existing, &llm).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedModelOutput(_)));
    }
}
