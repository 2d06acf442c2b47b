use tracing::{debug, info};

use crate::errors::AppError;
use crate::importer::prompts::extraction_system_prompt;
use crate::llm_client::LlmProvider;
use crate::models::project::ProjectRecord;

/// Turns resume text into candidate project records.
///
/// A reply that does not deserialize into valid records fails the whole run
/// with `MalformedModelOutput`. Identifiers are cleared: only the corpus merge
/// assigns them.
pub async fn extract_projects(
    resume_text: &str,
    llm: &dyn LlmProvider,
) -> Result<Vec<ProjectRecord>, AppError> {
    info!("Extracting projects via {}", llm.model_name());

    let mut records = llm
        .complete_structured::<ProjectRecord>(&extraction_system_prompt(), resume_text)
        .await?;

    for record in &mut records {
        record.validate()?;
        record.id.clear();
    }

    debug!("Extraction returned {} record(s)", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::ScriptedProvider;
    use crate::models::project::RoleTag;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_returns_validated_records() {
        let llm = ScriptedProvider::new().with_json(
            "ProjectRecord",
            json!({"items": [
                {"id": "x1", "title": "Churn Model", "summary": "Predicted churn.",
                 "skills": ["Python"], "role_tags": ["data_scientist"],
                 "impact": ["Cut churn 12%"], "organization": "Acme"},
                {"title": "ETL Rewrite", "role_tags": ["data_engineer", "analytics_engineer"]}
            ]}),
        );

        let records = extract_projects("resume text", &llm).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Churn Model");
        assert_eq!(records[0].id, "");
        assert_eq!(records[1].role_tags, vec![RoleTag::DataEngineer, RoleTag::AnalyticsEngineer]);
        assert!(records[1].impact.is_empty());

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user, "resume text");
        assert!(calls[0].system.contains("data_engineer"));
    }

    #[tokio::test]
    async fn test_extract_empty_list_is_ok() {
        let llm = ScriptedProvider::new().with_json("ProjectRecord", json!({"items": []}));
        assert!(extract_projects("nothing here", &llm).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extract_invalid_role_tag_is_malformed() {
        let llm = ScriptedProvider::new().with_json(
            "ProjectRecord",
            json!({"items": [{"title": "A", "role_tags": ["astronaut"]}]}),
        );
        let err = extract_projects("resume", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_extract_empty_role_tags_is_malformed() {
        let llm = ScriptedProvider::new().with_json(
            "ProjectRecord",
            json!({"items": [{"title": "A", "summary": "s", "role_tags": []}]}),
        );
        let err = extract_projects("resume", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedModelOutput(_)));
    }
}
