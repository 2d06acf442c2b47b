//! Project record schema: the single source of truth for what a corpus entry,
//! a duplicate verdict, and a merge synthesis look like.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::llm_client::StructuredShape;

/// Job-family label used to filter the corpus for a given posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    DataScientist,
    MachineLearningEngineer,
    AnalyticsEngineer,
    AiEngineer,
    DataAnalyst,
    DataEngineer,
}

impl RoleTag {
    pub const ALL: [RoleTag; 6] = [
        RoleTag::DataScientist,
        RoleTag::MachineLearningEngineer,
        RoleTag::AnalyticsEngineer,
        RoleTag::AiEngineer,
        RoleTag::DataAnalyst,
        RoleTag::DataEngineer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::DataScientist => "data_scientist",
            RoleTag::MachineLearningEngineer => "machine_learning_engineer",
            RoleTag::AnalyticsEngineer => "analytics_engineer",
            RoleTag::AiEngineer => "ai_engineer",
            RoleTag::DataAnalyst => "data_analyst",
            RoleTag::DataEngineer => "data_engineer",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleTag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleTag::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| {
                let valid = RoleTag::ALL.map(|t| t.as_str()).join(", ");
                AppError::Validation(format!("Unknown role tag '{s}'. Valid tags: {valid}"))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dates {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// One discrete unit of work experience.
///
/// `summary`, `skills` and `impact` default to empty when absent so a thin
/// extraction still yields a storable record. `title` and `role_tags` never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub id: String,
    #[serde(deserialize_with = "non_empty_title")]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "non_empty_role_tags")]
    pub role_tags: Vec<RoleTag>,
    #[serde(default)]
    pub impact: Vec<String>,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Dates>,
    #[serde(default)]
    pub description_long: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub include_by_default: bool,
    #[serde(default)]
    pub notes: String,
}

fn non_empty_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let title = String::deserialize(deserializer)?;
    if title.trim().is_empty() {
        return Err(serde::de::Error::custom("title must be non-empty"));
    }
    Ok(title)
}

fn non_empty_role_tags<'de, D>(deserializer: D) -> Result<Vec<RoleTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = Vec::<RoleTag>::deserialize(deserializer)?;
    if tags.is_empty() {
        return Err(serde::de::Error::custom("role_tags must be non-empty"));
    }
    Ok(tags)
}

impl ProjectRecord {
    /// Builds a record with the required fields; everything optional starts empty.
    #[cfg(test)]
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        role_tags: Vec<RoleTag>,
    ) -> Result<Self, AppError> {
        let record = Self {
            id: String::new(),
            title: title.into(),
            summary: summary.into(),
            skills: Vec::new(),
            role_tags,
            impact: Vec::new(),
            organization: String::new(),
            role: String::new(),
            dates: None,
            description_long: String::new(),
            keywords: Vec::new(),
            include_by_default: false,
            notes: String::new(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the invariants serde cannot see on a record built in code.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must be non-empty".to_string()));
        }
        if self.role_tags.is_empty() {
            return Err(AppError::Validation(format!(
                "role_tags must be non-empty (project '{}')",
                self.title
            )));
        }
        Ok(())
    }

    pub fn has_role_tag(&self, tag: RoleTag) -> bool {
        self.role_tags.contains(&tag)
    }
}

impl StructuredShape for ProjectRecord {
    const NAME: &'static str = "ProjectRecord";

    fn json_schema() -> Value {
        let tags: Vec<&str> = RoleTag::ALL.iter().map(|t| t.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "summary": { "type": "string" },
                "skills": { "type": "array", "items": { "type": "string" } },
                "role_tags": {
                    "type": "array",
                    "items": { "type": "string", "enum": tags }
                },
                "impact": { "type": "array", "items": { "type": "string" } },
                "organization": { "type": "string" },
                "role": { "type": "string" },
                "dates": {
                    "type": "object",
                    "properties": {
                        "start": { "type": "string" },
                        "end": { "type": "string" }
                    }
                },
                "description_long": { "type": "string" },
                "keywords": { "type": "array", "items": { "type": "string" } },
                "notes": { "type": "string" }
            },
            "required": ["title", "summary", "skills", "role_tags", "impact"]
        })
    }
}

/// On-disk corpus document: `{ "projects": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectsFile {
    pub projects: Vec<ProjectRecord>,
}

/// Verdict of one duplicate comparison. An empty `matched_id` means no match.
/// `reason` is diagnostic only and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub matched_id: String,
    #[serde(default)]
    pub reason: String,
}

impl DuplicateMatch {
    pub fn matched(&self) -> Option<&str> {
        let id = self.matched_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

impl StructuredShape for DuplicateMatch {
    const NAME: &'static str = "DuplicateMatch";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "matched_id": {
                    "type": "string",
                    "description": "id of the matching existing project, or empty string"
                },
                "reason": { "type": "string" }
            },
            "required": ["matched_id", "reason"]
        })
    }
}

/// Consolidated free text for a confirmed duplicate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedProjectText {
    pub summary: String,
    pub description_long: String,
}

impl StructuredShape for MergedProjectText {
    const NAME: &'static str = "MergedProjectText";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string" },
                "description_long": { "type": "string" }
            },
            "required": ["summary", "description_long"]
        })
    }
}
