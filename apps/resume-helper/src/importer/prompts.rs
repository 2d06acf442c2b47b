// Project import LLM prompt templates.
// All prompts for the importer module are defined here.

use crate::llm_client::prompts::{role_tag_list, NO_INVENTION_INSTRUCTION};

/// Extraction prompt template. Replace `{role_tags}` and `{no_invention}` before sending
/// (see [`extraction_system_prompt`]).
const EXTRACTION_SYSTEM_TEMPLATE: &str = r#"You are a resume parser. Your job is to extract every distinct work experience and project from the resume text provided.

Each record must include:
  Required:
    - "title": short descriptive name for the project or role (e.g. "Churn Prediction Model")
    - "summary": 1-2 sentence summary of the work
    - "skills": tech stack and tools used
    - "role_tags": one or more tags from this exact list:
        {role_tags}
      Assign all tags that apply. Every record must have at least one.
    - "impact": measurable outcomes or achievements (use exact numbers from the resume)

  Optional (include if inferable from the resume):
    - "organization": employer or client name
    - "role": the candidate's job title for this work
    - "dates": object with "start" and "end" (YYYY-MM, e.g. "2022-06")
    - "description_long": full context paragraph to draw tailored bullets from
    - "keywords": domain keywords useful for resume matching
    - "notes": any other context worth preserving

Rules:
- {no_invention}
- One record per distinct project or job. If a job had multiple projects, create one record per project.
- "impact" entries must be concrete. Skip vague statements like "improved performance"."#;

pub fn extraction_system_prompt() -> String {
    EXTRACTION_SYSTEM_TEMPLATE
        .replace("{role_tags}", &role_tag_list())
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
}

pub const MATCH_SYSTEM: &str = "\
You are a deduplication assistant for a projects database. Given a new project and a list of \
existing projects (each with an id, title, and summary), determine whether the new project \
describes the same real-world work as any existing project.

Two projects are the same if they refer to the same initiative, system, or body of work, \
even if the title is worded differently, the organization differs, or the description \
emphasises different aspects.

Return:
  - matched_id: the id of the matching existing project, or an empty string if there is no match
  - reason: a brief explanation of your decision";

/// Comparison request template. Replace `{new_project}` and `{existing_projects}`.
pub const MATCH_PROMPT_TEMPLATE: &str = "New project:
{new_project}

Existing projects:
{existing_projects}";

pub const MERGE_SYSTEM: &str = "\
You are merging two descriptions of the same project into a single, richer record. \
Given the existing summary and description, and a new summary and description for the same \
project, write a consolidated version that captures the best detail from both without \
inventing new facts.

Return:
  - summary: a 1-2 sentence summary (concise, clear)
  - description_long: a comprehensive paragraph combining the strongest details from both versions";

/// Merge request template. Replace `{existing_summary}`, `{existing_description}`,
/// `{new_summary}`, `{new_description}`.
pub const MERGE_PROMPT_TEMPLATE: &str = "Existing summary: {existing_summary}
Existing description: {existing_description}

New summary: {new_summary}
New description: {new_description}";

pub const COVERAGE_SYSTEM: &str = "\
You are a resume coverage auditor.

You will be given:
1. A resume (full text)
2. A list of projects already captured in a database (title and organization)

Your task: identify any distinct work experience or project in the resume that does NOT \
appear to be represented in the database list. Consider semantic similarity: the same \
work may be described with slightly different wording or project names.

Output rules:
- If all experience is represented, output exactly: NONE
- Otherwise, output a plain-text bullet list of gaps, one per line, starting with \"- \".
  Each bullet should name the role/project and employer as they appear in the resume.
- No prose introduction or conclusion. Bullets or NONE only.";

/// Coverage request template. Replace `{resume_text}` and `{db_summary}`.
pub const COVERAGE_PROMPT_TEMPLATE: &str = "RESUME
------
{resume_text}

DATABASE PROJECTS
-----------------
{db_summary}";
