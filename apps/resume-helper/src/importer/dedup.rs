//! Semantic duplicate resolution between freshly extracted records and the corpus.
//!
//! One comparison call per new record, sequentially, each carrying the whole
//! corpus as compact `{id, title, summary}` references. Payload therefore grows
//! with new × existing; there is no batching.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::importer::field_merge::{merge_fields, synthesize_text};
use crate::importer::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::LlmProvider;
use crate::models::project::{DuplicateMatch, ProjectRecord};

/// Outcome of [`resolve_duplicates`]. `truly_new` and the merged-away records are
/// disjoint; `updated_existing` has exactly as many entries as the input corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub truly_new: Vec<ProjectRecord>,
    pub updated_existing: Vec<ProjectRecord>,
    /// New records folded into an existing entry.
    pub merged: usize,
}

#[derive(Serialize)]
struct ExistingRef<'a> {
    id: &'a str,
    title: &'a str,
    summary: &'a str,
}

#[derive(Serialize)]
struct NewRef<'a> {
    title: &'a str,
    summary: &'a str,
}

/// Splits `new_projects` into records with no counterpart and an updated copy
/// of `existing` with confirmed duplicates merged in.
///
/// With an empty corpus, or with no model available (`llm == None`), every new
/// record is returned as new and no call is made; the exact-key pass in
/// `corpus::merge` still catches literal duplicates.
pub async fn resolve_duplicates(
    existing: Vec<ProjectRecord>,
    new_projects: Vec<ProjectRecord>,
    llm: Option<&dyn LlmProvider>,
) -> Result<Resolution, AppError> {
    let Some(llm) = llm.filter(|_| !existing.is_empty()) else {
        return Ok(Resolution {
            truly_new: new_projects,
            updated_existing: existing,
            merged: 0,
        });
    };

    info!(
        "Checking {} new project(s) for duplicates against {} existing",
        new_projects.len(),
        existing.len()
    );

    let refs: Vec<ExistingRef<'_>> = existing
        .iter()
        .map(|p| ExistingRef {
            id: &p.id,
            title: &p.title,
            summary: &p.summary,
        })
        .collect();
    let existing_json = to_pretty_json(&refs)?;

    // A duplicated id resolves to its first occurrence in the corpus.
    let mut index: HashMap<String, usize> = HashMap::with_capacity(existing.len());
    for (pos, project) in existing.iter().enumerate() {
        index.entry(project.id.clone()).or_insert(pos);
    }

    let mut updated = existing;
    let mut truly_new = Vec::new();
    let mut merged = 0;

    for candidate in new_projects {
        let new_json = to_pretty_json(&NewRef {
            title: &candidate.title,
            summary: &candidate.summary,
        })?;
        let user_prompt = fill_template(
            MATCH_PROMPT_TEMPLATE,
            &[("new_project", &new_json), ("existing_projects", &existing_json)],
        );

        let verdict = llm
            .complete_structured_one::<DuplicateMatch>(MATCH_SYSTEM, &user_prompt)
            .await?;

        let pos = match verdict.matched() {
            Some(id) => match index.get(id) {
                Some(&pos) => pos,
                None => {
                    debug!(
                        "Ignoring unknown matched_id '{id}' for '{}'",
                        candidate.title
                    );
                    truly_new.push(candidate);
                    continue;
                }
            },
            None => {
                debug!("No match for '{}': {}", candidate.title, verdict.reason);
                truly_new.push(candidate);
                continue;
            }
        };

        debug!(
            "'{}' matches {} ({}): {}",
            candidate.title, updated[pos].id, updated[pos].title, verdict.reason
        );
        let text = synthesize_text(&updated[pos], &candidate, llm).await?;
        updated[pos] = merge_fields(&updated[pos], &candidate, text);
        merged += 1;
    }

    if merged > 0 {
        info!("Merged {merged} duplicate(s) into existing records");
    }

    Ok(Resolution {
        truly_new,
        updated_existing: updated,
        merged,
    })
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize comparison payload: {e}")))
}
