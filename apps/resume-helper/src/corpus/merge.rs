//! Deterministic corpus merge: the exact-key safety net that runs after semantic
//! duplicate resolution, plus stable identifier assignment.
//!
//! Dedup key = (title, organization), each trimmed and lower-cased. A new record
//! whose key is already present in the corpus being built is skipped, never
//! merged. Existing records keep their position and their `id`.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::corpus::store::save_projects;
use crate::errors::AppError;
use crate::models::project::ProjectRecord;

const ID_PREFIX: &str = "proj_";

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Records actually appended.
    pub added: usize,
    /// Final corpus: existing records first, in their original order.
    pub projects: Vec<ProjectRecord>,
}

/// Merges `new_projects` into `existing` and rewrites the corpus at `path`.
pub fn merge_projects(
    existing: Vec<ProjectRecord>,
    new_projects: Vec<ProjectRecord>,
    path: &Path,
) -> Result<MergeOutcome, AppError> {
    let outcome = merge_into_corpus(existing, new_projects)?;
    save_projects(path, &outcome.projects)?;
    info!(
        "Added {} new project(s). Total: {}.",
        outcome.added,
        outcome.projects.len()
    );
    Ok(outcome)
}

/// In-memory half of [`merge_projects`].
pub fn merge_into_corpus(
    existing: Vec<ProjectRecord>,
    new_projects: Vec<ProjectRecord>,
) -> Result<MergeOutcome, AppError> {
    let mut keys: HashSet<(String, String)> = existing.iter().map(dedup_key).collect();
    let mut used_ids: HashSet<String> = existing.iter().map(|p| p.id.clone()).collect();
    let mut next = successor(max_id_suffix(existing.iter().map(|p| p.id.as_str())))?;

    let mut projects = existing;
    let mut added = 0;

    for mut record in new_projects {
        if !keys.insert(dedup_key(&record)) {
            debug!(
                "Skipping '{}' ({}): already in corpus",
                record.title, record.organization
            );
            continue;
        }

        let id = record.id.trim().to_string();
        if id.is_empty() || used_ids.contains(&id) {
            record.id = format_id(next);
            next = successor(next)?;
        } else {
            if let Some(n) = id_suffix(&id) {
                next = next.max(successor(n)?);
            }
            record.id = id;
        }
        used_ids.insert(record.id.clone());

        projects.push(record);
        added += 1;
    }

    Ok(MergeOutcome { added, projects })
}

/// Normalized `(title, organization)` pair.
pub fn dedup_key(record: &ProjectRecord) -> (String, String) {
    (
        record.title.trim().to_lowercase(),
        record.organization.trim().to_lowercase(),
    )
}

fn format_id(n: u64) -> String {
    format!("{ID_PREFIX}{n:03}")
}

fn max_id_suffix<'a>(ids: impl IntoIterator<Item = &'a str>) -> u64 {
    ids.into_iter().filter_map(id_suffix).max().unwrap_or(0)
}

/// Trailing digit run of an identifier, if any. A run too long for `u64`
/// saturates so it still counts as the maximum.
fn id_suffix(id: &str) -> Option<u64> {
    let digits = id.len() - id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    Some(id[id.len() - digits..].parse().unwrap_or(u64::MAX))
}

fn successor(n: u64) -> Result<u64, AppError> {
    n.checked_add(1).ok_or_else(|| {
        AppError::Validation(format!(
            "No project identifier left after suffix {n}; renumber the corpus ids"
        ))
    })
}
