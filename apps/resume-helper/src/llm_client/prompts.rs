// Shared prompt fragments. Each pipeline keeps its own prompts.rs alongside it;
// only cross-cutting instructions live here.

use crate::models::project::RoleTag;

/// Appended to every prompt that writes or rewrites candidate content.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Never invent facts, credentials, employers, dates, or metrics. \
    Use only information present in the inputs. \
    If the inputs do not support a detail, leave it out.";

/// Comma-separated list of every valid role tag, for embedding in prompts.
pub fn role_tag_list() -> String {
    RoleTag::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Substitutes `{name}` placeholders in one left-to-right pass. Inserted values
/// are never scanned again, so user text containing `{...}` is kept verbatim.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match vars.iter().find(|(key, _)| placeholder_at(tail, key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholder_at(tail: &str, key: &str) -> bool {
    tail.strip_prefix('{')
        .and_then(|t| t.strip_prefix(key))
        .is_some_and(|t| t.starts_with('}'))
}
