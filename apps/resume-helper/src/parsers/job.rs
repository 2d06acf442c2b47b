//! Job posting input: a URL to fetch and strip down to readable text, or raw text.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::errors::AppError;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const FETCH_TIMEOUT_SECS: u64 = 15;

/// Elements whose text never belongs to the posting.
const STRIP_TAGS: [&str; 7] = ["script", "style", "noscript", "header", "footer", "nav", "aside"];

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://").expect("static regex"))
}

fn container_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)job|content|description").expect("static regex"))
}

/// Raw `--job` value: `None` or `-` reads stdin, anything else is returned as
/// given. The result still goes through [`parse_job_input`].
pub async fn read_job_arg(arg: Option<&str>) -> Result<String, AppError> {
    match arg {
        None | Some("-") => {
            debug!("Reading job posting from stdin");
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            Ok(buf)
        }
        Some(input) => Ok(input.to_string()),
    }
}

/// Plain text of a job posting given either its URL or the text itself.
pub async fn parse_job_input(input: &str) -> Result<String, AppError> {
    if is_url(input) {
        fetch_job_posting(input.trim()).await
    } else {
        Ok(input.trim().to_string())
    }
}

pub fn is_url(text: &str) -> bool {
    url_pattern().is_match(text.trim())
}

async fn fetch_job_posting(url: &str) -> Result<String, AppError> {
    info!("Fetching job posting: {url}");

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")?;

    let html = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to fetch job posting {url}"))?
        .text()
        .await
        .context("Failed to read job posting body")?;

    let text = extract_job_text(&html);
    if text.is_empty() {
        warn!("No readable text found at {url}");
    }
    Ok(text)
}

/// Readable text of a posting page. Prefers `<main>`, then an element whose id
/// or class mentions job/content/description, then `<body>`. Script-rendered
/// pages with an empty container fall back to `<meta name="description">`.
pub fn extract_job_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let Some(container) = find_container(&document) else {
        return meta_description(&document);
    };

    let text = collapse_whitespace(&visible_text(container));
    if text.is_empty() {
        debug!("Empty content container; using meta description");
        return meta_description(&document);
    }
    text
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn is_stripped(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .chain(std::iter::once(**element))
        .filter_map(|node| node.value().as_element())
        .any(|e| STRIP_TAGS.contains(&e.name()))
}

fn find_container(document: &Html) -> Option<ElementRef<'_>> {
    let pattern = container_pattern();

    select_all(document, "main")
        .into_iter()
        .find(|e| !is_stripped(e))
        .or_else(|| {
            select_all(document, "[id]").into_iter().find(|e| {
                !is_stripped(e) && e.value().id().is_some_and(|id| pattern.is_match(id))
            })
        })
        .or_else(|| {
            select_all(document, "[class]").into_iter().find(|e| {
                !is_stripped(e) && e.value().classes().any(|c| pattern.is_match(c))
            })
        })
        .or_else(|| select_first(document, "body"))
}

/// Text nodes under `container`, one per line, skipping stripped subtrees.
fn visible_text(container: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in container.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| STRIP_TAGS.contains(&e.name()));
        if !hidden {
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}

/// Trims every line and collapses runs of blank lines into one.
fn collapse_whitespace(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_blank = false;
    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !prev_blank {
                lines.push("");
            }
            prev_blank = true;
        } else {
            lines.push(line);
            prev_blank = false;
        }
    }
    lines.join("\n").trim().to_string()
}

fn meta_description(document: &Html) -> String {
    select_first(document, r#"meta[name="description"]"#)
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}
