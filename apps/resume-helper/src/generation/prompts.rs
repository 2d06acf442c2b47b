// Tailoring prompt constants and the deterministic prompt builder.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::models::project::ProjectRecord;

/// System prompt for resume tailoring. Replace `{no_invention}` before sending
/// (see [`system_prompt`]).
const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are an expert resume writer with deep experience tailoring resumes to specific job postings.

Rules you must follow without exception:
- Begin your response with exactly two metadata lines, then a blank line:
  COMPANY: <hiring company name from the job posting>
  ROLE: <job title from the job posting>
- Output well-structured markdown. Use # for the candidate name, ## for section headers,
  ### for job/project titles, **bold** for company names and dates, and - for bullet points.
- The resume must contain a \"## Work Experience\" section and a \"## Project Experience\" section.
- {no_invention}
- Select the 3 to 5 most relevant projects from the candidate projects provided.
- Preserve every non-project section from the base resume exactly (contact info, education,
  skills, certifications, etc.). Only the experience and projects sections should be tailored.
- End your response with a SELECTION NOTES section explaining which projects you chose,
  which you excluded, and why.

Output format:
COMPANY: <company>
ROLE: <role>

[Full markdown resume]

## SELECTION NOTES
[Your explanation of project selection and tailoring decisions]";

const NO_BASE_RESUME: &str = "\
BASE RESUME
-----------
No base resume provided. Build the full resume from the candidate projects below,
following a standard chronological format.";

const INSTRUCTIONS: &str = "\
INSTRUCTIONS
------------
1. Keep all non-project sections from the base resume unchanged.
2. Select the 3 to 5 projects that best match the job posting.
3. Rewrite the project bullets to emphasize skills and impact relevant to this role.
4. Do not add any experience, skills, or credentials not present in the inputs.
5. After the resume, append a SELECTION NOTES section explaining your choices.";

pub fn system_prompt() -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{no_invention}", NO_INVENTION_INSTRUCTION)
}

/// Assembles `(system, user)`. Section order is fixed: base resume (or the
/// fallback instruction), job posting, candidate projects, instructions.
pub fn build_prompt(
    base_resume: Option<&str>,
    job_text: &str,
    projects: &[ProjectRecord],
) -> (String, String) {
    let mut sections = Vec::with_capacity(4);

    match base_resume.map(str::trim).filter(|r| !r.is_empty()) {
        Some(resume) => sections.push(section("BASE RESUME", resume)),
        None => sections.push(NO_BASE_RESUME.to_string()),
    }

    sections.push(section("JOB POSTING", job_text));

    let blocks = projects
        .iter()
        .map(format_project)
        .collect::<Vec<_>>()
        .join("\n\n");
    sections.push(section("CANDIDATE PROJECTS", &blocks));

    sections.push(INSTRUCTIONS.to_string());

    let user_prompt = format!("\n\n{}\n", sections.join("\n\n"));
    (system_prompt(), user_prompt)
}

fn section(title: &str, content: &str) -> String {
    format!("{title}\n{}\n{}", "-".repeat(title.len()), content.trim())
}

/// One labeled line per populated field; absent fields are left out entirely.
pub fn format_project(project: &ProjectRecord) -> String {
    let mut lines = vec![format!("Project: {}", project.title)];

    if !project.organization.is_empty() {
        lines.push(format!("Organization: {}", project.organization));
    }
    if let Some(dates) = &project.dates {
        if !dates.start.is_empty() {
            let end = if dates.end.is_empty() { "present" } else { dates.end.as_str() };
            lines.push(format!("Dates: {} to {end}", dates.start));
        }
    }
    if !project.role.is_empty() {
        lines.push(format!("Role: {}", project.role));
    }
    if !project.summary.is_empty() {
        lines.push(format!("Summary: {}", project.summary));
    }
    if !project.description_long.is_empty() {
        lines.push(format!("Details: {}", project.description_long));
    }
    if !project.skills.is_empty() {
        lines.push(format!("Skills: {}", project.skills.join(", ")));
    }
    if !project.impact.is_empty() {
        lines.push("Impact:".to_string());
        lines.extend(project.impact.iter().map(|item| format!("  - {item}")));
    }
    if !project.keywords.is_empty() {
        lines.push(format!("Keywords: {}", project.keywords.join(", ")));
    }
    if !project.notes.is_empty() {
        lines.push(format!("Notes: {}", project.notes));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{Dates, RoleTag};

    fn project() -> ProjectRecord {
        ProjectRecord::new("Churn Model", "Predicted churn.", vec![RoleTag::DataScientist]).unwrap()
    }

    #[test]
    fn test_format_project_omits_absent_fields() {
        assert_eq!(
            format_project(&project()),
            "Project: Churn Model\nSummary: Predicted churn."
        );
    }

    #[test]
    fn test_format_project_renders_every_present_field() {
        let mut p = project();
        p.organization = "Acme".to_string();
        p.dates = Some(Dates {
            start: "2022-01".to_string(),
            end: String::new(),
        });
        p.role = "Data Scientist".to_string();
        p.skills = vec!["Python".to_string(), "SQL".to_string()];
        p.impact = vec!["Cut churn 12%".to_string()];
        p.keywords = vec!["retention".to_string()];
        p.notes = "Led a team of 3".to_string();

        let text = format_project(&p);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Project: Churn Model",
                "Organization: Acme",
                "Dates: 2022-01 to present",
                "Role: Data Scientist",
                "Summary: Predicted churn.",
                "Skills: Python, SQL",
                "Impact:",
                "  - Cut churn 12%",
                "Keywords: retention",
                "Notes: Led a team of 3",
            ]
        );
    }

    #[test]
    fn test_dates_without_start_are_omitted() {
        let mut p = project();
        p.dates = Some(Dates {
            start: String::new(),
            end: "2023-01".to_string(),
        });
        assert!(!format_project(&p).contains("Dates"));
    }

    #[test]
    fn test_build_prompt_section_order() {
        let (system, user) = build_prompt(Some("My resume"), "  The job  ", &[project()]);
        assert!(system.contains("COMPANY:"));
        assert!(system.contains("## SELECTION NOTES"));
        assert!(!system.contains("{no_invention}"));

        let resume = user.find("BASE RESUME\n-----------\nMy resume").unwrap();
        let job = user.find("JOB POSTING\n-----------\nThe job").unwrap();
        let projects = user.find("CANDIDATE PROJECTS").unwrap();
        let instructions = user.find("INSTRUCTIONS").unwrap();
        assert!(resume < job && job < projects && projects < instructions);
        assert!(user.starts_with("\n\n"));
        assert!(user.ends_with("explaining your choices.\n"));
    }

    #[test]
    fn test_build_prompt_without_base_resume_uses_fallback() {
        let (_, user) = build_prompt(None, "job", &[]);
        assert!(user.contains("No base resume provided."));
        let (_, blank) = build_prompt(Some("   "), "job", &[]);
        assert!(blank.contains("No base resume provided."));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let projects = vec![project(), project()];
        assert_eq!(
            build_prompt(Some("r"), "j", &projects),
            build_prompt(Some("r"), "j", &projects)
        );
    }
}
