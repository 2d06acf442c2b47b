use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::llm_client::Provider;

#[derive(Parser)]
#[command(name = "resume-helper", version)]
#[command(about = "Tailor a resume to a job posting and maintain a projects database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Profile name (default: RESUME_HELPER_USER, then jayne_dough)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// LLM provider (default: RESUME_HELPER_PROVIDER, then gemini)
    #[arg(long, value_enum, global = true)]
    pub provider: Option<Provider>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a tailored resume for one job posting
    Tailor {
        /// Job posting URL or raw text; `-` or omitted reads stdin
        #[arg(long)]
        job: Option<String>,

        /// Base resume (PDF, .txt or .md; default: profile resume)
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Projects database (default: profile projects.json)
        #[arg(long)]
        projects: Option<PathBuf>,

        /// Only use projects with this role tag (e.g. data_scientist)
        #[arg(long)]
        role: Option<String>,

        /// Markdown output path (auto-named if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pandoc reference .docx (default: RESUME_HELPER_TEMPLATE)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Skip DOCX conversion
        #[arg(long)]
        no_docx: bool,
    },

    /// Extract projects from a resume and merge them into projects.json
    ImportProjects {
        /// Resume to import (default: profile resume)
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Projects database (default: profile projects.json)
        #[arg(long)]
        projects: Option<PathBuf>,
    },

    /// List user profiles
    ListUsers,

    /// Create a new user profile
    InitUser {
        /// Profile name
        name: String,
    },

    /// Convert a markdown resume to DOCX with pandoc
    Convert {
        /// Markdown input
        input: PathBuf,

        /// DOCX output
        output: PathBuf,

        /// Pandoc reference .docx (default: RESUME_HELPER_TEMPLATE)
        #[arg(long)]
        template: Option<PathBuf>,
    },
}
