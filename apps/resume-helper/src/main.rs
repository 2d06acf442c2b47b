mod cli;
mod config;
mod corpus;
mod errors;
mod generation;
mod importer;
mod llm_client;
mod models;
mod parsers;
mod profiles;
mod render;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::errors::AppError;
use crate::generation::builder::{build_resume, TailorRequest};
use crate::importer::ingest::{run_import, ImportRequest};
use crate::llm_client::{build_provider, LlmProvider};
use crate::models::project::RoleTag;
use crate::parsers::job::read_job_arg;
use crate::profiles::InitOutcome;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (.env, then process environment)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize structured logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("resume_helper=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("resume_helper={}", config.rust_log)))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), "{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    let provider = cli.provider.unwrap_or(config.provider);

    match cli.command {
        Commands::Tailor {
            job,
            resume,
            projects,
            role,
            output,
            template,
            no_docx,
        } => {
            let role = role.as_deref().map(str::parse::<RoleTag>).transpose()?;
            let paths = config.user_paths(cli.user.as_deref());
            let llm = connect(provider, &config)?;

            let request = TailorRequest {
                job: read_job_arg(job.as_deref()).await?,
                resume,
                projects,
                role,
                output,
                template: template.or_else(|| default_template(&config)),
                docx: !no_docx,
            };
            let outcome = build_resume(&request, &paths, llm.as_ref()).await?;
            info!(
                company = outcome.metadata.company.as_deref().unwrap_or("-"),
                role = outcome.metadata.role.as_deref().unwrap_or("-"),
                projects = outcome.projects_used,
                missing_sections = outcome.missing_sections.len(),
                "Tailored resume ready"
            );

            println!("{}", outcome.markdown_path.display());
            if let Some(docx) = outcome.docx_path {
                println!("{}", docx.display());
            }
        }

        Commands::ImportProjects { resume, projects } => {
            let paths = config.user_paths(cli.user.as_deref());
            let llm = connect(provider, &config)?;

            let summary = run_import(&ImportRequest { resume, projects }, &paths, llm.as_ref()).await?;
            println!(
                "Extracted {}, merged {} duplicate(s), added {}. Total: {} ({})",
                summary.extracted,
                summary.merged_duplicates,
                summary.added,
                summary.total,
                summary.projects_path.display()
            );
            if !summary.gaps.is_empty() {
                println!("Possibly missing from the database:");
                for gap in &summary.gaps {
                    println!("  - {gap}");
                }
            }
        }

        Commands::ListUsers => {
            println!("{}", profiles::list_users(&config)?);
        }

        Commands::InitUser { name } => match profiles::init_user(&config, &name)? {
            InitOutcome::Created(paths) => {
                println!("Created user profile '{}'", paths.user);
                println!("Drop your resume PDF at: {}", paths.resume.display());
            }
            InitOutcome::AlreadyExists(root) => {
                println!("User profile '{}' already exists at {}", name.trim(), root.display());
            }
        },

        Commands::Convert {
            input,
            output,
            template,
        } => {
            let template = template.or_else(|| default_template(&config));
            render::convert_to_docx(&input, &output, template.as_deref()).await?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

fn connect(
    provider: llm_client::Provider,
    config: &Config,
) -> Result<Box<dyn LlmProvider>, AppError> {
    let llm = build_provider(provider, config)?;
    info!("Using {} ({})", provider.as_str(), llm.model_name());
    Ok(llm)
}

/// The configured reference doc, only when it exists.
fn default_template(config: &Config) -> Option<std::path::PathBuf> {
    config
        .reference_docx
        .is_file()
        .then(|| config.reference_docx.clone())
}
