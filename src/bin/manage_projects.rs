use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use folio::db::Database;
use folio::environment::Settings;
use folio::project::{self, parse_submission, validate_submission, SubmissionResponse};
use prettytable::{Cell, Row as PrettyRow, Table};
use std::path::PathBuf;
use tokio::main;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project, or update one when --id is given, from a JSON submission
    Submit {
        /// Path to a JSON file holding the flat submission record
        #[arg(short, long)]
        file: PathBuf,

        /// Existing project to overwrite
        #[arg(short, long)]
        id: Option<i64>,
    },

    /// Show one project with its technologies and tags
    Show {
        /// Project slug
        #[arg(short, long)]
        slug: String,
    },

    /// List all projects
    List,

    /// Print every known technology and tag name
    Labels,

    /// Delete a project by id
    Delete {
        #[arg(short, long)]
        id: i64,
    },

    /// Display row counts
    Stats,
}

#[main]
async fn main() -> Result<()> {
    folio::logging::configure_logging();

    let cli = Cli::parse();

    let settings = Settings::from_env();
    let db = Database::new(&settings)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Submit { file, id } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let checked = parse_submission(raw.as_bytes())
                .and_then(|submission| validate_submission(&submission).map(|()| submission));

            let response = match checked {
                Ok(submission) => project::submit(&db, id, &submission).await,
                Err(err) => SubmissionResponse::failed(&err),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);

            if !response.success {
                return Err(anyhow!(response.message));
            }
        }

        Commands::Show { slug } => {
            let project = db
                .get_project_by_slug(&slug)
                .await?
                .ok_or_else(|| anyhow!("No project with slug '{}'", slug))?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }

        Commands::List => {
            let projects = db.list_projects().await?;

            let mut table = Table::new();
            table.add_row(PrettyRow::new(vec![
                Cell::new("ID"),
                Cell::new("Name"),
                Cell::new("Slug"),
                Cell::new("Status"),
                Cell::new("Started"),
                Cell::new("Technologies"),
                Cell::new("Tags"),
            ]));

            for project in &projects {
                let names = |entities: &[folio::taxonomy::TaxonomyEntity]| {
                    entities
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                let started = project
                    .dev_phase
                    .start_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());

                table.add_row(PrettyRow::new(vec![
                    Cell::new(&project.id.to_string()),
                    Cell::new(&project.name),
                    Cell::new(&project.slug),
                    Cell::new(project.dev_phase.status.as_str()),
                    Cell::new(&started),
                    Cell::new(&names(&project.technologies)),
                    Cell::new(&names(&project.tags)),
                ]));
            }

            table.printstd();
            println!("{} projects", projects.len());
        }

        Commands::Labels => {
            let labels = db.available_labels().await?;
            println!("Technologies ({}):", labels.technologies.len());
            for name in &labels.technologies {
                println!("  {}", name);
            }
            println!("Tags ({}):", labels.tags.len());
            for name in &labels.tags {
                println!("  {}", name);
            }
        }

        Commands::Delete { id } => {
            if db.delete_project(id).await? {
                info!("Deleted project {}", id);
                println!("Deleted project {}", id);
            } else {
                return Err(anyhow!("Project {} not found", id));
            }
        }

        Commands::Stats => {
            let stats = db.collect_stats().await?;
            let counts: Vec<&str> = stats.split(':').collect();
            if let [technologies, tags, projects] = counts.as_slice() {
                println!("Technologies: {}", technologies);
                println!("Tags:         {}", tags);
                println!("Projects:     {}", projects);
            }
        }
    }

    Ok(())
}
