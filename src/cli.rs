use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{default_config_path, Config};
use crate::database::Database;
use crate::excel::{create_template, read_upload};
use crate::import::{self, Category, ImportBatch, TASK_COLUMNS};

/// Import recurring tasks from a spreadsheet
#[derive(Debug, Parser)]
#[command(name = "taskbook")]
#[command(about = "Import recurring tasks from daily/weekly/monthly/yearly spreadsheet sheets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a workbook and store its tasks if every row passes
    Import {
        /// Spreadsheet file (.xlsx, .xls, ...)
        file: PathBuf,

        /// Identity stamped as created_by
        #[arg(long)]
        actor: Option<String>,

        /// Validate only, store nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write an empty workbook with the expected sheets and columns
    Template {
        /// Output path
        out: PathBuf,
    },

    /// List imported tasks
    List {
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show past import attempts
    Runs,
}

pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for a well-formed workbook that failed validation
pub const EXIT_REJECTED: u8 = 2;

/// Run one command, returning the process exit code
pub async fn execute(cli: Cli) -> Result<u8> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match cli.command {
        Commands::Import { file, actor, dry_run, json } => {
            let bytes = read_upload(&file.to_string_lossy())?;

            let batch = if dry_run {
                import::import_workbook(&bytes)?
            } else {
                let actor = config
                    .resolve_actor(actor.as_deref())
                    .ok_or_else(|| anyhow!("No actor identity: pass --actor or set created_by in config"))?;
                let db = Arc::new(open_database(cli.db, &config)?);
                let outcome = import::import_and_persist(bytes, &actor, db).await?;
                info!("Import run stored with checksum {}", outcome.checksum);
                outcome.batch
            };

            print_batch(&batch, json, dry_run)?;

            Ok(if batch.is_accepted() { EXIT_SUCCESS } else { EXIT_REJECTED })
        }
        Commands::Template { out } => {
            let path = out.to_string_lossy().to_string();
            let sheets: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
            create_template(&path, &sheets, &TASK_COLUMNS)?;
            println!("Template written to {}", path);
            Ok(EXIT_SUCCESS)
        }
        Commands::List { limit, json } => {
            let db = open_database(cli.db, &config)?;
            let tasks = db.list_tasks(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for task in tasks {
                    println!(
                        "{}  [{}] [{}] {}  (due {})",
                        task.id, task.category, task.priority, task.title, task.deadline
                    );
                }
            }
            Ok(EXIT_SUCCESS)
        }
        Commands::Runs => {
            let db = open_database(cli.db, &config)?;
            for run in db.list_import_runs()? {
                println!(
                    "{}  by {}  accepted={} rejected={}  sha256={}",
                    run.id, run.created_by, run.accepted, run.rejected, run.checksum
                );
            }
            Ok(EXIT_SUCCESS)
        }
    }
}

fn open_database(explicit: Option<PathBuf>, config: &Config) -> Result<Database> {
    let path = match explicit {
        Some(path) => path,
        None => config.database_path()?,
    };
    Database::open(&path).with_context(|| format!("Failed to open database at {}", path.display()))
}

fn print_batch(batch: &ImportBatch, json: bool, dry_run: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(batch)?);
        return Ok(());
    }

    match batch {
        ImportBatch::Accepted(tasks) if dry_run => {
            println!("All {} rows are valid (dry run, nothing stored)", tasks.len());
        }
        ImportBatch::Accepted(_) => println!("{}", batch.summary()),
        ImportBatch::Rejected(_) => {
            println!("{}", batch.summary());
            for line in batch.report().to_lines() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
