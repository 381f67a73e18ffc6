pub mod cli;
pub mod config;
pub mod database;
pub mod excel;
pub mod import;
pub mod tasks;

pub use database::{Database, DbError};
pub use import::{import_and_persist, import_workbook, ImportBatch, ImportError};

use clap::Parser;
use std::process::ExitCode;

/// Entry point for the `taskbook` binary
pub async fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();

    match cli::execute(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
