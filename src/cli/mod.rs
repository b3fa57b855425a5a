pub mod commands;
pub mod utils;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, DatabaseBackend};
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "contacts-admin")]
#[command(about = "Contacts API administration: schema and account management")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create or update the database schema")]
    Migrate,

    #[command(about = "User account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env_without_secret().context("Invalid configuration")?;
    let db = connect(&config).await?;

    let result = match cli.command {
        Commands::Migrate => commands::migrate::handle(&db, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &config, &db, output_format).await,
    };

    db.close().await;
    result
}

/// The memory store would vanish with the process, so admin commands insist on Postgres.
async fn connect(config: &AppConfig) -> anyhow::Result<DatabaseManager> {
    let backend = config.database_backend();
    if backend == DatabaseBackend::Memory {
        bail!("DATABASE_URL must point at a PostgreSQL database");
    }
    DatabaseManager::connect(&backend, &config.database)
        .await
        .context("Failed to connect to the database")
}
