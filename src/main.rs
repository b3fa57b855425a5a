use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use contacts_api::app::app;
use contacts_api::config::AppConfig;
use contacts_api::database::DatabaseManager;
use contacts_api::state::AppState;

#[derive(Parser)]
#[command(name = "contacts-api")]
#[command(about = "Contacts management API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("Invalid configuration")?;

    contacts_api::init_tracing(if config.is_development() {
        "contacts_api=debug,tower_http=info"
    } else {
        "info"
    });

    let port = match cli.command {
        Some(Command::Serve { port }) => port,
        None => None,
    };
    if let Some(port) = port {
        config.server.port = port;
    }

    serve(config).await
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting Contacts API in {:?} mode", config.environment);
    if config.security.jwt_previous_secret.is_some() {
        warn!("SECURITY_JWT_PREVIOUS_SECRET is set; tokens signed with it are still accepted");
    }

    let db = DatabaseManager::connect(&config.database_backend(), &config.database)
        .await
        .context("Failed to initialize the database")?;

    let bind_addr = config.bind_addr();
    let bootstrap = config.bootstrap.clone();
    let state = AppState::new(config, db.clone());

    if let Some(admin) = bootstrap {
        state
            .users
            .ensure_admin(&admin.username, admin.password.expose())
            .await
            .context("Failed to create the bootstrap admin")?;
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Contacts API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
