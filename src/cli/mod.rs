use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::config::{config, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::routes;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "branch-notes")]
#[command(about = "Branch listing and sharing API for the notes application")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create the database tables")]
    Migrate,

    #[command(about = "Mint a bearer token for a user id")]
    Token {
        #[arg(long)]
        user_id: Uuid,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(port).await,
        Commands::Migrate => migrate().await,
        Commands::Token { user_id } => token(user_id),
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting branch-notes API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET_KEY is not set; /current-user will reject every token");
    }

    let store: Arc<dyn Store> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let app = routes::app(AppState::from_config(store, config));

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}

fn token(user_id: Uuid) -> anyhow::Result<()> {
    let security = &config().security;
    let claims = Claims::new(user_id, security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &security.jwt_secret)?;
    println!("{}", token);
    Ok(())
}
