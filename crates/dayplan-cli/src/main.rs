mod config;
mod plan_routes;
mod serve_cmd;
mod task_routes;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use dayplan_core::planner::PlanGenerator;
use dayplan_db::pool;

use config::DayplanConfig;
use serve_cmd::AppState;

#[derive(Parser)]
#[command(name = "dayplan", about = "Task and daily-plan backend with LLM-assisted scheduling")]
struct Cli {
    /// Database URL (overrides DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a dayplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/dayplan")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the dayplan database if missing and run migrations
    DbInit,
    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Execute the `dayplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: Some(db_url.to_string()),
        },
        ..config::ConfigFile::default()
    };

    config::save_config(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Set llm.api_key in that file (or OPENAI_API_KEY) to enable plan generation.");
    println!("Next: run `dayplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `dayplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = DayplanConfig::resolve(cli_db_url)?;

    println!("Initializing dayplan database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database.");
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in counts.rows() {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("dayplan db-init complete.");
    Ok(())
}

/// Execute the `dayplan serve` command.
async fn cmd_serve(cli_db_url: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = DayplanConfig::resolve(cli_db_url)?;

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    if resolved.llm_config.api_key.is_none() {
        tracing::warn!("no text-generation API key configured; plan generation will fail");
    }
    let planner = PlanGenerator::from_config(&resolved.llm_config)?;
    tracing::info!(
        model = %resolved.llm_config.model,
        timeout_secs = resolved.llm_config.timeout.as_secs(),
        "plan generator ready"
    );

    let state = AppState {
        pool: db_pool.clone(),
        planner: Arc::new(planner),
        work_hours: resolved.work_hours,
    };

    let result = serve_cmd::run_serve(state, bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), &bind, port).await?;
        }
    }

    Ok(())
}
