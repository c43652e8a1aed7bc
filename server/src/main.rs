mod config;
mod http;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use orgchart::{OrgChart, SchemaOptions, seed_demo};
use platform_obs::{ObsConfig, init_tracing};
use platform_store::{DocumentStore, MemoryStore, StoreHandle, StoreSettings};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "orgchart-server", version, about = "Org chart GraphQL service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations (SQL store only).
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Write a small demo org chart into the configured store.
    Seed,
    /// Print the GraphQL schema SDL.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path (stdout when omitted)")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _obs = init_tracing(ObsConfig::from_env()?)?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, Arc::new(AppConfig::load()?)).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed => run_seed().await,
        Command::SchemaPrint { output } => schema_print(output),
    }
}

async fn open_store() -> Result<StoreHandle> {
    StoreSettings::from_env().open().await.map_err(Into::into)
}

fn sql_connection(handle: &StoreHandle) -> Result<&DatabaseConnection> {
    handle
        .connection()
        .ok_or_else(|| anyhow!("migrations need DATABASE_URL to point at a SQL database"))
}

async fn run_seed() -> Result<()> {
    let handle = open_store().await?;
    if let StoreHandle::Memory(_) = handle {
        warn!("seeding the in-memory store; data is discarded when this command exits");
    }
    let store = handle.shared();
    let seeded = seed_demo(store.as_ref()).await?;
    for department in &seeded.departments {
        info!(id = %department.id, name = ?department.name, "department");
    }
    for employee in &seeded.employees {
        info!(id = %employee.id, name = ?employee.name, parent_id = ?employee.parent_id, "employee");
    }
    store.close().await?;
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let chart = OrgChart::new(Arc::new(MemoryStore::new()), SchemaOptions::default());
    let sdl = chart.sdl();
    match path {
        Some(target) => {
            std::fs::write(&target, sdl)?;
            info!(path = %target.display(), "schema written");
        }
        None => print!("{sdl}"),
    }
    Ok(())
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let handle = open_store().await?;
    if let Some(conn) = handle.connection() {
        ensure_migrations(conn, cmd.allow_dirty).await?;
    }
    let store = handle.shared();
    info!(
        backend = store.backend(),
        options = ?config.schema,
        "building org chart schema"
    );
    let chart = OrgChart::new(store.clone(), config.schema);
    let state = AppState {
        chart,
        config: config.clone(),
    };
    let served = http::serve((&cmd).into(), state).await;
    store.close().await?;
    info!("document store closed");
    served
}

async fn ensure_migrations(conn: &DatabaseConnection, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(conn).await?;
    if !pending.is_empty() {
        if !allow_dirty {
            bail!(
                "pending migrations detected; run `orgchart-server migrate up` or pass --allow-dirty"
            );
        }
        warn!(pending = pending.len(), "starting with pending migrations");
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let handle = open_store().await?;
    Migrator::up(sql_connection(&handle)?, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let handle = open_store().await?;
    Migrator::down(sql_connection(&handle)?, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
