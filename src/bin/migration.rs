use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use scanner_log_api::migrator::{connect_for_migrations, Migrator};

#[derive(Parser)]
#[command(name = "migration", about = "Manage the scanner-log-api database schema", version)]
struct Cli {
    /// Database connection URL
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://scanner_log.db?mode=rwc"
    )]
    database_url: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations (default)
    Up {
        /// Apply at most this many migrations
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let db = connect_for_migrations(&cli.database_url).await?;

    match cli.command.unwrap_or(Commands::Up { steps: None }) {
        Commands::Up { steps } => {
            info!("Applying migrations");
            Migrator::up(&db, steps).await?;
        }
        Commands::Down { steps } => {
            info!(steps, "Rolling back migrations");
            Migrator::down(&db, Some(steps)).await?;
        }
        Commands::Status => Migrator::status(&db).await?,
    }

    info!("Migration command completed");
    Ok(())
}
