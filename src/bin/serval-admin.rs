use anyhow::Result;
use clap::{Parser, Subcommand};
use serval::config::{Config, DatabaseBackend};
use serval::storage::{LinkStore, PostgresStorage, SqliteStorage};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "serval-admin")]
#[command(about = "Serval admin management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Promote a user to admin
    Promote {
        /// Opaque user id as supplied by the upstream auth layer
        user_id: String,
    },
    /// Demote a user from admin
    Demote {
        /// Opaque user id as supplied by the upstream auth layer
        user_id: String,
    },
    /// List all promoted admins
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage: Arc<dyn LinkStore> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            Arc::new(SqliteStorage::new(&config.database.url, 5).await?)
        }
        DatabaseBackend::Postgres => Arc::new(PostgresStorage::new(&config.database.url).await?),
    };

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::Promote { user_id } => {
            storage.promote_admin(&user_id).await?;
            println!("✓ Promoted user '{}' to admin", user_id);
        }
        Commands::Demote { user_id } => {
            let demoted = storage.demote_admin(&user_id).await?;
            if demoted {
                println!("✓ Demoted user '{}' from admin", user_id);
            } else {
                println!("⚠ User '{}' was not an admin", user_id);
            }
        }
        Commands::List => {
            let admins = storage.list_admins().await?;
            if admins.is_empty() {
                println!("No admins found.");
            } else {
                println!("Admins:");
                for user_id in admins {
                    println!("  {}", user_id);
                }
            }
        }
    }

    Ok(())
}
