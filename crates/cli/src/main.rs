//! Callback notifier CLI - database migrations.
//!
//! # Usage
//!
//! ```bash
//! # Run customer and session-store migrations
//! notifier-cli migrate
//!
//! # Against an explicit database
//! notifier-cli migrate --database-url postgres://localhost/notifier
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "notifier-cli")]
#[command(author, version, about = "Callback notifier CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// `PostgreSQL` connection string (falls back to `NOTIFIER_DATABASE_URL`,
        /// then `DATABASE_URL`)
        #[arg(long, env = "NOTIFIER_DATABASE_URL", hide_env_values = true)]
        database_url: Option<String>,

        /// Skip the session table migration
        #[arg(long)]
        skip_sessions: bool,
    },
}

#[tokio::main]
async fn main() {
    // .env first so clap's `env` fallbacks see it
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::migrate::MigrationError> {
    match cli.command {
        Commands::Migrate {
            database_url,
            skip_sessions,
        } => {
            let database_url = commands::migrate::resolve_database_url(database_url)?;
            commands::migrate::run(&SecretString::from(database_url), !skip_sessions).await?;
        }
    }
    Ok(())
}
