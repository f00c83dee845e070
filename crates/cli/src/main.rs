use anyhow::Context;
use clap::{Parser, Subcommand};

use libris_app::books::BookStore;
use libris_kernel::settings::Settings;

/// Library catalog service
#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Print catalog counts and recent additions as JSON
    Summary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            libris_app::run(settings).await
        }
        Command::Migrate => {
            libris_app::prepare(&settings).await?;
            tracing::info!(db = %settings.database.path, "migrations applied");
            Ok(())
        }
        Command::Summary => {
            let (db, _registry) = libris_app::prepare(&settings).await?;
            let summary = BookStore::new(db)
                .summary()
                .context("failed to read catalog summary")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
