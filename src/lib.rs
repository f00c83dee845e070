//! Libris application library
//!
//! Wires the catalog modules into the kernel registry and runs the HTTP
//! service. The binaries in this workspace share these bootstrap steps.

pub mod modules;

use anyhow::Context;
use libris_kernel::{settings::Settings, Database, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// Open the database, register and initialize every module, then apply
/// pending migrations.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(Database, ModuleRegistry)> {
    let db = Database::open(&settings.database.path)
        .with_context(|| format!("failed to open database at {}", settings.database.path))?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);

    let ctx = InitCtx {
        settings,
        db: &db,
    };
    registry.init_modules(&ctx).await?;

    let applied = registry
        .run_migrations(&db)
        .context("failed to apply migrations")?;
    tracing::info!(applied, db = %settings.database.path, "database ready");

    Ok((db, registry))
}

/// Run the service until Ctrl-C, then stop modules in reverse order.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let (db, registry) = prepare(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.start_modules(&ctx).await?;

    let served = libris_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_modules().await?;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
