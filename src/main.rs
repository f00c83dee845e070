use anyhow::Context;
use libris_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "libris-app bootstrap starting"
    );

    libris_app::run(settings).await
}
