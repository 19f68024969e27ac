use anyhow::Context;
use catalog_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.endpoint,
        "catalog-app bootstrap starting"
    );

    catalog_app::bootstrap::run(settings).await?;

    tracing::info!("catalog-app stopped");
    Ok(())
}
