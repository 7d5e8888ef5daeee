use anyhow::Context;
use tripdesk_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load TripDesk settings")?;
    tripdesk_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "tripdesk starting"
    );

    tripdesk_app::app::run(settings).await
}
