//! `tripdesk` command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tripdesk_app::app::{self, App};
use tripdesk_app::import::{self, reconcile, Workbook};
use tripdesk_app::modules::itineraries::models::CustomerItinerary;
use tripdesk_app::modules::packages::models::Package;
use tripdesk_db::Repository;
use tripdesk_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "tripdesk", version, about = "TripDesk travel agency backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Reconcile a package workbook (.xlsx/.xls or JSON) against the store
    Import {
        file: PathBuf,
        /// Write the new packages instead of only previewing
        #[arg(long)]
        commit: bool,
    },
    /// Render a customer itinerary JSON document to PDF
    RenderItinerary { input: PathBuf, output: PathBuf },
    /// List the collections every module declares
    Collections,
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn import_workbook(settings: Settings, file: PathBuf, commit: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let workbook = Workbook::from_bytes(bytes)?;

    let app = App::from_settings(settings).await?;
    let repo: Repository<Package> = app.ctx.repo();
    let existing = reconcile::existing_ids(&repo.list().await?);
    let plan = import::plan_workbook(
        &workbook,
        &existing,
        &app.ctx.settings.generator.default_currency,
    )?;

    if commit {
        let report = import::commit(&repo, plan).await;
        print_json(&report)?;
        if !report.failed.is_empty() {
            anyhow::bail!("{} packages failed to import", report.failed.len());
        }
    } else {
        print_json(&plan.summary())?;
    }
    app.shutdown().await
}

fn render_itinerary(settings: &Settings, input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mut itinerary: CustomerItinerary =
        serde_json::from_str(&raw).context("input is not a customer itinerary")?;
    itinerary.recompute_balance();

    let bytes = tripdesk_app::pdf::itinerary_pdf(&itinerary, None, &settings.brand)?;
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(output = %output.display(), bytes = bytes.len(), "itinerary rendered");
    Ok(())
}

async fn list_collections(settings: Settings) -> anyhow::Result<()> {
    let app = App::in_memory(settings).await?;
    for (module, spec) in app.registry.collect_collections() {
        println!("{module}\t{}\t{}", spec.name, spec.indexes.join(","));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load TripDesk settings")?;
    tripdesk_telemetry::init(&settings.telemetry);

    match cli.command {
        Command::Serve => app::run(settings).await,
        Command::Import { file, commit } => import_workbook(settings, file, commit).await,
        Command::RenderItinerary { input, output } => render_itinerary(&settings, input, output),
        Command::Collections => list_collections(settings).await,
    }
}
