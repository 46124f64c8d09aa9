use anyhow::{Context, Result};
use notas_dashboard::{
    config::Config,
    dataset::{DatasetKind, ExclusionRoster},
    process, report,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging (stderr; stdout carries the report) ─────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::discover(std::env::args_os().nth(1).map(PathBuf::from))?;
    let data_dir = config.data_dir();
    let roster = ExclusionRoster::standard();
    info!(data_dir = %data_dir.display(), roster = roster.len(), "configured");

    // ─── 3) both pipelines, from scratch ─────────────────────────────
    let notes = process::run_dataset(
        &data_dir,
        &config.dataset(DatasetKind::MaintenanceNotes),
        roster,
    )?;
    let measures = process::run_dataset(
        &data_dir,
        &config.dataset(DatasetKind::QualityMeasures),
        roster,
    )?;

    // ─── 4) display contract ─────────────────────────────────────────
    let dashboard = report::build_report(&notes, &measures)?;
    let json = serde_json::to_string_pretty(&dashboard).context("serializing report")?;
    println!("{}", json);

    info!("all done");
    Ok(())
}
