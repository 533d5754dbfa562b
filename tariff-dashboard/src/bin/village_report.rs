use anyhow::{bail, Result};
use std::env;
use tariff_client::db::PgTableReader;
use tariff_dashboard::{
    config::AppConfig,
    export, observability,
    pipeline::{self, VillageRequest},
    tariff_source::{TariffMode, TariffSelection},
};

/// Print one village's assessment, operation budget and competitor comparison
/// as CSV sections on stdout.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_cli_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: village_report <village_name> [manual|competitor|simulation]");
    }
    let village = &args[1];
    let mode: TariffMode = match args.get(2) {
        Some(m) => m.parse().map_err(anyhow::Error::msg)?,
        None => TariffMode::default(),
    };

    let cfg = AppConfig::load()?;
    let reader = PgTableReader::connect(&cfg.database.uri, cfg.database.max_connections).await?;

    let request = VillageRequest {
        village: village.clone(),
        selection: TariffSelection {
            mode,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = pipeline::village_report(&reader, &cfg.settings(), &request).await?;

    for warning in &report.warnings {
        tracing::warn!(village = %village, "{warning}");
    }

    print!("{}", export::assessment_csv(&report.assessment)?);
    println!();
    print!("{}", export::budget_csv(&report.budget)?);
    if let Some(rows) = &report.comparison {
        println!();
        print!("{}", export::comparison_csv(rows)?);
    }

    Ok(())
}
