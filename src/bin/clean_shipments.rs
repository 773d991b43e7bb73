//! Cleaning stage CLI: repair raw shipment and fuel-price CSVs and write the
//! cleaned, fuel-joined shipment table.
//!
//! Run: cargo run --release --bin clean_shipments -- --shipments <csv> --fuel <csv>

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use freight_scenarios::io as tables;
use freight_scenarios::{cleaning, report};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "clean_shipments")]
#[command(about = "Clean raw shipment data and join fuel prices")]
struct Args {
    /// Raw shipment CSV (ShipmentID, Origin, ..., OtherCost)
    #[arg(long, default_value = "data/shipments.csv")]
    shipments: PathBuf,

    /// Fuel price index CSV (Date, FuelPrice)
    #[arg(long, default_value = "data/fuel_price_index.csv")]
    fuel: PathBuf,

    /// Cleaned output CSV
    #[arg(long, default_value = "data/cleaned_shipments.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    info!("Reading raw shipments from {:?}", args.shipments);
    let raw = tables::read_raw_shipments(
        File::open(&args.shipments)
            .with_context(|| format!("open {:?}", args.shipments))?,
    )?;
    info!("Reading fuel prices from {:?}", args.fuel);
    let fuel = tables::read_fuel_rows(
        File::open(&args.fuel).with_context(|| format!("open {:?}", args.fuel))?,
    )?;
    info!("Parsed {} shipment rows, {} fuel rows", raw.len(), fuel.len());

    let (cleaned, cleaning_report) = cleaning::clean(raw, &fuel);
    report::print_cleaning_report(&cleaning_report);

    if let Some(dir) = args.output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    tables::write_cleaned_shipments(
        File::create(&args.output)
            .with_context(|| format!("create {:?}", args.output))?,
        &cleaned,
    )?;
    info!("Wrote {} cleaned shipments to {:?}", cleaned.len(), args.output);

    Ok(())
}
