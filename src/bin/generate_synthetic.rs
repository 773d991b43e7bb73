//! Synthetic freight dataset generator.
//!
//! Produces a raw shipment CSV and a fuel-price index CSV with controlled
//! data-quality defects (missing cells, duplicate IDs, unparseable dates,
//! cost outliers) so the cleaning stage has something to repair.
//!
//! Run: cargo run --release --bin generate_synthetic -- --rows 2000 --seed 42

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use csv::WriterBuilder;
use freight_scenarios::models::{RawFuelRow, RawShipmentRow};
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::info;

const CITIES: [&str; 8] = [
    "Hamburg", "Munich", "Berlin", "Rotterdam", "Antwerp", "Lyon", "Milan", "Vienna",
];
const MODES: [&str; 4] = ["Air", "Rail", "Road", "Sea"];
const CARRIERS: [&str; 5] = [
    "TransEuro", "CargoLine", "SwiftFreight", "NordHaul", "AlpTrans",
];

#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate synthetic shipment and fuel-price data")]
struct Args {
    /// Number of shipment rows
    #[arg(long, default_value = "1000")]
    rows: usize,

    /// First ship date (inclusive)
    #[arg(long, default_value = "2024-01-01")]
    start_date: NaiveDate,

    /// Length of the shipping window in days
    #[arg(long, default_value = "365")]
    days: i64,

    /// Probability that any one nullable cell is blanked
    #[arg(long, default_value = "0.03")]
    missing_rate: f64,

    /// Probability that a row reuses an earlier ShipmentID
    #[arg(long, default_value = "0.02")]
    duplicate_rate: f64,

    /// Probability that a row gets an unparseable ship date
    #[arg(long, default_value = "0.01")]
    bad_date_rate: f64,

    /// Probability that a row's base cost is inflated 100x
    #[arg(long, default_value = "0.01")]
    outlier_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Shipment output CSV
    #[arg(long, default_value = "data/shipments.csv")]
    shipments: PathBuf,

    /// Fuel price output CSV
    #[arg(long, default_value = "data/fuel_price_index.csv")]
    fuel: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("Generating {} shipments with seed {}", args.rows, seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let shipments = generate_shipments(&args, &mut rng);
    let fuel = generate_fuel_index(&args, &mut rng);

    for path in [&args.shipments, &args.fuel] {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }
    write_rows(&args.shipments, &shipments)?;
    write_rows(&args.fuel, &fuel)?;

    info!(
        "Wrote {} shipment rows to {:?} and {} fuel rows to {:?}",
        shipments.len(),
        args.shipments,
        fuel.len(),
        args.fuel
    );
    Ok(())
}

fn generate_shipments(args: &Args, rng: &mut StdRng) -> Vec<RawShipmentRow> {
    let mut rows = Vec::with_capacity(args.rows);
    for i in 0..args.rows {
        let origin = CITIES[rng.gen_range(0..CITIES.len())];
        let destination = loop {
            let d = CITIES[rng.gen_range(0..CITIES.len())];
            if d != origin {
                break d;
            }
        };
        let mode = MODES[rng.gen_range(0..MODES.len())];
        let carrier = CARRIERS[rng.gen_range(0..CARRIERS.len())];

        let distance_km = rng.gen_range(150.0..2500.0_f64).round();
        let weight_tons = (rng.gen_range(0.5..60.0_f64) * 10.0).round() / 10.0;
        let mut base_cost = distance_km * weight_tons * rng.gen_range(0.05..0.15);
        if rng.gen_bool(args.outlier_rate) {
            base_cost *= 100.0;
        }
        let fuel_cost = base_cost * rng.gen_range(0.20..0.50);
        let other_cost = rng.gen_range(5.0..80.0_f64);

        let ship_date = if rng.gen_bool(args.bad_date_rate) {
            "n/a".to_string()
        } else {
            let offset = rng.gen_range(0..args.days.max(1));
            (args.start_date + Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string()
        };

        let shipment_id = if i > 0 && rng.gen_bool(args.duplicate_rate) {
            format!("SHP{:06}", rng.gen_range(0..i))
        } else {
            format!("SHP{i:06}")
        };

        let mut row = RawShipmentRow {
            shipment_id: Some(shipment_id),
            origin: Some(origin.to_string()),
            destination: Some(destination.to_string()),
            route: Some(format!("{origin}-{destination}")),
            mode: Some(mode.to_string()),
            carrier: Some(carrier.to_string()),
            ship_date: Some(ship_date),
            distance_km: Some(distance_km),
            weight_tons: Some(weight_tons),
            base_cost: Some((base_cost * 100.0).round() / 100.0),
            fuel_cost: Some((fuel_cost * 100.0).round() / 100.0),
            other_cost: Some((other_cost * 100.0).round() / 100.0),
        };
        blank_some_cells(&mut row, args.missing_rate, rng);
        rows.push(row);
    }
    rows
}

/// Blank nullable value cells at the configured rate. IDs and dates are left
/// alone; those defects are injected separately.
fn blank_some_cells(row: &mut RawShipmentRow, rate: f64, rng: &mut StdRng) {
    if rng.gen_bool(rate) {
        row.origin = None;
    }
    if rng.gen_bool(rate) {
        row.destination = None;
    }
    if rng.gen_bool(rate) {
        row.route = None;
    }
    if rng.gen_bool(rate) {
        row.mode = None;
    }
    if rng.gen_bool(rate) {
        row.carrier = None;
    }
    if rng.gen_bool(rate) {
        row.distance_km = None;
    }
    if rng.gen_bool(rate) {
        row.weight_tons = None;
    }
    if rng.gen_bool(rate) {
        row.base_cost = None;
    }
    if rng.gen_bool(rate) {
        row.fuel_cost = None;
    }
    if rng.gen_bool(rate) {
        row.other_cost = None;
    }
}

/// Weekly fuel price index: a bounded random walk starting near 1.50/l.
fn generate_fuel_index(args: &Args, rng: &mut StdRng) -> Vec<RawFuelRow> {
    let mut rows = Vec::new();
    let mut price: f64 = 1.50;
    let mut date = args.start_date;
    let end = args.start_date + Duration::days(args.days);
    while date < end {
        price = (price + rng.gen_range(-0.05..0.05)).clamp(1.10, 2.20);
        rows.push(RawFuelRow {
            date: Some(date.format("%Y-%m-%d").to_string()),
            fuel_price: Some((price * 1000.0).round() / 1000.0),
        });
        date += Duration::days(7);
    }
    rows
}

fn write_rows<T: serde::Serialize>(path: &PathBuf, rows: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {path:?}"))?;
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(file);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args(rows: &str) -> Args {
        Args::parse_from([
            "generate_synthetic",
            "--rows",
            rows,
            "--seed",
            "7",
            "--missing-rate",
            "0",
        ])
    }

    #[test]
    fn generates_the_requested_rows_with_rounded_costs() {
        let args = test_args("50");
        let mut rng = StdRng::seed_from_u64(7);
        let shipments = generate_shipments(&args, &mut rng);
        assert_eq!(shipments.len(), 50);
        for row in &shipments {
            for cost in [row.base_cost, row.fuel_cost, row.other_cost] {
                let cost = cost.unwrap();
                // costs carry at most two decimal places
                assert!((cost * 100.0 - (cost * 100.0).round()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn fuel_index_walks_within_bounds() {
        let args = test_args("1");
        let mut rng = StdRng::seed_from_u64(7);
        let fuel = generate_fuel_index(&args, &mut rng);
        assert!(!fuel.is_empty());
        for row in &fuel {
            let price = row.fuel_price.unwrap();
            assert!((1.10..=2.20).contains(&price));
        }
    }
}
