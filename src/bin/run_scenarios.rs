//! Scenario stage CLI: take the cleaned shipment table, evaluate the four
//! what-if cost scenarios, and write the comparison tables plus the numeric
//! series behind each chart.
//!
//! Run: cargo run --release --bin run_scenarios -- --input data/cleaned_shipments.csv

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use freight_scenarios::io as tables;
use freight_scenarios::io::ChartSeries;
use freight_scenarios::{aggregate, report, scenarios};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "run_scenarios")]
#[command(about = "Evaluate cost scenarios over a cleaned shipment table")]
struct Args {
    /// Cleaned shipment CSV produced by clean_shipments
    #[arg(long, default_value = "data/cleaned_shipments.csv")]
    input: PathBuf,

    /// Directory for output tables
    #[arg(long, default_value = "data/scenarios")]
    out_dir: PathBuf,

    /// How many routes to keep in the top-N views
    #[arg(long, default_value = "10")]
    top: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    info!("Reading cleaned shipments from {:?}", args.input);
    let cleaned = tables::read_cleaned_shipments(
        File::open(&args.input).with_context(|| format!("open {:?}", args.input))?,
    )?;
    info!("Loaded {} cleaned shipments", cleaned.len());

    let rows = scenarios::extend(&cleaned);
    let consolidated = scenarios::consolidate_routes(&rows);
    let impact = aggregate::weight_impact(&rows);
    let top_routes = aggregate::top_routes_by_cost(&rows, args.top);
    let top_cptk = aggregate::top_routes_by_cptk(&rows, args.top);
    let carriers = aggregate::carrier_costs(&rows);
    let summary = aggregate::summary(&rows, &consolidated);

    report::print_section_header("FREIGHT COST SCENARIO ANALYSIS");
    report::print_summary(&summary);
    report::print_scenario_comparison(&summary);
    report::print_top_routes(&top_routes);
    report::print_carrier_costs(&carriers);
    report::print_cptk_routes(&top_cptk);
    report::print_weight_impact(&impact);

    std::fs::create_dir_all(&args.out_dir)?;
    let out = |name: &str| args.out_dir.join(name);
    tables::write_scenario_table(File::create(out("scenario_full_data_with_cptk.csv"))?, &rows)?;
    tables::write_consolidated(File::create(out("scenario2_consolidation.csv"))?, &consolidated)?;
    tables::write_weight_impact(File::create(out("weight_impact_analysis.csv"))?, &impact)?;
    tables::write_summary(File::create(out("scenario_summary_with_cptk.csv"))?, &summary)?;
    tables::write_top_routes_by_cost(File::create(out("top_routes.csv"))?, &top_routes)?;
    tables::write_top_routes_by_cptk(File::create(out("top_cptk_routes.csv"))?, &top_cptk)?;
    tables::write_carrier_costs(File::create(out("carrier_comparison.csv"))?, &carriers)?;

    let chart_series = vec![
        ChartSeries::new(
            "Scenario Comparison - Total Costs",
            summary.iter().map(|r| (r.scenario.to_string(), r.total_cost)),
        ),
        ChartSeries::new(
            "Top Costly Routes (Original)",
            top_routes
                .iter()
                .map(|r| (format!("{} → {}", r.origin, r.destination), r.total_cost)),
        ),
        ChartSeries::new(
            "Carrier Comparison after Optimization (Scenario 4)",
            carriers
                .iter()
                .map(|c| (c.carrier.clone(), c.scenario4_total)),
        ),
        ChartSeries::new(
            "Top Routes by Cost per Ton-Km",
            top_cptk
                .iter()
                .map(|r| (format!("{} → {}", r.origin, r.destination), r.mean_cptk)),
        ),
        ChartSeries::new(
            "Cost Distribution by Weight Category",
            impact
                .iter()
                .map(|w| (w.weight_category.label().to_string(), w.total_cost)),
        ),
    ];
    tables::write_chart_series(File::create(out("chart_series.json"))?, &chart_series)?;

    info!("Wrote scenario tables to {:?}", args.out_dir);
    Ok(())
}
