//! Console rendering of the analysis outputs: formatted tables and text bar
//! charts for the scenario comparison, route/carrier rankings, and the
//! weight-impact breakdown.

use crate::aggregate::{CarrierCost, RouteCost, RouteCptk, SummaryRow, WeightImpactRow};
use crate::cleaning::CleaningReport;

pub fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

pub fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if !(max > 0.0) || !value.is_finite() || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * width as f64).round() as usize;
    "█".repeat(len.min(width))
}

pub fn print_cleaning_report(report: &CleaningReport) {
    print_subsection("Cleaning Summary");
    println!("  Input rows:            {:>10}", report.input_rows);
    println!("  Cells imputed:         {:>10}", report.cells_imputed());
    for (column, count) in &report.imputed {
        println!("    {:20} {:>10}", column, count);
    }
    println!("  Invalid-date rows:     {:>10}", report.invalid_date_rows);
    println!("  Duplicate rows:        {:>10}", report.duplicate_rows);
    println!("  Non-positive rows:     {:>10}", report.nonpositive_rows);
    println!("  Cost-outlier rows:     {:>10}", report.outlier_rows);
    println!("  Fuel rows dropped:     {:>10}", report.fuel_rows_dropped);
    println!("  Output rows:           {:>10}", report.output_rows);
}

pub fn print_summary(summary: &[SummaryRow]) {
    print_subsection("Scenario Summary");
    println!(
        "  {:22} {:>16} {:>12} {:>14}",
        "Scenario", "Total Cost", "Avg CPTK", "Reduction %"
    );
    println!("  {}", "─".repeat(68));
    for row in summary {
        println!(
            "  {:22} {:>16.2} {:>12.4} {:>13.2}%",
            row.scenario, row.total_cost, row.avg_cptk, row.cost_reduction_pct
        );
    }
}

pub fn print_scenario_comparison(summary: &[SummaryRow]) {
    print_subsection("Scenario Comparison - Total Costs");
    let max = summary.iter().map(|r| r.total_cost).fold(0.0, f64::max);
    for row in summary {
        println!(
            "  {:22} {:>16.2} {}",
            row.scenario,
            row.total_cost,
            bar(row.total_cost, max, 40)
        );
    }
}

pub fn print_top_routes(routes: &[RouteCost]) {
    print_subsection(&format!("Top {} Costly Routes (Original)", routes.len()));
    let max = routes.iter().map(|r| r.total_cost).fold(0.0, f64::max);
    println!("  {:32} {:>14} {}", "Route", "Total Cost", "");
    println!("  {}", "─".repeat(66));
    for row in routes {
        let lane = format!("{} → {}", row.origin, row.destination);
        println!(
            "  {:32} {:>14.2} {}",
            lane,
            row.total_cost,
            bar(row.total_cost, max, 30)
        );
    }
}

pub fn print_cptk_routes(routes: &[RouteCptk]) {
    print_subsection(&format!("Top {} Routes by Cost per Ton-Km", routes.len()));
    let max = routes.iter().map(|r| r.mean_cptk).fold(0.0, f64::max);
    println!("  {:32} {:>12}", "Route", "CPTK");
    println!("  {}", "─".repeat(60));
    for row in routes {
        let lane = format!("{} → {}", row.origin, row.destination);
        println!(
            "  {:32} {:>12.4} {}",
            lane,
            row.mean_cptk,
            bar(row.mean_cptk, max, 30)
        );
    }
}

pub fn print_carrier_costs(carriers: &[CarrierCost]) {
    print_subsection("Carrier Comparison after Optimization (Scenario 4)");
    let max = carriers.iter().map(|c| c.scenario4_total).fold(0.0, f64::max);
    println!("  {:22} {:>16}", "Carrier", "Scenario 4 Cost");
    println!("  {}", "─".repeat(66));
    for row in carriers {
        println!(
            "  {:22} {:>16.2} {}",
            row.carrier,
            row.scenario4_total,
            bar(row.scenario4_total, max, 30)
        );
    }
}

pub fn print_weight_impact(impact: &[WeightImpactRow]) {
    print_subsection("Cost Distribution by Weight Category");
    println!(
        "  {:>8} {:>16} {:>18} {:>12} {:>12}",
        "Tons", "Total Cost", "Scenario 4 Cost", "Weight", "Share %"
    );
    println!("  {}", "─".repeat(70));
    for row in impact {
        println!(
            "  {:>8} {:>16.2} {:>18.2} {:>12.1} {:>11.1}%",
            row.weight_category.label(),
            row.total_cost,
            row.scenario4_total,
            row.weight_tons,
            row.cost_contribution_pct
        );
    }
}
