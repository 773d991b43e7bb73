//! Whole-table reductions over the scenario table: weight-impact analysis,
//! top-N route/carrier views, and the scenario comparison summary.
//!
//! Grouping is an explicit key→accumulator map built in one pass; groups
//! keep first-encounter order so top-N ties resolve deterministically.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::models::WeightCategory;
use crate::scenarios::{ConsolidatedRoute, ScenarioShipment};
use crate::stats;

/// Cost totals per weight class plus each class's share of the grand total.
#[derive(Debug, Clone, Serialize)]
pub struct WeightImpactRow {
    #[serde(rename = "Weight_Category")]
    pub weight_category: WeightCategory,
    #[serde(rename = "TotalCost")]
    pub total_cost: f64,
    #[serde(rename = "Scenario4_TotalCost")]
    pub scenario4_total: f64,
    #[serde(rename = "Weight_tons")]
    pub weight_tons: f64,
    #[serde(rename = "Cost_Contribution_%")]
    pub cost_contribution_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteCost {
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "TotalCost")]
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteCptk {
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "CPTK_Original")]
    pub mean_cptk: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarrierCost {
    #[serde(rename = "Carrier")]
    pub carrier: String,
    #[serde(rename = "Scenario4_TotalCost")]
    pub scenario4_total: f64,
}

/// One row per scenario in the comparison summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Scenario")]
    pub scenario: &'static str,
    #[serde(rename = "Total Cost")]
    pub total_cost: f64,
    #[serde(rename = "Avg CPTK")]
    pub avg_cptk: f64,
    #[serde(rename = "Cost Reduction %")]
    pub cost_reduction_pct: f64,
}

/// Weight-impact table over all six weight classes, empty ones included,
/// in ascending weight order.
pub fn weight_impact(rows: &[ScenarioShipment]) -> Vec<WeightImpactRow> {
    let grand_total: f64 = rows.iter().map(|r| r.base.total_cost).sum();
    WeightCategory::ALL
        .iter()
        .map(|&category| {
            let mut total_cost = 0.0;
            let mut scenario4_total = 0.0;
            let mut weight_tons = 0.0;
            for row in rows.iter().filter(|r| r.weight_category == category) {
                total_cost += row.base.total_cost;
                scenario4_total += row.scenario4_total;
                weight_tons += row.base.weight_tons;
            }
            WeightImpactRow {
                weight_category: category,
                total_cost,
                scenario4_total,
                weight_tons,
                cost_contribution_pct: 100.0 * total_cost / grand_total,
            }
        })
        .collect()
}

/// Top `n` routes by summed original TotalCost, descending.
pub fn top_routes_by_cost(rows: &[ScenarioShipment], n: usize) -> Vec<RouteCost> {
    let mut groups = group_sum(
        rows.iter()
            .map(|r| ((r.base.origin.clone(), r.base.destination.clone()), r.base.total_cost)),
    );
    // Stable sort keeps first-encounter order among equal totals.
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
        .into_iter()
        .take(n)
        .map(|((origin, destination), total_cost)| RouteCost {
            origin,
            destination,
            total_cost,
        })
        .collect()
}

/// Top `n` routes by mean original CPTK, descending.
pub fn top_routes_by_cptk(rows: &[ScenarioShipment], n: usize) -> Vec<RouteCptk> {
    let mut groups = group_mean(
        rows.iter()
            .map(|r| ((r.base.origin.clone(), r.base.destination.clone()), r.cptk_original)),
    );
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
        .into_iter()
        .take(n)
        .map(|((origin, destination), mean_cptk)| RouteCptk {
            origin,
            destination,
            mean_cptk,
        })
        .collect()
}

/// Every carrier's summed Scenario 4 cost, descending.
pub fn carrier_costs(rows: &[ScenarioShipment]) -> Vec<CarrierCost> {
    let mut groups = group_sum(
        rows.iter()
            .map(|r| (r.base.carrier.clone(), r.scenario4_total)),
    );
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups
        .into_iter()
        .map(|(carrier, scenario4_total)| CarrierCost {
            carrier,
            scenario4_total,
        })
        .collect()
}

/// Scenario comparison summary. The Consolidation row is route-granular:
/// its total comes from the consolidated table and its average CPTK divides
/// the grand Scenario 2 cost by summed route weight times mean route
/// distance, mirroring how that scenario is defined.
pub fn summary(rows: &[ScenarioShipment], consolidated: &[ConsolidatedRoute]) -> Vec<SummaryRow> {
    let original_total: f64 = rows.iter().map(|r| r.base.total_cost).sum();
    let scenario1_total: f64 = rows.iter().map(|r| r.scenario1_total).sum();
    let scenario3_total: f64 = rows.iter().map(|r| r.scenario3_total).sum();
    let scenario4_total: f64 = rows.iter().map(|r| r.scenario4_total).sum();
    let scenario2_total: f64 = consolidated.iter().map(|c| c.scenario2_total).sum();

    let mean_cptk = |pick: fn(&ScenarioShipment) -> f64| {
        let vals: Vec<f64> = rows.iter().map(pick).collect();
        stats::mean(&vals).unwrap_or(f64::NAN)
    };
    let consolidated_weight: f64 = consolidated.iter().map(|c| c.weight_tons).sum();
    let route_distances: Vec<f64> = consolidated.iter().map(|c| c.mean_distance_km).collect();
    let scenario2_cptk = scenario2_total
        / (consolidated_weight * stats::mean(&route_distances).unwrap_or(f64::NAN));

    let reduction = |total: f64| 100.0 * (original_total - total) / original_total;

    vec![
        SummaryRow {
            scenario: "Original",
            total_cost: original_total,
            avg_cptk: mean_cptk(|r| r.cptk_original),
            cost_reduction_pct: reduction(original_total),
        },
        SummaryRow {
            scenario: "Fuel +10%",
            total_cost: scenario1_total,
            avg_cptk: mean_cptk(|r| r.cptk_scenario1),
            cost_reduction_pct: reduction(scenario1_total),
        },
        SummaryRow {
            scenario: "Consolidation",
            total_cost: scenario2_total,
            avg_cptk: scenario2_cptk,
            cost_reduction_pct: reduction(scenario2_total),
        },
        SummaryRow {
            scenario: "Mode Shift",
            total_cost: scenario3_total,
            avg_cptk: mean_cptk(|r| r.cptk_scenario3),
            cost_reduction_pct: reduction(scenario3_total),
        },
        SummaryRow {
            scenario: "Carrier Optimization",
            total_cost: scenario4_total,
            avg_cptk: mean_cptk(|r| r.cptk_scenario4),
            cost_reduction_pct: reduction(scenario4_total),
        },
    ]
}

/// Sum values per key, keys in first-encounter order.
fn group_sum<K: Eq + Hash + Clone>(items: impl Iterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, f64)> = Vec::new();
    for (key, value) in items {
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, 0.0));
            groups.len() - 1
        });
        groups[slot].1 += value;
    }
    groups
}

/// Mean value per key, keys in first-encounter order.
fn group_mean<K: Eq + Hash + Clone>(items: impl Iterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, (f64, usize))> = Vec::new();
    for (key, value) in items {
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, (0.0, 0)));
            groups.len() - 1
        });
        groups[slot].1 .0 += value;
        groups[slot].1 .1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}
