//! Scenario engine: extends the cleaned shipment table with what-if cost
//! columns and builds the route-consolidation table.
//!
//! The scenarios form a chain: Scenario 3 starts from Scenario 1, and
//! Scenario 4 from Scenario 3. Scenario 2 is the odd one out — it operates
//! on route-level aggregates of Scenario 1, not per shipment.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Shipment, WeightCategory};

/// Scenario 1: fuel component grows by 10%.
pub const FUEL_INCREASE: f64 = 0.10;
/// Scenario 2: consolidated routes keep 90% of the fuel-adjusted cost.
pub const CONSOLIDATION_FACTOR: f64 = 0.90;
/// Scenario 3: 10% of air volume shifts to rail at 30% lower cost, the rest
/// stays at full Scenario 1 cost.
pub const MODE_SHIFT_FACTOR: f64 = 0.90 + 0.10 * 0.70;
/// Scenario 4: 30% of a shipment's volume stays with its own carrier,
/// 70% moves to the cheapest carrier on the route.
pub const OWN_CARRIER_SHARE: f64 = 0.30;
pub const CHEAPEST_CARRIER_SHARE: f64 = 0.70;

/// A cleaned shipment extended with scenario and efficiency columns. The
/// base record is never mutated; every scenario value is a new column.
///
/// CPTK ratios are plain f64 divisions: if a caller bypasses cleaning and
/// feeds a zero Ton_Km, the ratio is a non-finite marker (inf or NaN),
/// never a panic.
#[derive(Debug, Clone)]
pub struct ScenarioShipment {
    pub base: Shipment,
    pub new_fuel_cost: f64,
    pub scenario1_total: f64,
    pub scenario3_total: f64,
    pub scenario4_total: f64,
    pub ton_km: f64,
    pub cptk_original: f64,
    pub cptk_scenario1: f64,
    pub cptk_scenario3: f64,
    pub cptk_scenario4: f64,
    pub weight_category: WeightCategory,
}

/// One row per (Origin, Destination) pair with route-level sums, the mean
/// route distance, and the Scenario 2 consolidated cost.
///
/// Scenario 2 deliberately stays at route granularity: the 10% consolidation
/// saving applies to the route-summed Scenario 1 cost and is never folded
/// back into the per-shipment Scenarios 3 and 4.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedRoute {
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "TotalCost")]
    pub total_cost: f64,
    #[serde(rename = "FuelCost")]
    pub fuel_cost: f64,
    #[serde(rename = "Scenario1_TotalCost")]
    pub scenario1_total: f64,
    #[serde(rename = "Weight_tons")]
    pub weight_tons: f64,
    #[serde(rename = "Distance_km")]
    pub mean_distance_km: f64,
    #[serde(rename = "Scenario2_TotalCost")]
    pub scenario2_total: f64,
}

/// Compute the full scenario chain for every shipment.
pub fn extend(shipments: &[Shipment]) -> Vec<ScenarioShipment> {
    // Scenario 1 and 3 are row-local.
    let mut rows: Vec<ScenarioShipment> = shipments
        .iter()
        .map(|s| {
            let new_fuel_cost = s.fuel_cost * (1.0 + FUEL_INCREASE);
            let scenario1_total = s.total_cost - s.fuel_cost + new_fuel_cost;
            let scenario3_total = if s.is_air() {
                scenario1_total * MODE_SHIFT_FACTOR
            } else {
                scenario1_total
            };
            let ton_km = s.weight_tons * s.distance_km;
            ScenarioShipment {
                new_fuel_cost,
                scenario1_total,
                scenario3_total,
                scenario4_total: 0.0,
                ton_km,
                cptk_original: s.total_cost / ton_km,
                cptk_scenario1: scenario1_total / ton_km,
                cptk_scenario3: scenario3_total / ton_km,
                cptk_scenario4: 0.0,
                weight_category: WeightCategory::from_tons(s.weight_tons),
                base: s.clone(),
            }
        })
        .collect();

    // Scenario 4 needs the cheapest Scenario 3 cost on each route.
    let mut route_min: HashMap<(String, String), f64> = HashMap::new();
    for row in &rows {
        let key = (row.base.origin.clone(), row.base.destination.clone());
        route_min
            .entry(key)
            .and_modify(|m| {
                if row.scenario3_total < *m {
                    *m = row.scenario3_total;
                }
            })
            .or_insert(row.scenario3_total);
    }
    for row in rows.iter_mut() {
        let min = route_min[&(row.base.origin.clone(), row.base.destination.clone())];
        row.scenario4_total =
            OWN_CARRIER_SHARE * row.scenario3_total + CHEAPEST_CARRIER_SHARE * min;
        row.cptk_scenario4 = row.scenario4_total / row.ton_km;
    }

    rows
}

/// Scenario 2: group shipments by (Origin, Destination), sum costs and
/// weight, average distance, and apply the consolidation discount to the
/// route-summed Scenario 1 cost. Groups appear in first-encounter order.
pub fn consolidate_routes(rows: &[ScenarioShipment]) -> Vec<ConsolidatedRoute> {
    struct RouteAcc {
        total_cost: f64,
        fuel_cost: f64,
        scenario1_total: f64,
        weight_tons: f64,
        distance_sum: f64,
        count: usize,
    }

    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut keys: Vec<(String, String)> = Vec::new();
    let mut accs: Vec<RouteAcc> = Vec::new();

    for row in rows {
        let key = (row.base.origin.clone(), row.base.destination.clone());
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            accs.push(RouteAcc {
                total_cost: 0.0,
                fuel_cost: 0.0,
                scenario1_total: 0.0,
                weight_tons: 0.0,
                distance_sum: 0.0,
                count: 0,
            });
            accs.len() - 1
        });
        let acc = &mut accs[slot];
        acc.total_cost += row.base.total_cost;
        acc.fuel_cost += row.base.fuel_cost;
        acc.scenario1_total += row.scenario1_total;
        acc.weight_tons += row.base.weight_tons;
        acc.distance_sum += row.base.distance_km;
        acc.count += 1;
    }

    keys.into_iter()
        .zip(accs)
        .map(|((origin, destination), acc)| ConsolidatedRoute {
            origin,
            destination,
            total_cost: acc.total_cost,
            fuel_cost: acc.fuel_cost,
            scenario1_total: acc.scenario1_total,
            weight_tons: acc.weight_tons,
            mean_distance_km: acc.distance_sum / acc.count as f64,
            scenario2_total: acc.scenario1_total * CONSOLIDATION_FACTOR,
        })
        .collect()
}
