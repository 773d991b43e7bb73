//! End-to-end pipeline test: raw CSV bytes through cleaning, the scenario
//! chain, and aggregation, checking the invariants each stage promises.

use freight_scenarios::models::RawShipmentRow;
use freight_scenarios::{aggregate, cleaning, io as tables, scenarios};

const TOL: f64 = 1e-9;

fn raw_csv() -> String {
    let mut csv = String::from(
        "ShipmentID,Origin,Destination,Route,Mode,Carrier,ShipDate,Distance_km,Weight_tons,BaseCost,FuelCost,OtherCost\n",
    );
    let costs = [150.0, 155.0, 160.0, 165.0, 170.0];
    let modes = ["Air", "Rail", "Road"];
    let carriers = ["TransEuro", "CargoLine", "SwiftFreight"];
    for i in 0..30 {
        let base = costs[i % costs.len()];
        csv.push_str(&format!(
            "SHP{i:03},Hamburg,Munich,Hamburg-Munich,{},{},2024-{:02}-15,600,{},{},40,10\n",
            modes[i % modes.len()],
            carriers[i % carriers.len()],
            (i % 12) + 1,
            5.0 + (i % 10) as f64 * 5.5,
            base,
        ));
    }
    // defects the cleaner must repair or drop
    csv.push_str("SHP000,Hamburg,Munich,Hamburg-Munich,Road,TransEuro,2024-06-01,600,10,150,40,10\n"); // duplicate ID
    csv.push_str("BADDATE,Hamburg,Munich,Hamburg-Munich,Road,TransEuro,someday,600,10,150,40,10\n");
    csv.push_str("ZERODIST,Hamburg,Munich,Hamburg-Munich,Road,TransEuro,2024-06-02,0,10,150,40,10\n");
    csv.push_str("OUTLIER,Hamburg,Munich,Hamburg-Munich,Road,TransEuro,2024-06-03,600,10,1000000,40,10\n");
    csv.push_str("MISSING,,Munich,Hamburg-Munich,,TransEuro,2024-06-04,600,,150,40,10\n");
    csv
}

const FUEL_CSV: &str = "Date,FuelPrice\n2024-01-20,1.45\n2024-04-10,1.55\n2024-08-10,1.65\n";

#[test]
fn full_pipeline_upholds_stage_invariants() {
    let raw = tables::read_raw_shipments(raw_csv().as_bytes()).unwrap();
    let fuel = tables::read_fuel_rows(FUEL_CSV.as_bytes()).unwrap();
    let (cleaned, report) = cleaning::clean(raw, &fuel);

    // repairs and drops are counted, not raised
    assert_eq!(report.invalid_date_rows, 1);
    assert_eq!(report.duplicate_rows, 1);
    assert_eq!(report.nonpositive_rows, 1);
    assert!(report.outlier_rows >= 1);
    assert!(report.cells_imputed() >= 2); // Origin, Mode, Weight_tons on MISSING

    // cleaned-table invariants
    let mut ids: Vec<&str> = cleaned.iter().map(|s| s.shipment_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), cleaned.len(), "ShipmentID not unique");
    assert!(cleaned.iter().all(|s| s.distance_km > 0.0 && s.weight_tons > 0.0));
    assert!(!cleaned.iter().any(|s| s.shipment_id == "OUTLIER"));
    assert!(cleaned.windows(2).all(|w| w[0].ship_date <= w[1].ship_date));

    // as-of join: January 15 shipments predate the first observation
    let january = cleaned
        .iter()
        .find(|s| s.ship_date.format("%m").to_string() == "01")
        .unwrap();
    assert_eq!(january.fuel_price, None);
    let june = cleaned
        .iter()
        .find(|s| s.ship_date.format("%m").to_string() == "06")
        .unwrap();
    assert_eq!(june.fuel_price, Some(1.55));

    // scenario chain
    let rows = scenarios::extend(&cleaned);
    for row in &rows {
        let s1_expected = row.base.total_cost - row.base.fuel_cost + row.base.fuel_cost * 1.10;
        assert!((row.scenario1_total - s1_expected).abs() < TOL);
        if row.base.is_air() {
            assert!((row.scenario3_total - row.scenario1_total * 0.97).abs() < TOL);
        } else {
            assert!((row.scenario3_total - row.scenario1_total).abs() < TOL);
        }
        assert!(row.scenario4_total <= row.scenario3_total + TOL);
    }
    let original: f64 = rows.iter().map(|r| r.base.total_cost).sum();
    let scenario1: f64 = rows.iter().map(|r| r.scenario1_total).sum();
    assert!(scenario1 >= original, "fuel increase cannot cut total cost");

    // consolidation and summary
    let consolidated = scenarios::consolidate_routes(&rows);
    let route_s1: f64 = rows.iter().map(|r| r.scenario1_total).sum();
    let cons_s1: f64 = consolidated.iter().map(|c| c.scenario1_total).sum();
    assert!((route_s1 - cons_s1).abs() < 1e-6);
    for route in &consolidated {
        assert!((route.scenario2_total - route.scenario1_total * 0.90).abs() < TOL);
    }

    let summary = aggregate::summary(&rows, &consolidated);
    assert_eq!(summary[0].scenario, "Original");
    assert_eq!(summary[0].cost_reduction_pct, 0.0);
    assert!((summary[1].total_cost - scenario1).abs() < 1e-6);
    assert!(summary[4].total_cost <= summary[3].total_cost + TOL);

    let impact = aggregate::weight_impact(&rows);
    let share: f64 = impact.iter().map(|w| w.cost_contribution_pct).sum();
    assert!((share - 100.0).abs() < 1e-6);
}

#[test]
fn cleaned_output_survives_a_csv_round_trip_into_the_scenario_stage() {
    let raw = tables::read_raw_shipments(raw_csv().as_bytes()).unwrap();
    let fuel = tables::read_fuel_rows(FUEL_CSV.as_bytes()).unwrap();
    let (cleaned, _) = cleaning::clean(raw, &fuel);

    let mut buf = Vec::new();
    tables::write_cleaned_shipments(&mut buf, &cleaned).unwrap();
    let reloaded = tables::read_cleaned_shipments(buf.as_slice()).unwrap();

    assert_eq!(reloaded.len(), cleaned.len());
    for (a, b) in reloaded.iter().zip(cleaned.iter()) {
        assert_eq!(a.shipment_id, b.shipment_id);
        assert_eq!(a.ship_date, b.ship_date);
        assert!((a.total_cost - b.total_cost).abs() < TOL);
        assert_eq!(a.fuel_price, b.fuel_price);
    }

    // the reloaded table feeds the scenario stage identically
    let direct = scenarios::extend(&cleaned);
    let via_csv = scenarios::extend(&reloaded);
    for (a, b) in direct.iter().zip(via_csv.iter()) {
        assert!((a.scenario4_total - b.scenario4_total).abs() < TOL);
    }
}

#[test]
fn recleaning_clean_data_changes_nothing() {
    let raw = tables::read_raw_shipments(raw_csv().as_bytes()).unwrap();
    let fuel = tables::read_fuel_rows(FUEL_CSV.as_bytes()).unwrap();
    let (cleaned, _) = cleaning::clean(raw, &fuel);

    let again: Vec<RawShipmentRow> = cleaned
        .iter()
        .map(|s| RawShipmentRow {
            shipment_id: Some(s.shipment_id.clone()),
            origin: Some(s.origin.clone()),
            destination: Some(s.destination.clone()),
            route: Some(s.route.clone()),
            mode: Some(s.mode.clone()),
            carrier: Some(s.carrier.clone()),
            ship_date: Some(s.ship_date.format("%Y-%m-%dT%H:%M:%S").to_string()),
            distance_km: Some(s.distance_km),
            weight_tons: Some(s.weight_tons),
            base_cost: Some(s.base_cost),
            fuel_cost: Some(s.fuel_cost),
            other_cost: Some(s.other_cost),
        })
        .collect();
    let (recleaned, report) = cleaning::clean(again, &fuel);
    assert!(report.is_noop(), "second pass repaired something: {report:?}");
    assert_eq!(recleaned.len(), cleaned.len());
}
