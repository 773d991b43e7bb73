//! Cleaning stage: repair raw shipment rows, derive base KPIs, and time-align
//! each shipment with the most recent known fuel price.
//!
//! Repairs are recoveries, not errors: nothing here fails, but every repair
//! is counted in [`CleaningReport`] so callers can log what happened.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::models::{parse_timestamp, FuelPricePoint, RawFuelRow, RawShipmentRow, Shipment};
use crate::stats;

/// Counts of rows repaired or dropped, keyed by the step that touched them.
#[derive(Debug, Default, Clone)]
pub struct CleaningReport {
    pub input_rows: usize,
    /// Imputed cell counts per column (median for numerics, mode for
    /// categoricals).
    pub imputed: BTreeMap<&'static str, usize>,
    pub invalid_date_rows: usize,
    pub duplicate_rows: usize,
    pub nonpositive_rows: usize,
    pub outlier_rows: usize,
    pub fuel_rows_dropped: usize,
    pub output_rows: usize,
}

impl CleaningReport {
    pub fn cells_imputed(&self) -> usize {
        self.imputed.values().sum()
    }

    /// True when the pass neither imputed nor dropped anything, i.e. the
    /// input was already clean.
    pub fn is_noop(&self) -> bool {
        self.cells_imputed() == 0
            && self.invalid_date_rows == 0
            && self.duplicate_rows == 0
            && self.nonpositive_rows == 0
            && self.outlier_rows == 0
    }
}

/// Run the whole cleaning pipeline. Output shipments are sorted by ShipDate
/// ascending with fuel prices attached via as-of join.
///
/// The outlier band is recomputed from whatever distribution this call is
/// handed. Re-cleaning an already-clean table is only a no-op when the
/// extreme TotalCost values repeat enough to pin the 1st/99th percentiles;
/// with all-distinct costs each pass trims a fresh pair of extremes.
pub fn clean(
    mut raw: Vec<RawShipmentRow>,
    raw_fuel: &[RawFuelRow],
) -> (Vec<Shipment>, CleaningReport) {
    let mut report = CleaningReport {
        input_rows: raw.len(),
        ..CleaningReport::default()
    };

    impute_missing(&mut raw, &mut report);

    // Parse ShipDate; a row whose date can't be parsed is unusable for the
    // as-of join and gets dropped rather than guessed at.
    let mut shipments: Vec<Shipment> = Vec::with_capacity(raw.len());
    let mut seen_ids: HashSet<String> = HashSet::new();
    for row in raw {
        let Some(ship_date) = row.ship_date.as_deref().and_then(parse_timestamp) else {
            report.invalid_date_rows += 1;
            continue;
        };
        let shipment_id = row.shipment_id.unwrap_or_default();
        if !seen_ids.insert(shipment_id.clone()) {
            report.duplicate_rows += 1;
            continue;
        }
        let distance_km = row.distance_km.unwrap_or(f64::NAN);
        let weight_tons = row.weight_tons.unwrap_or(f64::NAN);
        let base_cost = row.base_cost.unwrap_or(f64::NAN);
        let fuel_cost = row.fuel_cost.unwrap_or(f64::NAN);
        let other_cost = row.other_cost.unwrap_or(f64::NAN);
        let total_cost = base_cost + fuel_cost + other_cost;
        shipments.push(Shipment {
            shipment_id,
            origin: row.origin.unwrap_or_default(),
            destination: row.destination.unwrap_or_default(),
            route: row.route.unwrap_or_default(),
            mode: row.mode.unwrap_or_default(),
            carrier: row.carrier.unwrap_or_default(),
            ship_date,
            distance_km,
            weight_tons,
            base_cost,
            fuel_cost,
            other_cost,
            total_cost,
            cost_per_ton_km: total_cost / (distance_km * weight_tons),
            fuel_percentage: 100.0 * fuel_cost / total_cost,
            fuel_price: None,
        });
    }

    // Zero or negative dimensions make every per-ton-km figure meaningless.
    let before = shipments.len();
    shipments.retain(|s| s.distance_km > 0.0 && s.weight_tons > 0.0);
    report.nonpositive_rows = before - shipments.len();

    // Trim TotalCost outliers to the [1st, 99th] percentile band of the
    // current distribution, bounds inclusive.
    let costs: Vec<f64> = shipments.iter().map(|s| s.total_cost).collect();
    if let (Some(q_low), Some(q_high)) = (
        stats::percentile(&costs, 1.0),
        stats::percentile(&costs, 99.0),
    ) {
        let before = shipments.len();
        shipments.retain(|s| s.total_cost >= q_low && s.total_cost <= q_high);
        report.outlier_rows = before - shipments.len();
        debug!(q_low, q_high, dropped = report.outlier_rows, "trimmed TotalCost outliers");
    }

    shipments.sort_by_key(|s| s.ship_date);

    let (fuel, fuel_dropped) = fuel_points(raw_fuel);
    report.fuel_rows_dropped = fuel_dropped;
    attach_fuel_prices(&mut shipments, &fuel);

    report.output_rows = shipments.len();
    (shipments, report)
}

/// Parse the fuel feed into dated points sorted ascending. Rows with an
/// unparseable date or no price can't join and are dropped (counted).
pub fn fuel_points(raw: &[RawFuelRow]) -> (Vec<FuelPricePoint>, usize) {
    let mut points: Vec<FuelPricePoint> = Vec::with_capacity(raw.len());
    let mut dropped = 0;
    for row in raw {
        match (row.date.as_deref().and_then(parse_timestamp), row.fuel_price) {
            (Some(date), Some(price)) => points.push(FuelPricePoint { date, price }),
            _ => dropped += 1,
        }
    }
    points.sort_by_key(|p| p.date);
    (points, dropped)
}

/// As-of join: each shipment takes the price of the latest fuel observation
/// dated at or before its ShipDate. Shipments earlier than every observation
/// keep `fuel_price = None`. Both slices must be sorted by date ascending.
pub fn attach_fuel_prices(shipments: &mut [Shipment], fuel: &[FuelPricePoint]) {
    let mut next = 0usize;
    let mut latest: Option<f64> = None;
    for shipment in shipments.iter_mut() {
        while next < fuel.len() && fuel[next].date <= shipment.ship_date {
            latest = Some(fuel[next].price);
            next += 1;
        }
        shipment.fuel_price = latest;
    }
}

fn impute_missing(rows: &mut [RawShipmentRow], report: &mut CleaningReport) {
    impute_numeric(rows, "Distance_km", |r| r.distance_km, |r, v| r.distance_km = Some(v), report);
    impute_numeric(rows, "Weight_tons", |r| r.weight_tons, |r, v| r.weight_tons = Some(v), report);
    impute_numeric(rows, "BaseCost", |r| r.base_cost, |r, v| r.base_cost = Some(v), report);
    impute_numeric(rows, "FuelCost", |r| r.fuel_cost, |r, v| r.fuel_cost = Some(v), report);
    impute_numeric(rows, "OtherCost", |r| r.other_cost, |r, v| r.other_cost = Some(v), report);

    impute_categorical(rows, "Origin", |r| &mut r.origin, report);
    impute_categorical(rows, "Destination", |r| &mut r.destination, report);
    impute_categorical(rows, "Route", |r| &mut r.route, report);
    impute_categorical(rows, "Mode", |r| &mut r.mode, report);
    impute_categorical(rows, "Carrier", |r| &mut r.carrier, report);
}

/// Fill missing cells in one numeric column with the column median over the
/// observed values. A column with no observations at all is left missing.
fn impute_numeric(
    rows: &mut [RawShipmentRow],
    column: &'static str,
    get: impl Fn(&RawShipmentRow) -> Option<f64>,
    set: impl Fn(&mut RawShipmentRow, f64),
    report: &mut CleaningReport,
) {
    let observed: Vec<f64> = rows.iter().filter_map(&get).collect();
    let Some(fill) = stats::median(&observed) else {
        return;
    };
    let mut filled = 0;
    for row in rows.iter_mut() {
        if get(row).is_none() {
            set(row, fill);
            filled += 1;
        }
    }
    if filled > 0 {
        debug!(column, filled, fill, "imputed numeric column with median");
        report.imputed.insert(column, filled);
    }
}

/// Fill missing cells in one categorical column with the column mode; ties
/// go to the value seen first in row order.
fn impute_categorical(
    rows: &mut [RawShipmentRow],
    column: &'static str,
    field: fn(&mut RawShipmentRow) -> &mut Option<String>,
    report: &mut CleaningReport,
) {
    let mut observed: Vec<String> = Vec::new();
    for row in rows.iter_mut() {
        if let Some(v) = field(row) {
            observed.push(v.clone());
        }
    }
    let Some(fill) = stats::mode(observed.iter().map(String::as_str)).map(str::to_owned) else {
        return;
    };
    let mut filled = 0;
    for row in rows.iter_mut() {
        let cell = field(row);
        if cell.is_none() {
            *cell = Some(fill.clone());
            filled += 1;
        }
    }
    if filled > 0 {
        debug!(column, fill = fill.as_str(), filled, "imputed categorical column with mode");
        report.imputed.insert(column, filled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, date: &str) -> RawShipmentRow {
        RawShipmentRow {
            shipment_id: Some(id.to_string()),
            origin: Some("Hamburg".into()),
            destination: Some("Munich".into()),
            route: Some("Hamburg-Munich".into()),
            mode: Some("Road".into()),
            carrier: Some("ACME".into()),
            ship_date: Some(date.to_string()),
            distance_km: Some(600.0),
            weight_tons: Some(10.0),
            base_cost: Some(100.0),
            fuel_cost: Some(50.0),
            other_cost: Some(10.0),
        }
    }

    fn fuel_row(date: &str, price: f64) -> RawFuelRow {
        RawFuelRow {
            date: Some(date.to_string()),
            fuel_price: Some(price),
        }
    }

    #[test]
    fn imputes_numeric_with_median_and_categorical_with_mode() {
        let mut rows = vec![
            raw("S1", "2024-01-01"),
            raw("S2", "2024-01-02"),
            raw("S3", "2024-01-03"),
            raw("S4", "2024-01-04"),
        ];
        rows[0].weight_tons = None;
        rows[1].weight_tons = Some(20.0);
        rows[2].weight_tons = Some(30.0);
        // medians over {20, 30, 10} -> 20
        rows[3].weight_tons = Some(10.0);
        rows[1].mode = Some("Rail".into());
        rows[2].mode = None;
        // modes over {Road, Rail, Road} -> Road

        let (cleaned, report) = clean(rows, &[]);
        assert_eq!(report.imputed.get("Weight_tons"), Some(&1));
        assert_eq!(report.imputed.get("Mode"), Some(&1));
        let s1 = cleaned.iter().find(|s| s.shipment_id == "S1").unwrap();
        assert!((s1.weight_tons - 20.0).abs() < 1e-9);
        let s3 = cleaned.iter().find(|s| s.shipment_id == "S3").unwrap();
        assert_eq!(s3.mode, "Road");
    }

    #[test]
    fn drops_rows_with_unparseable_ship_date() {
        let rows = vec![raw("S1", "2024-01-01"), raw("S2", "not-a-date")];
        let (cleaned, report) = clean(rows, &[]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.invalid_date_rows, 1);
    }

    #[test]
    fn deduplicates_by_id_keeping_first_occurrence() {
        let mut second = raw("S1", "2024-02-01");
        second.base_cost = Some(999.0);
        let rows = vec![raw("S1", "2024-01-01"), second, raw("S2", "2024-01-05")];
        let (cleaned, report) = clean(rows, &[]);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(cleaned.len(), 2);
        let s1 = cleaned.iter().find(|s| s.shipment_id == "S1").unwrap();
        assert!((s1.base_cost - 100.0).abs() < 1e-9);
    }

    #[test]
    fn derives_kpis() {
        let (cleaned, _) = clean(vec![raw("S1", "2024-01-01")], &[]);
        let s = &cleaned[0];
        assert!((s.total_cost - 160.0).abs() < 1e-9);
        assert!((s.cost_per_ton_km - 160.0 / 6000.0).abs() < 1e-12);
        assert!((s.fuel_percentage - 100.0 * 50.0 / 160.0).abs() < 1e-9);
    }

    #[test]
    fn drops_nonpositive_distance_or_weight() {
        let mut zero_dist = raw("S2", "2024-01-02");
        zero_dist.distance_km = Some(0.0);
        let mut neg_weight = raw("S3", "2024-01-03");
        neg_weight.weight_tons = Some(-4.0);
        let rows = vec![raw("S1", "2024-01-01"), zero_dist, neg_weight];
        let (cleaned, report) = clean(rows, &[]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.nonpositive_rows, 2);
    }

    #[test]
    fn trims_total_cost_outliers_to_percentile_band() {
        let mut rows: Vec<RawShipmentRow> = (0..18)
            .map(|i| raw(&format!("S{i}"), "2024-01-01"))
            .collect();
        let mut cheap = raw("LOW", "2024-01-01");
        cheap.base_cost = Some(0.0);
        cheap.fuel_cost = Some(0.5);
        cheap.other_cost = Some(0.5);
        let mut dear = raw("HIGH", "2024-01-01");
        dear.base_cost = Some(99_940.0);
        dear.fuel_cost = Some(50.0);
        dear.other_cost = Some(10.0);
        rows.push(cheap);
        rows.push(dear);

        let (cleaned, report) = clean(rows, &[]);
        assert_eq!(report.outlier_rows, 2);
        assert_eq!(cleaned.len(), 18);
        assert!(cleaned.iter().all(|s| (s.total_cost - 160.0).abs() < 1e-9));
    }

    #[test]
    fn sorts_output_by_ship_date() {
        let rows = vec![raw("S1", "2024-03-01"), raw("S2", "2024-01-01"), raw("S3", "2024-02-01")];
        let (cleaned, _) = clean(rows, &[]);
        let ids: Vec<&str> = cleaned.iter().map(|s| s.shipment_id.as_str()).collect();
        assert_eq!(ids, ["S2", "S3", "S1"]);
    }

    #[test]
    fn as_of_join_uses_latest_observation_at_or_before_ship_date() {
        let rows = vec![
            raw("EARLY", "2024-01-01"),
            raw("MID", "2024-01-20"),
            raw("EXACT", "2024-02-01"),
        ];
        let fuel = vec![
            fuel_row("2024-01-10", 1.50),
            fuel_row("2024-02-01", 1.80),
        ];
        let (cleaned, _) = clean(rows, &fuel);
        let by_id = |id: &str| cleaned.iter().find(|s| s.shipment_id == id).unwrap();
        // predates every observation: absent, not zero
        assert_eq!(by_id("EARLY").fuel_price, None);
        assert_eq!(by_id("MID").fuel_price, Some(1.50));
        assert_eq!(by_id("EXACT").fuel_price, Some(1.80));
    }

    #[test]
    fn fuel_rows_without_date_or_price_are_dropped() {
        let fuel = vec![
            fuel_row("2024-01-10", 1.50),
            RawFuelRow { date: Some("garbage".into()), fuel_price: Some(1.0) },
            RawFuelRow { date: Some("2024-01-11".into()), fuel_price: None },
        ];
        let (points, dropped) = fuel_points(&fuel);
        assert_eq!(points.len(), 1);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn percentile_trim_is_relative_to_the_current_distribution() {
        // All-distinct costs: the interpolated q01/q99 fall strictly inside
        // the observed range, so every pass sheds its two extremes.
        let rows: Vec<RawShipmentRow> = (0..20)
            .map(|i| {
                let mut row = raw(&format!("S{i}"), "2024-01-01");
                row.base_cost = Some(100.0 + 10.0 * i as f64);
                row
            })
            .collect();

        let (cleaned, first) = clean(rows, &[]);
        assert_eq!(first.outlier_rows, 2);
        assert_eq!(cleaned.len(), 18);

        let again: Vec<RawShipmentRow> = cleaned
            .iter()
            .map(|s| {
                let mut row = raw(&s.shipment_id, "2024-01-01");
                row.base_cost = Some(s.base_cost);
                row
            })
            .collect();
        let (recleaned, second) = clean(again, &[]);
        assert!(!second.is_noop());
        assert_eq!(second.outlier_rows, 2);
        assert_eq!(recleaned.len(), 16);
    }

    #[test]
    fn cleaning_is_idempotent_on_its_own_output() {
        let mut rows: Vec<RawShipmentRow> = (0..12)
            .map(|i| raw(&format!("S{i}"), &format!("2024-01-{:02}", i + 1)))
            .collect();
        rows[3].mode = None;
        rows[7].distance_km = None;
        let fuel = vec![fuel_row("2024-01-01", 1.40)];

        let (cleaned, first) = clean(rows, &fuel);
        assert!(first.cells_imputed() > 0);

        // Feed the cleaned table back through as raw rows.
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
        let (recleaned, second) = clean(again, &fuel);

        assert!(second.is_noop(), "second pass repaired something: {second:?}");
        assert_eq!(recleaned.len(), cleaned.len());
        for (a, b) in recleaned.iter().zip(cleaned.iter()) {
            assert_eq!(a.shipment_id, b.shipment_id);
            assert!((a.total_cost - b.total_cost).abs() < 1e-9);
            assert_eq!(a.fuel_price, b.fuel_price);
        }
    }
}
