//! CSV wire contract: column-named tabular inputs and outputs, plus the
//! chart-series JSON export.
//!
//! Every reader validates the header against the columns its stage requires
//! before touching a row; a missing column is a fatal precondition failure
//! naming every absent column at once.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tracing::warn;

use crate::aggregate::{CarrierCost, RouteCost, RouteCptk, SummaryRow, WeightImpactRow};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{RawFuelRow, RawShipmentRow, Shipment};
use crate::scenarios::{ConsolidatedRoute, ScenarioShipment};

/// Columns the cleaning stage requires on the shipment source.
pub const RAW_SHIPMENT_COLUMNS: [&str; 12] = [
    "ShipmentID",
    "Origin",
    "Destination",
    "Route",
    "Mode",
    "Carrier",
    "ShipDate",
    "Distance_km",
    "Weight_tons",
    "BaseCost",
    "FuelCost",
    "OtherCost",
];

/// Columns the cleaning stage requires on the fuel-price source.
pub const FUEL_COLUMNS: [&str; 2] = ["Date", "FuelPrice"];

/// Columns the scenario engine requires on the cleaned table.
pub const SCENARIO_REQUIRED_COLUMNS: [&str; 8] = [
    "Origin",
    "Destination",
    "TotalCost",
    "FuelCost",
    "Mode",
    "Carrier",
    "Weight_tons",
    "Distance_km",
];

/// Full header of the cleaned shipment table as the cleaning stage writes it.
pub const CLEANED_COLUMNS: [&str; 16] = [
    "ShipmentID",
    "Origin",
    "Destination",
    "Route",
    "Mode",
    "Carrier",
    "ShipDate",
    "Distance_km",
    "Weight_tons",
    "BaseCost",
    "FuelCost",
    "OtherCost",
    "TotalCost",
    "Cost_per_TonKm",
    "Fuel_Percentage",
    "FuelPrice",
];

const CONSOLIDATED_COLUMNS: [&str; 8] = [
    "Origin",
    "Destination",
    "TotalCost",
    "FuelCost",
    "Scenario1_TotalCost",
    "Weight_tons",
    "Distance_km",
    "Scenario2_TotalCost",
];

const WEIGHT_IMPACT_COLUMNS: [&str; 5] = [
    "Weight_Category",
    "TotalCost",
    "Scenario4_TotalCost",
    "Weight_tons",
    "Cost_Contribution_%",
];

const SUMMARY_COLUMNS: [&str; 4] = ["Scenario", "Total Cost", "Avg CPTK", "Cost Reduction %"];

const ROUTE_COST_COLUMNS: [&str; 3] = ["Origin", "Destination", "TotalCost"];

const ROUTE_CPTK_COLUMNS: [&str; 3] = ["Origin", "Destination", "CPTK_Original"];

const CARRIER_COLUMNS: [&str; 2] = ["Carrier", "Scenario4_TotalCost"];

/// Header of the full scenario table (cleaned columns plus everything the
/// scenario engine appends).
const SCENARIO_TABLE_COLUMNS: [&str; 26] = [
    "ShipmentID",
    "Origin",
    "Destination",
    "Route",
    "Mode",
    "Carrier",
    "ShipDate",
    "Distance_km",
    "Weight_tons",
    "BaseCost",
    "FuelCost",
    "OtherCost",
    "TotalCost",
    "Cost_per_TonKm",
    "Fuel_Percentage",
    "FuelPrice",
    "New_Fuel_Cost",
    "Scenario1_TotalCost",
    "Scenario3_TotalCost",
    "Scenario4_TotalCost",
    "Ton_Km",
    "CPTK_Original",
    "CPTK_Scenario1",
    "CPTK_Scenario3",
    "CPTK_Scenario4",
    "Weight_Category",
];

/// Fail with every missing column named, not just the first.
pub fn check_required_columns(
    headers: &StringRecord,
    required: &[&str],
    stage: &'static str,
) -> PipelineResult<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns {
            stage,
            columns: missing,
        })
    }
}

/// Read the raw shipment source. Rows that fail CSV deserialization are
/// skipped with a warning; missing cells come through as `None` for the
/// cleaning stage to repair.
pub fn read_raw_shipments<R: Read>(reader: R) -> PipelineResult<Vec<RawShipmentRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    check_required_columns(rdr.headers()?, &RAW_SHIPMENT_COLUMNS, "cleaning stage")?;
    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<RawShipmentRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("skipping unreadable shipment row {}: {e}", i + 1),
        }
    }
    Ok(rows)
}

/// Read the raw fuel-price source.
pub fn read_fuel_rows<R: Read>(reader: R) -> PipelineResult<Vec<RawFuelRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    check_required_columns(rdr.headers()?, &FUEL_COLUMNS, "cleaning stage")?;
    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize::<RawFuelRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("skipping unreadable fuel row {}: {e}", i + 1),
        }
    }
    Ok(rows)
}

/// Read a cleaned shipment table produced by the cleaning stage. The
/// scenario engine's required columns are checked first so their absence is
/// reported on its own; after that the full cleaned header is checked, since
/// every cleaned column feeds the scenario output table.
pub fn read_cleaned_shipments<R: Read>(reader: R) -> PipelineResult<Vec<Shipment>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    check_required_columns(rdr.headers()?, &SCENARIO_REQUIRED_COLUMNS, "scenario engine")?;
    check_required_columns(rdr.headers()?, &CLEANED_COLUMNS, "scenario engine")?;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<Shipment>() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn write_cleaned_shipments<W: Write>(writer: W, shipments: &[Shipment]) -> PipelineResult<()> {
    write_serialized(writer, &CLEANED_COLUMNS, shipments)
}

pub fn write_consolidated<W: Write>(writer: W, routes: &[ConsolidatedRoute]) -> PipelineResult<()> {
    write_serialized(writer, &CONSOLIDATED_COLUMNS, routes)
}

pub fn write_weight_impact<W: Write>(writer: W, rows: &[WeightImpactRow]) -> PipelineResult<()> {
    write_serialized(writer, &WEIGHT_IMPACT_COLUMNS, rows)
}

pub fn write_summary<W: Write>(writer: W, rows: &[SummaryRow]) -> PipelineResult<()> {
    write_serialized(writer, &SUMMARY_COLUMNS, rows)
}

pub fn write_top_routes_by_cost<W: Write>(writer: W, rows: &[RouteCost]) -> PipelineResult<()> {
    write_serialized(writer, &ROUTE_COST_COLUMNS, rows)
}

pub fn write_top_routes_by_cptk<W: Write>(writer: W, rows: &[RouteCptk]) -> PipelineResult<()> {
    write_serialized(writer, &ROUTE_CPTK_COLUMNS, rows)
}

pub fn write_carrier_costs<W: Write>(writer: W, rows: &[CarrierCost]) -> PipelineResult<()> {
    write_serialized(writer, &CARRIER_COLUMNS, rows)
}

/// The header row is written explicitly so an empty table still carries its
/// column names on the wire.
fn write_serialized<W: Write, T: Serialize>(
    writer: W,
    header: &[&str],
    rows: &[T],
) -> PipelineResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the full scenario table. Built record by record because the row is
/// a cleaned shipment plus appended columns.
pub fn write_scenario_table<W: Write>(writer: W, rows: &[ScenarioShipment]) -> PipelineResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SCENARIO_TABLE_COLUMNS)?;
    for row in rows {
        let s = &row.base;
        let record: [String; 26] = [
            s.shipment_id.clone(),
            s.origin.clone(),
            s.destination.clone(),
            s.route.clone(),
            s.mode.clone(),
            s.carrier.clone(),
            s.ship_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            s.distance_km.to_string(),
            s.weight_tons.to_string(),
            s.base_cost.to_string(),
            s.fuel_cost.to_string(),
            s.other_cost.to_string(),
            s.total_cost.to_string(),
            s.cost_per_ton_km.to_string(),
            s.fuel_percentage.to_string(),
            s.fuel_price.map(|p| p.to_string()).unwrap_or_default(),
            row.new_fuel_cost.to_string(),
            row.scenario1_total.to_string(),
            row.scenario3_total.to_string(),
            row.scenario4_total.to_string(),
            row.ton_km.to_string(),
            row.cptk_original.to_string(),
            row.cptk_scenario1.to_string(),
            row.cptk_scenario3.to_string(),
            row.cptk_scenario4.to_string(),
            row.weight_category.label().to_string(),
        ];
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One named numeric series behind a chart. Drawing is someone else's job;
/// this is the data contract.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(title: &str, points: impl IntoIterator<Item = (String, f64)>) -> Self {
        let (labels, values) = points.into_iter().unzip();
        ChartSeries {
            title: title.to_string(),
            labels,
            values,
        }
    }
}

pub fn write_chart_series<W: Write>(writer: W, series: &[ChartSeries]) -> PipelineResult<()> {
    serde_json::to_writer_pretty(writer, series)?;
    Ok(())
}
