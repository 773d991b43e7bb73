//! Offline freight-shipment cost analysis.
//!
//! Two batch stages over an in-memory table: a cleaning stage that repairs
//! raw shipment and fuel-price data and derives base KPIs, and a scenario
//! stage that evaluates what-if cost scenarios (fuel price increase, route
//! consolidation, mode shift, carrier optimization) and aggregates them into
//! comparison tables.

pub mod aggregate;
pub mod cleaning;
pub mod error;
pub mod io;
pub mod models;
pub mod report;
pub mod scenarios;
pub mod stats;
