use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};

/// Raw shipment row as it arrives from CSV. Every value field is nullable;
/// the cleaning stage repairs or drops what it can't use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawShipmentRow {
    #[serde(rename = "ShipmentID")]
    pub shipment_id: Option<String>,
    #[serde(rename = "Origin")]
    pub origin: Option<String>,
    #[serde(rename = "Destination")]
    pub destination: Option<String>,
    #[serde(rename = "Route")]
    pub route: Option<String>,
    #[serde(rename = "Mode")]
    pub mode: Option<String>,
    #[serde(rename = "Carrier")]
    pub carrier: Option<String>,
    #[serde(rename = "ShipDate")]
    pub ship_date: Option<String>,
    #[serde(rename = "Distance_km")]
    pub distance_km: Option<f64>,
    #[serde(rename = "Weight_tons")]
    pub weight_tons: Option<f64>,
    #[serde(rename = "BaseCost")]
    pub base_cost: Option<f64>,
    #[serde(rename = "FuelCost")]
    pub fuel_cost: Option<f64>,
    #[serde(rename = "OtherCost")]
    pub other_cost: Option<f64>,
}

/// Raw fuel-price row: one observation per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFuelRow {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "FuelPrice")]
    pub fuel_price: Option<f64>,
}

/// A fuel-price observation with a valid timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelPricePoint {
    pub date: NaiveDateTime,
    pub price: f64,
}

/// Cleaned, validated shipment with derived KPIs and the as-of joined fuel
/// price. `fuel_price` stays `None` for shipments dated before the earliest
/// fuel observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(rename = "ShipmentID")]
    pub shipment_id: String,
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "Route")]
    pub route: String,
    #[serde(rename = "Mode")]
    pub mode: String,
    #[serde(rename = "Carrier")]
    pub carrier: String,
    #[serde(rename = "ShipDate", with = "ship_date_format")]
    pub ship_date: NaiveDateTime,
    #[serde(rename = "Distance_km")]
    pub distance_km: f64,
    #[serde(rename = "Weight_tons")]
    pub weight_tons: f64,
    #[serde(rename = "BaseCost")]
    pub base_cost: f64,
    #[serde(rename = "FuelCost")]
    pub fuel_cost: f64,
    #[serde(rename = "OtherCost")]
    pub other_cost: f64,
    #[serde(rename = "TotalCost")]
    pub total_cost: f64,
    #[serde(rename = "Cost_per_TonKm")]
    pub cost_per_ton_km: f64,
    #[serde(rename = "Fuel_Percentage")]
    pub fuel_percentage: f64,
    #[serde(rename = "FuelPrice")]
    pub fuel_price: Option<f64>,
}

impl Shipment {
    /// Case-insensitive check used by the mode-shift scenario.
    pub fn is_air(&self) -> bool {
        self.mode.eq_ignore_ascii_case("air")
    }
}

/// Parse a timestamp from the handful of formats the raw feeds use.
/// Failures are `None`; the caller decides whether that drops the row.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// ShipDate wire format for the cleaned table: ISO without timezone, parsed
/// back through the same lenient parser the cleaning stage uses.
mod ship_date_format {
    use super::parse_timestamp;
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(de)?;
        parse_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ShipDate: {s}")))
    }
}

/// Weight class for the weight-impact analysis. Buckets are left-inclusive,
/// right-exclusive, with everything from 50 t up in the open-ended top class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightCategory {
    UpTo5,
    From5To10,
    From10To20,
    From20To30,
    From30To50,
    Over50,
}

impl WeightCategory {
    /// All categories in ascending weight order.
    pub const ALL: [WeightCategory; 6] = [
        WeightCategory::UpTo5,
        WeightCategory::From5To10,
        WeightCategory::From10To20,
        WeightCategory::From20To30,
        WeightCategory::From30To50,
        WeightCategory::Over50,
    ];

    pub fn from_tons(weight_tons: f64) -> Self {
        if weight_tons < 5.0 {
            WeightCategory::UpTo5
        } else if weight_tons < 10.0 {
            WeightCategory::From5To10
        } else if weight_tons < 20.0 {
            WeightCategory::From10To20
        } else if weight_tons < 30.0 {
            WeightCategory::From20To30
        } else if weight_tons < 50.0 {
            WeightCategory::From30To50
        } else {
            WeightCategory::Over50
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightCategory::UpTo5 => "0-5",
            WeightCategory::From5To10 => "5-10",
            WeightCategory::From10To20 => "10-20",
            WeightCategory::From20To30 => "20-30",
            WeightCategory::From30To50 => "30-50",
            WeightCategory::Over50 => "50+",
        }
    }
}

impl std::fmt::Display for WeightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for WeightCategory {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("2024-03-01 08:30:00").is_some());
        assert!(parse_timestamp("2024-03-01T08:30:00").is_some());
        assert!(parse_timestamp("03/01/2024").is_some());
    }

    #[test]
    fn bad_timestamps_are_none_not_errors() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("2024-13-45").is_none());
    }

    #[test]
    fn weight_buckets_are_left_inclusive() {
        assert_eq!(WeightCategory::from_tons(0.0).label(), "0-5");
        assert_eq!(WeightCategory::from_tons(4.999).label(), "0-5");
        assert_eq!(WeightCategory::from_tons(5.0).label(), "5-10");
        assert_eq!(WeightCategory::from_tons(49.999).label(), "30-50");
        assert_eq!(WeightCategory::from_tons(50.0).label(), "50+");
        assert_eq!(WeightCategory::from_tons(120.0).label(), "50+");
    }

    #[test]
    fn air_mode_is_case_insensitive() {
        let mut s = sample_shipment();
        for mode in ["Air", "AIR", "air"] {
            s.mode = mode.to_string();
            assert!(s.is_air());
        }
        s.mode = "Rail".to_string();
        assert!(!s.is_air());
    }

    fn sample_shipment() -> Shipment {
        Shipment {
            shipment_id: "S1".into(),
            origin: "Hamburg".into(),
            destination: "Munich".into(),
            route: "Hamburg-Munich".into(),
            mode: "Road".into(),
            carrier: "ACME".into(),
            ship_date: parse_timestamp("2024-01-01").unwrap(),
            distance_km: 600.0,
            weight_tons: 12.0,
            base_cost: 100.0,
            fuel_cost: 50.0,
            other_cost: 10.0,
            total_cost: 160.0,
            cost_per_ton_km: 160.0 / (600.0 * 12.0),
            fuel_percentage: 100.0 * 50.0 / 160.0,
            fuel_price: None,
        }
    }
}
