//! Unit conversion tools.
//!
//! Tools: convert_units
//!
//! Length and weight convert through a base unit (metres, grams); temperature
//! converts through kelvin. Unit names are case-insensitive.

use super::{ToolResult, get_f64_arg, get_string_arg};
use crate::ToolError;
use crate::schema;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use toolhub_types::ToolDef;

pub(super) const CONVERT_UNITS: &str = "convert_units";

/// Metres per unit.
const LENGTH_UNITS: &[(&str, f64)] = &[
    ("km", 1000.0),
    ("m", 1.0),
    ("miles", 1609.344),
    ("ft", 0.3048),
    ("in", 0.0254),
];

/// Grams per unit.
const WEIGHT_UNITS: &[(&str, f64)] = &[
    ("kg", 1000.0),
    ("g", 1.0),
    ("lbs", 453.592_37),
    ("oz", 28.349_523_125),
];

const TEMPERATURE_UNITS: &[&str] = &["celsius", "fahrenheit", "kelvin"];

/// Kind of quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Length,
    Weight,
    Temperature,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 3] = [
        UnitCategory::Length,
        UnitCategory::Weight,
        UnitCategory::Temperature,
    ];

    pub fn units(self) -> Vec<&'static str> {
        match self {
            UnitCategory::Length => LENGTH_UNITS.iter().map(|(u, _)| *u).collect(),
            UnitCategory::Weight => WEIGHT_UNITS.iter().map(|(u, _)| *u).collect(),
            UnitCategory::Temperature => TEMPERATURE_UNITS.to_vec(),
        }
    }
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub original_value: f64,
    pub original_unit: String,
    /// Rounded to 4 decimal places.
    pub converted_value: f64,
    pub converted_unit: String,
    pub category: UnitCategory,
    pub success: bool,
}

/// Returned when no category contains both units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsupportedConversion {
    pub error: String,
    pub supported_categories: Vec<UnitCategory>,
    pub supported_units: BTreeMap<UnitCategory, Vec<&'static str>>,
}

impl UnsupportedConversion {
    fn new(from_unit: &str, to_unit: &str) -> Self {
        Self {
            error: format!("Unsupported conversion from '{from_unit}' to '{to_unit}'"),
            supported_categories: UnitCategory::ALL.to_vec(),
            supported_units: UnitCategory::ALL.iter().map(|c| (*c, c.units())).collect(),
        }
    }
}

pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        CONVERT_UNITS,
        "Convert a value between units of length (km, m, miles, ft, in), weight \
         (kg, g, lbs, oz) or temperature (celsius, fahrenheit, kelvin). \
         Unsupported pairs return an object listing the supported units.",
        schema!(object {
            required: { "value": number, "from_unit": string, "to_unit": string }
        }),
    )]
}

pub fn dispatch(name: &str, args: Map<String, JsonValue>) -> ToolResult<JsonValue> {
    match name {
        CONVERT_UNITS => {
            let value = get_f64_arg(&args, "value")?;
            let from_unit = get_string_arg(&args, "from_unit")?;
            let to_unit = get_string_arg(&args, "to_unit")?;
            let json = match convert_units(value, &from_unit, &to_unit) {
                Ok(conversion) => serde_json::to_value(conversion),
                Err(unsupported) => serde_json::to_value(unsupported),
            };
            json.map_err(|e| ToolError::Failed(e.to_string()))
        }
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

/// Convert `value` from one unit to another.
pub fn convert_units(
    value: f64,
    from_unit: &str,
    to_unit: &str,
) -> Result<Conversion, UnsupportedConversion> {
    let from = from_unit.to_lowercase();
    let to = to_unit.to_lowercase();

    let (converted, category) = if let Some(v) = convert_linear(LENGTH_UNITS, value, &from, &to) {
        (v, UnitCategory::Length)
    } else if let Some(v) = convert_linear(WEIGHT_UNITS, value, &from, &to) {
        (v, UnitCategory::Weight)
    } else if let Some(v) = convert_temperature(value, &from, &to) {
        (v, UnitCategory::Temperature)
    } else {
        return Err(UnsupportedConversion::new(from_unit, to_unit));
    };

    Ok(Conversion {
        original_value: value,
        original_unit: from_unit.to_string(),
        converted_value: round4(converted),
        converted_unit: to_unit.to_string(),
        category,
        success: true,
    })
}

fn factor(table: &[(&str, f64)], unit: &str) -> Option<f64> {
    table.iter().find(|(u, _)| *u == unit).map(|(_, f)| *f)
}

fn convert_linear(table: &[(&str, f64)], value: f64, from: &str, to: &str) -> Option<f64> {
    Some(value * factor(table, from)? / factor(table, to)?)
}

fn convert_temperature(value: f64, from: &str, to: &str) -> Option<f64> {
    let kelvin = match from {
        "celsius" => value + 273.15,
        "fahrenheit" => (value - 32.0) * 5.0 / 9.0 + 273.15,
        "kelvin" => value,
        _ => return None,
    };
    match to {
        "celsius" => Some(kelvin - 273.15),
        "fahrenheit" => Some((kelvin - 273.15) * 9.0 / 5.0 + 32.0),
        "kelvin" => Some(kelvin),
        _ => None,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
