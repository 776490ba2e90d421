//! Field values, canonical units and number parsing.
//!
//! Datasheets from the same manufacturer mix decimal commas, thin-space
//! thousand separators and several units for the same quantity. Every
//! numeric value is converted to its field's canonical [`Unit`] before
//! it is compared or stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical units, one per numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "W/mK")]
    WattPerMetreKelvin,
    #[serde(rename = "m²K/W")]
    SquareMetreKelvinPerWatt,
    #[serde(rename = "W/m²K")]
    WattPerSquareMetreKelvin,
    #[serde(rename = "kg/m³")]
    KilogramPerCubicMetre,
    #[serde(rename = "kPa")]
    Kilopascal,
    #[serde(rename = "mm")]
    Millimetre,
    #[serde(rename = "J/kgK")]
    JoulePerKilogramKelvin,
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "kg/m²")]
    KilogramPerSquareMetre,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "-")]
    Dimensionless,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::WattPerMetreKelvin => "W/mK",
            Unit::SquareMetreKelvinPerWatt => "m²K/W",
            Unit::WattPerSquareMetreKelvin => "W/m²K",
            Unit::KilogramPerCubicMetre => "kg/m³",
            Unit::Kilopascal => "kPa",
            Unit::Millimetre => "mm",
            Unit::JoulePerKilogramKelvin => "J/kgK",
            Unit::Celsius => "°C",
            Unit::KilogramPerSquareMetre => "kg/m²",
            Unit::Hour => "h",
            Unit::Kilogram => "kg",
            Unit::Dimensionless => "-",
        }
    }

    /// Multiplier that converts a value written in `raw` into this unit.
    ///
    /// `None` or an empty token means the value is already canonical.
    /// Returns `None` when the token names a unit of a different quantity.
    pub fn factor_from(self, raw: Option<&str>) -> Option<f64> {
        let token = match raw {
            Some(t) => normalize_unit_token(t),
            None => return Some(1.0),
        };
        if token.is_empty() {
            return Some(1.0);
        }

        match self {
            Unit::WattPerMetreKelvin => match token.as_str() {
                "w/mk" | "w/(mk)" | "w/m.k" | "w/m-k" => Some(1.0),
                "mw/mk" | "mw/(mk)" | "mw/m.k" => Some(0.001),
                _ => None,
            },
            Unit::SquareMetreKelvinPerWatt => match token.as_str() {
                "m2k/w" | "(m2k)/w" | "m2.k/w" => Some(1.0),
                _ => None,
            },
            Unit::WattPerSquareMetreKelvin => match token.as_str() {
                "w/m2k" | "w/(m2k)" | "w/m2.k" => Some(1.0),
                _ => None,
            },
            Unit::KilogramPerCubicMetre => match token.as_str() {
                "kg/m3" => Some(1.0),
                "g/cm3" | "kg/dm3" | "kg/l" => Some(1000.0),
                _ => None,
            },
            Unit::Kilopascal => match token.as_str() {
                "kpa" | "kn/m2" => Some(1.0),
                "mpa" | "n/mm2" => Some(1000.0),
                "pa" | "n/m2" => Some(0.001),
                _ => None,
            },
            Unit::Millimetre => match token.as_str() {
                "mm" => Some(1.0),
                "cm" => Some(10.0),
                "m" => Some(1000.0),
                _ => None,
            },
            Unit::JoulePerKilogramKelvin => match token.as_str() {
                "j/kgk" | "j/(kgk)" | "j/kg.k" => Some(1.0),
                "kj/kgk" | "kj/(kgk)" | "kj/kg.k" => Some(1000.0),
                _ => None,
            },
            Unit::Celsius => match token.as_str() {
                "°c" | "c" | "oc" => Some(1.0),
                _ => None,
            },
            Unit::KilogramPerSquareMetre => match token.as_str() {
                "kg/m2" | "kg/(m2)" => Some(1.0),
                "g/m2" => Some(0.001),
                _ => None,
            },
            Unit::Hour => match token.as_str() {
                "h" | "hr" | "hrs" | "hours" | "óra" | "std" | "stunden" => Some(1.0),
                "min" | "perc" => Some(1.0 / 60.0),
                "d" | "days" | "nap" | "tage" => Some(24.0),
                _ => None,
            },
            Unit::Kilogram => match token.as_str() {
                "kg" => Some(1.0),
                "g" => Some(0.001),
                "t" => Some(1000.0),
                _ => None,
            },
            Unit::Dimensionless => Some(1.0),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Lowercase, drop whitespace and middle dots, fold superscripts.
fn normalize_unit_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '·' && *c != '⋅' && *c != '*')
        .map(|c| match c {
            '²' => '2',
            '³' => '3',
            'µ' | 'μ' => 'u',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValue {
    Number {
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<Unit>,
    },
    Range {
        min: f64,
        max: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<Unit>,
    },
    Text {
        value: String,
    },
}

impl FieldValue {
    pub fn number(value: f64, unit: Option<Unit>) -> Self {
        FieldValue::Number { value, unit }
    }

    /// A range; swapped bounds are reordered and equal bounds collapse to a number.
    pub fn range(a: f64, b: f64, unit: Option<Unit>) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        if min == max {
            FieldValue::Number { value: min, unit }
        } else {
            FieldValue::Range { min, max, unit }
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text {
            value: value.into(),
        }
    }

    /// Whether two values describe the same fact.
    ///
    /// Numbers compare within a relative `tolerance`; text compares
    /// case-insensitively with whitespace and punctuation folded.
    pub fn agrees_with(&self, other: &FieldValue, tolerance: f64) -> bool {
        match (self, other) {
            (FieldValue::Number { value: a, .. }, FieldValue::Number { value: b, .. }) => {
                approx_eq(*a, *b, tolerance)
            }
            (
                FieldValue::Range { min: a0, max: a1, .. },
                FieldValue::Range { min: b0, max: b1, .. },
            ) => approx_eq(*a0, *b0, tolerance) && approx_eq(*a1, *b1, tolerance),
            (FieldValue::Text { value: a }, FieldValue::Text { value: b }) => {
                fold_text(a) == fold_text(b)
            }
            _ => false,
        }
    }

    /// Short display string, e.g. `0.035 W/mK` or `A1`.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Number { value, unit } => match unit {
                Some(u) if *u != Unit::Dimensionless => format!("{} {}", trim_float(*value), u),
                _ => trim_float(*value),
            },
            FieldValue::Range { min, max, unit } => match unit {
                Some(u) if *u != Unit::Dimensionless => {
                    format!("{}–{} {}", trim_float(*min), trim_float(*max), u)
                }
                _ => format!("{}–{}", trim_float(*min), trim_float(*max)),
            },
            FieldValue::Text { value } => value.clone(),
        }
    }
}

fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= scale * tolerance
}

fn fold_text(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn trim_float(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Parse a datasheet number.
///
/// Accepts decimal commas (`0,035`), space / thin-space / apostrophe
/// thousand separators (`1 800`, `1'800`) and mixed separators where the
/// last one is the decimal mark (`1.234,5`, `1,234.5`).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00a0}' | '\u{2009}' | '\u{202f}' | '\''))
        .map(|c| if c == '−' || c == '–' { '-' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
