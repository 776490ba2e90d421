//! The catalog of technical fields extracted from building-materials datasheets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::value::Unit;

/// How a field's value is read and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// A measured quantity with a canonical unit (single value or range)
    Numeric,
    /// A classification token (Euroclass, standard number)
    Class,
    /// Free text (colour, DoP number)
    Text,
}

/// A named technical property.
///
/// Serialized with its snake_case key, which is also the key used in the
/// product's `technical_specs` JSON and in LLM prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    ThermalConductivity,
    ThermalResistance,
    UValue,
    Density,
    FireClass,
    CompressiveStrength,
    TensileStrength,
    Thickness,
    Length,
    Width,
    WaterVapourDiffusion,
    SpecificHeatCapacity,
    MeltingPoint,
    SoundAbsorption,
    WaterAbsorption,
    GrainSize,
    Consumption,
    ApplicationTemperatureMin,
    ApplicationTemperatureMax,
    DryingTime,
    PhValue,
    PackageWeight,
    Standard,
    DeclarationOfPerformance,
    Colour,
    ProductCode,
}

impl SpecField {
    /// Every field, in catalog order.
    pub const ALL: [SpecField; 26] = [
        SpecField::ThermalConductivity,
        SpecField::ThermalResistance,
        SpecField::UValue,
        SpecField::Density,
        SpecField::FireClass,
        SpecField::CompressiveStrength,
        SpecField::TensileStrength,
        SpecField::Thickness,
        SpecField::Length,
        SpecField::Width,
        SpecField::WaterVapourDiffusion,
        SpecField::SpecificHeatCapacity,
        SpecField::MeltingPoint,
        SpecField::SoundAbsorption,
        SpecField::WaterAbsorption,
        SpecField::GrainSize,
        SpecField::Consumption,
        SpecField::ApplicationTemperatureMin,
        SpecField::ApplicationTemperatureMax,
        SpecField::DryingTime,
        SpecField::PhValue,
        SpecField::PackageWeight,
        SpecField::Standard,
        SpecField::DeclarationOfPerformance,
        SpecField::Colour,
        SpecField::ProductCode,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SpecField::ThermalConductivity => "thermal_conductivity",
            SpecField::ThermalResistance => "thermal_resistance",
            SpecField::UValue => "u_value",
            SpecField::Density => "density",
            SpecField::FireClass => "fire_class",
            SpecField::CompressiveStrength => "compressive_strength",
            SpecField::TensileStrength => "tensile_strength",
            SpecField::Thickness => "thickness",
            SpecField::Length => "length",
            SpecField::Width => "width",
            SpecField::WaterVapourDiffusion => "water_vapour_diffusion",
            SpecField::SpecificHeatCapacity => "specific_heat_capacity",
            SpecField::MeltingPoint => "melting_point",
            SpecField::SoundAbsorption => "sound_absorption",
            SpecField::WaterAbsorption => "water_absorption",
            SpecField::GrainSize => "grain_size",
            SpecField::Consumption => "consumption",
            SpecField::ApplicationTemperatureMin => "application_temperature_min",
            SpecField::ApplicationTemperatureMax => "application_temperature_max",
            SpecField::DryingTime => "drying_time",
            SpecField::PhValue => "ph_value",
            SpecField::PackageWeight => "package_weight",
            SpecField::Standard => "standard",
            SpecField::DeclarationOfPerformance => "declaration_of_performance",
            SpecField::Colour => "colour",
            SpecField::ProductCode => "product_code",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpecField::ThermalConductivity => "Thermal conductivity (λ)",
            SpecField::ThermalResistance => "Thermal resistance (R)",
            SpecField::UValue => "Thermal transmittance (U)",
            SpecField::Density => "Bulk density",
            SpecField::FireClass => "Reaction to fire (Euroclass)",
            SpecField::CompressiveStrength => "Compressive strength",
            SpecField::TensileStrength => "Tensile strength",
            SpecField::Thickness => "Thickness",
            SpecField::Length => "Length",
            SpecField::Width => "Width",
            SpecField::WaterVapourDiffusion => "Water vapour diffusion resistance (μ)",
            SpecField::SpecificHeatCapacity => "Specific heat capacity",
            SpecField::MeltingPoint => "Melting point",
            SpecField::SoundAbsorption => "Sound absorption (αw)",
            SpecField::WaterAbsorption => "Water absorption",
            SpecField::GrainSize => "Grain size",
            SpecField::Consumption => "Consumption",
            SpecField::ApplicationTemperatureMin => "Minimum application temperature",
            SpecField::ApplicationTemperatureMax => "Maximum application temperature",
            SpecField::DryingTime => "Drying time",
            SpecField::PhValue => "pH value",
            SpecField::PackageWeight => "Package weight",
            SpecField::Standard => "Harmonised standard",
            SpecField::DeclarationOfPerformance => "Declaration of performance",
            SpecField::Colour => "Colour",
            SpecField::ProductCode => "Product code",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            SpecField::FireClass | SpecField::Standard => ValueKind::Class,
            SpecField::DeclarationOfPerformance | SpecField::Colour | SpecField::ProductCode => {
                ValueKind::Text
            }
            _ => ValueKind::Numeric,
        }
    }

    /// Canonical unit for numeric fields.
    pub fn unit(self) -> Option<Unit> {
        let unit = match self {
            SpecField::ThermalConductivity => Unit::WattPerMetreKelvin,
            SpecField::ThermalResistance => Unit::SquareMetreKelvinPerWatt,
            SpecField::UValue => Unit::WattPerSquareMetreKelvin,
            SpecField::Density => Unit::KilogramPerCubicMetre,
            SpecField::CompressiveStrength | SpecField::TensileStrength => Unit::Kilopascal,
            SpecField::Thickness | SpecField::Length | SpecField::Width | SpecField::GrainSize => {
                Unit::Millimetre
            }
            SpecField::SpecificHeatCapacity => Unit::JoulePerKilogramKelvin,
            SpecField::MeltingPoint
            | SpecField::ApplicationTemperatureMin
            | SpecField::ApplicationTemperatureMax => Unit::Celsius,
            SpecField::WaterAbsorption | SpecField::Consumption => Unit::KilogramPerSquareMetre,
            SpecField::DryingTime => Unit::Hour,
            SpecField::PackageWeight => Unit::Kilogram,
            SpecField::WaterVapourDiffusion | SpecField::SoundAbsorption | SpecField::PhValue => {
                Unit::Dimensionless
            }
            SpecField::FireClass
            | SpecField::Standard
            | SpecField::DeclarationOfPerformance
            | SpecField::Colour
            | SpecField::ProductCode => return None,
        };
        Some(unit)
    }

    /// Plausible canonical-unit bounds. Values outside are discarded as misreads.
    pub fn plausible_range(self) -> Option<(f64, f64)> {
        match self {
            SpecField::ThermalConductivity => Some((0.01, 3.0)),
            SpecField::ThermalResistance => Some((0.01, 20.0)),
            SpecField::UValue => Some((0.05, 10.0)),
            SpecField::Density => Some((5.0, 3000.0)),
            SpecField::CompressiveStrength | SpecField::TensileStrength => Some((0.1, 100_000.0)),
            SpecField::Thickness | SpecField::Length | SpecField::Width => Some((0.5, 20_000.0)),
            SpecField::GrainSize => Some((0.01, 32.0)),
            SpecField::WaterVapourDiffusion => Some((1.0, 1_000_000.0)),
            SpecField::SpecificHeatCapacity => Some((100.0, 5000.0)),
            SpecField::MeltingPoint => Some((100.0, 2000.0)),
            SpecField::SoundAbsorption => Some((0.0, 1.2)),
            SpecField::WaterAbsorption => Some((0.0, 50.0)),
            SpecField::Consumption => Some((0.01, 100.0)),
            SpecField::ApplicationTemperatureMin | SpecField::ApplicationTemperatureMax => {
                Some((-30.0, 60.0))
            }
            SpecField::DryingTime => Some((0.05, 2000.0)),
            SpecField::PhValue => Some((0.0, 14.0)),
            SpecField::PackageWeight => Some((0.1, 2000.0)),
            _ => None,
        }
    }

    /// Look a field up by its key.
    pub fn from_key(key: &str) -> Option<SpecField> {
        SpecField::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SpecField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecField::from_key(s).ok_or_else(|| format!("unknown spec field: {}", s))
    }
}
