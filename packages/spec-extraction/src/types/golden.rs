//! The golden record: one merged, confidence-scored result per document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::field::SpecField;
use super::strategy::StrategyKind;
use super::value::FieldValue;

/// How strongly the strategies that reported a field agree on its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    /// Two or more strategies reported the field and all agree
    Unanimous,
    /// The winning value has more than half of the support
    Majority,
    /// The winning value has half of the support or less
    Contested,
    /// Only one strategy reported the field
    SingleSource,
}

/// The chosen value for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub value: FieldValue,
    pub confidence: f32,
    pub agreement: Agreement,

    /// Strategies whose candidates agree with `value`
    pub supporting: Vec<StrategyKind>,

    /// Strategies that proposed a different value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dissenting: Vec<StrategyKind>,
}

/// A candidate that lost, kept for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictingCandidate {
    pub strategy: StrategyKind,
    pub value: FieldValue,
    pub confidence: f32,
    #[serde(default)]
    pub raw: String,
}

/// A field where a losing value had significant support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: SpecField,
    pub chosen: FieldValue,

    /// Every candidate reported for the field, winners included
    pub candidates: Vec<ConflictingCandidate>,

    /// Runner-up support divided by winner support
    pub support_ratio: f32,
}

/// Merged extraction result for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoldenRecord {
    pub fields: IndexMap<SpecField, ResolvedField>,
    pub conflicts: Vec<FieldConflict>,

    /// Strategies whose output was merged
    pub strategies: Vec<StrategyKind>,

    /// Mean confidence over resolved fields
    pub overall_confidence: f32,

    /// Share of required fields that were resolved
    pub completeness: f32,
}

impl GoldenRecord {
    pub fn get(&self, field: SpecField) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    pub fn value(&self, field: SpecField) -> Option<&FieldValue> {
        self.fields.get(&field).map(|r| &r.value)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Whether a human should look at this record before it is trusted.
    pub fn needs_review(&self, review_threshold: f32) -> bool {
        self.has_conflicts() || self.overall_confidence < review_threshold
    }

    /// Flat `{ key: { value, display, confidence, agreement } }` map for storage.
    pub fn to_spec_map(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(field, resolved)| {
                (
                    field.key().to_string(),
                    serde_json::json!({
                        "value": resolved.value,
                        "display": resolved.value.display(),
                        "confidence": resolved.confidence,
                        "agreement": resolved.agreement,
                    }),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }

    /// One `label: value` line per resolved field.
    pub fn summary_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(field, resolved)| format!("{}: {}", field.label(), resolved.value.display()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Unit;

    fn record_with_density() -> GoldenRecord {
        let mut record = GoldenRecord::default();
        record.fields.insert(
            SpecField::Density,
            ResolvedField {
                value: FieldValue::number(140.0, Some(Unit::KilogramPerCubicMetre)),
                confidence: 0.9,
                agreement: Agreement::Unanimous,
                supporting: vec![StrategyKind::TextLayer, StrategyKind::AiNative],
                dissenting: vec![],
            },
        );
        record.overall_confidence = 0.9;
        record
    }

    #[test]
    fn spec_map_uses_field_keys() {
        let map = record_with_density().to_spec_map();
        assert_eq!(map["density"]["display"], "140 kg/m³");
        assert_eq!(map["density"]["value"]["type"], "number");
        assert_eq!(map["density"]["agreement"], "unanimous");
    }

    #[test]
    fn review_needed_below_threshold_or_on_conflict() {
        let mut record = record_with_density();
        assert!(!record.needs_review(0.6));
        assert!(record.needs_review(0.95));

        record.conflicts.push(FieldConflict {
            field: SpecField::Density,
            chosen: FieldValue::number(140.0, None),
            candidates: vec![],
            support_ratio: 0.8,
        });
        assert!(record.needs_review(0.6));
    }
}
