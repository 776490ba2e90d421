//! Consensus merge - reduce strategy outputs to a golden record.
//!
//! For every field, candidates from all strategies are grouped by value,
//! each group is weighted by candidate confidence and strategy weight, and
//! the best-supported group wins. Losing groups with significant support
//! become conflicts for human review.

use indexmap::IndexMap;
use std::cmp::Ordering;

use crate::types::{
    Agreement, ConflictingCandidate, ConsensusConfig, FieldCandidate, FieldConflict, FieldValue,
    GoldenRecord, ResolvedField, SpecField, StrategyKind, StrategyOutput,
};

/// Support values closer than this are treated as a tie.
const SUPPORT_EPSILON: f32 = 1e-6;

/// Candidates that agree on one value.
struct ValueGroup<'a> {
    members: Vec<&'a FieldCandidate>,
    support: f32,
}

impl<'a> ValueGroup<'a> {
    fn strategies(&self) -> Vec<StrategyKind> {
        let mut kinds: Vec<StrategyKind> = Vec::new();
        for member in &self.members {
            if !kinds.contains(&member.strategy) {
                kinds.push(member.strategy);
            }
        }
        kinds
    }

    fn best_rank(&self) -> u8 {
        self.members
            .iter()
            .map(|m| m.strategy.priority_rank())
            .min()
            .unwrap_or(u8::MAX)
    }

    /// Value of the strongest member; it represents the group in the record.
    fn value(&self, config: &ConsensusConfig) -> FieldValue {
        self.members
            .iter()
            .max_by(|a, b| {
                let wa = a.confidence * config.weight(a.strategy);
                let wb = b.confidence * config.weight(b.strategy);
                wa.partial_cmp(&wb)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| b.strategy.priority_rank().cmp(&a.strategy.priority_rank()))
            })
            .map(|m| m.value.clone())
            .unwrap_or(FieldValue::text(""))
    }

    fn mean_confidence(&self) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.confidence).sum::<f32>() / self.members.len() as f32
    }
}

/// Winner ordering: support, then strategy count, then priority rank.
fn compare_groups(a: &ValueGroup<'_>, b: &ValueGroup<'_>) -> Ordering {
    let support = if (a.support - b.support).abs() <= SUPPORT_EPSILON {
        Ordering::Equal
    } else {
        b.support.partial_cmp(&a.support).unwrap_or(Ordering::Equal)
    };
    support
        .then_with(|| b.strategies().len().cmp(&a.strategies().len()))
        .then_with(|| a.best_rank().cmp(&b.best_rank()))
}

/// Merge the outputs of every successful strategy into one golden record.
pub fn merge(outputs: &[StrategyOutput], config: &ConsensusConfig) -> GoldenRecord {
    let mut record = GoldenRecord::default();

    for output in outputs {
        if !record.strategies.contains(&output.strategy) {
            record.strategies.push(output.strategy);
        }
    }

    for field in SpecField::ALL {
        let candidates: Vec<&FieldCandidate> = outputs
            .iter()
            .flat_map(|o| o.candidates_for(field))
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let (resolved, conflict) = resolve_field(field, &candidates, config);
        record.fields.insert(field, resolved);
        if let Some(conflict) = conflict {
            record.conflicts.push(conflict);
        }
    }

    record.overall_confidence = if record.fields.is_empty() {
        0.0
    } else {
        record.fields.values().map(|r| r.confidence).sum::<f32>() / record.fields.len() as f32
    };
    record.completeness = completeness(&record.fields, &config.required_fields);
    record
}

fn resolve_field(
    field: SpecField,
    candidates: &[&FieldCandidate],
    config: &ConsensusConfig,
) -> (ResolvedField, Option<FieldConflict>) {
    let mut groups: Vec<ValueGroup<'_>> = Vec::new();
    for &candidate in candidates {
        let weighted = candidate.confidence * config.weight(candidate.strategy);
        match groups.iter_mut().find(|g| {
            g.members[0]
                .value
                .agrees_with(&candidate.value, config.numeric_tolerance)
        }) {
            Some(group) => {
                group.members.push(candidate);
                group.support += weighted;
            }
            None => groups.push(ValueGroup {
                members: vec![candidate],
                support: weighted,
            }),
        }
    }
    groups.sort_by(compare_groups);

    let total_support: f32 = groups.iter().map(|g| g.support).sum();
    let winner = &groups[0];
    let winner_strategies = winner.strategies();

    let mut reporting: Vec<StrategyKind> = Vec::new();
    for c in candidates {
        if !reporting.contains(&c.strategy) {
            reporting.push(c.strategy);
        }
    }

    let share = if total_support > 0.0 {
        winner.support / total_support
    } else {
        1.0 / groups.len() as f32
    };
    let bonus = config.agreement_bonus * winner_strategies.len().saturating_sub(1) as f32;
    let confidence = (winner.mean_confidence() * share + bonus).clamp(0.0, 1.0);

    let agreement = if reporting.len() < 2 {
        Agreement::SingleSource
    } else if groups.len() == 1 {
        Agreement::Unanimous
    } else if share > 0.5 {
        Agreement::Majority
    } else {
        Agreement::Contested
    };

    let dissenting: Vec<StrategyKind> = reporting
        .iter()
        .copied()
        .filter(|k| !winner_strategies.contains(k))
        .collect();

    let chosen = winner.value(config);

    let conflict = groups.get(1).and_then(|runner_up| {
        let ratio = if winner.support > 0.0 {
            runner_up.support / winner.support
        } else {
            1.0
        };
        (ratio >= config.conflict_ratio).then(|| FieldConflict {
            field,
            chosen: chosen.clone(),
            candidates: candidates
                .iter()
                .map(|c| ConflictingCandidate {
                    strategy: c.strategy,
                    value: c.value.clone(),
                    confidence: c.confidence,
                    raw: c.raw.clone(),
                })
                .collect(),
            support_ratio: ratio,
        })
    });

    let resolved = ResolvedField {
        value: chosen,
        confidence,
        agreement,
        supporting: winner_strategies,
        dissenting,
    };
    (resolved, conflict)
}

fn completeness(fields: &IndexMap<SpecField, ResolvedField>, required: &[SpecField]) -> f32 {
    if required.is_empty() {
        return if fields.is_empty() { 0.0 } else { 1.0 };
    }
    let found = required.iter().filter(|f| fields.contains_key(*f)).count();
    found as f32 / required.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;

    fn lambda(value: f64, confidence: f32, strategy: StrategyKind) -> FieldCandidate {
        FieldCandidate::new(
            SpecField::ThermalConductivity,
            FieldValue::number(value, Some(Unit::WattPerMetreKelvin)),
            confidence,
            strategy,
        )
    }

    fn output(strategy: StrategyKind, candidates: Vec<FieldCandidate>) -> StrategyOutput {
        StrategyOutput::new(strategy).with_candidates(candidates)
    }

    fn equal_weights() -> ConsensusConfig {
        ConsensusConfig {
            text_layer_weight: 1.0,
            ai_native_weight: 1.0,
            ocr_weight: 1.0,
            ..ConsensusConfig::default()
        }
    }

    #[test]
    fn test_unanimous_values_within_tolerance() {
        let outputs = vec![
            output(StrategyKind::TextLayer, vec![lambda(0.035, 0.9, StrategyKind::TextLayer)]),
            output(StrategyKind::AiNative, vec![lambda(0.0352, 0.8, StrategyKind::AiNative)]),
        ];
        let record = merge(&outputs, &ConsensusConfig::default());
        let resolved = record.get(SpecField::ThermalConductivity).unwrap();

        assert_eq!(resolved.agreement, Agreement::Unanimous);
        assert_eq!(resolved.value, FieldValue::number(0.035, Some(Unit::WattPerMetreKelvin)));
        assert_eq!(resolved.supporting, vec![StrategyKind::TextLayer, StrategyKind::AiNative]);
        // mean 0.85 * share 1.0 + one extra strategy
        assert!((resolved.confidence - 0.95).abs() < 1e-5);
        assert!(record.conflicts.is_empty());
    }

    #[test]
    fn test_majority_with_conflict() {
        let outputs = vec![
            output(StrategyKind::TextLayer, vec![lambda(0.035, 0.9, StrategyKind::TextLayer)]),
            output(StrategyKind::AiNative, vec![lambda(0.035, 0.8, StrategyKind::AiNative)]),
            output(StrategyKind::Ocr, vec![lambda(0.038, 0.9, StrategyKind::Ocr)]),
        ];
        let record = merge(&outputs, &ConsensusConfig::default().with_conflict_ratio(0.3));
        let resolved = record.get(SpecField::ThermalConductivity).unwrap();

        assert_eq!(resolved.agreement, Agreement::Majority);
        assert_eq!(resolved.dissenting, vec![StrategyKind::Ocr]);
        assert_eq!(record.conflicts.len(), 1);
        assert_eq!(record.conflicts[0].candidates.len(), 3);
        assert!(record.needs_review(0.0));
    }

    #[test]
    fn test_weak_runner_up_is_not_a_conflict() {
        let outputs = vec![
            output(StrategyKind::TextLayer, vec![lambda(0.035, 0.9, StrategyKind::TextLayer)]),
            output(StrategyKind::AiNative, vec![lambda(0.035, 0.8, StrategyKind::AiNative)]),
            output(StrategyKind::Ocr, vec![lambda(0.038, 0.5, StrategyKind::Ocr)]),
        ];
        let record = merge(&outputs, &ConsensusConfig::default());
        assert!(record.conflicts.is_empty());
    }

    #[test]
    fn test_tie_prefers_more_strategies() {
        let outputs = vec![
            output(StrategyKind::TextLayer, vec![lambda(0.035, 0.8, StrategyKind::TextLayer)]),
            output(StrategyKind::AiNative, vec![lambda(0.040, 0.4, StrategyKind::AiNative)]),
            output(StrategyKind::Ocr, vec![lambda(0.040, 0.4, StrategyKind::Ocr)]),
        ];
        let record = merge(&outputs, &equal_weights());
        assert_eq!(
            record.value(SpecField::ThermalConductivity),
            Some(&FieldValue::number(0.040, Some(Unit::WattPerMetreKelvin)))
        );
    }

    #[test]
    fn test_tie_falls_back_to_priority_rank() {
        let outputs = vec![
            output(StrategyKind::Ocr, vec![lambda(0.040, 0.8, StrategyKind::Ocr)]),
            output(StrategyKind::TextLayer, vec![lambda(0.035, 0.8, StrategyKind::TextLayer)]),
        ];
        let record = merge(&outputs, &equal_weights());
        let resolved = record.get(SpecField::ThermalConductivity).unwrap();

        assert_eq!(resolved.value, FieldValue::number(0.035, Some(Unit::WattPerMetreKelvin)));
        assert_eq!(resolved.agreement, Agreement::Contested);
        assert_eq!(record.conflicts.len(), 1);
    }

    #[test]
    fn test_single_source_and_completeness() {
        let density = FieldCandidate::new(
            SpecField::Density,
            FieldValue::number(140.0, Some(Unit::KilogramPerCubicMetre)),
            0.9,
            StrategyKind::TextLayer,
        );
        let outputs = vec![output(
            StrategyKind::TextLayer,
            vec![lambda(0.035, 0.9, StrategyKind::TextLayer), density],
        )];
        let record = merge(&outputs, &ConsensusConfig::default());

        assert_eq!(
            record.get(SpecField::Density).unwrap().agreement,
            Agreement::SingleSource
        );
        // thermal conductivity + density of three required fields
        assert!((record.completeness - 2.0 / 3.0).abs() < 1e-5);
        assert!((record.overall_confidence - 0.9).abs() < 1e-5);
        assert_eq!(record.strategies, vec![StrategyKind::TextLayer]);
    }

    #[test]
    fn test_empty_outputs_give_empty_record() {
        let record = merge(&[], &ConsensusConfig::default());
        assert!(record.is_empty());
        assert_eq!(record.completeness, 0.0);
    }
}
