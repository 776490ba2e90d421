//! AI strategy: ask a language model for the field catalog as JSON.
//!
//! Reads the best text available (prior OCR output, else the text layer),
//! so it works for scanned datasheets as long as an earlier tier recovered
//! their text. Values are normalised and range-checked exactly like the
//! pattern strategies; model-reported confidence is damped.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::patterns::has_usable_text;
use super::prompts;
use super::text_layer::extract_text;
use crate::error::{StrategyError, StrategyResult};
use crate::traits::ai::LanguageModel;
use crate::traits::strategy::{ExtractionContext, ExtractionStrategy};
use crate::types::{
    parse_decimal, CostTier, FieldCandidate, FieldValue, PdfDocument, SpecField, StrategyKind,
    StrategyOutput, ValueKind,
};

/// Confidence assumed when the model omits one.
const DEFAULT_MODEL_CONFIDENCE: f32 = 0.8;

pub struct AiNativeStrategy {
    model: Arc<dyn LanguageModel>,
    max_input_chars: usize,
    confidence_factor: f32,
}

impl AiNativeStrategy {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_input_chars: 24_000,
            confidence_factor: 0.9,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    async fn document_text(&self, ctx: &ExtractionContext<'_>) -> StrategyResult<String> {
        if let Some(text) = ctx.prior_text {
            return Ok(text.to_string());
        }
        let document = ctx.document.clone();
        tokio::task::spawn_blocking(move || extract_text(document.bytes()))
            .await
            .map_err(|e| StrategyError::PdfParse(format!("text extraction task failed: {}", e)))?
    }
}

#[async_trait]
impl ExtractionStrategy for AiNativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AiNative
    }

    fn tier(&self) -> CostTier {
        CostTier::High
    }

    fn estimated_cost(&self, document: &PdfDocument) -> f64 {
        // Without the text at hand, assume a dense datasheet page is ~3000 characters
        let pages = document.page_count.max(1);
        let chars = (pages * 3000).min(self.max_input_chars);
        self.model.estimate_cost(chars)
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> StrategyResult<StrategyOutput> {
        let text = self.document_text(ctx).await?;
        if !has_usable_text(&text, 40) {
            let chars = text.chars().filter(|c| c.is_alphanumeric()).count();
            return Err(StrategyError::NoTextLayer { chars });
        }

        let system = prompts::system_prompt();
        let user = prompts::user_prompt(ctx.document, &text, self.max_input_chars);
        let cost = self.model.estimate_cost(system.len() + user.len());

        let reply = self.model.complete_json(&system, &user).await?;
        let candidates = parse_reply(&reply, self.confidence_factor)?;

        debug!(
            source = %ctx.document.source,
            model = self.model.model_name(),
            candidates = candidates.len(),
            "AI extraction complete"
        );

        Ok(StrategyOutput::new(StrategyKind::AiNative)
            .with_candidates(candidates)
            .with_cost(cost)
            .with_pages(ctx.document.page_count))
    }
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

/// Parse the model's JSON reply into candidates.
///
/// Unknown keys, nulls and implausible numbers are dropped; a reply that
/// is not JSON at all is an error.
pub fn parse_reply(reply: &str, confidence_factor: f32) -> StrategyResult<Vec<FieldCandidate>> {
    let cleaned = strip_code_fences(reply);
    let parsed: ModelReply = serde_json::from_str(cleaned)
        .map_err(|e| StrategyError::Response(format!("{}: {}", e, preview(cleaned))))?;

    let mut candidates = Vec::new();
    for (key, entry) in parsed.fields {
        let Some(field) = SpecField::from_key(&key) else {
            debug!(key = %key, "model returned unknown field, skipping");
            continue;
        };
        match read_entry(field, &entry) {
            Some((value, confidence)) => {
                candidates.push(
                    FieldCandidate::new(field, value, confidence * confidence_factor, StrategyKind::AiNative)
                        .with_raw(entry.to_string()),
                );
            }
            None => {
                if !entry.is_null() {
                    warn!(field = %field, entry = %entry, "discarding unusable model value");
                }
            }
        }
    }
    candidates.sort_by_key(|c| c.field);
    Ok(candidates)
}

fn read_entry(field: SpecField, entry: &Value) -> Option<(FieldValue, f32)> {
    // A bare value instead of an object is tolerated
    let (value, unit, min, max, confidence) = match entry {
        Value::Object(map) => (
            map.get("value"),
            map.get("unit").and_then(Value::as_str),
            map.get("min"),
            map.get("max"),
            map.get("confidence").and_then(Value::as_f64),
        ),
        other => (Some(other), None, None, None, None),
    };
    let confidence = confidence
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(DEFAULT_MODEL_CONFIDENCE);

    let value = match field.kind() {
        ValueKind::Numeric => numeric_value(field, value, unit, min, max)?,
        ValueKind::Class | ValueKind::Text => {
            let text = match value? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if text.is_empty() {
                return None;
            }
            FieldValue::text(text)
        }
    };
    Some((value, confidence))
}

fn numeric_value(
    field: SpecField,
    value: Option<&Value>,
    unit_token: Option<&str>,
    min: Option<&Value>,
    max: Option<&Value>,
) -> Option<FieldValue> {
    let unit = field.unit()?;
    let factor = unit.factor_from(unit_token)?;
    let (lo, hi) = field.plausible_range().unwrap_or((f64::MIN, f64::MAX));
    let plausible = |v: f64| (lo..=hi).contains(&v);

    if let (Some(min), Some(max)) = (min.and_then(as_number), max.and_then(as_number)) {
        let (min, max) = (min * factor, max * factor);
        return (plausible(min) && plausible(max)).then(|| FieldValue::range(min, max, Some(unit)));
    }

    let value = match value? {
        Value::String(s) => match split_range(s) {
            Some((a, b)) => {
                let (a, b) = (a * factor, b * factor);
                return (plausible(a) && plausible(b)).then(|| FieldValue::range(a, b, Some(unit)));
            }
            None => parse_decimal(s.trim_start_matches('+'))?,
        },
        other => as_number(other)?,
    } * factor;

    plausible(value).then(|| FieldValue::number(value, Some(unit)))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s.trim_start_matches('+')),
        _ => None,
    }
}

/// `"50-200"` / `"50 – 200"`; a leading minus is a sign, not a separator.
fn split_range(s: &str) -> Option<(f64, f64)> {
    let s = s.trim();
    let body_start = s.chars().next().map(|c| c.len_utf8()).unwrap_or(0);
    let idx = s[body_start..].find(['-', '–'])? + body_start;
    let sep_len = s[idx..].chars().next()?.len_utf8();
    let a = parse_decimal(s[..idx].trim().trim_start_matches('+'))?;
    let b = parse_decimal(s[idx + sep_len..].trim().trim_start_matches('+'))?;
    Some((a, b))
}

fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}
