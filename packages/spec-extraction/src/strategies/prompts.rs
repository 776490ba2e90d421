//! LLM prompts for the AI-native strategy.

use crate::types::{PdfDocument, SpecField, ValueKind};

/// System prompt for datasheet field extraction.
pub const SPEC_SYSTEM_PROMPT: &str = r#"You extract technical data from building-material datasheets (insulation, plasters, adhesives, masonry).
Datasheets may be written in German, Hungarian or English.

Rules:
- Report only values that are printed in the document. Never estimate or fill in typical values.
- Use the field keys listed below. Omit fields that are not present.
- Numbers use a dot as decimal separator. Convert decimal commas.
- Give the unit exactly as printed (for example "W/(m·K)", "N/mm²", "kg/m³"); it is converted afterwards.
- For a range write {"min": .., "max": .., "unit": ..} instead of "value".
- Euroclasses keep their suffix, for example "A2-s1,d0".
- "confidence" is your certainty that the value belongs to this field, from 0.0 to 1.0.

Output JSON:
{
    "fields": {
        "<field_key>": {"value": <number or string>, "unit": "<unit or null>", "confidence": <0.0-1.0>}
    }
}

Fields:
{catalog}"#;

/// One line per field: key, label and expected unit.
pub fn field_catalog() -> String {
    SpecField::ALL
        .iter()
        .map(|field| match (field.kind(), field.unit()) {
            (ValueKind::Numeric, Some(unit)) => {
                format!("- {}: {} [{}]", field.key(), field.label(), unit)
            }
            _ => format!("- {}: {}", field.key(), field.label()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn system_prompt() -> String {
    SPEC_SYSTEM_PROMPT.replace("{catalog}", &field_catalog())
}

/// User prompt with document metadata and (possibly truncated) text.
pub fn user_prompt(document: &PdfDocument, text: &str, max_chars: usize) -> String {
    let mut prompt = format!("Source: {}\n", document.source);
    if let Some(title) = &document.metadata.title {
        prompt.push_str(&format!("Title: {}\n", title));
    }
    if let Some(subject) = &document.metadata.subject {
        prompt.push_str(&format!("Subject: {}\n", subject));
    }

    let body = truncate_chars(text.trim(), max_chars);
    prompt.push_str("\nDocument text:\n");
    prompt.push_str(body);
    if body.len() < text.trim().len() {
        prompt.push_str("\n[truncated]");
    }
    prompt
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_field() {
        let catalog = field_catalog();
        for field in SpecField::ALL {
            assert!(catalog.contains(field.key()), "missing {}", field);
        }
        assert!(catalog.contains("thermal_conductivity: Thermal conductivity (λ) [W/mK]"));
        assert!(!system_prompt().contains("{catalog}"));
    }

    #[test]
    fn test_user_prompt_truncates_on_char_boundary() {
        let document = PdfDocument::from_bytes(b"%PDF-1.4\n".to_vec(), "https://example.com/a.pdf").unwrap();
        let prompt = user_prompt(&document, "Hővezetési tényező 0,035", 5);
        assert!(prompt.contains("Document text:\nHővez\n"));
        assert!(prompt.ends_with("[truncated]"));
    }
}
