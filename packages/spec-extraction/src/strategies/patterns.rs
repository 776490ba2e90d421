//! Label-anchored pattern library for datasheet text.
//!
//! Every field has a set of labels in English, German and Hungarian.
//! After each label occurrence a short window of text is scanned for the
//! first value that fits the field: a number whose unit converts to the
//! field's canonical unit and lands inside the field's plausible range,
//! a Euroclass token, a standard number or a code token.
//!
//! Both the text-layer and the OCR strategy run this library; they differ
//! only in the base confidence they assign.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::types::{FieldCandidate, FieldValue, SpecField, StrategyKind, Unit, ValueKind};

/// Characters scanned after a label.
const WINDOW_CHARS: usize = 160;

/// Product standards (hEN) a datasheet declares conformity with.
const HARMONISED_STANDARDS: &[&str] = &[
    "13162", "13163", "13164", "13165", "13166", "13167", "13168", "13169", "13170", "13171",
    "14064", "14303", "998", "771", "13813", "12004", "13139", "14190", "520", "13950", "14041",
    "1520", "15824", "13658", "16069", "13499", "13279", "459",
];

lazy_static! {
    static ref NUMBER: Regex = Regex::new(
        r"(?P<a>[-−+]?(?:\d{1,3}(?:[ \u{00a0}\u{202f}']\d{3})+|\d+)(?:[.,]\d+)?)(?:\s*(?:°\s*C)?\s*(?:[-–…]|bis|to|és|and)\s*(?P<b>[-−+]?\d+(?:[.,]\d+)?))?(?:\s*(?P<unit>[^\s,;|]{1,14}))?"
    )
    .expect("number pattern");

    static ref BRACKET_UNIT: Regex =
        Regex::new(r"[\[(]\s*(?P<unit>[^\])\s][^\])]{0,12})\s*[\])]").expect("bracket unit pattern");

    static ref EUROCLASS: Regex = Regex::new(
        r"\b(?P<class>A1|A2|[B-E])(?:\s*[-–]\s*s\s*(?P<s>[123])\s*[,;]?\s*d\s*(?P<d>[012]))?\b"
    )
    .expect("euroclass pattern");

    static ref STANDARD: Regex =
        Regex::new(r"\bEN\s?(?P<num>\d{3,5})(?:\s?-\s?(?P<part>\d{1,2}))?\b").expect("standard pattern");

    static ref CODE_TOKEN: Regex = Regex::new(
        r"(?i)^[\s:#.]*(?:nr\.?|no\.?|number|száma?|nummer)?[\s:#.]*(?P<code>[A-Z0-9][A-Z0-9\-_/.]{2,30})"
    )
    .expect("code token pattern");

    static ref WORDS: Regex =
        Regex::new(r"^[\s:=\-]*(?P<words>\p{L}[\p{L} \-]{1,30})").expect("words pattern");

    static ref LABELS: Vec<(SpecField, Regex)> = build_labels();
}

fn label_source(field: SpecField) -> &'static str {
    match field {
        SpecField::ThermalConductivity => {
            r"nennwert\s+der\s+wärmeleitfähigkeit|wärmeleitfähigkeit|hővezetési\s+tényező|hővezetés|thermal\s+conductivity|\blambda\b|λ"
        }
        SpecField::ThermalResistance => {
            r"wärmedurchlasswiderstand|hőellenállás|thermal\s+resistance|\bR\s*D\b"
        }
        SpecField::UValue => {
            r"wärmedurchgangskoeffizient|hőátbocsátási\s+tényező|thermal\s+transmittance|\bU[\s-]*(?:wert|érték|value)\b"
        }
        SpecField::Density => {
            r"rohdichte|testsűrűség|térfogatsűrűség|térfogattömeg|sűrűség|bulk\s+density|density|dichte|ρ"
        }
        SpecField::FireClass => {
            r"brandverhalten|euroklasse|euroclass|baustoffklasse|tűzvédelmi\s+osztály|tűzveszélyességi\s+osztály|éghetőségi\s+osztály|reaction\s+to\s+fire|fire\s+class"
        }
        SpecField::CompressiveStrength => {
            r"druckfestigkeit|druckspannung|nyomószilárdság|nyomófeszültség|compressive\s+(?:strength|stress)"
        }
        SpecField::TensileStrength => {
            r"abreißfestigkeit|haftzugfestigkeit|zugfestigkeit|húzószilárdság|tapadószilárdság|tensile\s+strength|bond\s+strength"
        }
        SpecField::Thickness => r"schichtdicke|dämmstärke|dicke|rétegvastagság|vastagság|thickness",
        SpecField::Length => r"länge|hosszúság|hossz|length",
        SpecField::Width => r"breite|szélesség|width",
        SpecField::WaterVapourDiffusion => {
            r"wasserdampf[-\s]?diffusionswiderstand(?:szahl)?|páradiffúziós\s+ellenállás(?:i\s+szám)?|vízgőz[-\s]?diffúziós\s+ellenállás|water\s+vapou?r\s+diffusion\s+resistance|\bμ\b|\bµ\b"
        }
        SpecField::SpecificHeatCapacity => {
            r"spezifische\s+wärmekapazität|fajlagos\s+hőkapacitás|fajhő|specific\s+heat(?:\s+capacity)?"
        }
        SpecField::MeltingPoint => r"schmelzpunkt|olvadáspont|melting\s+point",
        SpecField::SoundAbsorption => {
            r"schallabsorptionsgrad|schallabsorption|hangelnyelési\s+tényező|sound\s+absorption|α\s*w\b"
        }
        SpecField::WaterAbsorption => r"wasseraufnahme|vízfelvétel|water\s+absorption",
        SpecField::GrainSize => r"größtkorn|körnung|szemcseméret|szemnagyság|grain\s+size",
        SpecField::Consumption => {
            r"materialverbrauch|verbrauch|anyagszükséglet|anyagigény|consumption|coverage"
        }
        SpecField::ApplicationTemperatureMin | SpecField::ApplicationTemperatureMax => {
            r"verarbeitungstemperatur|verarbeitungsbedingungen|bedolgozási\s+hőmérséklet|alkalmazási\s+hőmérséklet|application\s+temperature|processing\s+temperature"
        }
        SpecField::DryingTime => r"trocknungszeit|standzeit|száradási\s+idő|drying\s+time",
        SpecField::PhValue => r"\bph[\s-]*(?:wert|érték|value)?\b",
        SpecField::PackageWeight => r"gebindegröße|gebinde|sackgewicht|kiszerelés|bag\s+weight|packaging|package",
        SpecField::Standard => r"produktnorm|termékszabvány|harmonised\s+standard|norm|szabvány|standard",
        SpecField::DeclarationOfPerformance => {
            r"leistungserklärung|teljesítmény\s*nyilatkozat|declaration\s+of\s+performance|\bDoP\b"
        }
        SpecField::Colour => r"farbton|farbe|színárnyalat|szín|colou?r",
        SpecField::ProductCode => {
            r"artikelnummer|artikel[-\s]?nr\.?|art\.\s?nr\.?|cikkszám|termékkód|product\s+code|item\s+(?:no\.?|number)|article\s+(?:no\.?|number)"
        }
    }
}

fn build_labels() -> Vec<(SpecField, Regex)> {
    SpecField::ALL
        .iter()
        .filter(|f| **f != SpecField::ApplicationTemperatureMax)
        .map(|&field| {
            let pattern = format!("(?i)(?:{})", label_source(field));
            let regex = Regex::new(&pattern).expect("label pattern");
            (field, regex)
        })
        .collect()
}

/// Runs the pattern library over plain text.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    strategy: StrategyKind,
    base_confidence: f32,
}

impl PatternExtractor {
    pub fn new(strategy: StrategyKind, base_confidence: f32) -> Self {
        Self {
            strategy,
            base_confidence,
        }
    }

    /// Extract candidates for every field found in `text`.
    ///
    /// At most one candidate per field. When the same value is found
    /// again under another label occurrence its confidence is raised.
    pub fn extract(&self, text: &str) -> Vec<FieldCandidate> {
        let mut found: HashMap<SpecField, (FieldCandidate, u32)> = HashMap::new();

        for (field, label) in LABELS.iter() {
            for m in label.find_iter(text) {
                let window = window_after(text, m.end());
                for candidate in self.read_window(*field, window) {
                    record(&mut found, candidate);
                }
            }
        }

        if !found.contains_key(&SpecField::FireClass) {
            if let Some(candidate) = self.unlabelled_euroclass(text) {
                record(&mut found, candidate);
            }
        }
        if !found.contains_key(&SpecField::Standard) {
            if let Some(candidate) = self.read_standard(text, -0.1) {
                record(&mut found, candidate);
            }
        }

        let mut candidates: Vec<FieldCandidate> = found
            .into_values()
            .map(|(mut candidate, repeats)| {
                let bonus = (repeats.saturating_sub(1) as f32 * 0.05).min(0.1);
                candidate.confidence = (candidate.confidence + bonus).min(1.0);
                candidate
            })
            .collect();
        candidates.sort_by_key(|c| c.field);
        candidates
    }

    fn read_window(&self, field: SpecField, window: &str) -> Vec<FieldCandidate> {
        match field {
            SpecField::ApplicationTemperatureMin | SpecField::ApplicationTemperatureMax => {
                self.read_temperatures(window)
            }
            SpecField::FireClass => self.read_euroclass(window).into_iter().collect(),
            SpecField::Standard => self.read_standard(window, 0.0).into_iter().collect(),
            SpecField::DeclarationOfPerformance | SpecField::ProductCode => {
                self.read_code(field, window).into_iter().collect()
            }
            SpecField::Colour => self.read_words(field, window).into_iter().collect(),
            _ if field.kind() == ValueKind::Numeric => {
                self.read_number(field, window).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    fn candidate(&self, field: SpecField, value: FieldValue, adjust: f32, raw: &str) -> FieldCandidate {
        FieldCandidate::new(field, value, self.base_confidence + adjust, self.strategy)
            .with_raw(raw.trim())
    }

    fn read_number(&self, field: SpecField, window: &str) -> Option<FieldCandidate> {
        let unit = field.unit()?;
        let (lo, hi) = field.plausible_range().unwrap_or((f64::MIN, f64::MAX));

        for caps in NUMBER.captures_iter(window) {
            let whole = caps.get(0)?;
            let unit_token = caps.name("unit").map(|m| m.as_str());
            if unit_token.is_some_and(|u| u.starts_with('%')) {
                continue;
            }

            let (factor, has_unit) = match resolve_factor(unit, unit_token) {
                Resolved::Factor(f) => (f, true),
                Resolved::Foreign => continue,
                Resolved::Unknown => match bracket_factor(unit, &window[..whole.start()]) {
                    Some(f) => (f, true),
                    None => (1.0, false),
                },
            };

            let Some(a) = caps.name("a").and_then(|m| parse_signed(m.as_str())) else {
                continue;
            };
            let b = caps.name("b").and_then(|m| parse_signed(m.as_str()));

            let a = a * factor;
            let b = b.map(|b| b * factor);
            let in_range = |v: f64| v >= lo && v <= hi;
            if !in_range(a) || b.is_some_and(|b| !in_range(b)) {
                continue;
            }

            let value = match b {
                Some(b) => FieldValue::range(a, b, Some(unit)),
                None => FieldValue::number(a, Some(unit)),
            };
            let mut adjust = if has_unit { 0.05 } else { -0.1 };
            if whole.start() > 60 {
                adjust -= 0.05;
            }
            return Some(self.candidate(field, value, adjust, window_snippet(window, whole.end())));
        }
        None
    }

    fn read_temperatures(&self, window: &str) -> Vec<FieldCandidate> {
        let (lo, hi) = SpecField::ApplicationTemperatureMin
            .plausible_range()
            .unwrap_or((-30.0, 60.0));

        for caps in NUMBER.captures_iter(window) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(a) = caps.name("a").and_then(|m| parse_signed(m.as_str())) else {
                continue;
            };
            if !(lo..=hi).contains(&a) {
                continue;
            }
            let raw = window_snippet(window, whole.end());

            if let Some(b) = caps.name("b").and_then(|m| parse_signed(m.as_str())) {
                if !(lo..=hi).contains(&b) {
                    continue;
                }
                let (min, max) = if a <= b { (a, b) } else { (b, a) };
                return vec![
                    self.candidate(
                        SpecField::ApplicationTemperatureMin,
                        FieldValue::number(min, Some(Unit::Celsius)),
                        0.0,
                        raw,
                    ),
                    self.candidate(
                        SpecField::ApplicationTemperatureMax,
                        FieldValue::number(max, Some(Unit::Celsius)),
                        0.0,
                        raw,
                    ),
                ];
            }

            let before = window[..whole.start()].to_lowercase();
            let field = if before.contains("max") || before.contains("legfeljebb") || before.contains("höchstens") {
                SpecField::ApplicationTemperatureMax
            } else {
                SpecField::ApplicationTemperatureMin
            };
            return vec![self.candidate(
                field,
                FieldValue::number(a, Some(Unit::Celsius)),
                -0.05,
                raw,
            )];
        }
        Vec::new()
    }

    fn read_euroclass(&self, window: &str) -> Option<FieldCandidate> {
        EUROCLASS
            .captures_iter(window)
            .find_map(|caps| euroclass_value(&caps))
            .map(|(value, raw)| self.candidate(SpecField::FireClass, value, 0.05, &raw))
    }

    /// Suffixed Euroclasses (`A2-s1,d0`) are specific enough without a label.
    fn unlabelled_euroclass(&self, text: &str) -> Option<FieldCandidate> {
        EUROCLASS
            .captures_iter(text)
            .filter(|caps| caps.name("s").is_some())
            .find_map(|caps| euroclass_value(&caps))
            .map(|(value, raw)| self.candidate(SpecField::FireClass, value, -0.15, &raw))
    }

    fn read_standard(&self, text: &str, adjust: f32) -> Option<FieldCandidate> {
        STANDARD.captures_iter(text).find_map(|caps| {
            let num = caps.name("num")?.as_str();
            if !HARMONISED_STANDARDS.contains(&num) {
                return None;
            }
            let value = match caps.name("part") {
                Some(part) => format!("EN {}-{}", num, part.as_str()),
                None => format!("EN {}", num),
            };
            let raw = caps.get(0)?.as_str();
            Some(self.candidate(SpecField::Standard, FieldValue::text(value), adjust, raw))
        })
    }

    fn read_code(&self, field: SpecField, window: &str) -> Option<FieldCandidate> {
        let line = first_line(window);
        let caps = CODE_TOKEN.captures(line)?;
        let code = caps.name("code")?.as_str().trim_end_matches(['.', '/', '-']);
        if !code.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(self.candidate(field, FieldValue::text(code), -0.05, line))
    }

    fn read_words(&self, field: SpecField, window: &str) -> Option<FieldCandidate> {
        let line = first_line(window);
        let caps = WORDS.captures(line)?;
        let words = caps.name("words")?.as_str().trim();
        if words.len() < 3 {
            return None;
        }
        Some(self.candidate(field, FieldValue::text(words), -0.1, line))
    }
}

/// Whether `text` carries enough readable characters to be worth parsing.
pub fn has_usable_text(text: &str, min_chars: usize) -> bool {
    text.chars().filter(|c| c.is_alphanumeric()).count() >= min_chars
}

fn record(found: &mut HashMap<SpecField, (FieldCandidate, u32)>, candidate: FieldCandidate) {
    match found.get_mut(&candidate.field) {
        Some((existing, repeats)) => {
            if existing.value.agrees_with(&candidate.value, 0.001) {
                *repeats += 1;
            }
        }
        None => {
            found.insert(candidate.field, (candidate, 1));
        }
    }
}

enum Resolved {
    Factor(f64),
    Foreign,
    Unknown,
}

const ALL_UNITS: [Unit; 12] = [
    Unit::WattPerMetreKelvin,
    Unit::SquareMetreKelvinPerWatt,
    Unit::WattPerSquareMetreKelvin,
    Unit::KilogramPerCubicMetre,
    Unit::Kilopascal,
    Unit::Millimetre,
    Unit::JoulePerKilogramKelvin,
    Unit::Celsius,
    Unit::KilogramPerSquareMetre,
    Unit::Hour,
    Unit::Kilogram,
    Unit::Dimensionless,
];

fn resolve_factor(unit: Unit, token: Option<&str>) -> Resolved {
    let Some(token) = token.map(trim_unit_token) else {
        return Resolved::Unknown;
    };
    if token.is_empty() {
        return Resolved::Unknown;
    }
    if unit != Unit::Dimensionless {
        if let Some(f) = unit.factor_from(Some(token)) {
            return Resolved::Factor(f);
        }
    }
    let foreign = ALL_UNITS
        .iter()
        .filter(|u| **u != unit && **u != Unit::Dimensionless)
        .any(|u| u.factor_from(Some(token)).is_some());
    if foreign {
        Resolved::Foreign
    } else {
        Resolved::Unknown
    }
}

/// Strip sentence punctuation glued to a unit; keep `)` that closes `W/(m·K)`.
fn trim_unit_token(token: &str) -> &str {
    let token = token.trim_end_matches(['.', ':', ']']);
    if token.contains('(') {
        token
    } else {
        token.trim_end_matches(')')
    }
}

/// Unit written in brackets between the label and the number, e.g. `[kPa]`.
fn bracket_factor(unit: Unit, before: &str) -> Option<f64> {
    if unit == Unit::Dimensionless {
        return None;
    }
    BRACKET_UNIT
        .captures_iter(before)
        .filter_map(|caps| unit.factor_from(Some(caps.name("unit")?.as_str())))
        .last()
}

fn euroclass_value(caps: &regex::Captures<'_>) -> Option<(FieldValue, String)> {
    let class = caps.name("class")?.as_str();
    let raw = caps.get(0)?.as_str().to_string();
    match (caps.name("s"), caps.name("d")) {
        (Some(s), Some(d)) => Some((
            FieldValue::text(format!("{}-s{},d{}", class, s.as_str(), d.as_str())),
            raw,
        )),
        _ if class == "A1" || class == "A2" => Some((FieldValue::text(class), raw)),
        _ => None,
    }
}

fn parse_signed(raw: &str) -> Option<f64> {
    crate::types::parse_decimal(raw.trim_start_matches('+'))
}

fn window_after(text: &str, start: usize) -> &str {
    let mut end = (start + WINDOW_CHARS).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let window = &text[start..end];
    match window.find("\n\n") {
        Some(cut) if cut > 0 => &window[..cut],
        _ => window,
    }
}

fn window_snippet(window: &str, end: usize) -> &str {
    let mut end = end.min(window.len());
    while !window.is_char_boundary(end) {
        end -= 1;
    }
    &window[..end]
}

fn first_line(window: &str) -> &str {
    window.lines().next().unwrap_or("")
}
