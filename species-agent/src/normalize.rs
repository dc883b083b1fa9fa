//! Response normalization.
//!
//! Turns the free-form text an LLM returns ("mostly JSON, maybe fenced or
//! wrapped in prose") into a fully populated [`SpeciesProfile`]. The
//! upstream JSON is first read into a boundary union ([`RawProfile`] and
//! friends) that captures every shape seen in practice, then coerced into
//! the canonical profile, filling each missing leaf from [`crate::fallback`].
//!
//! ```text
//! raw text ─► strip fences ─► first '{' .. last '}' ─► serde_json::Value
//!                                                         │
//!                                   RawProfile (tagged) ◄─┘
//!                                         │ coerce + partial fill
//!                                         ▼
//!                                   SpeciesProfile
//! ```
//!
//! [`normalize`] never fails and never panics; every failure path yields a
//! complete fallback profile with `research_backed == false`.

use serde_json::{Map, Value};

use crate::fallback;
use crate::profile::{
    Facet, FrameworkSection, ProfileField, SpeciesProfile, TextField, MAX_DETAILS, MIN_DETAILS,
};

/// Why a raw response could not be read as a profile payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("no upstream response")]
    Empty,

    #[error("no JSON object in upstream response")]
    NoJsonObject,

    #[error("invalid JSON in upstream response: {0}")]
    InvalidJson(String),
}

/// Remove markdown code-fence markers (```` ```json ```` and ```` ``` ````).
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// Greedy outer-brace extraction: first `{` through last `}`.
///
/// This is not a balanced-brace parse; trailing prose containing a `}` is
/// swept into the candidate and left for the JSON parser to reject.
pub fn extract_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse raw upstream text into the boundary representation.
pub fn parse_payload(raw_text: &str) -> Result<RawProfile, NormalizeError> {
    if raw_text.trim().is_empty() {
        return Err(NormalizeError::Empty);
    }

    let cleaned = strip_code_fences(raw_text);
    let candidate = extract_candidate(&cleaned).ok_or(NormalizeError::NoJsonObject)?;

    let map: Map<String, Value> = serde_json::from_str(candidate)
        .map_err(|e| NormalizeError::InvalidJson(e.to_string()))?;

    Ok(RawProfile::from_map(&map))
}

/// Normalize upstream text into a complete profile for `species_name`.
pub fn normalize(raw_text: &str, species_name: &str) -> SpeciesProfile {
    match parse_payload(raw_text) {
        Ok(raw) => raw.into_profile(species_name),
        Err(e) => fallback::profile(species_name, e.to_string()),
    }
}

// =============================================================================
// Boundary types
// =============================================================================

/// A free-text leaf as found in upstream JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawText {
    /// Non-blank string
    Text(String),
    /// Absent, null, blank, or an unusable shape
    Missing,
}

impl RawText {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => RawText::Text(s.clone()),
            // A text dimension sent as {"summary": "..."} keeps its summary
            Some(Value::Object(map)) => match map.get("summary") {
                Some(Value::String(s)) if !s.trim().is_empty() => RawText::Text(s.clone()),
                _ => RawText::Missing,
            },
            _ => RawText::Missing,
        }
    }

    fn into_option(self) -> Option<String> {
        match self {
            RawText::Text(s) => Some(s),
            RawText::Missing => None,
        }
    }
}

/// A list leaf (`details`, `sources`) as found in upstream JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawList {
    /// At least one usable string item
    Items(Vec<String>),
    /// Absent, not a sequence, or no usable items
    Missing,
}

impl RawList {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => {
                let items: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                        _ => None,
                    })
                    .collect();
                if items.is_empty() {
                    RawList::Missing
                } else {
                    RawList::Items(items)
                }
            }
            _ => RawList::Missing,
        }
    }
}

/// A framework section as found in upstream JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSection {
    /// An object; `summary` and `details` are judged independently
    Structured { summary: RawText, details: RawList },
    /// A bare string, used as the summary
    Text(String),
    /// Absent or an unusable shape
    Missing,
}

impl RawSection {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => RawSection::Structured {
                summary: RawText::from_value(map.get("summary")),
                details: RawList::from_value(map.get("details")),
            },
            Some(Value::String(s)) if !s.trim().is_empty() => RawSection::Text(s.clone()),
            _ => RawSection::Missing,
        }
    }

    fn into_parts(self) -> (Option<String>, Option<Vec<String>>) {
        match self {
            RawSection::Structured { summary, details } => {
                let details = match details {
                    RawList::Items(items) => Some(items),
                    RawList::Missing => None,
                };
                (summary.into_option(), details)
            }
            RawSection::Text(summary) => (Some(summary), None),
            RawSection::Missing => (None, None),
        }
    }
}

/// Upstream profile payload before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProfile {
    pub species: RawText,
    pub wisdom_insight: RawText,
    pub perceive: RawSection,
    pub relate: RawSection,
    pub apply: RawSection,
    pub texts: Vec<(TextField, RawText)>,
    pub sources: RawList,
}

impl RawProfile {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            species: RawText::from_value(map.get("species")),
            wisdom_insight: RawText::from_value(map.get("wisdomInsight")),
            perceive: RawSection::from_value(map.get(Facet::Perceive.as_str())),
            relate: RawSection::from_value(map.get(Facet::Relate.as_str())),
            apply: RawSection::from_value(map.get(Facet::Apply.as_str())),
            texts: TextField::ALL
                .iter()
                .map(|field| (*field, RawText::from_value(map.get(field.as_str()))))
                .collect(),
            sources: RawList::from_value(map.get("sources")),
        }
    }

    /// Coerce into a canonical profile, filling each missing leaf.
    pub fn into_profile(self, species_name: &str) -> SpeciesProfile {
        let mut filled = Vec::new();

        let species = take_or_fill(self.species, ProfileField::Species, &mut filled, || {
            species_name.to_string()
        });
        let wisdom_insight =
            take_or_fill(self.wisdom_insight, ProfileField::WisdomInsight, &mut filled, || {
                fallback::wisdom_insight(species_name)
            });

        let perceive = coerce_section(self.perceive, Facet::Perceive, species_name, &mut filled);
        let relate = coerce_section(self.relate, Facet::Relate, species_name, &mut filled);
        let apply = coerce_section(self.apply, Facet::Apply, species_name, &mut filled);

        let mut profile = fallback::profile(species_name, "");
        profile.species = species;
        profile.wisdom_insight = wisdom_insight;
        profile.perceive = perceive;
        profile.relate = relate;
        profile.apply = apply;

        for (field, raw) in self.texts {
            match raw {
                RawText::Text(text) => *profile.text_mut(field) = text,
                RawText::Missing => filled.push(field.profile_field()),
            }
        }

        profile.sources = match self.sources {
            RawList::Items(items) => items,
            RawList::Missing => {
                filled.push(ProfileField::Sources);
                fallback::sources()
            }
        };

        // Report leaves in declaration order regardless of fill order
        profile.fallback_fields = ProfileField::ALL
            .iter()
            .copied()
            .filter(|field| filled.contains(field))
            .collect();
        profile.research_backed = true;
        profile.fallback_reason = None;
        profile
    }
}

fn take_or_fill(
    raw: RawText,
    field: ProfileField,
    filled: &mut Vec<ProfileField>,
    fallback: impl FnOnce() -> String,
) -> String {
    raw.into_option().unwrap_or_else(|| {
        filled.push(field);
        fallback()
    })
}

fn coerce_section(
    raw: RawSection,
    facet: Facet,
    species_name: &str,
    filled: &mut Vec<ProfileField>,
) -> FrameworkSection {
    let (summary, details) = raw.into_parts();

    let summary = summary.unwrap_or_else(|| {
        filled.push(facet.summary_field());
        fallback::section_summary(facet, species_name)
    });

    let details = match details {
        Some(mut items) => {
            items.truncate(MAX_DETAILS);
            if items.len() < MIN_DETAILS {
                filled.push(facet.details_field());
                pad_details(&mut items, facet);
            }
            items
        }
        None => {
            filled.push(facet.details_field());
            fallback::section_details(facet)
        }
    };

    FrameworkSection::new(summary, details)
}

/// Top up a short list from the fallback details, skipping repeats.
fn pad_details(items: &mut Vec<String>, facet: Facet) {
    for extra in fallback::section_details(facet) {
        if items.len() >= MIN_DETAILS {
            break;
        }
        if !items.iter().any(|i| i.eq_ignore_ascii_case(&extra)) {
            items.push(extra);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload(species: &str) -> Value {
        json!({
            "species": species,
            "wisdomInsight": "Trees remember droughts in their rings.",
            "perceive": {
                "summary": "Trees sense light, gravity and chemistry.",
                "details": ["Phototropism", "Gravitropism", "Root chemoreception", "Wound signalling"]
            },
            "relate": {
                "summary": "Trees share resources through fungal networks.",
                "details": ["Mycorrhizal exchange", "Kin recognition", "Volatile alarm signals"]
            },
            "apply": {
                "summary": "Trees time growth and dormancy.",
                "details": ["Dormancy", "Mast seeding", "Compartmentalization", "Canopy shyness"]
            },
            "temporalIntelligence": "Seasonal dormancy cycles.",
            "energeticIntelligence": "Photosynthetic efficiency.",
            "collectiveWisdom": "Forest-wide resource sharing.",
            "adaptiveStrategies": "Drought-adapted rooting.",
            "quantumAspects": "Coherent energy transfer in photosynthesis.",
            "humanLearnings": "Patience and long-term planning.",
            "conservationWisdom": "Old-growth forests store knowledge.",
            "sources": ["Simard 2021", "Wohlleben 2016"]
        })
    }

    fn expected_profile(species: &str) -> SpeciesProfile {
        serde_json::from_value(json!({
            "species": species,
            "wisdomInsight": "Trees remember droughts in their rings.",
            "perceive": {
                "summary": "Trees sense light, gravity and chemistry.",
                "details": ["Phototropism", "Gravitropism", "Root chemoreception", "Wound signalling"]
            },
            "relate": {
                "summary": "Trees share resources through fungal networks.",
                "details": ["Mycorrhizal exchange", "Kin recognition", "Volatile alarm signals"]
            },
            "apply": {
                "summary": "Trees time growth and dormancy.",
                "details": ["Dormancy", "Mast seeding", "Compartmentalization", "Canopy shyness"]
            },
            "temporalIntelligence": "Seasonal dormancy cycles.",
            "energeticIntelligence": "Photosynthetic efficiency.",
            "collectiveWisdom": "Forest-wide resource sharing.",
            "adaptiveStrategies": "Drought-adapted rooting.",
            "quantumAspects": "Coherent energy transfer in photosynthesis.",
            "humanLearnings": "Patience and long-term planning.",
            "conservationWisdom": "Old-growth forests store knowledge.",
            "sources": ["Simard 2021", "Wohlleben 2016"],
            "researchBacked": true
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_text_falls_back() {
        for raw in ["", "   ", "\n\t"] {
            let profile = normalize(raw, "octopuses");
            assert!(!profile.research_backed);
            assert_eq!(profile.fallback_reason.as_deref(), Some("no upstream response"));
            assert!(profile.is_complete());
            assert!(profile.perceive.summary.contains("octopuses"));
        }
    }

    #[test]
    fn test_well_formed_payload_round_trips() {
        let raw = serde_json::to_string(&full_payload("trees")).unwrap();
        let profile = normalize(&raw, "trees");

        assert_eq!(profile, expected_profile("trees"));
        assert!(profile.fallback_fields.is_empty());
        assert!(profile.fallback_reason.is_none());
    }

    #[test]
    fn test_species_from_payload_is_preserved() {
        let raw = serde_json::to_string(&full_payload("Oak trees")).unwrap();
        let profile = normalize(&raw, "trees");
        assert_eq!(profile.species, "Oak trees");
    }

    #[test]
    fn test_missing_single_leaf_is_filled_alone() {
        let mut payload = full_payload("trees");
        payload["apply"].as_object_mut().unwrap().remove("details");
        let raw = serde_json::to_string(&payload).unwrap();

        let profile = normalize(&raw, "trees");

        let mut expected = expected_profile("trees");
        expected.apply.details = fallback::section_details(Facet::Apply);
        expected.fallback_fields = vec![ProfileField::ApplyDetails];
        assert_eq!(profile, expected);
    }

    #[test]
    fn test_missing_summary_keeps_details() {
        let mut payload = full_payload("trees");
        payload["perceive"].as_object_mut().unwrap().remove("summary");
        let profile = normalize(&payload.to_string(), "trees");

        assert_eq!(
            profile.perceive.summary,
            fallback::section_summary(Facet::Perceive, "trees")
        );
        assert_eq!(profile.perceive.details.len(), 4);
        assert_eq!(profile.perceive.details[0], "Phototropism");
        assert_eq!(profile.fallback_fields, vec![ProfileField::PerceiveSummary]);
    }

    #[test]
    fn test_missing_text_field_is_filled() {
        let mut payload = full_payload("trees");
        payload.as_object_mut().unwrap().remove("quantumAspects");
        let profile = normalize(&payload.to_string(), "trees");

        assert!(profile.research_backed);
        assert_eq!(
            profile.quantum_aspects,
            fallback::text(TextField::QuantumAspects, "trees")
        );
        assert_eq!(profile.fallback_fields, vec![ProfileField::QuantumAspects]);
        assert_eq!(profile.collective_wisdom, "Forest-wide resource sharing.");
    }

    #[test]
    fn test_details_not_a_sequence_uses_fallback_list() {
        let mut payload = full_payload("trees");
        payload["relate"]["details"] = json!("one long string");
        let profile = normalize(&payload.to_string(), "trees");

        assert_eq!(profile.relate.details, fallback::section_details(Facet::Relate));
        assert_eq!(
            profile.relate.summary,
            "Trees share resources through fungal networks."
        );
        assert_eq!(profile.fallback_fields, vec![ProfileField::RelateDetails]);
    }

    #[test]
    fn test_details_are_cleaned_and_truncated() {
        let mut payload = full_payload("trees");
        payload["perceive"]["details"] = json!(["a", 3, "", "b", "c", "d", "e"]);
        let profile = normalize(&payload.to_string(), "trees");

        assert_eq!(profile.perceive.details, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_short_details_are_padded_from_fallback() {
        let mut payload = full_payload("trees");
        payload["perceive"]["details"] = json!(["Phototropism"]);
        let profile = normalize(&payload.to_string(), "trees");

        let extra = fallback::section_details(Facet::Perceive);
        assert_eq!(profile.perceive.details.len(), MIN_DETAILS);
        assert_eq!(profile.perceive.details[0], "Phototropism");
        assert_eq!(profile.perceive.details[1..], extra[..2]);
        assert!(profile.research_backed);
        assert_eq!(profile.fallback_fields, vec![ProfileField::PerceiveDetails]);
    }

    #[test]
    fn test_section_as_plain_string_becomes_summary() {
        let mut payload = full_payload("trees");
        payload["apply"] = json!("Trees act slowly and deliberately.");
        let profile = normalize(&payload.to_string(), "trees");

        assert_eq!(profile.apply.summary, "Trees act slowly and deliberately.");
        assert_eq!(profile.apply.details, fallback::section_details(Facet::Apply));
        assert_eq!(profile.fallback_fields, vec![ProfileField::ApplyDetails]);
    }

    #[test]
    fn test_blank_and_null_values_count_as_missing() {
        let mut payload = full_payload("trees");
        payload["wisdomInsight"] = json!("   ");
        payload["humanLearnings"] = Value::Null;
        let profile = normalize(&payload.to_string(), "trees");

        assert_eq!(profile.wisdom_insight, fallback::wisdom_insight("trees"));
        assert_eq!(
            profile.fallback_fields,
            vec![ProfileField::WisdomInsight, ProfileField::HumanLearnings]
        );
    }

    #[test]
    fn test_fenced_partial_payload() {
        let raw = "```json\n{\"species\":\"trees\",\"wisdomInsight\":\"Roots listen.\"} \n```";
        let profile = normalize(raw, "trees");

        assert!(profile.research_backed);
        assert_eq!(profile.wisdom_insight, "Roots listen.");
        assert_eq!(
            profile.perceive.summary,
            fallback::section_summary(Facet::Perceive, "trees")
        );
        assert!(profile.is_complete());
        assert!(!profile.fallback_fields.contains(&ProfileField::WisdomInsight));
        assert!(profile.fallback_fields.contains(&ProfileField::Sources));
    }

    #[test]
    fn test_prose_wrapped_payload() {
        let raw = format!(
            "Here is the research you asked for:\n{}\nLet me know if you need more.",
            full_payload("trees")
        );
        let profile = normalize(&raw, "trees");
        assert_eq!(profile, expected_profile("trees"));
    }

    #[test]
    fn test_unparseable_inputs_fall_back_without_panicking() {
        let inputs = [
            "I could not research that species.",
            "{\"species\": \"trees\", \"wisdomInsight\": ",
            "}{",
            "{ not json }",
            "``````",
            "[1, 2, 3]",
            "{\"a\": 1} trailing } brace",
            "\u{0}{\u{7f}}",
        ];

        for raw in inputs {
            let profile = normalize(raw, "bees");
            assert!(!profile.research_backed, "input: {raw:?}");
            assert!(profile.fallback_reason.is_some());
            assert!(profile.is_complete());
        }
    }

    #[test]
    fn test_parse_payload_errors() {
        assert!(parse_payload("{\"x\": 1}").is_ok());
        assert_eq!(parse_payload("").unwrap_err(), NormalizeError::Empty);
        assert!(matches!(
            parse_payload("{ nope }").unwrap_err(),
            NormalizeError::InvalidJson(_)
        ));
        assert_eq!(
            parse_payload("just words").unwrap_err(),
            NormalizeError::NoJsonObject
        );
    }

    #[test]
    fn test_extract_candidate_is_greedy() {
        assert_eq!(extract_candidate("a {b} c {d} e"), Some("{b} c {d}"));
        assert_eq!(extract_candidate("no braces"), None);
        assert_eq!(extract_candidate("} before {"), None);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "\n{}\n");
    }
}
