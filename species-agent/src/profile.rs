//! Species profile types.
//!
//! The canonical, always-populated shape returned to the browser client.
//! Field names serialize in camelCase to match the front-end.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Minimum number of detail items a framework section is expected to carry.
pub const MIN_DETAILS: usize = 3;

/// Maximum number of detail items kept per framework section.
pub const MAX_DETAILS: usize = 4;

/// The three fixed analytical facets of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// How the species becomes aware of information
    Perceive,
    /// How the species processes information in relationship
    Relate,
    /// How the species acts on information
    Apply,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Perceive, Facet::Relate, Facet::Apply];

    /// JSON key of this facet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Perceive => "perceive",
            Facet::Relate => "relate",
            Facet::Apply => "apply",
        }
    }

    pub fn summary_field(&self) -> ProfileField {
        match self {
            Facet::Perceive => ProfileField::PerceiveSummary,
            Facet::Relate => ProfileField::RelateSummary,
            Facet::Apply => ProfileField::ApplySummary,
        }
    }

    pub fn details_field(&self) -> ProfileField {
        match self {
            Facet::Perceive => ProfileField::PerceiveDetails,
            Facet::Relate => ProfileField::RelateDetails,
            Facet::Apply => ProfileField::ApplyDetails,
        }
    }
}

/// The free-text dimensions of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    TemporalIntelligence,
    EnergeticIntelligence,
    CollectiveWisdom,
    AdaptiveStrategies,
    QuantumAspects,
    HumanLearnings,
    ConservationWisdom,
}

impl TextField {
    pub const ALL: [TextField; 7] = [
        TextField::TemporalIntelligence,
        TextField::EnergeticIntelligence,
        TextField::CollectiveWisdom,
        TextField::AdaptiveStrategies,
        TextField::QuantumAspects,
        TextField::HumanLearnings,
        TextField::ConservationWisdom,
    ];

    /// JSON key of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextField::TemporalIntelligence => "temporalIntelligence",
            TextField::EnergeticIntelligence => "energeticIntelligence",
            TextField::CollectiveWisdom => "collectiveWisdom",
            TextField::AdaptiveStrategies => "adaptiveStrategies",
            TextField::QuantumAspects => "quantumAspects",
            TextField::HumanLearnings => "humanLearnings",
            TextField::ConservationWisdom => "conservationWisdom",
        }
    }

    pub fn profile_field(&self) -> ProfileField {
        match self {
            TextField::TemporalIntelligence => ProfileField::TemporalIntelligence,
            TextField::EnergeticIntelligence => ProfileField::EnergeticIntelligence,
            TextField::CollectiveWisdom => ProfileField::CollectiveWisdom,
            TextField::AdaptiveStrategies => ProfileField::AdaptiveStrategies,
            TextField::QuantumAspects => ProfileField::QuantumAspects,
            TextField::HumanLearnings => ProfileField::HumanLearnings,
            TextField::ConservationWisdom => ProfileField::ConservationWisdom,
        }
    }
}

/// Every leaf of a profile that can be filled from fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum ProfileField {
    #[serde(rename = "species")]
    Species,
    #[serde(rename = "wisdomInsight")]
    WisdomInsight,
    #[serde(rename = "perceive.summary")]
    PerceiveSummary,
    #[serde(rename = "perceive.details")]
    PerceiveDetails,
    #[serde(rename = "relate.summary")]
    RelateSummary,
    #[serde(rename = "relate.details")]
    RelateDetails,
    #[serde(rename = "apply.summary")]
    ApplySummary,
    #[serde(rename = "apply.details")]
    ApplyDetails,
    #[serde(rename = "temporalIntelligence")]
    TemporalIntelligence,
    #[serde(rename = "energeticIntelligence")]
    EnergeticIntelligence,
    #[serde(rename = "collectiveWisdom")]
    CollectiveWisdom,
    #[serde(rename = "adaptiveStrategies")]
    AdaptiveStrategies,
    #[serde(rename = "quantumAspects")]
    QuantumAspects,
    #[serde(rename = "humanLearnings")]
    HumanLearnings,
    #[serde(rename = "conservationWisdom")]
    ConservationWisdom,
    #[serde(rename = "sources")]
    Sources,
}

impl ProfileField {
    /// All leaves in declaration order.
    pub const ALL: [ProfileField; 16] = [
        ProfileField::Species,
        ProfileField::WisdomInsight,
        ProfileField::PerceiveSummary,
        ProfileField::PerceiveDetails,
        ProfileField::RelateSummary,
        ProfileField::RelateDetails,
        ProfileField::ApplySummary,
        ProfileField::ApplyDetails,
        ProfileField::TemporalIntelligence,
        ProfileField::EnergeticIntelligence,
        ProfileField::CollectiveWisdom,
        ProfileField::AdaptiveStrategies,
        ProfileField::QuantumAspects,
        ProfileField::HumanLearnings,
        ProfileField::ConservationWisdom,
        ProfileField::Sources,
    ];
}

/// One facet of a profile: a summary plus a short list of details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FrameworkSection {
    pub summary: String,
    pub details: Vec<String>,
}

impl FrameworkSection {
    pub fn new(summary: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            summary: summary.into(),
            details,
        }
    }
}

/// The normalized research record for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SpeciesProfile {
    pub species: String,
    pub wisdom_insight: String,
    pub perceive: FrameworkSection,
    pub relate: FrameworkSection,
    pub apply: FrameworkSection,
    pub temporal_intelligence: String,
    pub energetic_intelligence: String,
    pub collective_wisdom: String,
    pub adaptive_strategies: String,
    pub quantum_aspects: String,
    pub human_learnings: String,
    pub conservation_wisdom: String,
    pub sources: Vec<String>,
    /// True only when the upstream response was received and parsed
    pub research_backed: bool,
    /// Why the profile is templated rather than researched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Leaves filled from fallback text
    #[serde(default)]
    pub fallback_fields: Vec<ProfileField>,
}

impl SpeciesProfile {
    pub fn section(&self, facet: Facet) -> &FrameworkSection {
        match facet {
            Facet::Perceive => &self.perceive,
            Facet::Relate => &self.relate,
            Facet::Apply => &self.apply,
        }
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::TemporalIntelligence => &self.temporal_intelligence,
            TextField::EnergeticIntelligence => &self.energetic_intelligence,
            TextField::CollectiveWisdom => &self.collective_wisdom,
            TextField::AdaptiveStrategies => &self.adaptive_strategies,
            TextField::QuantumAspects => &self.quantum_aspects,
            TextField::HumanLearnings => &self.human_learnings,
            TextField::ConservationWisdom => &self.conservation_wisdom,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::TemporalIntelligence => &mut self.temporal_intelligence,
            TextField::EnergeticIntelligence => &mut self.energetic_intelligence,
            TextField::CollectiveWisdom => &mut self.collective_wisdom,
            TextField::AdaptiveStrategies => &mut self.adaptive_strategies,
            TextField::QuantumAspects => &mut self.quantum_aspects,
            TextField::HumanLearnings => &mut self.human_learnings,
            TextField::ConservationWisdom => &mut self.conservation_wisdom,
        }
    }

    /// Whether a leaf carries upstream research rather than fallback text.
    pub fn is_researched(&self, field: ProfileField) -> bool {
        self.research_backed && !self.fallback_fields.contains(&field)
    }

    /// Check the "every field populated" invariant.
    pub fn is_complete(&self) -> bool {
        let sections_ok = Facet::ALL.iter().all(|facet| {
            let section = self.section(*facet);
            !section.summary.trim().is_empty()
                && !section.details.is_empty()
                && section.details.iter().all(|d| !d.trim().is_empty())
        });
        let texts_ok = TextField::ALL
            .iter()
            .all(|field| !self.text(*field).trim().is_empty());

        !self.species.trim().is_empty()
            && !self.wisdom_insight.trim().is_empty()
            && sections_ok
            && texts_ok
            && !self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_field_serializes_as_path() {
        let json = serde_json::to_string(&ProfileField::ApplyDetails).unwrap();
        assert_eq!(json, r#""apply.details""#);

        let field: ProfileField = serde_json::from_str(r#""wisdomInsight""#).unwrap();
        assert_eq!(field, ProfileField::WisdomInsight);
    }

    #[test]
    fn test_facet_fields() {
        assert_eq!(Facet::Relate.summary_field(), ProfileField::RelateSummary);
        assert_eq!(Facet::Relate.details_field(), ProfileField::RelateDetails);
        assert_eq!(Facet::Apply.as_str(), "apply");
    }

    #[test]
    fn test_text_field_keys_match_profile_field_names() {
        for field in TextField::ALL {
            let json = serde_json::to_string(&field.profile_field()).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
