//! Deterministic fallback content.
//!
//! Every template interpolates the species name through the `{species}`
//! placeholder. The same templates feed whole-profile fallbacks and
//! per-leaf fills, so a partially researched profile reads consistently.

use crate::profile::{Facet, FrameworkSection, ProfileField, SpeciesProfile, TextField};

const PLACEHOLDER: &str = "{species}";

const WISDOM_INSIGHT: &str = "{species} embodies a unique expression of consciousness that has evolved \
extraordinary ways of perceiving, relating to, and applying intelligence within the intricate web of life. \
Their form of awareness demonstrates that intelligence is not a hierarchy with humans at the top, but a \
spectrum of expressions, each contributing irreplaceable gifts to the planetary intelligence network. \
Understanding {species} invites us to expand our definition of intelligence and recognize the wisdom that \
exists in forms of awareness very different from our own.";

const PERCEIVE_SUMMARY: &str = "{species} perceives their world through sophisticated sensory systems that \
extend far beyond the conventional five senses, including sensitivity to subtle environmental fields. \
Their perceptual capabilities gather complex environmental information and maintain awareness of both \
local and distant conditions. Their self-awareness manifests in ways that transcend anthropocentric \
measures, revealing intelligence through environmental responsiveness and relational behaviour.";

const RELATE_SUMMARY: &str = "{species} maintains intricate relationships through communication systems \
that combine conventional signals with subtler forms of coordination. Their relational intelligence \
encompasses individual bonds, community structures, ecological partnerships and participation in larger \
networks of life. Their communication suggests access to shared information that supports coordination \
across space and time.";

const APPLY_SUMMARY: &str = "{species} applies intelligence through behavioural strategies that include \
both decisive action and strategic non-response, demonstrating the wisdom of knowing when and when not to \
engage. Creative problem-solving, innovative adaptation and timing intelligence let them thrive while \
contributing to ecosystem health. Their restraint often conserves energy and maintains harmony.";

const PERCEIVE_DETAILS: [&str; 4] = [
    "Multi-dimensional sensory integration beyond conventional human sensory experience",
    "Electromagnetic and environmental field awareness for navigation and assessment",
    "Fine-grained detection of chemical, vibrational and light signals",
    "Self-awareness demonstrated through environmental adaptation and social recognition beyond mirror tests",
];

const RELATE_DETAILS: [&str; 4] = [
    "Complex communication systems combining physical signals with empathic transmission",
    "Deep ecological relationships and symbiotic partnerships that support ecosystem balance",
    "Coordinated group behaviour within the species and across species boundaries",
    "Participation in collective networks and ecosystem-level intelligence coordination",
];

const APPLY_DETAILS: [&str; 4] = [
    "Creative problem-solving and innovative behavioural adaptations",
    "Strategic non-response and conscious restraint, knowing when not to act",
    "Timing intelligence and energy optimization aligned with ecosystem rhythms",
    "Ecosystem contributions that support biodiversity, balance and collective wellbeing",
];

const TEMPORAL: &str = "{species} demonstrates sophisticated temporal intelligence through precise \
synchronization with natural cycles, from daily circadian rhythms to seasonal and multi-year patterns. \
Internal biological clocks coordinate with lunar phases, solar cycles and planetary rhythms, enabling \
optimal timing for breeding, feeding, movement and other critical activities. Anticipatory behaviours \
suggest a temporal awareness that reaches beyond simple biological programming. Coordinating individual \
timing with group activity and ecosystem rhythms lets {species} act as a temporal coordinator within \
their habitat, supporting both individual survival and collective resilience.";

const ENERGETIC: &str = "{species} exhibits remarkable energetic intelligence through sensitivity to \
electromagnetic fields and efficient management of metabolic energy. Research suggests they detect and \
respond to subtle field variations, using this sensitivity for orientation, communication and \
environmental assessment. Their ability to optimize energy expenditure while maintaining complex \
behaviours integrates physical metabolism with responsiveness to their surroundings. This energetic \
awareness helps {species} maintain the flow and balance of energy that supports living systems.";

const COLLECTIVE: &str = "{species} participates in collective intelligence networks that enable group \
decision-making, distributed problem-solving and emergent behaviours exceeding individual capabilities. \
Group decisions often demonstrate wisdom that individual members could not reach alone. Information \
sharing across individuals allows rapid, coordinated responses to environmental challenges. This \
collective wisdom lets {species} adapt quickly to changing conditions and contributes to ecosystem \
stability through coordinated responses.";

const ADAPTIVE: &str = "{species} demonstrates extraordinary adaptive intelligence through flexible \
behavioural strategies that allow thriving across diverse and changing conditions. Adaptation operates \
through rapid real-time responses, seasonal adjustments and long-term evolutionary change. Crisis \
responses show sophisticated risk assessment and resource allocation, and novel challenges elicit \
creative solutions that go beyond programmed behaviour. By balancing change with continuity, {species} \
maintains resilience while contributing to ecosystem stability.";

const QUANTUM: &str = "{species} may rely on quantum coherence effects in biological processes such as \
navigation, sensing and cellular signalling. Research in quantum biology suggests that some organisms \
maintain coherent states for efficient information processing and magnetic field detection. Behaviours \
that show rapid group coordination and fine environmental sensitivity invite further study into these \
mechanisms. While science continues to explore these connections, {species} reminds us that awareness \
may operate through mechanisms beyond current understanding.";

const HUMAN_LEARNINGS: &str = "Humans can learn profound lessons from {species} about developing our own \
intuitive capacities for empathic connection and deeper relationship with the living world. Their \
example shows how intelligence operates through relationship, cooperation and ecological integration \
rather than dominance and separation. Their integration of individual awareness with collective \
intelligence offers models for communities seeking harmony and shared wisdom. Most importantly, \
{species} teaches us that intelligence manifests in countless forms across the web of life.";

const CONSERVATION: &str = "{species}'s unique form of intelligence represents an irreplaceable \
contribution to planetary ecosystems that cannot be restored once lost to extinction. Their environmental \
relationships create ecosystem services that extend beyond immediate biological functions. Protecting \
{species} means preserving not only biological diversity but diversity of intelligence and awareness. \
Understanding their capabilities shows why their conservation is critical for ecosystem health and the \
resilience of all life.";

const SOURCES: [&str; 5] = [
    "Consciousness research and interspecies communication studies",
    "Quantum biology and biophysics research applications",
    "Behavioral ecology and ethological research",
    "Indigenous knowledge systems and traditional ecological wisdom",
    "Unified field theory and biophysics applications",
];

/// Reason attached when there was nothing to parse.
pub const NO_UPSTREAM_RESPONSE: &str = "no upstream response";

fn render(template: &str, species: &str) -> String {
    template.replace(PLACEHOLDER, species)
}

pub fn wisdom_insight(species: &str) -> String {
    render(WISDOM_INSIGHT, species)
}

pub fn section_summary(facet: Facet, species: &str) -> String {
    let template = match facet {
        Facet::Perceive => PERCEIVE_SUMMARY,
        Facet::Relate => RELATE_SUMMARY,
        Facet::Apply => APPLY_SUMMARY,
    };
    render(template, species)
}

pub fn section_details(facet: Facet) -> Vec<String> {
    let details = match facet {
        Facet::Perceive => &PERCEIVE_DETAILS,
        Facet::Relate => &RELATE_DETAILS,
        Facet::Apply => &APPLY_DETAILS,
    };
    details.iter().map(|d| d.to_string()).collect()
}

pub fn section(facet: Facet, species: &str) -> FrameworkSection {
    FrameworkSection::new(section_summary(facet, species), section_details(facet))
}

pub fn text(field: TextField, species: &str) -> String {
    let template = match field {
        TextField::TemporalIntelligence => TEMPORAL,
        TextField::EnergeticIntelligence => ENERGETIC,
        TextField::CollectiveWisdom => COLLECTIVE,
        TextField::AdaptiveStrategies => ADAPTIVE,
        TextField::QuantumAspects => QUANTUM,
        TextField::HumanLearnings => HUMAN_LEARNINGS,
        TextField::ConservationWisdom => CONSERVATION,
    };
    render(template, species)
}

pub fn sources() -> Vec<String> {
    SOURCES.iter().map(|s| s.to_string()).collect()
}

/// A profile built entirely from fallback text.
pub fn profile(species: &str, reason: impl Into<String>) -> SpeciesProfile {
    SpeciesProfile {
        species: species.to_string(),
        wisdom_insight: wisdom_insight(species),
        perceive: section(Facet::Perceive, species),
        relate: section(Facet::Relate, species),
        apply: section(Facet::Apply, species),
        temporal_intelligence: text(TextField::TemporalIntelligence, species),
        energetic_intelligence: text(TextField::EnergeticIntelligence, species),
        collective_wisdom: text(TextField::CollectiveWisdom, species),
        adaptive_strategies: text(TextField::AdaptiveStrategies, species),
        quantum_aspects: text(TextField::QuantumAspects, species),
        human_learnings: text(TextField::HumanLearnings, species),
        conservation_wisdom: text(TextField::ConservationWisdom, species),
        sources: sources(),
        research_backed: false,
        fallback_reason: Some(reason.into()),
        fallback_fields: ProfileField::ALL.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_profile_is_complete() {
        let profile = profile("octopuses", NO_UPSTREAM_RESPONSE);

        assert!(profile.is_complete());
        assert!(!profile.research_backed);
        assert_eq!(profile.fallback_reason.as_deref(), Some("no upstream response"));
        assert_eq!(profile.fallback_fields.len(), ProfileField::ALL.len());
    }

    #[test]
    fn test_interpolating_templates_mention_species() {
        let species = "mycelial networks";
        let profile = profile(species, "test");

        assert_eq!(profile.species, species);
        assert!(profile.wisdom_insight.contains(species));
        for facet in Facet::ALL {
            assert!(profile.section(facet).summary.contains(species));
            assert_eq!(profile.section(facet).details.len(), 4);
        }
        for field in TextField::ALL {
            assert!(profile.text(field).contains(species), "{:?}", field);
            assert!(!profile.text(field).contains(PLACEHOLDER));
        }
    }

    #[test]
    fn test_templates_are_deterministic() {
        assert_eq!(profile("bees", "a"), profile("bees", "a"));
    }
}
