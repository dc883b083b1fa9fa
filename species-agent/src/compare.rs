//! Multi-species comparison.
//!
//! Builds the similarities/differences/contribution summary shown after a
//! multi-species research run.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::profile::{ProfileField, SpeciesProfile, MIN_DETAILS};

/// Summary of several profiles side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub similarities: Vec<String>,
    pub differences: Vec<String>,
    pub whole_life_contribution: Vec<String>,
}

fn non_response_example(species: &str) -> String {
    let lower = species.to_lowercase();
    if lower.contains("tree") {
        "trees through dormancy".to_string()
    } else if lower.contains("octop") {
        "octopuses through camouflage stillness".to_string()
    } else if lower.contains("human") {
        "humans through mindful restraint".to_string()
    } else {
        format!("{species} through strategic timing")
    }
}

/// First sentence of `text`, including its terminator.
fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    match text.find(". ") {
        Some(idx) => &text[..=idx],
        None => text,
    }
}

/// Compare profiles in the order given.
pub fn compare(profiles: &[SpeciesProfile]) -> Comparison {
    let n = profiles.len();
    let mut comparison = Comparison::default();
    if n == 0 {
        return comparison;
    }

    if profiles
        .iter()
        .all(|p| p.is_researched(ProfileField::QuantumAspects))
    {
        comparison.similarities.push(format!(
            "All {n} life forms show signs of quantum coherence in their biological processes, \
suggesting intelligence is a phenomenon that crosses species boundaries."
        ));
    }

    if profiles.iter().all(|p| p.apply.details.len() >= MIN_DETAILS) {
        let examples = profiles
            .iter()
            .map(|p| non_response_example(&p.species))
            .collect::<Vec<_>>()
            .join(", ");
        comparison.similarities.push(format!(
            "Each demonstrates strategic non-response as intelligence: {examples}. Knowing when \
not to act is a shared principle."
        ));
    }

    if profiles.iter().all(|p| p.relate.details.len() >= MIN_DETAILS) {
        comparison.similarities.push(
            "All forms communicate relationally beyond individual boundaries, showing that \
intelligence is fundamentally about connection."
                .to_string(),
        );
    }

    comparison.differences.push(format!(
        "These {n} life forms operate across different timescales and spatial domains, showing \
how intelligence adapts to diverse ecological niches while keeping its relational core."
    ));
    if n >= 3 {
        comparison.differences.push(
            "Together they span the range of intelligence strategies, from rapid individual \
creativity to patient networked wisdom to collective thinking."
                .to_string(),
        );
    }

    for profile in profiles {
        comparison.whole_life_contribution.push(format!(
            "{}: {}",
            profile.species,
            first_sentence(&profile.wisdom_insight)
        ));
    }
    comparison.whole_life_contribution.push(format!(
        "Together, these {n} forms of intelligence each contribute unique capacities that \
strengthen the whole web of life."
    ));

    comparison
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    fn researched(species: &str) -> SpeciesProfile {
        let mut profile = fallback::profile(species, "");
        profile.research_backed = true;
        profile.fallback_reason = None;
        profile.fallback_fields.clear();
        profile.wisdom_insight = format!("{species} teach patience. They also teach timing.");
        profile
    }

    #[test]
    fn test_two_researched_species() {
        let comparison = compare(&[researched("Oak trees"), researched("octopuses")]);

        assert_eq!(comparison.similarities.len(), 3);
        assert!(comparison.similarities[1]
            .contains("trees through dormancy, octopuses through camouflage stillness"));
        assert_eq!(comparison.differences.len(), 1);
        assert_eq!(
            comparison.whole_life_contribution,
            vec![
                "Oak trees: Oak trees teach patience.".to_string(),
                "octopuses: octopuses teach patience.".to_string(),
                "Together, these 2 forms of intelligence each contribute unique capacities that strengthen the whole web of life.".to_string(),
            ]
        );
    }

    #[test]
    fn test_fallback_profiles_skip_quantum_similarity() {
        let profiles = vec![
            fallback::profile("bees", "down"),
            fallback::profile("crows", "down"),
            fallback::profile("humans", "down"),
        ];
        let comparison = compare(&profiles);

        assert!(comparison.similarities.iter().all(|s| !s.contains("quantum")));
        assert!(comparison.similarities[0].contains("humans through mindful restraint"));
        assert_eq!(comparison.differences.len(), 2);
        assert_eq!(comparison.whole_life_contribution.len(), 4);
    }

    #[test]
    fn test_short_details_drop_similarity() {
        let mut a = researched("bees");
        a.relate.details.truncate(2);
        let comparison = compare(&[a, researched("ants")]);

        assert!(comparison
            .similarities
            .iter()
            .all(|s| !s.contains("communicate relationally")));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compare(&[]), Comparison::default());
    }
}
