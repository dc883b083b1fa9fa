//! Research request types.
//!
//! Mirrors the JSON body the browser client posts: `{species, prompt?, options?}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Validation failures for an incoming request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `species` was absent, empty or whitespace-only
    #[error("Species name is required")]
    MissingSpecies,

    /// Too many species in a single comparison
    #[error("At most {max} species can be compared at once, got {actual}")]
    TooManySpecies { max: usize, actual: usize },

    /// Comparison needs at least two species
    #[error("Please enter at least two species to compare")]
    TooFewSpecies,
}

/// Optional sections of the research prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct ResearchOptions {
    /// Ask for indigenous and traditional ecological knowledge
    pub include_indigenous: bool,
    /// Ask for biomimicry applications
    pub include_biomimicry: bool,
    /// Ask for the species' relationship with humans
    pub include_human: bool,
}

/// A request to research a single species.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    /// Unique request identifier
    #[serde(default = "new_request_id")]
    pub request_id: String,
    /// Species name, trimmed
    pub species: String,
    /// Caller-supplied prompt that replaces the server template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Prompt options
    #[serde(default)]
    pub options: ResearchOptions,
    /// When the request was made
    #[serde(default = "Utc::now")]
    pub requested_at: DateTime<Utc>,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl ResearchRequest {
    /// Create a request for a species, trimming the name.
    ///
    /// Fails when the trimmed name is empty.
    pub fn new(species: impl AsRef<str>) -> Result<Self, ValidationError> {
        let species = species.as_ref().trim();
        if species.is_empty() {
            return Err(ValidationError::MissingSpecies);
        }

        Ok(Self {
            request_id: new_request_id(),
            species: species.to_string(),
            prompt: None,
            options: ResearchOptions::default(),
            requested_at: Utc::now(),
        })
    }

    /// Set prompt options.
    pub fn with_options(mut self, options: ResearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Supply a prompt. Blank prompts are ignored.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
        self
    }

    /// Re-check the species invariant after deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.species.trim().is_empty() {
            Err(ValidationError::MissingSpecies)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_species() {
        let request = ResearchRequest::new("  octopuses \n").unwrap();
        assert_eq!(request.species, "octopuses");
        assert!(request.prompt.is_none());
        assert!(!request.request_id.is_empty());
    }

    #[test]
    fn test_blank_species_rejected() {
        assert_eq!(
            ResearchRequest::new("   ").unwrap_err(),
            ValidationError::MissingSpecies
        );
        assert_eq!(
            ResearchRequest::new("").unwrap_err(),
            ValidationError::MissingSpecies
        );
    }

    #[test]
    fn test_blank_prompt_ignored() {
        let request = ResearchRequest::new("trees").unwrap().with_prompt("  ");
        assert!(request.prompt.is_none());

        let request = ResearchRequest::new("trees").unwrap().with_prompt("Tell me");
        assert_eq!(request.prompt.as_deref(), Some("Tell me"));
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: ResearchOptions =
            serde_json::from_str(r#"{"includeIndigenous": true, "includeHuman": true}"#).unwrap();
        assert!(options.include_indigenous);
        assert!(!options.include_biomimicry);
        assert!(options.include_human);
    }
}
