//! Prompt templates and model parameters.
//!
//! Prompt variants are data, not code paths. A [`ResearchProfile`] pairs a
//! [`PromptTemplate`] with the [`ModelParams`] used to send it, so switching
//! from the full framework prompt to the concise academic one is a
//! configuration change.
//!
//! Placeholders:
//! - `{species}`: the species name
//! - `{indigenous}`, `{biomimicry}`, `{human}`: optional sections, rendered
//!   only when the matching [`ResearchOptions`] flag is set
//! - `{format}`: the JSON response skeleton shared by all templates

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::ResearchOptions;

/// Default upstream model.
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
/// Default output token cap.
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default upstream timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const QUANTUM_SYSTEM: &str = "You are a multidisciplinary species intelligence researcher working \
across ethology, neuroscience, quantum biology, consciousness studies and indigenous knowledge \
traditions.";

const QUANTUM_BODY: &str = "You are researching {species} through the Perceive/Relate/Apply \
framework, which treats intelligence as the capacity to relate to information rather than to solve \
problems, and which recognizes intelligence as a relational phenomenon across all life.

1. PERCEIVE - how {species} becomes aware of information:
   - Sensory capabilities beyond the traditional five senses
   - Self-awareness indicators that go beyond mirror tests
   - Electromagnetic and field sensitivity

2. RELATE - how {species} processes information in relationship:
   - Social structures and communication methods
   - Ecological relationships and symbiosis
   - Empathic connection and collective intelligence

3. APPLY - how {species} acts on information:
   - Problem-solving and creative adaptation
   - Strategic non-response: knowing when not to act
   - Contributions to ecosystem health and timing intelligence

Also cover temporal intelligence (cycles, rhythms, migration timing), energetic intelligence \
(field sensitivity, energy optimization), collective wisdom (group decisions, emergent behaviour), \
adaptive strategies (flexibility, crisis response) and quantum aspects of their biology, presented \
in accessible terms.

Synthesize peer-reviewed biology and ethology, quantum biology, consciousness research and field \
observations.{indigenous}{biomimicry}{human}

{format}

Write with scientific depth while remaining accessible. Respond ONLY with valid JSON, with no text \
outside the JSON structure.";

const ACADEMIC_SYSTEM: &str = "You are a behavioural ecologist who writes concise, well-sourced \
research summaries for a general audience.";

const ACADEMIC_BODY: &str = "Summarize current scientific understanding of the intelligence of \
{species} using the Perceive/Relate/Apply framework: how they sense their world, how they relate \
to others, and how they act, including when they choose not to act. Prefer documented findings \
from peer-reviewed ethology, neuroscience and ecology, and name the studies you draw on in \
`sources`.{indigenous}{biomimicry}{human}

{format}

Keep each summary to 2-3 sentences and each text field to 3-4 sentences. Respond ONLY with valid \
JSON.";

const INDIGENOUS_SECTION: &str = "
- Indigenous and traditional ecological knowledge about {species} from cultures worldwide
- Ceremonial relationships, traditional uses and ancestral teachings about {species}";

const BIOMIMICRY_SECTION: &str = "
- Current biomimicry applications and technologies inspired by {species}
- Potential future innovations based on their capabilities and adaptations";

const HUMAN_SECTION: &str = "
- The relationship between {species} and humans, past and present
- What human communities can learn from {species}";

const RESPONSE_FORMAT: &str = r#"Respond with a JSON object with exactly this structure:
{
  "species": "{species}",
  "wisdomInsight": "3-4 sentences on what {species} teaches about the nature of intelligence",
  "perceive": {
    "summary": "How {species} perceives their world (3-4 sentences)",
    "details": ["perceptual capability", "perceptual capability", "field or energetic perception", "self-awareness indicator"]
  },
  "relate": {
    "summary": "How {species} relates through communication and relationship (3-4 sentences)",
    "details": ["communication aspect", "relationship aspect", "empathic connection", "collective participation"]
  },
  "apply": {
    "summary": "How {species} applies intelligence through action and strategic non-response (3-4 sentences)",
    "details": ["application example", "strategic non-response example", "creative behaviour", "ecosystem contribution"]
  },
  "temporalIntelligence": "Relationship with time and cycles, with examples",
  "energeticIntelligence": "Field sensitivity and energy optimization, with examples",
  "collectiveWisdom": "Group decision-making and distributed intelligence, with examples",
  "adaptiveStrategies": "Adaptation mechanisms and crisis responses, with examples",
  "quantumAspects": "Quantum biology connections in accessible terms",
  "humanLearnings": "What humans can learn from {species}",
  "conservationWisdom": "Why conserving {species} matters for ecosystem health",
  "sources": ["source", "source", "source"]
}"#;

/// A named prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Template name (`quantum`, `academic`, or custom)
    pub name: String,
    /// System prompt sent alongside the user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// User message body with placeholders
    pub body: String,
}

impl PromptTemplate {
    /// Build a custom template.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system: None,
            body: body.into(),
        }
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// The full Perceive/Relate/Apply framework prompt.
    pub fn quantum() -> Self {
        Self::new("quantum", QUANTUM_BODY).with_system(QUANTUM_SYSTEM)
    }

    /// A concise, citation-oriented prompt.
    pub fn academic() -> Self {
        Self::new("academic", ACADEMIC_BODY).with_system(ACADEMIC_SYSTEM)
    }

    /// Look up a built-in template by name (case-insensitive).
    pub fn builtin(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "quantum" => Some(Self::quantum()),
            "academic" => Some(Self::academic()),
            _ => None,
        }
    }

    /// Render the user message for a species.
    ///
    /// Optional sections are substituted before `{species}` so their own
    /// placeholders are filled too.
    pub fn render(&self, species: &str, options: &ResearchOptions) -> String {
        let section = |enabled: bool, text: &'static str| if enabled { text } else { "" };

        self.body
            .replace("{format}", RESPONSE_FORMAT)
            .replace("{indigenous}", section(options.include_indigenous, INDIGENOUS_SECTION))
            .replace("{biomimicry}", section(options.include_biomimicry, BIOMIMICRY_SECTION))
            .replace("{human}", section(options.include_human, HUMAN_SECTION))
            .replace("{species}", species)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::quantum()
    }
}

/// Parameters for one upstream call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Template plus model parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchProfile {
    pub template: PromptTemplate,
    pub params: ModelParams,
}

impl ResearchProfile {
    pub fn new(template: PromptTemplate, params: ModelParams) -> Self {
        Self { template, params }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
