//! ResearchService - main entry point for species research.
//!
//! Walks an ordered list of LLM backends, normalizes whatever comes back,
//! scores the profile and records usage against the budget ledger.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::traits::{CompletionRequest, LlmBackend, LlmError, Usage};
use crate::budget::{BudgetError, BudgetStatus, UsageLedger};
use crate::compare::{compare, Comparison};
use crate::fallback;
use crate::metrics::{IntelligenceMetrics, MapPoint, TriangleLayout};
use crate::normalize::normalize;
use crate::profile::SpeciesProfile;
use crate::prompt::ResearchProfile;
use crate::request::{ResearchOptions, ResearchRequest, ValidationError};

/// Species appended to a comparison when `include_human` is set.
pub const HUMAN_SPECIES: &str = "humans";

/// Error types for the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request validation error
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// A backend is misconfigured; the request cannot be served
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Budget enforcement refused the request
    #[error("Budget exhausted: {0}")]
    BudgetExhausted(#[from] BudgetError),
}

/// Configuration for the ResearchService.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Prompt template and model parameters
    pub profile: ResearchProfile,
    /// Use a caller-supplied prompt instead of the template
    pub allow_client_prompt: bool,
    /// Refuse requests once the budget is exhausted
    pub enforce_budget: bool,
    /// Maximum species per comparison
    pub max_compare_species: usize,
    /// Map geometry
    pub layout: TriangleLayout,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            profile: ResearchProfile::default(),
            allow_client_prompt: true,
            enforce_budget: false,
            max_compare_species: 5,
            layout: TriangleLayout::default(),
        }
    }
}

/// Result of researching one species.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutcome {
    pub request_id: String,
    pub profile: SpeciesProfile,
    pub metrics: IntelligenceMetrics,
    pub map_point: MapPoint,
    /// Backend that produced the raw text, if any did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub budget: BudgetStatus,
    pub duration_ms: u64,
}

/// Result of researching several species.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOutcome {
    pub outcomes: Vec<ResearchOutcome>,
    pub comparison: Comparison,
}

/// Main entry point for species research.
pub struct ResearchService {
    /// Configuration
    config: ServiceConfig,
    /// Backends in priority order
    backends: Vec<Arc<dyn LlmBackend>>,
    /// Usage ledger
    ledger: Arc<UsageLedger>,
}

impl ResearchService {
    /// Create a new service with the given backends.
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>, ledger: Arc<UsageLedger>) -> Self {
        Self {
            config: ServiceConfig::default(),
            backends,
            ledger,
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    pub fn backend_ids(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.id().to_string()).collect()
    }

    /// Current budget snapshot.
    pub async fn budget_status(&self) -> BudgetStatus {
        self.ledger.status(today()).await
    }

    /// Research one species.
    ///
    /// Only validation, configuration and (when enforced) budget failures
    /// are errors. Upstream failures of any other kind produce a fallback
    /// profile.
    pub async fn research(&self, request: ResearchRequest) -> Result<ResearchOutcome, ServiceError> {
        let start = Instant::now();
        request.validate()?;

        let today = today();
        if self.config.enforce_budget {
            if let Err(e) = self.ledger.check(today).await {
                warn!(request_id = %request.request_id, error = %e, "Budget exhausted, refusing request");
                return Err(e.into());
            }
        }

        info!(
            request_id = %request.request_id,
            species = %request.species,
            "Researching species"
        );

        let completion = self.build_completion(&request);
        let mut last_error: Option<LlmError> = None;
        let mut answered = None;

        for backend in &self.backends {
            debug!(request_id = %request.request_id, backend = backend.id(), "Calling backend");
            match backend.complete(completion.clone()).await {
                Ok(response) => {
                    answered = Some((backend.id().to_string(), response));
                    break;
                }
                Err(e) if e.is_configuration() => {
                    warn!(request_id = %request.request_id, backend = backend.id(), error = %e, "Backend misconfigured");
                    return Err(ServiceError::Configuration(e.to_string()));
                }
                Err(e) => {
                    warn!(request_id = %request.request_id, backend = backend.id(), error = %e, "Backend failed");
                    last_error = Some(e);
                }
            }
        }

        let (profile, backend_id, usage) = match answered {
            Some((backend_id, response)) => (
                normalize(&response.content, &request.species),
                Some(backend_id),
                response.usage,
            ),
            None => {
                let reason = match &last_error {
                    Some(e) => format!("Research upstream unavailable: {}", e.summary()),
                    None => fallback::NO_UPSTREAM_RESPONSE.to_string(),
                };
                (fallback::profile(&request.species, reason), None, None)
            }
        };

        let budget = if self.backends.is_empty() {
            self.ledger.status(today).await
        } else {
            let cost = usage
                .as_ref()
                .map(|u| self.ledger.cost_model().cost(u))
                .unwrap_or(0.0);
            self.ledger.record(today, cost).await
        };

        let metrics = IntelligenceMetrics::from_profile(&profile);
        let map_point = self.config.layout.map_point(&profile.species, metrics);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            request_id = %request.request_id,
            species = %request.species,
            research_backed = profile.research_backed,
            tokens = usage.map(|u| u.total()),
            duration_ms,
            "Research complete"
        );

        Ok(ResearchOutcome {
            request_id: request.request_id,
            profile,
            metrics,
            map_point,
            backend_id,
            usage,
            budget,
            duration_ms,
        })
    }

    /// Research several species one after another, in input order.
    ///
    /// Blank names are skipped. With `include_human`, humans are researched
    /// last unless already listed.
    pub async fn research_many<S: AsRef<str>>(
        &self,
        names: &[S],
        options: ResearchOptions,
    ) -> Result<Vec<ResearchOutcome>, ServiceError> {
        let mut outcomes = Vec::new();
        for name in species_units(names, options) {
            let request = ResearchRequest::new(&name)?.with_options(options);
            outcomes.push(self.research(request).await?);
        }
        Ok(outcomes)
    }

    /// Research and compare two or more species.
    pub async fn compare_species<S: AsRef<str>>(
        &self,
        names: &[S],
        options: ResearchOptions,
    ) -> Result<ComparisonOutcome, ServiceError> {
        let listed = names.iter().filter(|n| !n.as_ref().trim().is_empty()).count();
        if listed < 2 {
            return Err(ValidationError::TooFewSpecies.into());
        }
        let units = species_units(names, options);
        if units.len() > self.config.max_compare_species {
            return Err(ValidationError::TooManySpecies {
                max: self.config.max_compare_species,
                actual: units.len(),
            }
            .into());
        }

        let outcomes = self.research_many(units.as_slice(), options).await?;
        let profiles: Vec<SpeciesProfile> = outcomes.iter().map(|o| o.profile.clone()).collect();

        Ok(ComparisonOutcome {
            comparison: compare(&profiles),
            outcomes,
        })
    }

    fn build_completion(&self, request: &ResearchRequest) -> CompletionRequest {
        let params = &self.config.profile.params;
        let template = &self.config.profile.template;

        let base = match (&request.prompt, self.config.allow_client_prompt) {
            (Some(prompt), true) => CompletionRequest::user(prompt),
            _ => {
                let rendered = template.render(&request.species, &request.options);
                let completion = CompletionRequest::user(rendered);
                match &template.system {
                    Some(system) => completion.with_system(system),
                    None => completion,
                }
            }
        };

        base.with_max_tokens(params.max_tokens)
            .with_temperature(params.temperature)
            .with_context(&request.species, request.options)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trimmed, non-blank names in order, plus humans when requested.
fn species_units<S: AsRef<str>>(names: &[S], options: ResearchOptions) -> Vec<String> {
    let mut units: Vec<String> = names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();

    if options.include_human && !units.iter().any(|u| u.eq_ignore_ascii_case(HUMAN_SPECIES)) {
        units.push(HUMAN_SPECIES.to_string());
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::budget::BudgetLimits;
    use crate::profile::{Facet, ProfileField};
    use serde_json::json;

    fn ledger() -> Arc<UsageLedger> {
        Arc::new(UsageLedger::in_memory(BudgetLimits::default()))
    }

    fn full_payload(species: &str) -> String {
        json!({
            "species": species,
            "wisdomInsight": "Insight.",
            "perceive": {"summary": "P.", "details": ["a", "b", "c", "d"]},
            "relate": {"summary": "R.", "details": ["a", "b", "c"]},
            "apply": {"summary": "A.", "details": ["a", "b", "c", "d"]},
            "temporalIntelligence": "T.",
            "energeticIntelligence": "E.",
            "collectiveWisdom": "C.",
            "adaptiveStrategies": "S.",
            "quantumAspects": "Q.",
            "humanLearnings": "H.",
            "conservationWisdom": "W.",
            "sources": ["one"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_research_with_well_formed_response() {
        let backend = Arc::new(
            MockBackend::new("primary")
                .with_response(full_payload("octopuses"))
                .with_usage(1000, 2000),
        );
        let service = ResearchService::new(vec![backend.clone()], ledger());

        let outcome = service
            .research(ResearchRequest::new("octopuses").unwrap())
            .await
            .unwrap();

        assert!(outcome.profile.research_backed);
        assert!(outcome.profile.fallback_fields.is_empty());
        assert_eq!(outcome.backend_id.as_deref(), Some("primary"));
        assert_eq!(outcome.budget.daily_count, 1);
        // 1000 * 3 / 1e6 + 2000 * 15 / 1e6
        assert!((outcome.budget.monthly_spend - 0.033).abs() < 1e-9);
        assert_eq!(backend.call_count(), 1);
        assert!(backend.last_prompt().unwrap().contains("octopuses"));
    }

    #[tokio::test]
    async fn test_network_failure_falls_back() {
        let backend = Arc::new(
            MockBackend::new("primary").with_error(LlmError::NetworkError("refused".into())),
        );
        let service = ResearchService::new(vec![backend.clone()], ledger());

        let outcome = service
            .research(ResearchRequest::new("octopuses").unwrap())
            .await
            .unwrap();

        assert!(!outcome.profile.research_backed);
        assert!(outcome.profile.perceive.summary.contains("octopuses"));
        assert!(outcome
            .profile
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("upstream unreachable"));
        assert!(outcome.backend_id.is_none());
        assert_eq!(outcome.budget.daily_count, 1);
    }

    #[tokio::test]
    async fn test_upstream_body_kept_out_of_fallback_reason() {
        let backend = Arc::new(MockBackend::new("primary").with_error(LlmError::Upstream {
            status: 401,
            body: r#"{"type":"error","error":{"message":"invalid x-api-key"}}"#.to_string(),
        }));
        let service = ResearchService::new(vec![backend], ledger());

        let outcome = service
            .research(ResearchRequest::new("octopuses").unwrap())
            .await
            .unwrap();

        let reason = outcome.profile.fallback_reason.unwrap();
        assert_eq!(reason, "Research upstream unavailable: upstream error 401");
        assert!(!reason.contains("x-api-key"));
    }

    #[tokio::test]
    async fn test_second_backend_used_after_failure() {
        let primary = Arc::new(
            MockBackend::new("primary").with_error(LlmError::Timeout { after_ms: 30_000 }),
        );
        let relay = Arc::new(MockBackend::new("relay").with_response(full_payload("bees")));
        let service = ResearchService::new(vec![primary.clone(), relay.clone()], ledger());

        let outcome = service
            .research(ResearchRequest::new("bees").unwrap())
            .await
            .unwrap();

        assert!(outcome.profile.research_backed);
        assert_eq!(outcome.backend_id.as_deref(), Some("relay"));
        assert_eq!(primary.call_count(), 1);
        assert_eq!(relay.call_count(), 1);
    }

    #[tokio::test]
    async fn test_first_success_stops_the_walk() {
        let primary = Arc::new(MockBackend::new("primary").with_response("not json at all"));
        let relay = Arc::new(MockBackend::new("relay").with_response(full_payload("bees")));
        let service = ResearchService::new(vec![primary, relay.clone()], ledger());

        let outcome = service
            .research(ResearchRequest::new("bees").unwrap())
            .await
            .unwrap();

        assert!(!outcome.profile.research_backed);
        assert_eq!(
            outcome.profile.fallback_reason.as_deref(),
            Some("no JSON object in upstream response")
        );
        assert_eq!(relay.call_count(), 0);
    }

    #[tokio::test]
    async fn test_configuration_error_aborts() {
        let primary = Arc::new(
            MockBackend::new("primary").with_error(LlmError::Configuration("key missing".into())),
        );
        let relay = Arc::new(MockBackend::new("relay").with_response(full_payload("bees")));
        let service = ResearchService::new(vec![primary, relay.clone()], ledger());

        let err = service
            .research(ResearchRequest::new("bees").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Configuration(_)));
        assert_eq!(relay.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_species_never_calls_upstream() {
        let backend = Arc::new(MockBackend::new("primary"));
        let service = ResearchService::new(vec![backend.clone()], ledger());

        let mut request = ResearchRequest::new("x").unwrap();
        request.species = "   ".to_string();

        let err = service.research(request).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidRequest(ValidationError::MissingSpecies)
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_enforced_budget_refuses() {
        let backend = Arc::new(MockBackend::new("primary").with_response(full_payload("bees")));
        let ledger = Arc::new(UsageLedger::in_memory(BudgetLimits {
            daily_requests: 1,
            ..Default::default()
        }));
        let service = ResearchService::new(vec![backend.clone()], ledger).with_config(ServiceConfig {
            enforce_budget: true,
            ..Default::default()
        });

        service.research(ResearchRequest::new("bees").unwrap()).await.unwrap();
        let err = service
            .research(ResearchRequest::new("bees").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::BudgetExhausted(_)));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unenforced_budget_still_counts() {
        let backend = Arc::new(MockBackend::new("primary").with_response(full_payload("bees")));
        let ledger = Arc::new(UsageLedger::in_memory(BudgetLimits {
            daily_requests: 1,
            ..Default::default()
        }));
        let service = ResearchService::new(vec![backend], ledger);

        service.research(ResearchRequest::new("bees").unwrap()).await.unwrap();
        let outcome = service.research(ResearchRequest::new("bees").unwrap()).await.unwrap();

        assert_eq!(outcome.budget.daily_count, 2);
        assert!(outcome.budget.is_exhausted());
    }

    #[tokio::test]
    async fn test_client_prompt_respects_config() {
        let backend = Arc::new(MockBackend::new("primary").with_response(full_payload("bees")));
        let service = ResearchService::new(vec![backend.clone()], ledger());

        let request = ResearchRequest::new("bees").unwrap().with_prompt("Custom prompt");
        service.research(request.clone()).await.unwrap();
        assert_eq!(backend.last_prompt().as_deref(), Some("Custom prompt"));

        let service = ResearchService::new(vec![backend.clone()], ledger()).with_config(
            ServiceConfig {
                allow_client_prompt: false,
                ..Default::default()
            },
        );
        service.research(request).await.unwrap();
        assert_ne!(backend.last_prompt().as_deref(), Some("Custom prompt"));
    }

    #[tokio::test]
    async fn test_partial_response_scores_lower() {
        let backend = Arc::new(MockBackend::new("primary").with_response(
            r#"```json
{"species": "crows", "perceive": {"summary": "Crows see.", "details": ["ultraviolet vision"]}}
```"#,
        ));
        let service = ResearchService::new(vec![backend], ledger());

        let outcome = service
            .research(ResearchRequest::new("crows").unwrap())
            .await
            .unwrap();

        assert!(outcome.profile.research_backed);
        assert_eq!(outcome.profile.perceive.details.len(), 3);
        assert_eq!(outcome.profile.perceive.details[0], "ultraviolet vision");
        assert!(outcome
            .profile
            .fallback_fields
            .contains(&ProfileField::PerceiveDetails));
        assert!(outcome
            .profile
            .fallback_fields
            .contains(&ProfileField::QuantumAspects));
        assert!((outcome.metrics.perceive - 0.6).abs() < 1e-9);
        assert!(outcome.metrics.get(Facet::Relate) > outcome.metrics.perceive);
    }

    #[tokio::test]
    async fn test_research_many_is_sequential_and_skips_blanks() {
        let backend = Arc::new(MockBackend::new("primary").with_response(full_payload("x")));
        let service = ResearchService::new(vec![backend.clone()], ledger());

        let options = ResearchOptions {
            include_human: true,
            ..Default::default()
        };
        let outcomes = service
            .research_many(&["trees", "  ", "octopuses"], options)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        let prompts = backend.prompts();
        assert!(prompts[0].contains("trees"));
        assert!(prompts[1].contains("octopuses"));
        assert!(prompts[2].contains("humans"));
    }

    #[tokio::test]
    async fn test_compare_species_validates_count() {
        let service = ResearchService::new(vec![Arc::new(MockBackend::new("m"))], ledger());

        let err = service
            .compare_species(&["trees", ""], ResearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidRequest(ValidationError::TooFewSpecies)
        ));

        let names = ["a", "b", "c", "d", "e", "f"];
        let err = service
            .compare_species(&names, ResearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidRequest(ValidationError::TooManySpecies { max: 5, actual: 6 })
        ));
    }

    #[tokio::test]
    async fn test_compare_species_limit_includes_humans() {
        let backend = Arc::new(MockBackend::new("m").with_response(full_payload("x")));
        let service = ResearchService::new(vec![backend.clone()], ledger());
        let options = ResearchOptions {
            include_human: true,
            ..Default::default()
        };

        let names = ["a", "b", "c", "d", "e"];
        let err = service.compare_species(&names, options).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidRequest(ValidationError::TooManySpecies { max: 5, actual: 6 })
        ));
        assert_eq!(backend.call_count(), 0);

        let result = service
            .compare_species(&["a", "b", "c", "d", "Humans"], options)
            .await
            .unwrap();
        assert_eq!(result.outcomes.len(), 5);
    }

    #[tokio::test]
    async fn test_compare_species() {
        let backend = Arc::new(MockBackend::new("primary").with_response(full_payload("x")));
        let service = ResearchService::new(vec![backend], ledger());

        let result = service
            .compare_species(&["trees", "octopuses"], ResearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(result.comparison.whole_life_contribution.len(), 3);
    }

    #[test]
    fn test_species_units_does_not_duplicate_humans() {
        let options = ResearchOptions {
            include_human: true,
            ..Default::default()
        };
        assert_eq!(
            species_units(&["Humans", "bees"], options),
            vec!["Humans".to_string(), "bees".to_string()]
        );
    }
}
