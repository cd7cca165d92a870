//! Generate-validate-retry loop.
//!
//! Each attempt sends the request (with the previous attempt's errors as
//! feedback) to the generator and validates the reply. The first valid plan
//! wins. Transport failures, timeouts and unreadable replies consume an
//! attempt without changing the feedback. When the budget runs out the last errors are returned with a
//! suggestion for the user.

use std::time::Duration;

use mealplan_db::models::UsageEntry;
use tracing::{info, warn};

use crate::catalog::RecipeCatalog;
use crate::generator::{GenerationRequest, GeneratorError, GeneratorResponse, PlanGenerator};
use crate::validate::{ValidationContext, ValidationResult, validate};

/// Shown to the user when every attempt failed.
pub const EXHAUSTED_SUGGESTION: &str = "Try relaxing some planning rules (fewer minimum cuisines, \
     shorter cooldowns, or enabling batch cooking) or adding more recipes, then generate again.";

/// Configuration for the retry loop.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
    /// Wall time limit per generator call.
    pub attempt_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(120),
        }
    }
}

/// Result of running the loop to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// A candidate passed validation. `validation.warnings` may be non-empty.
    Accepted {
        response: GeneratorResponse,
        validation: ValidationResult,
        attempts: u32,
    },
    /// Every attempt failed.
    Exhausted {
        errors: Vec<String>,
        attempts: u32,
        suggestion: &'static str,
    },
}

impl GenerationOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Accepted { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Fixed inputs the validator needs on every attempt.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInputs<'a> {
    pub history: &'a [UsageEntry],
    pub catalog: &'a RecipeCatalog,
    pub context: &'a ValidationContext,
}

/// Run the loop until a valid plan is produced or attempts run out.
pub async fn generate(
    generator: &dyn PlanGenerator,
    request: &GenerationRequest,
    inputs: ValidationInputs<'_>,
    config: &OrchestratorConfig,
) -> GenerationOutcome {
    let max_attempts = config.max_attempts.max(1);
    let mut feedback: Vec<String> = request.feedback.clone();
    let mut last_errors: Vec<String> = Vec::new();

    for attempt in 1..=max_attempts {
        let mut attempt_request = request.clone();
        attempt_request.feedback = feedback.clone();

        info!(
            generator = generator.name(),
            attempt,
            max_attempts,
            feedback = feedback.len(),
            "requesting candidate plan"
        );

        match tokio::time::timeout(config.attempt_timeout, generator.generate(&attempt_request)).await
        {
            Err(_) => {
                warn!(attempt, timeout_secs = config.attempt_timeout.as_secs(), "generator timed out");
                last_errors = vec![format!(
                    "The plan generator did not respond within {} seconds",
                    config.attempt_timeout.as_secs()
                )];
            }
            Ok(Err(GeneratorError::Malformed(reason))) => {
                warn!(attempt, %reason, "generator reply unusable");
                last_errors = vec![format!(
                    "The reply did not contain a usable plan ({reason}); reply with the JSON object only"
                )];
            }
            Ok(Err(e)) => {
                warn!(attempt, error = %e, "generator call failed");
                last_errors = vec![format!("The plan generator failed: {e}")];
            }
            Ok(Ok(response)) => {
                let mut validation = validate(
                    &response.meals,
                    &request.rules,
                    inputs.history,
                    inputs.catalog,
                    inputs.context,
                );
                validation.prepend_errors(&response.issues);

                if validation.is_valid {
                    info!(
                        attempt,
                        meals = response.meals.len(),
                        warnings = validation.warnings.len(),
                        "candidate plan accepted"
                    );
                    return GenerationOutcome::Accepted {
                        response,
                        validation,
                        attempts: attempt,
                    };
                }

                warn!(
                    attempt,
                    errors = validation.errors.len(),
                    first_error = %validation.errors.first().map(String::as_str).unwrap_or(""),
                    "candidate plan rejected"
                );
                feedback = validation.errors.clone();
                last_errors = validation.errors;
            }
        }

        if attempt < max_attempts && !config.backoff.is_zero() {
            tokio::time::sleep(config.backoff).await;
        }
    }

    GenerationOutcome::Exhausted {
        errors: last_errors,
        attempts: max_attempts,
        suggestion: EXHAUSTED_SUGGESTION,
    }
}
