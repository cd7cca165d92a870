//! The `PlanGenerator` trait -- the seam between the pipeline and whatever
//! produces candidate plans.

use async_trait::async_trait;

use super::types::{GenerationRequest, GeneratorError, GeneratorResponse};

/// Produces one candidate plan per call.
///
/// Implementations must not validate or repair the plan; the orchestrator
/// does that and feeds errors back through
/// [`GenerationRequest::feedback`] on the next call.
///
/// # Object Safety
///
/// The trait is object-safe so callers can hold `&dyn PlanGenerator` and tests
/// can substitute scripted generators.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Human-readable name for logs (e.g. "claude").
    fn name(&self) -> &str;

    /// Produce a candidate plan for `request`.
    async fn generate(&self, request: &GenerationRequest)
    -> Result<GeneratorResponse, GeneratorError>;
}

// Compile-time assertion: PlanGenerator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanGenerator) {}
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::types::CandidateMeal;
    use chrono::NaiveDate;
    use mealplan_db::models::{DayOfWeek, MealType, PlanningRules};
    use uuid::Uuid;

    struct FixedGenerator;

    #[async_trait]
    impl PlanGenerator for FixedGenerator {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GeneratorResponse, GeneratorError> {
            Ok(GeneratorResponse {
                meals: vec![CandidateMeal::new(
                    DayOfWeek::Monday,
                    MealType::Dinner,
                    "Tacos",
                )],
                summary: "One taco night.".to_owned(),
                issues: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let generator: Box<dyn PlanGenerator> = Box::new(FixedGenerator);
        let request = GenerationRequest::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            PlanningRules::default(),
        );
        let response = generator.generate(&request).await.unwrap();
        assert_eq!(generator.name(), "fixed");
        assert_eq!(response.meals.len(), 1);
    }
}
