//! Meal-plan generation pipeline.
//!
//! ```text
//! request
//!   -> adjust::adjust            (relax cooldowns for repetition intent)
//!   -> macro_filter::filter      (drop recipes that cannot fit the targets)
//!   -> orchestrator::generate    (generator -> validate -> feedback, retry)
//!   -> reconcile::reconcile      (sanitize, locks, servings, leftovers, rollup)
//!   -> repository                (persist meals, usage history, summary)
//! ```
//!
//! [`service::generate_meal_plan`] wires the stages together.

pub mod adjust;
pub mod catalog;
pub mod error;
pub mod generator;
pub mod history;
pub mod macro_filter;
pub mod orchestrator;
pub mod plan;
pub mod policy;
pub mod reconcile;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod validate;

pub use catalog::RecipeCatalog;
pub use error::PlanningInputError;
pub use generator::{CandidateMeal, GenerationRequest, GeneratorResponse, PlanGenerator};
pub use orchestrator::{GenerationOutcome, OrchestratorConfig};
pub use plan::LockedMeal;
pub use schedule::Schedule;
pub use validate::{ValidationContext, ValidationResult};
