use thiserror::Error;
use uuid::Uuid;

/// The household's data cannot support plan generation. Returned before any
/// generator call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningInputError {
    #[error("the household has no profiles; add at least one person before planning")]
    NoProfiles,

    #[error("no one in the household has meal slots configured")]
    NoMealSlots,

    #[error("the recipe library is empty; add recipes before planning")]
    EmptyRecipePool,

    #[error("required recipe {0} is not in the recipe library")]
    UnknownMandatoryRecipe(Uuid),

    #[error("no recipes suit the scheduled {0} slots")]
    NoRecipesForMealType(String),
}
