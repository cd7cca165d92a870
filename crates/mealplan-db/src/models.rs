use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    /// What was being parsed (e.g. "meal type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A meal slot within a day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    /// Snacks and desserts share one slot type.
    #[serde(alias = "dessert")]
    Snack,
}

impl MealType {
    /// Every meal type in serving order.
    pub const ALL: [MealType; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    /// Breakfast, lunch and dinner are main meals; snacks are not.
    pub fn is_main(self) -> bool {
        !matches!(self, Self::Snack)
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        };
        f.write_str(s)
    }
}

impl FromStr for MealType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" | "snacks" | "dessert" => Ok(Self::Snack),
            _ => Err(ParseEnumError::new("meal type", s)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Day of the plan week.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    #[serde(alias = "mon")]
    Monday,
    #[serde(alias = "tue")]
    Tuesday,
    #[serde(alias = "wed")]
    Wednesday,
    #[serde(alias = "thu")]
    Thursday,
    #[serde(alias = "fri")]
    Friday,
    #[serde(alias = "sat")]
    Saturday,
    #[serde(alias = "sun")]
    Sunday,
}

impl DayOfWeek {
    /// Monday through Sunday.
    pub const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Zero-based index from Monday.
    pub fn index(self) -> u32 {
        self.weekday().num_days_from_monday()
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Tuesday => Weekday::Tue,
            Self::Wednesday => Weekday::Wed,
            Self::Thursday => Weekday::Thu,
            Self::Friday => Weekday::Fri,
            Self::Saturday => Weekday::Sat,
            Self::Sunday => Weekday::Sun,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_monday() as usize]
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Self::Saturday | Self::Sunday)
    }

    /// Number of days between the week's first day and this day.
    ///
    /// Plans may start on any weekday; a plan starting on Thursday places
    /// Monday four days after the start.
    pub fn offset_from(self, week_start: NaiveDate) -> u32 {
        let start = week_start.weekday().num_days_from_monday();
        (self.index() + 7 - start) % 7
    }

    /// The calendar date of this day within the week beginning at `week_start`.
    pub fn date_in_week(self, week_start: NaiveDate) -> NaiveDate {
        week_start + chrono::Duration::days(i64::from(self.offset_from(week_start)))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        };
        f.write_str(s)
    }
}

impl FromStr for DayOfWeek {
    type Err = ParseEnumError;

    /// Accepts full names and common abbreviations, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let day = match lower.as_str() {
            "monday" | "mon" => Self::Monday,
            "tuesday" | "tue" | "tues" => Self::Tuesday,
            "wednesday" | "wed" => Self::Wednesday,
            "thursday" | "thu" | "thur" | "thurs" => Self::Thursday,
            "friday" | "fri" => Self::Friday,
            "saturday" | "sat" => Self::Saturday,
            "sunday" | "sun" => Self::Sunday,
            _ => return Err(ParseEnumError::new("day of week", s)),
        };
        Ok(day)
    }
}

// ---------------------------------------------------------------------------

/// How strictly daily macro targets are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MacroMode {
    #[default]
    Balanced,
    Strict,
    /// Tight on weekdays, relaxed on weekends.
    WeekdayDiscipline,
    /// Only the weekly average matters; single days may swing widely.
    CalorieBanking,
}

impl fmt::Display for MacroMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Balanced => "balanced",
            Self::Strict => "strict",
            Self::WeekdayDiscipline => "weekday_discipline",
            Self::CalorieBanking => "calorie_banking",
        };
        f.write_str(s)
    }
}

impl FromStr for MacroMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(Self::Balanced),
            "strict" => Ok(Self::Strict),
            "weekday_discipline" => Ok(Self::WeekdayDiscipline),
            "calorie_banking" => Ok(Self::CalorieBanking),
            other => Err(ParseEnumError::new("macro mode", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Lifecycle status of a stored meal plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Draft,
    Generated,
    Failed,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Generated => "generated",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "generated" => Ok(Self::Generated),
            "failed" => Ok(Self::Failed),
            other => Err(ParseEnumError::new("plan status", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Nutrition
// ---------------------------------------------------------------------------

/// One of the four tracked macro-nutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Macro {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    pub const ALL: [Macro; 4] = [Self::Calories, Self::Protein, Self::Carbs, Self::Fat];

    /// Lowercase name as used in priority lists ("calories", "protein", ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Calories => "calories",
            Self::Protein => "protein",
            Self::Carbs => "carbs",
            Self::Fat => "fat",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Calories => "kcal",
            _ => "g",
        }
    }

    /// Parse a priority-list entry, tolerating a few synonyms.
    pub fn from_priority(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calories" | "kcal" | "energy" => Some(Self::Calories),
            "protein" => Some(Self::Protein),
            "carbs" | "carbohydrates" => Some(Self::Carbs),
            "fat" | "fats" => Some(Self::Fat),
            _ => None,
        }
    }
}

/// Macro values where any field may be unknown. Used both for per-serving
/// recipe nutrition and for daily targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
}

impl Macros {
    pub fn get(&self, m: Macro) -> Option<f64> {
        match m {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein_g,
            Macro::Carbs => self.carbs_g,
            Macro::Fat => self.fat_g,
        }
    }

    /// True when no field is known.
    pub fn is_empty(&self) -> bool {
        Macro::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

/// Summed macro values (unknowns count as zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl MacroTotals {
    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein_g,
            Macro::Carbs => self.carbs_g,
            Macro::Fat => self.fat_g,
        }
    }

    /// Add one serving of `macros`.
    pub fn add(&mut self, macros: &Macros) {
        self.calories += macros.calories.unwrap_or(0.0);
        self.protein_g += macros.protein_g.unwrap_or(0.0);
        self.carbs_g += macros.carbs_g.unwrap_or(0.0);
        self.fat_g += macros.fat_g.unwrap_or(0.0);
    }

    pub fn divided_by(&self, n: f64) -> Self {
        if n <= 0.0 {
            return Self::default();
        }
        Self {
            calories: self.calories / n,
            protein_g: self.protein_g / n,
            carbs_g: self.carbs_g / n,
            fat_g: self.fat_g / n,
        }
    }
}

// ---------------------------------------------------------------------------
// Planning rules
// ---------------------------------------------------------------------------

/// The household's rule set for plan generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRules {
    /// Days before a recipe may repeat, per meal type. Missing entries mean
    /// no cooldown.
    #[serde(default)]
    pub cooldown_days: BTreeMap<MealType, u32>,
    pub min_cuisines: u32,
    pub max_same_cuisine: u32,
    pub batch_cooking_enabled: bool,
    pub max_leftover_days: u32,
    #[serde(default)]
    pub macro_mode: MacroMode,
    /// Ordered priorities used for soft-constraint tie-breaking
    /// (e.g. `["protein", "variety", "cost"]`).
    #[serde(default)]
    pub priorities: Vec<String>,
}

impl PlanningRules {
    pub fn cooldown_for(&self, meal_type: MealType) -> u32 {
        self.cooldown_days.get(&meal_type).copied().unwrap_or(0)
    }
}

impl Default for PlanningRules {
    /// The rule set used when a household has none stored.
    fn default() -> Self {
        let cooldown_days = BTreeMap::from([
            (MealType::Breakfast, 2),
            (MealType::Lunch, 3),
            (MealType::Dinner, 7),
            (MealType::Snack, 1),
        ]);
        Self {
            cooldown_days,
            min_cuisines: 3,
            max_same_cuisine: 5,
            batch_cooking_enabled: true,
            max_leftover_days: 3,
            macro_mode: MacroMode::Balanced,
            priorities: vec!["variety".to_owned(), "macros".to_owned(), "cost".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// Domain records
// ---------------------------------------------------------------------------

/// A recipe as seen by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Meal types this recipe suits. Empty means any.
    #[serde(default)]
    pub meal_types: Vec<MealType>,
    /// Canonical number of servings the recipe yields.
    pub servings: u32,
    /// Store-bought or grab-and-go item; exempt from cooldown and batch-cook
    /// expectations.
    #[serde(default)]
    pub is_product: bool,
    /// Per-serving nutrition.
    #[serde(default)]
    pub nutrition: Macros,
}

impl Recipe {
    pub fn applies_to(&self, meal_type: MealType) -> bool {
        self.meal_types.is_empty() || self.meal_types.contains(&meal_type)
    }

    pub fn has_nutrition(&self) -> bool {
        self.nutrition.calories.is_some()
    }
}

/// A single (day, meal type) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MealSlot {
    pub day: DayOfWeek,
    pub meal_type: MealType,
}

impl MealSlot {
    pub fn new(day: DayOfWeek, meal_type: MealType) -> Self {
        Self { day, meal_type }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.meal_type)
    }
}

/// A household member and the slots they eat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub daily_targets: Macros,
    #[serde(default)]
    pub slots: Vec<MealSlot>,
    #[serde(default)]
    pub dietary_notes: Option<String>,
}

/// One recorded use of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct UsageEntry {
    pub recipe_id: Uuid,
    pub used_on: NaiveDate,
    pub meal_type: MealType,
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `recipes` table.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub cuisine: Option<String>,
    pub meal_types: Vec<String>,
    pub servings: i32,
    pub is_product: bool,
    pub archived: bool,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl RecipeRow {
    /// Convert to the planner's view. Unrecognized meal-type strings are
    /// skipped with a warning.
    pub fn into_recipe(self) -> Recipe {
        let meal_types = self
            .meal_types
            .iter()
            .filter_map(|s| match s.parse::<MealType>() {
                Ok(mt) => Some(mt),
                Err(e) => {
                    tracing::warn!(recipe_id = %self.id, error = %e, "ignoring meal type");
                    None
                }
            })
            .collect();
        Recipe {
            id: self.id,
            name: self.name,
            cuisine: self.cuisine,
            meal_types,
            servings: u32::try_from(self.servings.max(1)).unwrap_or(1),
            is_product: self.is_product,
            nutrition: Macros {
                calories: self.calories,
                protein_g: self.protein_g,
                carbs_g: self.carbs_g,
                fat_g: self.fat_g,
            },
        }
    }
}

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub target_calories: Option<f64>,
    pub target_protein_g: Option<f64>,
    pub target_carbs_g: Option<f64>,
    pub target_fat_g: Option<f64>,
    pub meal_slots: Json<Vec<MealSlot>>,
    pub dietary_notes: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            daily_targets: Macros {
                calories: row.target_calories,
                protein_g: row.target_protein_g,
                carbs_g: row.target_carbs_g,
                fat_g: row.target_fat_g,
            },
            slots: row.meal_slots.0,
            dietary_notes: row.dietary_notes,
        }
    }
}

/// A stored weekly plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub household_id: Uuid,
    pub week_start: NaiveDate,
    pub status: PlanStatus,
    pub summary: Option<String>,
    pub nutrition: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A meal stored in a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlannedMeal {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub day: DayOfWeek,
    pub meal_date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub recipe_name: String,
    pub servings: i32,
    pub scaling_factor: Option<f64>,
    pub is_leftover: bool,
    pub leftover_from_meal_id: Option<Uuid>,
    pub batch_cook_source_day: Option<DayOfWeek>,
    pub notes: Option<String>,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_round_trips_display() {
        for mt in MealType::ALL {
            assert_eq!(mt.to_string().parse::<MealType>().unwrap(), mt);
        }
    }

    #[test]
    fn dessert_parses_as_snack() {
        assert_eq!("Dessert".parse::<MealType>().unwrap(), MealType::Snack);
        let mt: MealType = serde_json::from_str("\"dessert\"").unwrap();
        assert_eq!(mt, MealType::Snack);
    }

    #[test]
    fn meal_type_rejects_unknown() {
        let err = "brunch".parse::<MealType>().unwrap_err();
        assert_eq!(err.kind, "meal type");
        assert!(err.to_string().contains("brunch"));
    }

    #[test]
    fn day_parses_abbreviations() {
        assert_eq!("Thurs".parse::<DayOfWeek>().unwrap(), DayOfWeek::Thursday);
        assert_eq!(" SUN ".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert!("funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn day_offsets_follow_week_start() {
        // 2026-10-19 is a Monday, 2026-10-22 a Thursday.
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        assert_eq!(DayOfWeek::Monday.offset_from(monday), 0);
        assert_eq!(DayOfWeek::Sunday.offset_from(monday), 6);
        assert_eq!(DayOfWeek::Thursday.offset_from(thursday), 0);
        assert_eq!(DayOfWeek::Monday.offset_from(thursday), 4);
        assert_eq!(
            DayOfWeek::Monday.date_in_week(thursday),
            NaiveDate::from_ymd_opt(2026, 10, 26).unwrap()
        );
    }

    #[test]
    fn macro_mode_parse() {
        for mode in [
            MacroMode::Balanced,
            MacroMode::Strict,
            MacroMode::WeekdayDiscipline,
            MacroMode::CalorieBanking,
        ] {
            assert_eq!(mode.to_string().parse::<MacroMode>().unwrap(), mode);
        }
        assert!("keto".parse::<MacroMode>().is_err());
    }

    #[test]
    fn default_rules_have_cooldowns_for_every_meal_type() {
        let rules = PlanningRules::default();
        for mt in MealType::ALL {
            assert!(rules.cooldown_days.contains_key(&mt));
        }
        assert_eq!(rules.cooldown_for(MealType::Dinner), 7);
    }

    #[test]
    fn rules_deserialize_from_toml() {
        let rules: PlanningRules = toml::from_str(
            r#"
min_cuisines = 2
max_same_cuisine = 4
batch_cooking_enabled = false
max_leftover_days = 2
macro_mode = "calorie_banking"
priorities = ["protein", "variety"]

[cooldown_days]
dinner = 5
"#,
        )
        .unwrap();
        assert_eq!(rules.macro_mode, MacroMode::CalorieBanking);
        assert_eq!(rules.cooldown_for(MealType::Dinner), 5);
        assert_eq!(rules.cooldown_for(MealType::Lunch), 0);
    }

    #[test]
    fn totals_accumulate_and_divide() {
        let mut totals = MacroTotals::default();
        totals.add(&Macros {
            calories: Some(700.0),
            protein_g: Some(30.0),
            carbs_g: None,
            fat_g: Some(20.0),
        });
        totals.add(&Macros {
            calories: Some(700.0),
            ..Macros::default()
        });
        let avg = totals.divided_by(7.0);
        assert_eq!(avg.calories, 200.0);
        assert_eq!(MacroTotals::default().divided_by(0.0), MacroTotals::default());
    }

    #[test]
    fn recipe_row_skips_unknown_meal_types() {
        let row = RecipeRow {
            id: Uuid::new_v4(),
            household_id: Uuid::new_v4(),
            name: "Oats".to_owned(),
            cuisine: None,
            meal_types: vec!["breakfast".to_owned(), "elevenses".to_owned()],
            servings: 0,
            is_product: false,
            archived: false,
            calories: Some(350.0),
            protein_g: None,
            carbs_g: None,
            fat_g: None,
            created_at: Utc::now(),
        };
        let recipe = row.into_recipe();
        assert_eq!(recipe.meal_types, vec![MealType::Breakfast]);
        assert_eq!(recipe.servings, 1);
        assert!(recipe.has_nutrition());
    }
}
