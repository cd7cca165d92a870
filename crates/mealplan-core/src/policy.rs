//! Fixed planning policy: macro shares, tolerance bands and cuisine labels.

use std::collections::BTreeSet;

use mealplan_db::models::{MacroMode, MealType};

/// Fraction of the daily target assigned to main meals when the household
/// also eats snacks.
pub const MAIN_MEALS_SHARE_WITH_SNACKS: f64 = 0.8;

/// Validation skips macro checks when fewer meals than this fraction carry
/// nutrition data.
pub const MIN_NUTRITION_COVERAGE: f64 = 0.5;

const MAIN_MEAL_COUNT: f64 = 3.0;

/// Expected share of the daily target for one slot of `meal_type`.
pub fn slot_share(meal_type: MealType, snack_present: bool) -> f64 {
    let main_total = if snack_present {
        MAIN_MEALS_SHARE_WITH_SNACKS
    } else {
        1.0
    };
    if meal_type.is_main() {
        main_total / MAIN_MEAL_COUNT
    } else {
        1.0 - MAIN_MEALS_SHARE_WITH_SNACKS
    }
}

/// Share of the daily target covered by the scheduled meal types.
pub fn scheduled_share(meal_types: &BTreeSet<MealType>) -> f64 {
    let snack_present = meal_types.contains(&MealType::Snack);
    let share: f64 = meal_types
        .iter()
        .map(|mt| slot_share(*mt, snack_present))
        .sum();
    share.min(1.0)
}

// ---------------------------------------------------------------------------
// Tolerances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// How far a single day's calories may drift from the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyTolerance {
    pub band: f64,
    pub severity: Severity,
    /// Saturdays and Sundays are not checked.
    pub weekdays_only: bool,
}

/// Tolerance bands for one macro mode, as fractions of the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroTolerance {
    /// Per-recipe variance allowed by the feasibility filter.
    pub filter_variance: f64,
    /// Allowed drift of the weekly daily average.
    pub weekly: f64,
    pub daily: Option<DailyTolerance>,
}

pub fn tolerance(mode: MacroMode) -> MacroTolerance {
    match mode {
        MacroMode::Strict => MacroTolerance {
            filter_variance: 0.5,
            weekly: 0.05,
            daily: Some(DailyTolerance {
                band: 0.15,
                severity: Severity::Error,
                weekdays_only: false,
            }),
        },
        MacroMode::Balanced => MacroTolerance {
            filter_variance: 0.75,
            weekly: 0.10,
            daily: Some(DailyTolerance {
                band: 0.25,
                severity: Severity::Warning,
                weekdays_only: false,
            }),
        },
        MacroMode::WeekdayDiscipline => MacroTolerance {
            filter_variance: 0.6,
            weekly: 0.10,
            daily: Some(DailyTolerance {
                band: 0.15,
                severity: Severity::Error,
                weekdays_only: true,
            }),
        },
        MacroMode::CalorieBanking => MacroTolerance {
            filter_variance: 1.0,
            weekly: 0.10,
            daily: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Cuisines
// ---------------------------------------------------------------------------

const CUISINE_LABELS: &[(&str, &str, &str)] = &[
    ("american", "🇺🇸", "American"),
    ("chinese", "🇨🇳", "Chinese"),
    ("french", "🇫🇷", "French"),
    ("greek", "🇬🇷", "Greek"),
    ("indian", "🇮🇳", "Indian"),
    ("italian", "🇮🇹", "Italian"),
    ("japanese", "🇯🇵", "Japanese"),
    ("korean", "🇰🇷", "Korean"),
    ("mediterranean", "🫒", "Mediterranean"),
    ("mexican", "🇲🇽", "Mexican"),
    ("middle eastern", "🧆", "Middle Eastern"),
    ("spanish", "🇪🇸", "Spanish"),
    ("thai", "🇹🇭", "Thai"),
    ("vietnamese", "🇻🇳", "Vietnamese"),
];

/// Canonical form of a cuisine tag used for counting ("Middle-Eastern" and
/// "middle eastern" are the same cuisine).
pub fn normalize_cuisine(tag: &str) -> Option<String> {
    let cleaned = tag
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Display label with an emoji, e.g. "🇮🇹 Italian".
pub fn cuisine_label(tag: &str) -> String {
    let Some(key) = normalize_cuisine(tag) else {
        return "🍽️ Other".to_owned();
    };
    if let Some((_, emoji, label)) = CUISINE_LABELS.iter().find(|(k, _, _)| *k == key) {
        return format!("{emoji} {label}");
    }
    let title = key
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("🍽️ {title}")
}
