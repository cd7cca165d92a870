//! Tagged rules that detect repetition intent and the meal types it targets.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use mealplan_db::models::{MealType, Recipe};
use regex::Regex;

/// What kind of repetition a phrase asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Every day of the week.
    Daily,
    /// More than once, but not necessarily daily.
    Recurring,
}

/// A named predicate over lowercase free text.
pub struct IntentRule {
    pub tag: &'static str,
    pub intent: Intent,
    regex: Regex,
}

impl IntentRule {
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

const DAY: &str = r"(?:mon|tues?|wed(?:nes)?|thu(?:rs?)?|fri|sat(?:ur)?|sun)(?:day)?s?";

/// Rules in priority order; the first match decides the intent kind.
static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    let day_pair = format!(r"\b{DAY}\s*(?:and|&|,|to|through|-)\s*{DAY}\b");
    let table: Vec<(&'static str, Intent, String)> = vec![
        ("every-day", Intent::Daily, r"\bevery\s*day\b|\beach\s+day\b".to_owned()),
        ("daily", Intent::Daily, r"\bdaily\b".to_owned()),
        (
            "all-week",
            Intent::Daily,
            r"\ball\s+week\b|\b(?:the\s+)?(?:whole|entire)\s+week\b|\b7\s+days\b|\bseven\s+days\b".to_owned(),
        ),
        (
            "every-meal-time",
            Intent::Daily,
            r"\bevery\s+(?:morning|night|evening|breakfast|lunch(?:time)?|dinner|supper)\b".to_owned(),
        ),
        ("same-every", Intent::Daily, r"\bsame\b.{0,40}\b(?:every|each)\b".to_owned()),
        ("day-pair", Intent::Recurring, day_pair),
        (
            "weekdays",
            Intent::Recurring,
            r"\b(?:weekdays|every\s+weekday|work\s*days)\b".to_owned(),
        ),
        (
            "repeat-count",
            Intent::Recurring,
            r"\b(?:twice|two\s+times|three\s+times|[23]x|repeat(?:ed)?)\b".to_owned(),
        ),
    ];
    table
        .into_iter()
        .filter_map(|(tag, intent, pattern)| {
            Regex::new(&pattern).ok().map(|regex| IntentRule { tag, intent, regex })
        })
        .collect()
});

/// Meal-type keywords.
static MEAL_KEYWORDS: LazyLock<Vec<(MealType, Regex)>> = LazyLock::new(|| {
    [
        (
            MealType::Breakfast,
            r"\b(?:breakfasts?|brekkie|morning|mornings|oats|oatmeal|porridge|cereal)\b",
        ),
        (MealType::Lunch, r"\b(?:lunch(?:es|time)?|midday|noon)\b"),
        (
            MealType::Dinner,
            r"\b(?:dinners?|suppers?|evening|evenings|night|nights|tonight)\b",
        ),
        (MealType::Snack, r"\b(?:snacks?|desserts?|treats?)\b"),
    ]
    .into_iter()
    .filter_map(|(mt, pattern)| Regex::new(pattern).ok().map(|re| (mt, re)))
    .collect()
});

/// First matching rule, if any.
pub fn detect(text: &str) -> Option<&'static IntentRule> {
    INTENT_RULES.iter().find(|rule| rule.matches(text))
}

/// True when any daily rule matches, regardless of rule order.
pub fn is_daily(text: &str) -> bool {
    INTENT_RULES
        .iter()
        .any(|rule| rule.intent == Intent::Daily && rule.matches(text))
}

pub fn keyword_meal_types(text: &str) -> BTreeSet<MealType> {
    MEAL_KEYWORDS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(mt, _)| *mt)
        .collect()
}

/// Meal types of recipes whose names appear in the text. Recipes without
/// meal types contribute nothing.
pub fn named_recipe_meal_types(text: &str, recipes: &[Recipe]) -> BTreeSet<MealType> {
    recipes
        .iter()
        .filter(|r| {
            let name = r.name.trim().to_lowercase();
            name.chars().count() >= 3 && text.contains(&name)
        })
        .flat_map(|r| r.meal_types.iter().copied())
        .collect()
}
