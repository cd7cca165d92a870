//! Replaces the generator's nutrition claims with computed numbers.
//!
//! Generators routinely invent totals ("about 1,800 calories a day"). Every
//! calorie or gram figure in the summary is rewritten from the rollup, and a
//! nutrition line is appended whose wording depends on data coverage.

use std::sync::LazyLock;

use mealplan_db::models::Macro;
use regex::{Captures, Regex};

use super::NutritionRollup;

/// Coverage at or above which figures are stated plainly.
const HIGH_CONFIDENCE_PCT: f64 = 90.0;
/// Coverage below which no figures are stated.
const LOW_CONFIDENCE_PCT: f64 = 50.0;

static CALORIE_CLAIM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d[\d,]*(?:\.\d+)?(?:\s*(?:-|to)\s*\d[\d,]*(?:\.\d+)?)?\s*(?:kcals?|calories|cals?)\b",
    )
    .ok()
});

static GRAM_CLAIM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s*(?:g|grams?)\s+(?:of\s+)?(protein|carbohydrates?|carbs?|fats?)\b",
    )
    .ok()
});

static LABELLED_GRAM_CLAIM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(protein|carbohydrates?|carbs?|fats?)\s*(?::|=|of)?\s*~?\d+(?:\.\d+)?\s*(?:g|grams?)\b")
        .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confidence {
    High,
    Partial,
    Low,
}

fn confidence(rollup: &NutritionRollup) -> Confidence {
    if rollup.meals_with_nutrition == 0 || rollup.coverage_pct < LOW_CONFIDENCE_PCT {
        Confidence::Low
    } else if rollup.coverage_pct >= HIGH_CONFIDENCE_PCT {
        Confidence::High
    } else {
        Confidence::Partial
    }
}

fn macro_from_word(word: &str) -> Option<Macro> {
    let lower = word.to_ascii_lowercase();
    if lower.starts_with("carb") {
        Some(Macro::Carbs)
    } else if lower.starts_with("fat") {
        Some(Macro::Fat)
    } else if lower == "protein" {
        Some(Macro::Protein)
    } else {
        None
    }
}

/// Rewrite `generated` so its figures match `rollup`.
pub fn correct_summary(generated: &str, rollup: &NutritionRollup) -> String {
    let confidence = confidence(rollup);
    let avg = rollup.daily_average;

    let mut text = generated.trim().to_owned();
    if let Some(re) = CALORIE_CLAIM.as_ref() {
        text = re
            .replace_all(&text, |_: &Captures| match confidence {
                Confidence::Low => "an unverified number of calories".to_owned(),
                _ => format!("{:.0} kcal", avg.calories),
            })
            .into_owned();
    }

    let grams = |caps: &Captures, labelled: bool| {
        let word = caps.get(1).map_or("", |m| m.as_str());
        let value = macro_from_word(word).map(|m| avg.get(m)).unwrap_or(0.0);
        if confidence == Confidence::Low || value <= 0.0 {
            format!("an unverified amount of {word}")
        } else if labelled {
            format!("{word}: {value:.0}g")
        } else {
            format!("{value:.0}g {word}")
        }
    };
    if let Some(re) = GRAM_CLAIM.as_ref() {
        text = re.replace_all(&text, |caps: &Captures| grams(caps, false)).into_owned();
    }
    if let Some(re) = LABELLED_GRAM_CLAIM.as_ref() {
        text = re.replace_all(&text, |caps: &Captures| grams(caps, true)).into_owned();
    }

    let line = nutrition_line(rollup, confidence);
    if text.is_empty() {
        line
    } else {
        format!("{text}\n\n{line}")
    }
}

fn nutrition_line(rollup: &NutritionRollup, confidence: Confidence) -> String {
    let avg = rollup.daily_average;
    let mut figures = vec![format!("{:.0} kcal", avg.calories)];
    for m in [Macro::Protein, Macro::Carbs, Macro::Fat] {
        let value = avg.get(m);
        if value > 0.0 {
            figures.push(format!("{value:.0}g {}", m.name()));
        }
    }
    let figures = figures.join(", ");

    match confidence {
        Confidence::High => format!("Nutrition per person per day: {figures}."),
        Confidence::Partial => format!(
            "Estimated nutrition per person per day: about {figures} \
             ({:.0}% of meals have nutrition data).",
            rollup.coverage_pct
        ),
        Confidence::Low => format!(
            "Nutrition data covers only {:.0}% of meals, so daily totals are not estimated.",
            rollup.coverage_pct
        ),
    }
}
