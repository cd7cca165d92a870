use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use mealplan_db::models::{DayOfWeek, Macro, MacroTotals, MealType, PlanningRules};

use super::{PlacedMeal, ValidationContext, ValidationResult, title};
use crate::policy::{self, MIN_NUTRITION_COVERAGE, Severity};

/// Weekly average per macro, then per-day calories according to the macro
/// mode. Targets are scaled to the meal types actually scheduled.
pub(super) fn check(
    placed: &[PlacedMeal<'_>],
    rules: &PlanningRules,
    ctx: &ValidationContext,
    result: &mut ValidationResult,
) {
    let Some(targets) = ctx.macro_targets.filter(|t| !t.is_empty()) else {
        return;
    };
    if placed.is_empty() {
        return;
    }

    let total = placed.len();
    let coverage = |m: Macro| {
        let known = placed
            .iter()
            .filter(|p| p.recipe.nutrition.get(m).is_some())
            .count();
        known as f64 / total as f64
    };
    if coverage(Macro::Calories) < MIN_NUTRITION_COVERAGE {
        let known = placed.iter().filter(|p| p.recipe.has_nutrition()).count();
        result.warn(format!(
            "Only {known} of {total} planned meals have nutrition data; macro targets were not checked"
        ));
        return;
    }

    let meal_types: BTreeSet<MealType> = if ctx.schedule.is_empty() {
        placed.iter().map(|p| p.slot.meal_type).collect()
    } else {
        ctx.schedule.meal_types()
    };
    let share = policy::scheduled_share(&meal_types);

    let mut days: BTreeMap<NaiveDate, MacroTotals> = BTreeMap::new();
    for meal in placed {
        days.entry(meal.date).or_default().add(&meal.recipe.nutrition);
    }
    let mut week = MacroTotals::default();
    for totals in days.values() {
        week.calories += totals.calories;
        week.protein_g += totals.protein_g;
        week.carbs_g += totals.carbs_g;
        week.fat_g += totals.fat_g;
    }
    let average = week.divided_by(days.len() as f64);
    let tolerance = policy::tolerance(rules.macro_mode);

    for m in Macro::ALL {
        let Some(target) = targets.get(m).filter(|t| *t > 0.0) else {
            continue;
        };
        if coverage(m) < MIN_NUTRITION_COVERAGE {
            continue;
        }
        let expected = target * share;
        let (low, high) = band(expected, tolerance.weekly);
        let actual = average.get(m);
        if actual < low || actual > high {
            let unit = m.unit();
            result.error(format!(
                "Average daily {} is {actual:.0} {unit}, outside the {low:.0}-{high:.0} {unit} \
                 target range ({expected:.0} {unit} +/- {:.0}%)",
                m.name(),
                tolerance.weekly * 100.0
            ));
        }
    }

    let (Some(daily), Some(target)) = (tolerance.daily, targets.calories) else {
        return;
    };
    let expected = target * share;
    let (low, high) = band(expected, daily.band);
    for (date, totals) in &days {
        let day = DayOfWeek::from_weekday(date.weekday());
        if daily.weekdays_only && day.is_weekend() {
            continue;
        }
        if totals.calories < low || totals.calories > high {
            let message = format!(
                "{} totals {:.0} kcal, outside the {low:.0}-{high:.0} kcal daily range for {} mode",
                title(day),
                totals.calories,
                rules.macro_mode
            );
            match daily.severity {
                Severity::Error => result.error(message),
                Severity::Warning => result.warn(message),
            }
        }
    }
}

fn band(expected: f64, fraction: f64) -> (f64, f64) {
    ((expected * (1.0 - fraction)).max(0.0), expected * (1.0 + fraction))
}
