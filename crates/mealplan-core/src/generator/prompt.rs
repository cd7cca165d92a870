//! Prompt construction for text-based generators. Pure logic, no I/O.

use std::collections::BTreeMap;

use mealplan_db::models::{DayOfWeek, Macro, MealType};

use super::types::GenerationRequest;
use crate::schedule::Schedule;

/// Output contract included in every prompt.
const OUTPUT_SCHEMA: &str = r#"## Output Format

Reply with a single JSON object and nothing else:

```json
{
  "meals": [
    {
      "day": "monday",              // monday..sunday
      "meal_type": "dinner",        // breakfast, lunch, dinner or snack
      "recipe_id": "uuid",          // id from the recipe list below
      "recipe_name": "string",      // exact name from the recipe list
      "servings": 2,
      "is_leftover": false,
      "leftover_source_day": null,  // day the leftovers were cooked
      "notes": "optional"
    }
  ],
  "summary": "Two or three sentences describing the week."
}
```
"#;

const PLANNING_GUIDELINES: &str = r#"## Planning Guidelines

1. Use only recipes from the recipe list. Never invent recipes or ids.
2. Fill every scheduled slot exactly once and leave unscheduled slots empty.
3. Do not plan anything for locked slots; they are already decided.
4. A leftover meal must use the same recipe and meal type as a non-leftover
   meal cooked earlier in the week, within the leftover window. Mention the
   batch cook in the notes of the source meal.
5. Respect every cooldown, counting the recent history below.
"#;

/// Build the full prompt for one attempt.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::with_capacity(8192);
    let schedule = Schedule::from_profiles(&request.profiles);

    prompt.push_str("# Weekly Meal Planner\n\n");
    prompt.push_str(&format!(
        "Plan meals for the week starting {} ({}).\n\n",
        request.week_start.format("%Y-%m-%d"),
        request.week_start.format("%A"),
    ));

    prompt.push_str(OUTPUT_SCHEMA);
    prompt.push('\n');
    prompt.push_str(PLANNING_GUIDELINES);
    prompt.push('\n');

    push_rules(&mut prompt, request);
    push_household(&mut prompt, request, &schedule);
    push_recipes(&mut prompt, request);
    push_history(&mut prompt, request);
    push_locked(&mut prompt, request);
    push_mandatory(&mut prompt, request);

    if !request.instructions.trim().is_empty() {
        prompt.push_str("## Instructions\n\n");
        prompt.push_str(request.instructions.trim());
        prompt.push_str("\n\n");
    }

    if !request.feedback.is_empty() {
        prompt.push_str("## Previous Attempt Feedback\n\n");
        prompt.push_str(
            "The previous plan was rejected. Fix every problem below and keep \
             everything else that was valid:\n\n",
        );
        for error in &request.feedback {
            prompt.push_str(&format!("- {error}\n"));
        }
        prompt.push('\n');
    }

    prompt
}

fn push_rules(prompt: &mut String, request: &GenerationRequest) {
    let rules = &request.rules;
    prompt.push_str("## Rules\n\n");
    for mt in MealType::ALL {
        let days = rules.cooldown_for(mt);
        if days > 0 {
            prompt.push_str(&format!(
                "- The same {mt} recipe may not repeat within {days} days.\n"
            ));
        }
    }
    if rules.min_cuisines > 0 {
        prompt.push_str(&format!(
            "- Use at least {} different cuisines.\n",
            rules.min_cuisines
        ));
    }
    if rules.max_same_cuisine > 0 {
        prompt.push_str(&format!(
            "- Use no cuisine more than {} times.\n",
            rules.max_same_cuisine
        ));
    }
    if rules.batch_cooking_enabled {
        prompt.push_str(&format!(
            "- Batch cooking is allowed; leftovers may be eaten up to {} days after cooking.\n",
            rules.max_leftover_days
        ));
    } else {
        prompt.push_str("- Batch cooking is disabled; do not plan leftovers.\n");
    }
    prompt.push_str(&format!("- Macro mode: {}.\n", rules.macro_mode));
    if !rules.priorities.is_empty() {
        prompt.push_str(&format!(
            "- Priorities, most important first: {}.\n",
            rules.priorities.join(", ")
        ));
    }
    prompt.push('\n');
}

fn push_household(prompt: &mut String, request: &GenerationRequest, schedule: &Schedule) {
    prompt.push_str("## Household\n\n");
    for profile in &request.profiles {
        prompt.push_str(&format!("- **{}**", profile.name));
        let targets: Vec<String> = Macro::ALL
            .iter()
            .filter_map(|m| {
                profile
                    .daily_targets
                    .get(*m)
                    .map(|v| format!("{v:.0} {} {}", m.unit(), m.name()))
            })
            .collect();
        if !targets.is_empty() {
            prompt.push_str(&format!(" (daily: {})", targets.join(", ")));
        }
        if let Some(notes) = &profile.dietary_notes {
            prompt.push_str(&format!(" -- {notes}"));
        }
        prompt.push('\n');
    }

    prompt.push_str("\n### Schedule (people eating each slot)\n\n");
    let mut by_day: BTreeMap<u32, (DayOfWeek, Vec<String>)> = BTreeMap::new();
    for slot in schedule.slots() {
        let entry = by_day
            .entry(slot.day.offset_from(request.week_start))
            .or_insert_with(|| (slot.day, Vec::new()));
        entry
            .1
            .push(format!("{} x{}", slot.meal_type, schedule.eaters(slot)));
    }
    for (day, slots) in by_day.values() {
        prompt.push_str(&format!("- {day}: {}\n", slots.join(", ")));
    }
    prompt.push('\n');
}

fn push_recipes(prompt: &mut String, request: &GenerationRequest) {
    prompt.push_str("## Recipes\n\n");
    for recipe in &request.recipes {
        let meal_types = if recipe.meal_types.is_empty() {
            "any".to_owned()
        } else {
            recipe
                .meal_types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("/")
        };
        prompt.push_str(&format!(
            "- `{}` {} [{}; {}",
            recipe.id,
            recipe.name,
            recipe.cuisine.as_deref().unwrap_or("no cuisine"),
            meal_types,
        ));
        if let Some(kcal) = recipe.nutrition.calories {
            prompt.push_str(&format!("; {kcal:.0} kcal"));
        }
        if let Some(protein) = recipe.nutrition.protein_g {
            prompt.push_str(&format!("; {protein:.0} g protein"));
        }
        if recipe.is_product {
            prompt.push_str("; ready-made");
        }
        prompt.push_str("]\n");
    }
    prompt.push('\n');
}

fn push_history(prompt: &mut String, request: &GenerationRequest) {
    if request.history.is_empty() {
        return;
    }
    let names: BTreeMap<_, _> = request
        .recipes
        .iter()
        .chain(&request.mandatory_recipes)
        .map(|r| (r.id, r.name.as_str()))
        .collect();

    prompt.push_str("## Recent History\n\n");
    let mut history = request.history.clone();
    history.sort_by_key(|entry| entry.used_on);
    for entry in &history {
        let name = names.get(&entry.recipe_id).copied().unwrap_or("(not offered)");
        prompt.push_str(&format!(
            "- {} {}: {} (`{}`)\n",
            entry.used_on, entry.meal_type, name, entry.recipe_id
        ));
    }
    prompt.push('\n');
}

fn push_locked(prompt: &mut String, request: &GenerationRequest) {
    if request.locked_meals.is_empty() {
        return;
    }
    prompt.push_str("## Locked Slots (already decided)\n\n");
    for locked in &request.locked_meals {
        prompt.push_str(&format!("- {}: {}\n", locked.slot, locked.recipe_name));
    }
    prompt.push('\n');
}

fn push_mandatory(prompt: &mut String, request: &GenerationRequest) {
    if request.mandatory_recipes.is_empty() {
        return;
    }
    prompt.push_str("## Required Recipes\n\n");
    if request.daily_repetition {
        prompt.push_str("Serve each of these on every day it can be eaten:\n\n");
    } else {
        prompt.push_str("Include each of these at least once:\n\n");
    }
    for recipe in &request.mandatory_recipes {
        prompt.push_str(&format!("- `{}` {}\n", recipe.id, recipe.name));
    }
    prompt.push('\n');
}
