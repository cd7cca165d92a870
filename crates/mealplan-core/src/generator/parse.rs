//! Turning generator output into a [`GeneratorResponse`].
//!
//! Accepted shapes:
//! - a bare JSON object with a `meals` array,
//! - the same object inside a fenced code block within prose,
//! - a CLI envelope (`{"type": "result", "result": "..."}`) whose `result`
//!   text holds either of the above.
//!
//! Field names are read in both snake_case and camelCase. Meals that cannot
//! be read are skipped and reported in [`GeneratorResponse::issues`].

use std::sync::LazyLock;

use mealplan_db::models::{DayOfWeek, MealType};
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::types::{CandidateMeal, GeneratorError, GeneratorResponse};

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok());

pub fn parse_response(output: &str) -> Result<GeneratorResponse, GeneratorError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(GeneratorError::Malformed("the output was empty".to_owned()));
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => unwrap_envelope(v)?,
        Err(_) => extract_json(trimmed)?,
    };
    plan_from_value(&value)
}

fn unwrap_envelope(value: Value) -> Result<Value, GeneratorError> {
    if value.get("meals").is_some() {
        return Ok(value);
    }
    let result_text = value.get("result").and_then(Value::as_str);
    if value.get("is_error").and_then(Value::as_bool) == Some(true) {
        let message = result_text.unwrap_or("unknown error");
        return Err(GeneratorError::Reported(message.to_owned()));
    }
    match result_text {
        Some(text) => extract_json(text),
        None => Err(GeneratorError::Malformed(
            "the JSON reply has no \"meals\" array".to_owned(),
        )),
    }
}

/// Find the JSON object inside free text.
fn extract_json(text: &str) -> Result<Value, GeneratorError> {
    let body = FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&body[start..=end])
            .map_err(|e| GeneratorError::Malformed(format!("the plan is not valid JSON ({e})"))),
        _ => Err(GeneratorError::Malformed(
            "the reply contains no JSON object".to_owned(),
        )),
    }
}

fn plan_from_value(value: &Value) -> Result<GeneratorResponse, GeneratorError> {
    let raw_meals = value.get("meals").and_then(Value::as_array).ok_or_else(|| {
        GeneratorError::Malformed("the plan has no \"meals\" array".to_owned())
    })?;

    let mut meals = Vec::with_capacity(raw_meals.len());
    let mut issues = Vec::new();
    for (i, raw) in raw_meals.iter().enumerate() {
        match parse_meal(raw) {
            Ok(meal) => meals.push(meal),
            Err(reason) => issues.push(format!("Meal #{} could not be read: {reason}", i + 1)),
        }
    }

    let summary = value
        .as_object()
        .and_then(|obj| str_field(obj, &["summary", "planSummary"]))
        .unwrap_or_default()
        .to_owned();

    Ok(GeneratorResponse {
        meals,
        summary,
        issues,
    })
}

fn parse_meal(raw: &Value) -> Result<CandidateMeal, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| "expected an object".to_owned())?;

    let day_text = str_field(obj, &["day", "day_of_week", "dayOfWeek"])
        .ok_or_else(|| "missing \"day\"".to_owned())?;
    let day: DayOfWeek = day_text
        .parse()
        .map_err(|_| format!("unknown day {day_text:?}"))?;

    let meal_type_text = str_field(obj, &["meal_type", "mealType", "slot"])
        .ok_or_else(|| "missing \"meal_type\"".to_owned())?;
    let meal_type: MealType = meal_type_text
        .parse()
        .map_err(|_| format!("unknown meal type {meal_type_text:?}"))?;

    let recipe_id = str_field(obj, &["recipe_id", "recipeId"]).and_then(|s| Uuid::parse_str(s).ok());
    let recipe_name = str_field(obj, &["recipe_name", "recipeName", "recipe", "name"])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);
    if recipe_id.is_none() && recipe_name.is_none() {
        return Err(format!("{day} {meal_type} names no recipe"));
    }

    let servings = field(obj, &["servings"]).and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok())
    });

    let is_leftover = field(obj, &["is_leftover", "isLeftover", "leftover"])
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let leftover_source_day = match str_field(
        obj,
        &[
            "leftover_source_day",
            "leftoverSourceDay",
            "batch_cook_source_day",
            "batchCookSourceDay",
        ],
    ) {
        Some(text) => Some(
            text.parse::<DayOfWeek>()
                .map_err(|_| format!("unknown leftover source day {text:?}"))?,
        ),
        None => None,
    };

    let notes = str_field(obj, &["notes", "note"])
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned);

    Ok(CandidateMeal {
        day,
        meal_type,
        recipe_id,
        recipe_name,
        servings,
        is_leftover,
        leftover_source_day,
        notes,
    })
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| obj.get(*name))
        .filter(|v| !v.is_null())
}

fn str_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    field(obj, names).and_then(Value::as_str)
}
