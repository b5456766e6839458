//! Turns free-form model replies into [`FoodIdentificationResponse`]s.
//!
//! The model is asked for JSON but frequently wraps it in prose or code
//! fences, or answers in plain text. [`extract_json_object`] finds the first
//! balanced `{...}` that parses as an object; [`normalize_food_payload`] fills
//! whatever the model left out; [`parse_text_response`] scrapes plain text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use zcal_core::{FoodIdentificationResponse, FoodMacros};

const UNKNOWN_FOOD: &str = "Unknown";
const FALLBACK_FOOD_NAME: &str = "Identified food";
const NO_INSIGHTS: &str = "No insights available.";
const MAX_NAME_CHARS: usize = 60;
const MAX_INSIGHT_CHARS: usize = 280;
const NEUTRAL_HEALTH_SCORE: u8 = 50;

static CALORIES_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:calorias|calories|kcal)").expect("valid calories regex")
});

static QUOTED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:name|food)"\s*:\s*"([^"\\]+)""#).expect("valid quoted name regex")
});

static QUOTED_CALORIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""calories"\s*:\s*"?(\d+)"#).expect("valid quoted calories regex"));

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("valid number regex"));

/// Finds the first balanced `{...}` in `text` that parses as a JSON object.
///
/// Braces inside JSON string literals are ignored while matching. Candidates
/// that fail to parse are skipped and the scan resumes after their opening
/// brace.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut from = 0;

    while let Some(offset) = text[from..].find('{') {
        let open = from + offset;
        if let Some(close) = matching_brace(&text[open..]) {
            if let Ok(Value::Object(map)) = serde_json::from_str(&text[open..=open + close]) {
                return Some(map);
            }
        }
        from = open + 1;
    }

    None
}

/// Byte offset of the brace closing the one at the start of `s`.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Macro split derived from calories: 30% protein, 40% carbs, 30% fat.
pub fn estimate_macros(calories: u32) -> FoodMacros {
    if calories == 0 {
        return FoodMacros::grams(0, 0, 0);
    }

    let cal = f64::from(calories);
    FoodMacros::grams(
        (cal * 0.3 / 4.0).round() as u32,
        (cal * 0.4 / 4.0).round() as u32,
        (cal * 0.3 / 9.0).round() as u32,
    )
}

/// Buckets calories into a health score.
pub fn estimate_health_score(calories: u32) -> u8 {
    match calories {
        0 => NEUTRAL_HEALTH_SCORE,
        1..=249 => 85,
        250..=499 => 75,
        500..=749 => 65,
        750..=999 => 55,
        _ => 45,
    }
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reads a number, or the leading number of a string such as `"350 kcal"`.
fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER
            .captures(s)
            .and_then(|c| c[1].parse().ok()),
        _ => None,
    }
}

fn macro_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => n.as_f64().map(|g| format!("{}g", g.max(0.0).round() as u32)),
        _ => None,
    }
}

/// Fills a model-produced JSON object into the canonical response.
///
/// Accepts both the current schema and the older `food`/`description` one.
pub fn normalize_food_payload(map: &Map<String, Value>) -> FoodIdentificationResponse {
    let calories = numeric(map.get("calories"))
        .map(|c| c.clamp(0.0, f64::from(u32::MAX)).round() as u32)
        .unwrap_or(0);

    let estimated = estimate_macros(calories);
    let given = map.get("macros").and_then(Value::as_object);
    let pick = |key: &str, fallback: String| {
        given
            .and_then(|m| macro_value(m.get(key)))
            .unwrap_or(fallback)
    };
    let macros = FoodMacros {
        protein: pick("protein", estimated.protein.clone()),
        carbs: pick("carbs", estimated.carbs.clone()),
        fat: pick("fat", estimated.fat.clone()),
    };

    let health_score = numeric(map.get("healthScore"))
        .map(|s| s.clamp(0.0, 100.0).round() as u8)
        .unwrap_or_else(|| estimate_health_score(calories));

    FoodIdentificationResponse {
        name: non_empty_str(map, "name")
            .or_else(|| non_empty_str(map, "food"))
            .unwrap_or(UNKNOWN_FOOD)
            .to_string(),
        calories,
        macros,
        health_score,
        insights: non_empty_str(map, "insights")
            .or_else(|| non_empty_str(map, "description"))
            .unwrap_or(NO_INSIGHTS)
            .to_string(),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Drops Markdown code fence lines, keeping what they wrapped.
fn strip_code_fences(text: &str) -> String {
    text.lines().filter(|line| !is_fence(line)).collect::<Vec<_>>().join("\n")
}

/// First line or sentence of the reply, when it is short enough to be a name.
///
/// Fence lines are skipped; a segment that opens a JSON value is not a name.
pub fn extract_likely_food_name(text: &str) -> String {
    text.split(['\n', '.'])
        .find(|segment| !is_fence(segment))
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with(['{', '['])
                && line.chars().count() <= MAX_NAME_CHARS
        })
        .unwrap_or(FALLBACK_FOOD_NAME)
        .to_string()
}

/// Builds a response from a plain-text reply.
///
/// Malformed JSON still gets its quoted `name` and `calories` salvaged.
pub fn parse_text_response(text: &str) -> FoodIdentificationResponse {
    let body = strip_code_fences(text);

    let calories = CALORIES_IN_TEXT
        .captures(&body)
        .or_else(|| QUOTED_CALORIES.captures(&body))
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0);

    let name = QUOTED_NAME
        .captures(&body)
        .map(|c| c[1].trim().to_string())
        .filter(|name| !name.is_empty() && name.chars().count() <= MAX_NAME_CHARS)
        .unwrap_or_else(|| extract_likely_food_name(&body));

    let insights: String = body.trim().chars().take(MAX_INSIGHT_CHARS).collect();

    FoodIdentificationResponse {
        name,
        calories,
        macros: estimate_macros(calories),
        health_score: estimate_health_score(calories),
        insights: if insights.is_empty() { NO_INSIGHTS.to_string() } else { insights },
    }
}

/// Parses a reply: embedded JSON when present, plain text otherwise.
pub fn parse_food_reply(reply: &str) -> FoodIdentificationResponse {
    match extract_json_object(reply) {
        Some(map) => normalize_food_payload(&map),
        None => {
            tracing::warn!("No JSON object in food reply, falling back to text scraping");
            parse_text_response(reply)
        }
    }
}
