/// Pulls movie titles out of free-form model output
///
/// Models wrap JSON in code fences, prefix it with prose, or return objects
/// instead of strings. We accept a JSON array of strings or an array of
/// objects carrying a title, wherever it appears in the text.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?").expect("valid code fence regex"));

static OBJECT_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").expect("valid object array regex"));

static STRING_ARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\s*"(?:[^"\\]|\\.)*"(?:\s*,\s*"(?:[^"\\]|\\.)*")*\s*,?\s*\]"#)
        .expect("valid string array regex")
});

const TITLE_KEYS: [&str; 3] = ["title", "Title", "name"];

/// Titles in the first JSON array found in `text`, or `None` if there are none
pub fn extract_titles(text: &str) -> Option<Vec<String>> {
    let cleaned = CODE_FENCE.replace_all(text, "");
    let cleaned = cleaned.trim();

    let candidates = std::iter::once(cleaned)
        .chain(OBJECT_ARRAY.find_iter(cleaned).map(|m| m.as_str()))
        .chain(STRING_ARRAY.find_iter(cleaned).map(|m| m.as_str()));

    candidates
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find_map(|value| titles_from_value(&value))
}

fn titles_from_value(value: &Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        // {"movies": [...]} or {"recommendations": [...]}
        Value::Object(map) => map.values().find_map(Value::as_array)?,
        _ => return None,
    };

    let raw = items.iter().filter_map(|item| match item {
        Value::String(title) => Some(title.as_str()),
        Value::Object(map) => TITLE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str)),
        _ => None,
    });

    let titles = dedupe(raw);
    if titles.is_empty() {
        None
    } else {
        Some(titles)
    }
}

/// Trims, drops blanks, and removes case-insensitive duplicates, keeping first spelling
pub fn dedupe<'a>(titles: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}
