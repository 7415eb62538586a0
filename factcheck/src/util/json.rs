//! JSON extraction and parsing from model output

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Pull the JSON part out of model text
///
/// Handles:
/// - ```json blocks
/// - Generic ``` blocks
/// - Raw JSON text
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    let body = if let Some(start) = text.find("```json") {
        &text[start + 7..]
    } else if let Some(start) = text.find("```") {
        &text[start + 3..]
    } else {
        return text;
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse a top-level JSON object from model text
///
/// Tries the whole text, then the fenced block, then the span from the first
/// `{` to the last `}`.
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>> {
    let candidates = [text.trim(), extract_json(text)];
    for candidate in candidates {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return Ok(map);
        }
    }

    let inner = extract_json(text);
    let (start, end) = match (inner.find('{'), inner.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => return Err(anyhow!("Could not parse JSON object from model response: {}", preview(text))),
    };

    match serde_json::from_str::<Value>(&inner[start..=end])
        .with_context(|| format!("Invalid JSON in model response: {}", preview(text)))?
    {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("Model response JSON is not an object")),
    }
}

/// Parse model text into a typed structure
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let object = parse_json_object(text)?;
    serde_json::from_value(Value::Object(object))
        .context("Model response does not match the expected shape")
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        preview.push_str("...");
    }
    preview
}
