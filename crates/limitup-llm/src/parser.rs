use serde_json::{Map, Value};

use crate::error::LlmError;

/// Extract the first JSON object from a model reply that may contain surrounding text.
///
/// Handles the usual reply shapes:
/// - Clean JSON: `{"key": "value"}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - Prefix text: `分析结果如下:\n{"key": "value"}`
/// - Trailing commentary after the object
pub fn extract_json(text: &str) -> Result<String, LlmError> {
    let trimmed = text.trim();
    let is_json = |s: &str| serde_json::from_str::<Value>(s).is_ok();

    if trimmed.starts_with('{') && is_json(trimmed) {
        return Ok(trimmed.to_string());
    }

    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if is_json(&json_str) {
            return Ok(json_str);
        }
    }

    if let Some(json_str) = extract_first_object(trimmed) {
        if is_json(&json_str) {
            return Ok(json_str);
        }
    }

    if let Some(json_str) = extract_outermost_braces(trimmed) {
        if is_json(&json_str) {
            return Ok(json_str);
        }
    }

    Err(LlmError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    let start_markers = ["```json", "```JSON", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                let extracted = text[json_start..json_start + end].trim();
                return Some(extracted.to_string());
            }
        }
    }

    None
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' if start.is_some() => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Everything from the first `{` to the last `}`.
fn extract_outermost_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].to_string())
}

/// Parse a model reply into a JSON object.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, LlmError> {
    let json_str = extract_json(raw)?;
    match serde_json::from_str::<Value>(&json_str)? {
        Value::Object(map) => Ok(map),
        other => Err(LlmError::Parse(format!(
            "Expected a JSON object, got {}",
            match other {
                Value::Array(_) => "an array",
                _ => "a scalar",
            }
        ))),
    }
}
