use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ExtractError {
    #[error("no JSON object or array found in model output")]
    NotFound,
    #[error("unbalanced JSON delimiters in model output")]
    Unbalanced,
    #[error("multiple top-level JSON candidates in model output")]
    Ambiguous,
    #[error("candidate span is not valid JSON: {0}")]
    Invalid(String),
}

/// Parses model output that should be a single JSON value. Tries the whole (trimmed)
/// text first, which is the normal case when the JSON response format is honored, and
/// falls back to extracting one balanced top-level span from surrounding prose.
pub(crate) fn parse_model_json(text: &str) -> Result<Value, ExtractError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }
    extract_json(trimmed)
}

/// Extracts the first balanced top-level `{...}` or `[...]` span from `text`.
/// Fails on an unterminated span, and refuses to guess when a second opening
/// delimiter appears after the first span closes.
pub(crate) fn extract_json(text: &str) -> Result<Value, ExtractError> {
    let mut chars = text.char_indices();

    let (start, open) = loop {
        match chars.next() {
            Some((index, ch)) if ch == '{' || ch == '[' => break (index, ch),
            Some(_) => continue,
            None => return Err(ExtractError::NotFound),
        }
    };

    let close = if open == '{' { '}' } else { ']' };
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (index, ch) in chars.by_ref() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    end = Some(index);
                    break;
                }
            }
            _ => {}
        }
    }

    let Some(end) = end else {
        return Err(ExtractError::Unbalanced);
    };

    if chars.any(|(_, ch)| ch == '{' || ch == '[') {
        return Err(ExtractError::Ambiguous);
    }

    let span = &text[start..=end];
    serde_json::from_str(span).map_err(|err| ExtractError::Invalid(err.to_string()))
}
