//! Flattening of upstream responses into a single answer string.
//!
//! Matchers are tried in order; each either handles the response completely or
//! returns `None` to defer. The raw JSON dump at the end always matches, so an
//! unfamiliar success shape degrades to text instead of failing the request.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::BAD_GATEWAY;
use crate::{Error, Result};

/// Separator between candidate parts and between `output` items.
const BLOCK_SEPARATOR: &str = "\n\n";
/// Separator between content entries inside one `output` item.
const LINE_SEPARATOR: &str = "\n";

type Matcher = fn(&Value) -> Option<String>;

/// Recognised shapes, most expected first.
const MATCHERS: [(&str, Matcher); 2] = [("candidates", from_candidates), ("output", from_output)];

/// Turn a raw upstream response into answer text.
///
/// An `error` object in the response is surfaced as [`Error::Upstream`] before any
/// extraction is attempted.
pub fn extract_answer(raw: &Value) -> Result<String> {
    if let Some(err) = raw.get("error").filter(|e| e.is_object()) {
        return Err(upstream_error(err));
    }

    let answer = MATCHERS
        .iter()
        .find_map(|(shape, matcher)| {
            matcher(raw).inspect(|_| debug!(shape, "Extracted answer"))
        })
        .unwrap_or_else(|| {
            warn!("Unrecognised upstream response shape, returning raw JSON");
            raw.to_string()
        });

    Ok(answer)
}

/// `candidates[0].content.parts[*].text`, joined by blank lines.
fn from_candidates(raw: &Value) -> Option<String> {
    let first = raw.get("candidates")?.as_array()?.first()?;
    let parts = first
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Some(
        parts
            .iter()
            .map(text_of)
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR),
    )
}

/// `output[*].content[*].text`: lines within an item, blank lines between items.
///
/// Only taken when `output[0].content[0].text` is a non-empty string.
fn from_output(raw: &Value) -> Option<String> {
    raw.pointer("/output/0/content/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())?;
    let items = raw.get("output")?.as_array()?;

    Some(
        items
            .iter()
            .map(|item| {
                item.get("content")
                    .and_then(Value::as_array)
                    .map(|entries| {
                        entries
                            .iter()
                            .map(text_of)
                            .collect::<Vec<_>>()
                            .join(LINE_SEPARATOR)
                    })
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR),
    )
}

fn text_of(value: &Value) -> &str {
    value.get("text").and_then(Value::as_str).unwrap_or_default()
}

fn upstream_error(err: &Value) -> Error {
    let status = err
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .filter(|code| (400..600).contains(code))
        .unwrap_or(BAD_GATEWAY);

    Error::Upstream {
        status: Some(status),
        detail: err.to_string(),
    }
}
