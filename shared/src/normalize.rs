//! Coercion of loosely shaped request bodies into a question and a topic.
//!
//! Clients send the question and topic either as plain strings or wrapped in small
//! objects (e.g. `{"value": "..."}` from form widgets). [`FieldValue`] classifies a
//! raw JSON value once and [`FieldValue::normalize`] applies the precedence rules.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Keys probed, in order, when a field arrives as an object.
pub const OBJECT_TEXT_KEYS: [&str; 3] = ["text", "value", "question"];
/// Body keys accepted for the question, canonical key first.
pub const QUESTION_KEYS: [&str; 3] = ["question", "q", "prompt"];
/// Body keys accepted for the topic, canonical key first.
pub const TOPIC_KEYS: [&str; 2] = ["topic", "subject"];
/// Topic used when none is supplied.
pub const DEFAULT_TOPIC: &str = "General";

/// A request field, classified by shape.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// Absent or `null`
    Missing,
    Text(&'a str),
    Object(&'a Map<String, Value>),
    /// Numbers, booleans and arrays
    Other(&'a Value),
}

impl<'a> From<Option<&'a Value>> for FieldValue<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(Value::Object(map)) => FieldValue::Object(map),
            Some(other) => FieldValue::Other(other),
        }
    }
}

impl FieldValue<'_> {
    /// Reduce the field to a trimmed string. Never fails.
    ///
    /// Objects yield the first string among `text`, `value`, `question`; an object
    /// with none of them is rendered as its JSON text.
    pub fn normalize(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Object(map) => OBJECT_TEXT_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| Value::Object((*map).clone()).to_string()),
            FieldValue::Other(value) => value.to_string().trim().to_string(),
        }
    }
}

/// Normalize a single raw JSON value.
pub fn normalize(value: Option<&Value>) -> String {
    FieldValue::from(value).normalize()
}

/// First present, non-null field among `keys`.
fn lookup<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| body.get(*key))
        .find(|value| !value.is_null())
}

/// A validated question and topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub question: String,
    pub topic: String,
}

impl NormalizedRequest {
    /// Extract and validate the question and topic from a parsed request body.
    ///
    /// Length is counted in Unicode scalar values, not bytes or UTF-16 units.
    pub fn from_body(body: &Value, max_question_length: usize) -> Result<Self> {
        let question = normalize(lookup(body, &QUESTION_KEYS));
        if question.is_empty() {
            return Err(Error::MissingQuestion);
        }

        let length = question.chars().count();
        if length > max_question_length {
            return Err(Error::QuestionTooLong {
                length,
                max: max_question_length,
            });
        }

        let topic = match normalize(lookup(body, &TOPIC_KEYS)) {
            t if t.is_empty() => DEFAULT_TOPIC.to_string(),
            t => t,
        };

        Ok(Self { question, topic })
    }
}
