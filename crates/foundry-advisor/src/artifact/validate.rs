use std::fmt;

use serde_json::{Number, Value};

use super::schema::{ArtifactSchema, FieldKind, FieldSpec};

/// Why a model reply was rejected. Never returned to callers: the generator
/// logs it and substitutes the fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    NotJson(String),
    NotAnObject,
    MissingField(String),
    WrongType { field: String, expected: &'static str },
    NotAllowed { field: String, value: String },
    TooFewItems { field: String, min: usize, found: usize },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::NotJson(e) => write!(f, "reply is not JSON: {e}"),
            ValidationFailure::NotAnObject => write!(f, "reply is not a JSON object"),
            ValidationFailure::MissingField(field) => write!(f, "missing field {field}"),
            ValidationFailure::WrongType { field, expected } => {
                write!(f, "field {field} should be {expected}")
            }
            ValidationFailure::NotAllowed { field, value } => {
                write!(f, "field {field} has unexpected value '{value}'")
            }
            ValidationFailure::TooFewItems { field, min, found } => {
                write!(f, "field {field} has {found} items, needs at least {min}")
            }
        }
    }
}

/// Parse a raw model reply into JSON.
///
/// Accepts a reply wrapped in a Markdown code fence, and unwraps an object
/// whose only key is `result`.
pub fn parse_reply(raw: &str) -> Result<Value, ValidationFailure> {
    let body = strip_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ValidationFailure::NotJson(e.to_string()))?;
    Ok(unwrap_result(value))
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn unwrap_result(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Check `value` against `schema`, returning it with every number field
/// normalized to a float. Anything outside the schema is left as it was.
pub fn validate(schema: &ArtifactSchema, value: Value) -> Result<Value, ValidationFailure> {
    let mut value = value;
    check_fields(schema.fields, &mut value, "")?;
    Ok(value)
}

fn check_fields(fields: &[FieldSpec], value: &mut Value, prefix: &str) -> Result<(), ValidationFailure> {
    let Value::Object(map) = value else {
        return Err(if prefix.is_empty() {
            ValidationFailure::NotAnObject
        } else {
            ValidationFailure::WrongType {
                field: prefix.trim_end_matches('.').to_string(),
                expected: "an object",
            }
        });
    };

    for spec in fields {
        let path = format!("{prefix}{}", spec.name);
        let Some(field) = map.get_mut(spec.name) else {
            if spec.required {
                return Err(ValidationFailure::MissingField(path));
            }
            continue;
        };
        check_field(spec, field, &path)?;
    }
    Ok(())
}

fn check_field(spec: &FieldSpec, field: &mut Value, path: &str) -> Result<(), ValidationFailure> {
    match spec.kind {
        FieldKind::Number => {
            let number = field.as_f64().ok_or_else(|| ValidationFailure::WrongType {
                field: path.to_string(),
                expected: "a number",
            })?;
            *field = Number::from_f64(number)
                .map(Value::Number)
                .ok_or_else(|| ValidationFailure::WrongType {
                    field: path.to_string(),
                    expected: "a finite number",
                })?;
        }
        FieldKind::Text { one_of } => {
            let text = field.as_str().ok_or_else(|| ValidationFailure::WrongType {
                field: path.to_string(),
                expected: "a string",
            })?;
            if !one_of.is_empty() && !one_of.contains(&text) {
                return Err(ValidationFailure::NotAllowed {
                    field: path.to_string(),
                    value: text.to_string(),
                });
            }
        }
        FieldKind::TextList { min_items } => {
            let items = field.as_array().ok_or_else(|| ValidationFailure::WrongType {
                field: path.to_string(),
                expected: "a list of strings",
            })?;
            if items.iter().any(|item| !item.is_string()) {
                return Err(ValidationFailure::WrongType {
                    field: path.to_string(),
                    expected: "a list of strings",
                });
            }
            if items.len() < min_items {
                return Err(ValidationFailure::TooFewItems {
                    field: path.to_string(),
                    min: min_items,
                    found: items.len(),
                });
            }
        }
        FieldKind::Object(children) => check_fields(children, field, &format!("{path}."))?,
    }
    Ok(())
}
