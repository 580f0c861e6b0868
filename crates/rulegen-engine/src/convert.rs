//! # Type Narrowing and Value Conversion
//!
//! A raw `--set` value is a string. The schema decides what it becomes:
//!
//! 1. [`narrow`] reduces a [`ResolvedType`] to one [`JsonKind`], looking at
//!    the raw text only where a union leaves a choice.
//! 2. [`convert`] applies the single conversion rule of that kind.
//!
//! ## Narrowing Precedence (unions)
//!
//! 1. `array` when the text is a bracketed literal `[...]`
//! 2. `null` when the text is exactly `null`
//! 3. `string`
//! 4. `array`
//! 5. the first member in [`JsonKind`] order
//!
//! ## Conversion Rules
//!
//! | kind    | rule |
//! |---------|------|
//! | boolean | `true` (any case) is true, anything else false |
//! | integer | base-10 integer, else error |
//! | number  | integer if it reads as one, else finite float, else error |
//! | array   | `[a, b, ...]`; elements trimmed and converted by item type |
//! | object  | inline JSON object, else error |
//! | null    | always null |
//! | string  | unchanged |

use rulegen_core::{JsonKind, PathExpression, ResolvedType};
use serde_json::{Number, Value};

use crate::error::MutationError;

/// Reduce a resolved type to the single kind a raw value will be parsed as.
///
/// Returns `None` when nothing is known about the path.
pub fn narrow(resolved: &ResolvedType, raw: &str) -> Option<JsonKind> {
    let kinds = match resolved {
        ResolvedType::Single(kind) => return Some(*kind),
        ResolvedType::Union(kinds) => kinds,
        ResolvedType::Unknown => return None,
    };

    if kinds.contains(&JsonKind::Array) && is_array_literal(raw) {
        Some(JsonKind::Array)
    } else if kinds.contains(&JsonKind::Null) && raw == "null" {
        Some(JsonKind::Null)
    } else if kinds.contains(&JsonKind::String) {
        Some(JsonKind::String)
    } else if kinds.contains(&JsonKind::Array) {
        Some(JsonKind::Array)
    } else {
        kinds.iter().next().copied()
    }
}

/// True if the trimmed text is wrapped in `[` … `]`.
pub fn is_array_literal(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']')
}

/// Split `[a, b, c]` into trimmed elements. `[]` is empty.
fn array_elements(raw: &str) -> Option<Vec<&str>> {
    let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(str::trim).collect())
}

/// Convert `raw` to `kind`.
///
/// `item_type` is consulted only for arrays; each element is converted by
/// it, and compound or unknown item types keep elements as strings.
///
/// # Errors
///
/// Returns [`MutationError::Conversion`] when `raw` cannot be read as
/// `kind`.
pub fn convert(
    path: &PathExpression,
    kind: JsonKind,
    raw: &str,
    item_type: &ResolvedType,
) -> Result<Value, MutationError> {
    match kind {
        JsonKind::Array => {
            let elements = array_elements(raw).ok_or_else(|| {
                failure(path, kind, raw, "expected a bracketed list like [a,b,c]")
            })?;
            elements
                .into_iter()
                .map(|element| convert_element(path, element, item_type))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        JsonKind::Object => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(_) => Err(failure(path, kind, raw, "expected an inline JSON object")),
            Err(e) => Err(failure(path, kind, raw, &format!("invalid JSON: {e}"))),
        },
        scalar => convert_scalar(path, scalar, raw),
    }
}

fn convert_element(
    path: &PathExpression,
    element: &str,
    item_type: &ResolvedType,
) -> Result<Value, MutationError> {
    let kind = match item_type {
        ResolvedType::Single(kind) => Some(*kind),
        ResolvedType::Union(_) => narrow(item_type, element),
        ResolvedType::Unknown => None,
    };
    match kind {
        Some(kind) if !kind.is_compound() => convert_scalar(path, kind, element),
        _ => Ok(Value::String(element.to_string())),
    }
}

fn convert_scalar(
    path: &PathExpression,
    kind: JsonKind,
    raw: &str,
) -> Result<Value, MutationError> {
    match kind {
        JsonKind::Boolean => Ok(Value::Bool(raw.trim().eq_ignore_ascii_case("true"))),
        JsonKind::Integer => parse_integer(raw.trim())
            .ok_or_else(|| failure(path, kind, raw, "not a base-10 integer")),
        JsonKind::Number => {
            let text = raw.trim();
            parse_integer(text)
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                })
                .ok_or_else(|| failure(path, kind, raw, "not a finite number"))
        }
        JsonKind::Null => Ok(Value::Null),
        JsonKind::String | JsonKind::Array | JsonKind::Object => Ok(Value::String(raw.to_string())),
    }
}

fn parse_integer(text: &str) -> Option<Value> {
    text.parse::<i64>()
        .map(Value::from)
        .or_else(|_| text.parse::<u64>().map(Value::from))
        .ok()
}

fn failure(path: &PathExpression, kind: JsonKind, raw: &str, reason: &str) -> MutationError {
    MutationError::Conversion {
        path: path.to_string(),
        kind,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}
