//! Path-addressed writes and removals on a live JSON document.
//!
//! Both functions walk a [`PathExpression`] token by token. Writes create
//! missing intermediate containers (an object, or an array when the next
//! token is an index); removals never create anything and never fail.

use rulegen_core::{PathError, PathExpression, PathToken};
use serde_json::{Map, Value};

/// Write `value` at `path`, creating missing parents.
///
/// A final index token writes positionally: inside the array it replaces
/// the element, at exactly the current length it appends.
///
/// # Errors
///
/// - [`PathError::IndexOutOfBounds`] for an index past the end of an array.
/// - [`PathError::NotAContainer`] when an existing value along the path
///   cannot hold the next token.
pub fn write_value(
    document: &mut Value,
    path: &PathExpression,
    value: Value,
) -> Result<(), PathError> {
    let tokens = path.tokens();
    let mut current = document;

    for (position, token) in path.parent_tokens().iter().enumerate() {
        current = step_or_create(current, token, &tokens[position + 1], path)?;
    }

    match (current, path.last()) {
        (Value::Object(map), PathToken::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(items), PathToken::Index(index)) => {
            let len = items.len();
            if *index < len {
                items[*index] = value;
            } else if *index == len {
                items.push(value);
            } else {
                return Err(out_of_bounds(path, *index, len));
            }
            Ok(())
        }
        (_, token) => Err(not_a_container(path, token)),
    }
}

/// Remove the value at `path`. Returns whether anything was removed.
///
/// A missing intermediate, a non-container along the way, or an index
/// past the end all leave the document untouched.
pub fn remove_value(document: &mut Value, path: &PathExpression) -> bool {
    let mut current = document;

    for token in path.parent_tokens() {
        let next = match (current, token) {
            (Value::Object(map), PathToken::Key(key)) => map.get_mut(key),
            (Value::Array(items), PathToken::Index(index)) => items.get_mut(*index),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return false,
        }
    }

    match (current, path.last()) {
        (Value::Object(map), PathToken::Key(key)) => map.shift_remove(key).is_some(),
        (Value::Array(items), PathToken::Index(index)) if *index < items.len() => {
            items.remove(*index);
            true
        }
        _ => false,
    }
}

fn step_or_create<'v>(
    current: &'v mut Value,
    token: &PathToken,
    next: &PathToken,
    path: &PathExpression,
) -> Result<&'v mut Value, PathError> {
    match (current, token) {
        (Value::Object(map), PathToken::Key(key)) => {
            Ok(map.entry(key.clone()).or_insert_with(|| empty_container(next)))
        }
        (Value::Array(items), PathToken::Index(index)) => {
            let len = items.len();
            if *index == len {
                items.push(empty_container(next));
            } else if *index > len {
                return Err(out_of_bounds(path, *index, len));
            }
            Ok(&mut items[*index])
        }
        (_, token) => Err(not_a_container(path, token)),
    }
}

fn empty_container(next: &PathToken) -> Value {
    match next {
        PathToken::Key(_) => Value::Object(Map::new()),
        PathToken::Index(_) => Value::Array(Vec::new()),
    }
}

fn out_of_bounds(path: &PathExpression, index: usize, len: usize) -> PathError {
    PathError::IndexOutOfBounds {
        path: path.to_string(),
        index,
        len,
    }
}

fn not_a_container(path: &PathExpression, token: &PathToken) -> PathError {
    PathError::NotAContainer {
        path: path.to_string(),
        segment: token.to_string(),
    }
}
