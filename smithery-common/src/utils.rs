// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::time::Instant;
use serde_json::{Map, Value};

/// Walk a JSON value along a path of object keys
pub fn nested<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Mutable variant of [`nested`]
pub fn nested_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    path.iter().try_fold(value, |current, key| current.get_mut(*key))
}

pub fn nested_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    nested(value, path).and_then(Value::as_str)
}

pub fn nested_object<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Map<String, Value>> {
    nested(value, path).and_then(Value::as_object)
}

/// Set `new` at `path`, creating intermediate objects as needed.
///
/// Returns false when an intermediate value exists but is not an object.
pub fn set_nested(value: &mut Value, path: &[&str], new: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        *value = new;
        return true;
    };

    let mut current = value;
    for key in parents {
        let Some(map) = current.as_object_mut() else {
            return false;
        };
        current = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    match current.as_object_mut() {
        Some(map) => {
            map.insert(last.to_string(), new);
            true
        }
        None => false,
    }
}

/// Human readable time elapsed since `start`
pub fn eta(start: Instant) -> String {
    format!("{:.2?}", start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_walks_objects() {
        let value = json!({ "spec": { "names": { "plural": "buttons" } } });

        assert_eq!(nested_str(&value, &["spec", "names", "plural"]), Some("buttons"));
        assert!(nested(&value, &["spec", "group"]).is_none());
        assert!(nested_object(&value, &["spec", "names"]).is_some());
        assert_eq!(nested(&value, &[]), Some(&value));
    }

    #[test]
    fn set_nested_creates_intermediate_objects() {
        let mut value = json!({ "metadata": {} });

        assert!(set_nested(&mut value, &["metadata", "labels", "app"], json!("smithery")));
        assert_eq!(value, json!({ "metadata": { "labels": { "app": "smithery" } } }));
    }

    #[test]
    fn set_nested_refuses_non_object_parents() {
        let mut value = json!({ "metadata": "oops" });

        assert!(!set_nested(&mut value, &["metadata", "name"], json!("x")));
        assert_eq!(value, json!({ "metadata": "oops" }));
    }
}
