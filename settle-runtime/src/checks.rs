//! Argument assertions shared by every setup function.
//!
//! Each check fails with [`Error::InvalidArgument`] carrying a message of the
//! form `Expected argument "<name>" to be a <type>. Got <value>`, so callers
//! can tell a programmer error from a runtime outcome.

use std::fmt::Display;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Builds the error reported when `value` for argument `name` is not a
/// `type_name`.
pub fn expected_error(value: impl Display, name: &str, type_name: &str) -> Error {
    let article = if starts_with_vowel(type_name) { "an" } else { "a" };
    Error::InvalidArgument(format!(
        "Expected argument \"{name}\" to be {article} {type_name}. Got {value}"
    ))
}

fn starts_with_vowel(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
}

pub fn ensure_non_empty_string(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(expected_error(format!("{value:?}"), name, "non-empty string"));
    }
    Ok(())
}

pub fn ensure_positive_duration(value: Duration, name: &str) -> Result<()> {
    if value.is_zero() {
        return Err(expected_error(format!("{value:?}"), name, "positive number"));
    }
    Ok(())
}

pub fn ensure_object<'a>(value: &'a Value, name: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| expected_error(value, name, "object"))
}

pub fn ensure_boolean(value: &Value, name: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| expected_error(value, name, "boolean"))
}

/// Checks that `value` is an array whose elements are all strings and
/// returns them in order.
pub fn ensure_array_of_strings(value: &Value, name: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| expected_error(value, name, "array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| expected_error(item, &format!("{name}[{index}]"), "string"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expected_error_message() {
        let err = expected_error("\"\"", "event.name", "non-empty string");
        assert_eq!(
            err.to_string(),
            "Expected argument \"event.name\" to be a non-empty string. Got \"\""
        );
    }

    #[test]
    fn test_expected_error_uses_an_before_vowel() {
        let err = expected_error(json!(3), "options", "object");
        assert_eq!(
            err.to_string(),
            "Expected argument \"options\" to be an object. Got 3"
        );
    }

    #[test]
    fn test_non_empty_string() {
        assert!(ensure_non_empty_string("ready", "event.name").is_ok());
        let err = ensure_non_empty_string("", "event.name").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref m) if m.contains("event.name")));
    }

    #[test]
    fn test_positive_duration() {
        assert!(ensure_positive_duration(Duration::from_millis(1), "timeout.interval").is_ok());
        let err = ensure_positive_duration(Duration::ZERO, "timeout.interval").unwrap_err();
        assert!(err.to_string().contains("positive number"));
    }

    #[test]
    fn test_ensure_object() {
        assert!(ensure_object(&json!({}), "options").is_ok());
        assert!(ensure_object(&json!([]), "options").is_err());
        assert!(ensure_object(&Value::Null, "options").is_err());
    }

    #[test]
    fn test_ensure_boolean() {
        assert!(ensure_boolean(&json!(true), "flag").unwrap());
        assert!(ensure_boolean(&json!("true"), "flag").is_err());
    }

    #[test]
    fn test_array_of_strings() {
        let names = ensure_array_of_strings(&json!(["a", "b"]), "names").unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

        let err = ensure_array_of_strings(&json!("not an array"), "options.rejectMultiple")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected argument \"options.rejectMultiple\" to be an array. Got \"not an array\""
        );

        let err = ensure_array_of_strings(&json!(["a", 1]), "names").unwrap_err();
        assert!(err.to_string().contains("\"names[1]\""));
    }
}
