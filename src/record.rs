//! Records and the scalar values they hold.

use serde_json::Value as Json;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Date(OffsetDateTime),
}

/// A record maps field names to values.
pub type Record = HashMap<String, Value>;

impl Value {
    /// Text used when a string or regex literal is matched against this value.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Date(dt) => Cow::Owned(format_date(dt)),
        }
    }

    /// Numeric view; strings holding a number count too.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Date(_) => None,
        }
    }

    /// Point-in-time view; strings in a supported date format count too.
    pub fn as_date(&self) -> Option<OffsetDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::String(s) => parse_date(s),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Value::Date(value)
    }
}

fn format_date(dt: &OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

/// Parse a date literal.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD hh:mm:ss` and `MM/DD/YYYY`.
/// Forms without an offset are taken as UTC; date-only forms as midnight.
pub fn parse_date(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();

    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(dt.assume_utc());
    }
    if let Ok(date) = Date::parse(text, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }
    if let Ok(date) = Date::parse(
        text,
        format_description!("[month padding:none]/[day padding:none]/[year]"),
    ) {
        return Some(date.midnight().assume_utc());
    }

    None
}

/// Convert a JSON object into a record.
///
/// Booleans become `"true"`/`"false"`, nested arrays and objects become their
/// compact JSON text and `null` fields are dropped. Non-objects yield `None`.
pub fn from_json(value: Json) -> Option<Record> {
    let Json::Object(map) = value else {
        return None;
    };

    let record = map
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Json::Null => return None,
                Json::String(s) => Value::String(s),
                Json::Number(n) => Value::Number(n.as_f64()?),
                Json::Bool(b) => Value::String(b.to_string()),
                nested @ (Json::Array(_) | Json::Object(_)) => Value::String(nested.to_string()),
            };
            Some((key, value))
        })
        .collect();

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn test_parses_supported_date_forms() {
        let midnight = datetime!(1939-10-27 0:00 UTC);
        assert_eq!(parse_date("1939-10-27"), Some(midnight));
        assert_eq!(parse_date("10/27/1939"), Some(midnight));
        assert_eq!(parse_date("1939-10-27T00:00:00Z"), Some(midnight));
        assert_eq!(
            parse_date("1939-10-27 13:30:00"),
            Some(datetime!(1939-10-27 13:30 UTC))
        );
        assert_eq!(parse_date("1/8/1941"), Some(datetime!(1941-01-08 0:00 UTC)));
        assert_eq!(parse_date("last tuesday"), None);
    }

    #[test]
    fn test_numbers_render_in_shortest_form() {
        assert_eq!(Value::Number(83.0).text(), "83");
        assert_eq!(Value::Number(1.5).text(), "1.5");
    }

    #[test]
    fn test_string_values_have_numeric_and_date_views() {
        assert_eq!(Value::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(Value::from("forty").as_number(), None);
        assert_eq!(
            Value::from("2001-02-03").as_date(),
            Some(datetime!(2001-02-03 0:00 UTC))
        );
        assert_eq!(Value::Number(3.0).as_date(), None);
    }

    #[test]
    fn test_converts_json_objects() {
        let record = from_json(json!({
            "first": "John",
            "age": 83,
            "alive": false,
            "tags": ["a", "b"],
            "missing": null
        }))
        .unwrap();

        assert_eq!(record.get("first"), Some(&Value::from("John")));
        assert_eq!(record.get("age"), Some(&Value::Number(83.0)));
        assert_eq!(record.get("alive"), Some(&Value::from("false")));
        assert_eq!(record.get("tags"), Some(&Value::from(r#"["a","b"]"#)));
        assert!(!record.contains_key("missing"));
        assert!(from_json(json!([1, 2])).is_none());
    }
}
