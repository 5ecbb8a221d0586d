use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A global variable. XML and `setVar` produce text, `addVar` produces numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobalValue {
    Number(f64),
    Text(String),
}

pub type Globals = BTreeMap<String, GlobalValue>;

impl GlobalValue {
    /// Leading-number parse, so `"12 coins"` reads as 12.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => parse_leading_number(text),
        }
    }

    /// Loose comparison against a literal: numbers compare numerically, text compares exactly.
    pub fn loosely_equals(&self, literal: &str) -> bool {
        match self {
            Self::Number(value) => {
                let trimmed = literal.trim();
                let parsed = if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok()
                };
                parsed.is_some_and(|parsed| parsed == *value)
            }
            Self::Text(text) => text == literal,
        }
    }
}

impl fmt::Display for GlobalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for GlobalValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for GlobalValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

pub fn parse_leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let numeric_len = trimmed
        .char_indices()
        .take_while(|(_, ch)| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e' | 'E'))
        .map(|(index, ch)| index + ch.len_utf8())
        .last()
        .unwrap_or(0);
    (1..=numeric_len)
        .rev()
        .find_map(|len| trimmed[..len].parse::<f64>().ok())
}

pub fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let mut end = 0usize;
    for (index, ch) in trimmed.char_indices() {
        let sign_allowed = index == 0 && matches!(ch, '+' | '-');
        if !(ch.is_ascii_digit() || sign_allowed) {
            break;
        }
        end = index + ch.len_utf8();
    }
    trimmed[..end].parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_number_parse_ignores_trailing_text() {
        assert_eq!(parse_leading_number("12 coins"), Some(12.0));
        assert_eq!(parse_leading_number("  -2.5e1x"), Some(-25.0));
        assert_eq!(parse_leading_number("3e"), Some(3.0));
        assert_eq!(parse_leading_number("gold"), None);
        assert_eq!(parse_leading_number(""), None);
    }

    #[test]
    fn leading_integer_parse_stops_at_fraction() {
        assert_eq!(parse_leading_integer("4.9"), Some(4));
        assert_eq!(parse_leading_integer("-3"), Some(-3));
        assert_eq!(parse_leading_integer("x3"), None);
    }

    #[test]
    fn loose_equality_matches_numbers_against_text() {
        assert!(GlobalValue::Number(3.0).loosely_equals("3"));
        assert!(GlobalValue::Number(3.0).loosely_equals(" 3.0 "));
        assert!(GlobalValue::Number(0.0).loosely_equals(""));
        assert!(!GlobalValue::Number(3.0).loosely_equals("three"));
        assert!(GlobalValue::Text("open".into()).loosely_equals("open"));
        assert!(!GlobalValue::Text("1.0".into()).loosely_equals("1"));
    }

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(GlobalValue::Number(3.0).to_string(), "3");
        assert_eq!(GlobalValue::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn untagged_json_keeps_value_kind() {
        let globals: Globals =
            serde_json::from_str(r#"{"gold": 12, "door": "open"}"#).expect("globals json");
        assert_eq!(globals.get("gold"), Some(&GlobalValue::Number(12.0)));
        assert_eq!(globals.get("door"), Some(&GlobalValue::Text("open".into())));
    }
}
