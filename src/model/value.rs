use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("invalid number regex"));

/// A scalar lifted out of a directive body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Field name -> value, as decoded from one `[TAG: ...]` body.
pub type FieldMap = BTreeMap<String, Value>;

impl Value {
    /// Turns a raw (already unquoted) value string into a typed scalar.
    ///
    /// Plain integers and decimals become numbers, `true`/`false` in any case
    /// become booleans, everything else stays text (trimmed).
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();

        if NUMBER_RE.is_match(trimmed) {
            if let Ok(number) = trimmed.parse::<f64>() {
                return Value::Number(number);
            }
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }

        Value::Text(trimmed.to_string())
    }

    /// Text view of any scalar. Numbers keep their integer form when they have one.
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Numeric view. Text that looks like a number is accepted too.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) => None,
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Bool(_) => None,
        }
    }

    /// Integer view, truncated toward zero.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().map(|n| n.trunc() as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::Text(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_picks_numbers_booleans_and_text() {
        assert_eq!(Value::coerce("12"), Value::Number(12.0));
        assert_eq!(Value::coerce(" -3.5 "), Value::Number(-3.5));
        assert_eq!(Value::coerce("TRUE"), Value::Bool(true));
        assert_eq!(Value::coerce("False"), Value::Bool(false));
        assert_eq!(Value::coerce("  Kiếm Sắt "), Value::Text("Kiếm Sắt".into()));
        assert_eq!(Value::coerce("1e5"), Value::Text("1e5".into()));
        assert_eq!(Value::coerce("80%"), Value::Text("80%".into()));
    }

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(Value::Number(1984.0).as_text(), "1984");
        assert_eq!(Value::Number(2.5).as_text(), "2.5");
    }

    #[test]
    fn numeric_text_is_accepted_as_number() {
        assert_eq!(Value::Text("7".into()).as_integer(), Some(7));
        assert_eq!(Value::Number(2.9).as_integer(), Some(2));
        assert_eq!(Value::Text("many".into()).as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
    }
}
