//! Tolerant `key=value` scanner for directive bodies.
//!
//! The model is not grammar-exact, so there is no strict grammar here: the
//! scanner repeatedly looks for `identifier = value` and simply resumes after
//! whatever it matched. Trailing commas, missing commas and mixed quote
//! styles are all skipped over.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::value::{FieldMap, Value};

/// `key = "double" | 'single' | bare-token-up-to-comma-bracket-or-newline`
static PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^,\]\n]+))"#)
        .expect("invalid key-value regex")
});

/// Decodes one directive body into a field map. Never fails; unmatched text is ignored.
/// A key given twice keeps its last value.
pub fn decode(body: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    for caps in PAIR_RE.captures_iter(body) {
        let key = caps[1].to_string();
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");
        fields.insert(key, Value::coerce(raw));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn decodes_mixed_value_kinds() {
        let fields = decode(r#"name="Kiếm Sắt", quantity=1, rare=true, weight=2.5"#);
        assert_eq!(fields["name"], text("Kiếm Sắt"));
        assert_eq!(fields["quantity"], Value::Number(1.0));
        assert_eq!(fields["rare"], Value::Bool(true));
        assert_eq!(fields["weight"], Value::Number(2.5));
    }

    #[test]
    fn trailing_comma_does_not_break_the_scan() {
        let fields = decode(r#"name="Kiếm", quantity=1,"#);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["name"], text("Kiếm"));
        assert_eq!(fields["quantity"], Value::Number(1.0));
    }

    #[test]
    fn single_quotes_and_bare_words_are_accepted() {
        let fields = decode("name='Sói Con', description=Một con sói nhỏ , type = buff");
        assert_eq!(fields["name"], text("Sói Con"));
        assert_eq!(fields["description"], text("Một con sói nhỏ"));
        assert_eq!(fields["type"], text("buff"));
    }

    #[test]
    fn quoted_values_keep_commas_and_newlines() {
        let fields = decode("tiers=\"Ma Đầu,Vô Danh,Anh Hùng\", note=\"dòng 1\ndòng 2\"");
        assert_eq!(fields["tiers"], text("Ma Đầu,Vô Danh,Anh Hùng"));
        assert_eq!(fields["note"], text("dòng 1\ndòng 2"));
    }

    #[test]
    fn quoted_numbers_still_become_numbers() {
        let fields = decode(r#"quantity="3", flag='FALSE'"#);
        assert_eq!(fields["quantity"], Value::Number(3.0));
        assert_eq!(fields["flag"], Value::Bool(false));
    }

    #[test]
    fn missing_commas_between_quoted_values_are_tolerated() {
        let fields = decode(r#"name="Lão Ăn Mày" thoughtsOnPlayer="Tò mò""#);
        assert_eq!(fields["name"], text("Lão Ăn Mày"));
        assert_eq!(fields["thoughtsOnPlayer"], text("Tò mò"));
    }

    #[test]
    fn garbage_yields_an_empty_map() {
        assert!(decode("just some words, no pairs").is_empty());
        assert!(decode("").is_empty());
    }

    #[test]
    fn later_duplicate_key_wins() {
        let fields = decode("hours=1, hours=2");
        assert_eq!(fields["hours"], Value::Number(2.0));
    }
}
