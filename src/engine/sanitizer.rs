//! Narration clean-up and the bracket-hyphen word codec.
//!
//! Narration coming back from the model goes through [`sanitize_narration`],
//! which runs these stages in order, each over the full output of the previous one:
//!
//! 1. [`deobfuscate`]: `[x-y-z]` becomes `xyz`
//! 2. [`normalize_quotes`]: curly double quotes become `"`
//! 3. [`strip_tags_in_thought`]: inline markup removed inside `<thought>` spans
//! 4. [`strip_tags_in_quotes`]: all markup removed inside `"..."` spans
//! 5. [`normalize_line_breaks`]: `<br>` / `<br/>` become newlines

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Sensitive word -> encoded form. Both directions read this table.
pub const OBFUSCATION_MAP: &[(&str, &str)] = &[
    ("lồn", "[l-ồ-n]"),
    ("cặc", "[c-ặ-c]"),
    ("địt", "[đ-ị-t]"),
    ("buồi", "[b-u-ồ-i]"),
    ("dương vật", "[d-ươ-ng v-ậ-t]"),
    ("âm đạo", "[â-m đ-ạ-o]"),
    ("giao cấu", "[g-ia-o c-ấ-u]"),
    ("bú", "[b-ú]"),
    ("liếm", "[l-i-ế-m]"),
    ("mút", "[m-ú-t]"),
    ("âm vật", "[â-m v-ậ-t]"),
    ("tinh dịch", "[t-i-nh d-ị-ch]"),
    ("dâm thủy", "[d-â-m th-ủ-y]"),
];

/// Tags that may not appear inside `<thought>`.
const THOUGHT_STRIPPED_TAGS: &str = "entity|important|status|exp";

static OBFUSCATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\[\]\-\n]+(?:-[^\[\]\-\n]+)+)\]").expect("invalid obfuscation regex")
});
static CURLY_QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{201C}\u{201D}]").expect("invalid quote regex"));
static THOUGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<thought>(.*?)</thought>").expect("invalid thought regex"));
static THOUGHT_INNER_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"</?({THOUGHT_STRIPPED_TAGS})>")).expect("invalid thought tag regex")
});
static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"(.*?)""#).expect("invalid quoted span regex"));
static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("invalid line break regex"));

/// Longest key first so multi-word entries win over words they contain.
static OBFUSCATION_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    let mut entries: Vec<&(&str, &str)> = OBFUSCATION_MAP.iter().collect();
    entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    entries
        .into_iter()
        .map(|(word, encoded)| {
            let re = Regex::new(&format!("(?i){}", regex::escape(word)))
                .expect("invalid obfuscation rule");
            (re, *encoded)
        })
        .collect()
});

/// Full narration pipeline. Order matters.
pub fn sanitize_narration(text: &str) -> String {
    let text = deobfuscate(text);
    let text = normalize_quotes(&text);
    let text = strip_tags_in_thought(&text);
    let text = strip_tags_in_quotes(&text);
    normalize_line_breaks(&text)
}

/// Encodes sensitive words before player input is embedded in a prompt.
pub fn obfuscate(text: &str) -> String {
    let mut out = text.to_string();
    for (re, encoded) in OBFUSCATION_RULES.iter() {
        out = re.replace_all(&out, *encoded).into_owned();
    }
    out
}

/// Reverses the bracket-hyphen encoding: `[x-y-z]` -> `xyz`.
///
/// Runs to a fixpoint, so the result never contains another decodable token
/// and a second call changes nothing.
pub fn deobfuscate(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = OBFUSCATED_RE
            .replace_all(&current, |caps: &Captures| caps[1].replace('-', ""))
            .into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

pub fn normalize_quotes(text: &str) -> String {
    CURLY_QUOTE_RE.replace_all(text, "\"").into_owned()
}

/// Drops `entity`/`important`/`status`/`exp` markup inside `<thought>` spans,
/// keeping the wrapped text and the `<thought>` wrapper.
pub fn strip_tags_in_thought(text: &str) -> String {
    THOUGHT_RE
        .replace_all(text, |caps: &Captures| {
            let inner = THOUGHT_INNER_TAG_RE.replace_all(&caps[1], "");
            format!("<thought>{inner}</thought>")
        })
        .into_owned()
}

/// Dialogue renders as plain text: every tag inside `"..."` goes.
pub fn strip_tags_in_quotes(text: &str) -> String {
    QUOTED_RE
        .replace_all(text, |caps: &Captures| {
            let inner = ANY_TAG_RE.replace_all(&caps[1], "");
            format!("\"{inner}\"")
        })
        .into_owned()
}

pub fn normalize_line_breaks(text: &str) -> String {
    LINE_BREAK_RE.replace_all(text, "\n").into_owned()
}

/// Removes every markup tag. Used for text that is stored rather than rendered.
pub fn strip_all_tags(text: &str) -> String {
    ANY_TAG_RE.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deobfuscate_joins_hyphenated_tokens() {
        assert_eq!(deobfuscate("một [â-m đ-ạ-o] và [b-ú]"), "một âm đạo và bú");
    }

    #[test]
    fn deobfuscate_is_idempotent() {
        let samples = [
            "[[a-b]]",
            "[[a-b]-c]",
            "x [g-ia-o c-ấ-u] y",
            "[plain] [no hyphen here]",
            "[-]",
            "[a-b] [[c-d]-[e-f]]",
        ];
        for s in samples {
            let once = deobfuscate(s);
            assert_eq!(deobfuscate(&once), once, "input: {s}");
        }
    }

    #[test]
    fn deobfuscate_leaves_plain_brackets_alone() {
        assert_eq!(deobfuscate("[NARRATION_END] [ghi chú]"), "[NARRATION_END] [ghi chú]");
    }

    #[test]
    fn obfuscate_then_deobfuscate_restores_every_word() {
        for (word, encoded) in OBFUSCATION_MAP {
            assert_eq!(obfuscate(word), *encoded);
            assert_eq!(deobfuscate(&obfuscate(word)), *word);
        }
    }

    #[test]
    fn obfuscate_prefers_longer_entries() {
        assert_eq!(obfuscate("Âm vật"), "[â-m v-ậ-t]");
        assert_eq!(obfuscate("không có gì"), "không có gì");
    }

    #[test]
    fn curly_quotes_become_straight() {
        assert_eq!(normalize_quotes("\u{201C}Chào\u{201D}"), "\"Chào\"");
    }

    #[test]
    fn thought_keeps_wrapper_but_loses_inline_tags() {
        let input = "<thought>Hắn là <entity>Lão Ăn Mày</entity>, <b>cẩn thận</b></thought>";
        assert_eq!(
            strip_tags_in_thought(input),
            "<thought>Hắn là Lão Ăn Mày, <b>cẩn thận</b></thought>"
        );
    }

    #[test]
    fn quotes_lose_all_tags() {
        let input = "Hắn nói: \"Ta là <entity>Kiếm Thánh</entity><br/>\" rồi đi.";
        assert_eq!(strip_tags_in_quotes(input), "Hắn nói: \"Ta là Kiếm Thánh\" rồi đi.");
    }

    #[test]
    fn line_breaks_become_newlines() {
        assert_eq!(normalize_line_breaks("a<br>b<BR />c<br/>d"), "a\nb\nc\nd");
    }

    #[test]
    fn pipeline_normalizes_quotes_before_stripping() {
        let input = "\u{201C}Ngươi là <entity>ai</entity>?\u{201D}<br>[l-i-ế-m]";
        assert_eq!(sanitize_narration(input), "\"Ngươi là ai?\"\nliếm");
    }

    #[test]
    fn quoted_spans_may_cross_lines() {
        let input = "\"dòng một\n<important>dòng hai</important>\"";
        assert_eq!(strip_tags_in_quotes(input), "\"dòng một\ndòng hai\"");
    }
}
