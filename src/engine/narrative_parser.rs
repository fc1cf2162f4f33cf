use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::lexer;
use crate::engine::router::{self, DecodeError};
use crate::engine::sanitizer::sanitize_narration;
use crate::model::directive::{Directive, RawDirective};

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[NARRATION_END\]|NARRATION_END").expect("invalid separator regex")
});

/// Fallback when the separator is missing: a line that starts like `[TAG:` or `TAG:`.
/// Prose lines such as `Lão Ăn Mày: ...` also match this; that misfire is accepted.
static FIRST_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\[?\w+:").expect("invalid first-tag regex"));

/// `[NAME: body]`, body running lazily up to the next `]`.
static TAG_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[(\w+):\s*(.*?)\]").expect("invalid tag block regex"));

/// Output of [`parse_response`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Sanitised prose. May still carry semantic markup for the renderer.
    pub narration: String,
    /// Valid directives, in the order they appear in the text.
    pub directives: Vec<Directive>,
}

/// Splits a raw model response into narration and typed directives.
///
/// Never fails: a missing separator falls back to a heuristic split, a response
/// with no directive-looking lines is all narration, and a block that does not
/// decode is logged and skipped without affecting its neighbours.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let (raw_narration, tags_part) = split_narration(raw);

    let narration = sanitize_narration(raw_narration);

    let mut directives = Vec::new();
    for block in scan_blocks(tags_part) {
        match router::decode(&block) {
            Ok(directive) => directives.push(directive),
            Err(DecodeError::UnknownDirective(name)) => {
                debug!("Ignoring unknown directive [{name}]");
            }
            Err(err) => {
                warn!("Dropping directive [{}]: {err}", block.name);
            }
        }
    }

    ParsedResponse {
        narration,
        directives,
    }
}

/// Returns `(narration, directive_block)` slices of `raw`.
pub fn split_narration(raw: &str) -> (&str, &str) {
    if let Some(sep) = SEPARATOR_RE.find(raw) {
        return (raw[..sep.start()].trim(), raw[sep.end()..].trim());
    }

    if let Some(first_tag) = FIRST_TAG_RE.find(raw) {
        warn!("NARRATION_END separator not found; splitting at the first detected tag");
        return (
            raw[..first_tag.start()].trim(),
            raw[first_tag.start()..].trim(),
        );
    }

    warn!("No NARRATION_END separator and no tags found; treating the whole response as narration");
    (raw, "")
}

/// Lexes every `[NAME: body]` block in the directive part. Names are uppercased.
pub fn scan_blocks(tags_part: &str) -> Vec<RawDirective> {
    TAG_BLOCK_RE
        .captures_iter(tags_part)
        .map(|caps| RawDirective {
            name: caps[1].to_uppercase(),
            fields: lexer::decode(caps[2].trim()),
        })
        .collect()
}
