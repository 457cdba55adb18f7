//! spec §4.2 Tokenizer: splits raw advisory text into the token stream the
//! [`crate::token_matcher`] and [`crate::tracker`] consume.
//!
//! Three modes, selected by the grammar (spec §3 `multiline`/`templateMode`):
//! line mode for single-line reports (METAR/SPECI), multiline-label mode for
//! free-text bulletins that contain multi-word literals (SIGMET/AIRMET/TAF),
//! and template mode for the label-column record formats (VAA/TCA).
//!
//! spec §3 "Tokenized Token": every span of the source text is accounted
//! for, including whitespace (kind `"whitespace"`), so `tokenize(text)`
//! re-concatenates to `text` byte-for-byte (invariant 1) and every token
//! carries a non-empty `kind` (invariant 2). Non-whitespace spans are run
//! through [`crate::token_matcher::match_token`] here (the plain, non
//! structure-aware variant — classification that accounts for the tracker's
//! current expected kinds happens downstream in [`crate::validator`] and
//! [`crate::Engine`], which re-classify `token.text` with
//! `match_token_expecting`).

pub mod line;
pub mod multiline;
pub mod template;

use crate::grammar::Grammar;
use crate::token_matcher::match_token;

/// One token as split from the source text, in stream order.
///
/// `kind` is never empty except that it is always exactly `"whitespace"` for
/// a pure-whitespace span; an unrecognized non-whitespace span gets kind
/// `"error"` and carries its diagnostic message in `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    pub kind: String,
    pub style: Option<String>,
    pub description: Option<String>,
    pub start: usize,
    pub end: usize,
    pub error: Option<String>,
}

impl RawToken {
    fn whitespace(text: &str, start: usize, end: usize) -> Self {
        RawToken {
            text: text.to_string(),
            kind: "whitespace".to_string(),
            style: None,
            description: None,
            start,
            end,
            error: None,
        }
    }
}

/// Classifies a single non-whitespace span against `grammar`'s full token
/// table, folding a miss into an `"error"`-kind token rather than returning
/// `Result` (spec §3: `tokenize` never fails — unknown spans are folded into
/// the stream as an errored token).
pub(crate) fn classify_span(text: &str, start: usize, end: usize, grammar: &Grammar) -> RawToken {
    match match_token(text, grammar) {
        Ok(classification) => RawToken {
            text: text.to_string(),
            kind: classification.kind,
            style: classification.style,
            description: Some(classification.description),
            start,
            end,
            error: None,
        },
        Err(diagnostic) => RawToken {
            text: text.to_string(),
            kind: "error".to_string(),
            style: None,
            description: None,
            start,
            end,
            error: Some(diagnostic.message().to_string()),
        },
    }
}

/// Splits `text` into contiguous whitespace/non-whitespace byte spans
/// covering every byte exactly once, in order.
pub(crate) fn split_preserving_whitespace(text: &str) -> Vec<(bool, usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let is_ws = c.is_whitespace();
        match current {
            None => {
                start = i;
                current = Some(is_ws);
            }
            Some(prev) if prev != is_ws => {
                spans.push((prev, start, i));
                start = i;
                current = Some(is_ws);
            }
            _ => {}
        }
    }
    if let Some(prev) = current {
        spans.push((prev, start, text.len()));
    }
    spans
}

pub fn tokenize(text: &str, grammar: &Grammar) -> Vec<RawToken> {
    if grammar.template_mode {
        template::tokenize(text, grammar)
    } else if grammar.multiline {
        multiline::tokenize(text, grammar)
    } else {
        line::tokenize(text, grammar)
    }
}
