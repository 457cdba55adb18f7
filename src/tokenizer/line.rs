//! Line mode (spec §4.2): plain whitespace splitting, used by single-line
//! reports such as METAR and SPECI. Whitespace spans are preserved as
//! `"whitespace"`-kind tokens and every non-whitespace span is classified
//! against `grammar`'s token table.

use crate::grammar::Grammar;

use super::{classify_span, split_preserving_whitespace, RawToken};

pub fn tokenize(text: &str, grammar: &Grammar) -> Vec<RawToken> {
    split_preserving_whitespace(text)
        .into_iter()
        .map(|(is_whitespace, start, end)| {
            let span = &text[start..end];
            if is_whitespace {
                RawToken::whitespace(span, start, end)
            } else {
                classify_span(span, start, end, grammar)
            }
        })
        .collect()
}
