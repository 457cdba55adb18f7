//! Multiline-label mode (spec §4.2): the free-text bulletins (SIGMET,
//! AIRMET, TAF) mix single-word tokens with multi-word literals such as
//! `"AVIATION COLOUR CODE:"`. `grammar.multiword_literals` is pre-sorted
//! longest-first ([`crate::grammar::Grammar::multiword_literals`]) so a
//! longer literal is always preferred over a shorter one that happens to be
//! its prefix. Matching is done against an uppercased copy so the grammar
//! author can write patterns in one case, but the *emitted* token always
//! slices from the original-case source text, never the uppercased copy —
//! on a hit, the input's original casing is preserved.

use crate::grammar::Grammar;

use super::{classify_span, RawToken};

pub fn tokenize(text: &str, grammar: &Grammar) -> Vec<RawToken> {
    let upper = text.to_uppercase();
    let mut idx = 0;
    let mut out = Vec::new();

    while idx < upper.len() {
        let rest_upper = &upper[idx..];
        let leading_ws = rest_upper.len() - rest_upper.trim_start().len();
        if leading_ws > 0 {
            let start = idx;
            let end = idx + leading_ws;
            out.push(RawToken::whitespace(&text[start..end], start, end));
            idx = end;
            continue;
        }

        if let Some((literal, token_id)) = grammar
            .multiword_literals
            .iter()
            .find(|(literal, _)| rest_upper.starts_with(literal.as_str()))
        {
            let start = idx;
            let end = idx + literal.len();
            let def = grammar.token(token_id);
            out.push(RawToken {
                text: text[start..end].to_string(),
                kind: token_id.clone(),
                style: def.and_then(|d| d.style.clone()),
                description: def.map(|d| d.description.clone()),
                start,
                end,
                error: None,
            });
            idx = end;
            continue;
        }

        let word_len = rest_upper.find(char::is_whitespace).unwrap_or(rest_upper.len());
        let start = idx;
        let end = idx + word_len;
        out.push(classify_span(&text[start..end], start, end, grammar));
        idx = end;
    }
    out
}
