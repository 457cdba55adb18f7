//! spec §4.1 Token Matcher.

use crate::error::Diagnostic;
use crate::grammar::Grammar;

/// Result of classifying one text span against a grammar's token table.
#[derive(Debug, Clone)]
pub struct Classification {
    pub kind: String,
    pub style: Option<String>,
    pub description: String,
}

/// Iterates `grammar`'s token table in definition order; first regex match
/// wins, otherwise first literal-value match wins; otherwise an "Unknown
/// token" diagnostic.
pub fn match_token(text: &str, grammar: &Grammar) -> Result<Classification, Diagnostic> {
    match_in_order(text, grammar.tokens.keys().map(String::as_str), grammar)
}

/// The structure-aware variant (spec §4.1): tries the next up-to-five
/// expected kinds first, to disambiguate short/overloaded patterns, before
/// falling back to a full-table search.
pub fn match_token_expecting<'a>(
    text: &str,
    expected: impl Iterator<Item = &'a str>,
    grammar: &Grammar,
) -> Result<Classification, Diagnostic> {
    let expected_ids: Vec<&str> = expected.take(5).collect();
    if let Ok(found) = match_in_order(text, expected_ids.into_iter(), grammar) {
        return Ok(found);
    }
    match_token(text, grammar)
}

fn match_in_order<'a>(
    text: &str,
    ids: impl Iterator<Item = &'a str>,
    grammar: &Grammar,
) -> Result<Classification, Diagnostic> {
    let ids: Vec<&str> = ids.collect();

    // First pass: regex-pattern definitions, in the given order.
    for id in &ids {
        if let Some(def) = grammar.token(id) {
            if def.pattern.is_some() && def.matches(text) {
                return Ok(Classification {
                    kind: def.id.clone(),
                    style: def.style.clone(),
                    description: def.description.clone(),
                });
            }
        }
    }
    // Second pass: literal-value definitions.
    for id in &ids {
        if let Some(def) = grammar.token(id) {
            if def.pattern.is_none() && def.matches(text) {
                return Ok(Classification {
                    kind: def.id.clone(),
                    style: def.style.clone(),
                    description: def.description.clone(),
                });
            }
        }
    }

    Err(Diagnostic::unknown_token(text, 0))
}
