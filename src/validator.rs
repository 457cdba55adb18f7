//! spec §6 Validator: runs a full text through tokenizer, matcher and
//! tracker, collecting every diagnostic instead of stopping at the first.

use crate::error::Diagnostic;
use crate::grammar::Grammar;
use crate::token_matcher::match_token_expecting;
use crate::tokenizer::{self, RawToken};
use crate::tracker::StructureTracker;

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Tokenizes `text` under `grammar`, classifies and tracks every token, and
/// reports both unknown tokens (inline, non-fatal) and unsatisfied required
/// structure left over at the end (spec §7).
pub fn validate(text: &str, grammar: &Grammar) -> ValidationReport {
    let mut tracker = StructureTracker::new();
    tracker.set_grammar(grammar.clone());

    let tokens: Vec<RawToken> = tokenizer::tokenize(text, grammar);
    let mut diagnostics = Vec::new();

    for raw in &tokens {
        let expected = tracker.get_expected_token_ids();
        match match_token_expecting(&raw.text, expected.iter().map(String::as_str), grammar) {
            Ok(classification) => {
                if !tracker.try_match(&classification.kind) {
                    diagnostics.push(Diagnostic::unknown_token(&raw.text, raw.index));
                }
            }
            Err(_) => diagnostics.push(Diagnostic::unknown_token(&raw.text, raw.index)),
        }
    }

    let end = tokens.len();
    for description in tracker.missing_required() {
        diagnostics.push(Diagnostic::missing_field(&description, end));
    }

    ValidationReport { diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::document::{Cardinality, GrammarDocument, StructureNode, TokenDef};
    use indexmap::IndexMap;

    fn token_def(pattern: &str) -> TokenDef {
        TokenDef {
            pattern: Some(pattern.to_string()),
            values: None,
            style: None,
            description: String::new(),
        }
    }

    fn metar_like_grammar() -> Grammar {
        let mut tokens = IndexMap::new();
        tokens.insert("icao".to_string(), token_def("[A-Z]{4}"));
        tokens.insert("time".to_string(), token_def(r"\d{6}Z"));
        tokens.insert("pressure".to_string(), token_def(r"Q\d{4}"));

        Grammar::from_document(GrammarDocument {
            name: "metar".into(),
            version: None,
            description: None,
            identifier: Some(vec!["METAR".into()]),
            extends: None,
            category: None,
            multiline: None,
            template_mode: None,
            tokens,
            structure: Some(vec![
                StructureNode::Token {
                    id: "icao".into(),
                    cardinality: Cardinality::new(1, Some(1)),
                },
                StructureNode::Token {
                    id: "time".into(),
                    cardinality: Cardinality::new(1, Some(1)),
                },
                StructureNode::Token {
                    id: "pressure".into(),
                    cardinality: Cardinality::new(1, Some(1)),
                },
            ]),
            template: None,
            suggestions: Default::default(),
        })
        .unwrap()
    }

    #[test]
    fn complete_report_has_no_diagnostics() {
        let grammar = metar_like_grammar();
        let report = validate("LFPG 261430Z Q1013", &grammar);
        assert!(report.is_valid());
    }

    #[test]
    fn missing_pressure_is_reported() {
        let grammar = metar_like_grammar();
        let report = validate("LFPG 261430Z", &grammar);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message().contains("pressure"));
    }

    #[test]
    fn unknown_token_is_reported_inline_and_parsing_continues() {
        let grammar = metar_like_grammar();
        let report = validate("LFPG ???? Q1013", &grammar);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.message().contains("Unknown token")));
    }
}
