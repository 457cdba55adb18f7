//! Grammar-driven parsing, validation and autocompletion for aviation
//! Traffic Advisory Codes: METAR, SPECI, TAF, SIGMET, AIRMET, VAA and TCA.
//!
//! A [`Grammar`] is loaded from a [`grammar::document::GrammarDocument`]
//! (JSON), resolved through its `extends` chain by
//! [`GrammarRegistry::resolve_inheritance`], then driven through
//! [`tokenizer::tokenize`], [`token_matcher::match_token_expecting`] and a
//! per-session [`StructureTracker`]. [`Engine`] wires those pieces together
//! for a caller that just wants to feed in text and get suggestions back.

mod clock;
mod error;
pub mod grammar;
mod limit;
mod suggestion;
mod template;
mod token_matcher;
mod tokenizer;
mod tracker;
mod validator;

pub use crate::clock::{Clock, SystemClock};
pub use crate::error::{Diagnostic, Error};
pub use crate::grammar::document::GrammarDocument;
pub use crate::grammar::{Grammar, GrammarRegistry};
pub use crate::limit::LimitTracker;
pub use crate::suggestion::{Suggestion, SuggestionBuilder};
pub use crate::template::TemplateState;
pub use crate::token_matcher::Classification;
pub use crate::tokenizer::RawToken;
pub use crate::tracker::StructureTracker;
pub use crate::validator::{validate, ValidationReport};

use indexmap::IndexSet;

/// The engine facade: a grammar registry, the active grammar's structure
/// tracker, and the clock used to render datetime suggestions.
pub struct Engine {
    registry: GrammarRegistry,
    tracker: StructureTracker,
    clock: Box<dyn Clock>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            registry: GrammarRegistry::new(),
            tracker: StructureTracker::new(),
            clock: Box::new(SystemClock),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Engine {
            clock: Box::new(clock),
            ..Self::default()
        }
    }

    /// Registers a grammar document. Call [`Engine::resolve_grammars`] after
    /// registering every document in a batch to fold `extends` chains.
    pub fn register_grammar(&mut self, document: GrammarDocument) {
        self.registry.register(document);
    }

    pub fn resolve_grammars(&mut self) {
        self.registry.resolve_inheritance();
    }

    /// spec §4.4 `detect`: guesses which registered grammar `text` belongs
    /// to from its leading identifier.
    pub fn detect(&self, text: &str) -> Option<String> {
        self.registry.detect(text)
    }

    /// Selects `name` as the active grammar and resets the structure
    /// tracker. A name that doesn't resolve is a no-op (spec §7).
    pub fn select_grammar(&mut self, name: &str) {
        self.registry.set_current(name);
        match self.registry.current() {
            Some(grammar) => self.tracker.set_grammar(grammar.clone()),
            None => self.tracker.reset(),
        }
    }

    pub fn current_grammar(&self) -> Option<&Grammar> {
        self.registry.current()
    }

    pub fn current_grammar_name(&self) -> Option<&str> {
        self.registry.current_name()
    }

    /// Restarts the structure tracker for the active grammar without
    /// changing which grammar is selected.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    pub fn tokenize(&self, text: &str) -> Vec<RawToken> {
        match self.current_grammar() {
            Some(grammar) => tokenizer::tokenize(text, grammar),
            None => Vec::new(),
        }
    }

    pub fn expected_token_ids(&self) -> IndexSet<String> {
        self.tracker.get_expected_token_ids()
    }

    /// Classifies `text` against the active grammar, preferring whichever
    /// kinds the tracker currently expects (spec §4.1).
    pub fn classify(&self, text: &str) -> Result<Classification, Diagnostic> {
        let grammar = self
            .current_grammar()
            .ok_or_else(|| Diagnostic::unknown_token(text, 0))?;
        let expected = self.tracker.get_expected_token_ids();
        token_matcher::match_token_expecting(text, expected.iter().map(String::as_str), grammar)
    }

    /// Advances the tracker with an already-classified token kind.
    pub fn try_match(&mut self, kind_id: &str) -> bool {
        self.tracker.try_match(kind_id)
    }

    pub fn get_grammar_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// spec §6 `getSuggestionsForTokenType`: `kind = None` means no token has
    /// been matched yet, so the initial per-grammar menu is returned instead.
    pub fn get_suggestions_for_token_type(
        &self,
        kind: Option<&str>,
        prev_token_text: Option<&str>,
        supported_types: Option<&[String]>,
    ) -> Vec<Suggestion> {
        let builder = SuggestionBuilder::new(&self.registry);
        match kind {
            Some(kind) => builder.suggestions_after(kind, prev_token_text, self.clock.as_ref()),
            None => builder.initial_suggestions(supported_types),
        }
    }

    /// spec §6 `getSuggestions`: tokenizes and replays `text` up to `cursor`
    /// against a scratch tracker (the engine's own tracker is left
    /// untouched), then returns the suggestions that follow the last token
    /// matched, or the initial menu if nothing matched yet.
    pub fn get_suggestions(
        &self,
        text: &str,
        cursor: usize,
        supported_types: Option<&[String]>,
    ) -> Vec<Suggestion> {
        let Some(grammar) = self.current_grammar() else {
            return SuggestionBuilder::new(&self.registry).initial_suggestions(supported_types);
        };

        let prefix = &text[..cursor.min(text.len())];
        let mut tracker = StructureTracker::new();
        tracker.set_grammar(grammar.clone());

        let mut last: Option<(String, String)> = None;
        for token in tokenizer::tokenize(prefix, grammar) {
            if token.text.trim().is_empty() {
                continue;
            }
            let expected = tracker.get_expected_token_ids();
            let Ok(classification) =
                token_matcher::match_token_expecting(&token.text, expected.iter().map(String::as_str), grammar)
            else {
                continue;
            };
            if tracker.try_match(&classification.kind) {
                last = Some((classification.kind, token.text));
            }
        }

        match last {
            Some((kind, text)) => {
                self.get_suggestions_for_token_type(Some(kind.as_str()), Some(text.as_str()), supported_types)
            }
            None => self.get_suggestions_for_token_type(None, None, supported_types),
        }
    }

    /// spec §6 `getTemplateSuggestions`.
    pub fn get_template_suggestions(&self, label_kind: &str) -> Vec<Suggestion> {
        SuggestionBuilder::new(&self.registry).template_suggestions(label_kind, self.clock.as_ref())
    }

    /// Runs the full tokenize/classify/track pipeline over `text` and
    /// collects every diagnostic, under whichever grammar is active.
    pub fn validate(&self, text: &str) -> Option<ValidationReport> {
        self.current_grammar().map(|grammar| validate(text, grammar))
    }

    pub fn template_state(&self) -> Option<TemplateState> {
        self.current_grammar().and_then(TemplateState::initialize)
    }
}
