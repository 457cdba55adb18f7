//! spec §4.4 Grammar Registry.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::document::{self, GrammarDocument};
use super::Grammar;

/// Stores raw grammar documents, resolves `extends` inheritance by deep
/// merge, and holds the resulting set of resolved grammars plus whichever
/// one is currently selected.
#[derive(Debug, Default)]
pub struct GrammarRegistry {
    raw: IndexMap<String, GrammarDocument>,
    resolved: IndexMap<String, Grammar>,
    current: Option<String>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two registrations of the same name replace each other (spec §8,
    /// invariant 6).
    pub fn register(&mut self, doc: GrammarDocument) {
        self.raw.insert(doc.name.clone(), doc);
    }

    /// Resolves every registered grammar's `extends` chain by deep merge
    /// (spec §4.4). Idempotent: re-running recomputes the same result from
    /// the current raw set.
    pub fn resolve_inheritance(&mut self) {
        let mut merged_docs = IndexMap::new();
        for name in self.raw.keys() {
            let mut visited = HashSet::new();
            if let Some(doc) = self.resolve_one(name, &mut visited) {
                merged_docs.insert(name.clone(), doc);
            }
        }

        self.resolved.clear();
        for (name, doc) in merged_docs {
            match Grammar::from_document(doc) {
                Ok(grammar) => {
                    self.resolved.insert(name, grammar);
                }
                Err(err) => {
                    log::warn!("grammar `{name}` failed to resolve: {err}");
                }
            }
        }
    }

    fn resolve_one(&self, name: &str, visited: &mut HashSet<String>) -> Option<GrammarDocument> {
        if !visited.insert(name.to_string()) {
            log::warn!("`extends` cycle detected starting at `{name}`");
            return None;
        }

        let doc = self.raw.get(name)?.clone();
        let Some(parent_name) = doc.extends.clone() else {
            return Some(doc);
        };

        if !self.raw.contains_key(&parent_name) {
            log::warn!("grammar `{name}` extends unknown grammar `{parent_name}`");
            return Some(doc);
        }

        let parent_merged = self.resolve_one(&parent_name, visited)?;
        Some(document::merge(&parent_merged, &doc))
    }

    /// Selects the current grammar by name. Unknown names are a no-op,
    /// logged as a warning (spec §7 "Grammar engine misuse").
    pub fn set_current(&mut self, name: &str) {
        if self.resolved.contains_key(name) {
            self.current = Some(name.to_string());
        } else {
            log::warn!("unknown grammar `{name}`");
        }
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Grammar> {
        self.current.as_ref().and_then(|name| self.resolved.get(name))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Grammar> {
        self.resolved.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.resolved.keys().cloned().collect()
    }

    pub fn grammars(&self) -> impl Iterator<Item = &Grammar> {
        self.resolved.values()
    }

    /// spec §4.4 `detect`: uppercase-normalizes `text` and matches it
    /// against every resolved grammar's identifier(s), applying the
    /// SIGMET/AIRMET FIR-prefix special rule.
    pub fn detect(&self, text: &str) -> Option<String> {
        let upper = text.to_uppercase();
        let words: Vec<&str> = upper.split_whitespace().collect();
        let first = *words.first()?;

        for (name, grammar) in &self.resolved {
            for identifier in &grammar.identifier {
                let ident_upper = identifier.to_uppercase();
                if ident_upper.split_whitespace().count() > 1 {
                    if upper.starts_with(&ident_upper) {
                        return Some(name.clone());
                    }
                    continue;
                }

                if first == ident_upper {
                    return Some(name.clone());
                }

                if is_fir_prefixed_identifier(&ident_upper) && is_fir_code(first) {
                    if let Some(second) = words.get(1) {
                        if *second == ident_upper {
                            return Some(name.clone());
                        }
                    }
                }
            }
        }
        None
    }
}

fn is_fir_prefixed_identifier(identifier: &str) -> bool {
    matches!(identifier, "SIGMET" | "AIRMET")
}

fn is_fir_code(word: &str) -> bool {
    word.len() == 4 && word.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::document::{Cardinality, StructureNode, TokenDef};

    fn doc(name: &str, extends: Option<&str>) -> GrammarDocument {
        GrammarDocument {
            name: name.to_string(),
            version: None,
            description: None,
            identifier: Some(vec![name.to_string()]),
            extends: extends.map(str::to_string),
            category: None,
            multiline: None,
            template_mode: None,
            tokens: IndexMap::new(),
            structure: None,
            template: None,
            suggestions: Default::default(),
        }
    }

    #[test]
    fn inheritance_merges_tokens_and_falls_back_structure() {
        let mut parent = doc("parent", None);
        parent.tokens.insert(
            "a".to_string(),
            TokenDef {
                pattern: Some("A".to_string()),
                values: None,
                style: None,
                description: String::new(),
            },
        );
        parent.structure = Some(vec![StructureNode::Token {
            id: "a".to_string(),
            cardinality: Cardinality::new(1, Some(1)),
        }]);

        let mut child = doc("child", Some("parent"));
        child.tokens.insert(
            "b".to_string(),
            TokenDef {
                pattern: Some("B".to_string()),
                values: None,
                style: None,
                description: String::new(),
            },
        );

        let mut registry = GrammarRegistry::new();
        registry.register(parent);
        registry.register(child);
        registry.resolve_inheritance();

        let resolved = registry.get("child").unwrap();
        assert!(resolved.tokens.contains_key("a"));
        assert!(resolved.tokens.contains_key("b"));
        assert_eq!(resolved.structure.len(), 1);
    }

    #[test]
    fn cycle_is_logged_and_child_left_unresolved() {
        let mut a = doc("a", Some("b"));
        a.name = "a".to_string();
        let b = doc("b", Some("a"));

        let mut registry = GrammarRegistry::new();
        registry.register(a);
        registry.register(b);
        registry.resolve_inheritance();

        assert!(registry.get("a").is_none());
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn set_current_on_unknown_name_is_noop() {
        let mut registry = GrammarRegistry::new();
        registry.register(doc("known", None));
        registry.resolve_inheritance();
        registry.set_current("known");
        registry.set_current("nope");
        assert_eq!(registry.current_name(), Some("known"));
    }

    #[test]
    fn detect_applies_fir_prefix_rule_for_sigmet() {
        let mut registry = GrammarRegistry::new();
        registry.register(doc("sigmet-ws", None));
        registry
            .raw
            .get_mut("sigmet-ws")
            .unwrap()
            .identifier = Some(vec!["SIGMET".to_string()]);
        registry.resolve_inheritance();

        assert_eq!(
            registry.detect("LFFF SIGMET 1 VALID 010000/010400 LFFF-"),
            Some("sigmet-ws".to_string())
        );
    }
}
