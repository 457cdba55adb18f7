//! spec §4.5 Suggestion Builder.

use indexmap::IndexMap;

use crate::clock::{datetime_suggestion, Clock};
use crate::grammar::{AfterEntry, Grammar, GrammarRegistry, SuggestionDeclaration};

/// A resolved, ready-to-render suggestion. `children` is non-empty only for
/// a synthesized category submenu (spec §4.5 SIGMET/AIRMET grouping).
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub text: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub editable: bool,
    pub category: Option<String>,
    pub append_to_previous: bool,
    pub skip_to_next: bool,
    pub new_line_before: bool,
    pub switch_grammar: Option<String>,
    pub children: Vec<Suggestion>,
}

/// Text values that conventionally glue onto the group they qualify rather
/// than starting a new space-separated token (cumulonimbus/towering
/// cumulus cloud-type suffixes, e.g. `FEW030CB`).
fn is_glued_suffix(text: &str) -> bool {
    matches!(text, "CB" | "TCU")
}

fn already_has_glued_suffix(prev_token_text: Option<&str>) -> bool {
    let Some(prev) = prev_token_text else { return false };
    let upper = prev.to_uppercase();
    upper.ends_with("CB") || upper.ends_with("TCU")
}

/// Identifiers whose grammars are keyed off a second word rather than the
/// first (spec §4.4 FIR-prefix detection rule; spec §4.5 nested-submenu
/// rule for the same identifiers).
const SECOND_WORD_IDENTIFIERS: [&str; 2] = ["SIGMET", "AIRMET"];

/// Common FIR codes offered as a fixed fallback list under each SIGMET/AIRMET
/// category submenu, each with an editable 4-letter FIR span.
const COMMON_FIR_CODES: [&str; 6] = ["EGTT", "LFFF", "EDGG", "KZNY", "RJTG", "YMMM"];

pub struct SuggestionBuilder<'a> {
    registry: &'a GrammarRegistry,
}

impl<'a> SuggestionBuilder<'a> {
    pub fn new(registry: &'a GrammarRegistry) -> Self {
        SuggestionBuilder { registry }
    }

    /// One suggestion per registered grammar, keyed off its identifier(s),
    /// for the "no grammar selected yet" state. `supported_types` restricts
    /// the candidate set to those identifiers when given.
    pub fn initial_suggestions(&self, supported_types: Option<&[String]>) -> Vec<Suggestion> {
        let supports = |identifier: &str| {
            supported_types.map_or(true, |types| types.iter().any(|t| t.eq_ignore_ascii_case(identifier)))
        };

        let mut plain = Vec::new();
        let mut by_second_word: IndexMap<String, Vec<&Grammar>> = IndexMap::new();

        for grammar in self.registry.grammars() {
            let Some(identifier) = grammar.identifier.first() else { continue };
            if !supports(identifier) {
                continue;
            }
            let upper = identifier.to_uppercase();
            if SECOND_WORD_IDENTIFIERS.contains(&upper.as_str()) {
                by_second_word.entry(upper).or_default().push(grammar);
            } else {
                plain.push(Suggestion {
                    text: identifier.clone(),
                    placeholder: None,
                    description: grammar.description.clone(),
                    editable: false,
                    category: grammar.category.clone(),
                    append_to_previous: false,
                    skip_to_next: false,
                    new_line_before: false,
                    switch_grammar: Some(grammar.name.clone()),
                    children: Vec::new(),
                });
            }
        }

        for (identifier, grammars) in by_second_word {
            plain.push(second_word_submenu(&identifier, &grammars));
        }

        plain.sort_by(|a, b| a.text.cmp(&b.text));
        plain
    }

    /// Suggestions to offer after a token of kind `kind_id` has just been
    /// matched in the current grammar, dereferencing declaration ids and
    /// grouping same-category entries into a submenu. `prev_token_text` is
    /// used to suppress re-appending a CB/TCU suffix already present.
    pub fn suggestions_after(
        &self,
        kind_id: &str,
        prev_token_text: Option<&str>,
        clock: &dyn Clock,
    ) -> Vec<Suggestion> {
        let Some(grammar) = self.registry.current() else {
            return Vec::new();
        };
        let Some(entries) = grammar.suggestions.after.get(kind_id) else {
            return Vec::new();
        };

        let suppress_glued = already_has_glued_suffix(prev_token_text);

        let resolved: Vec<Suggestion> = entries
            .iter()
            .filter_map(|entry| self.dereference(entry, grammar))
            .map(|decl| self.resolve(decl, grammar, clock))
            .filter(|suggestion| !(suppress_glued && is_glued_suffix(&suggestion.text)))
            .collect();

        group_into_submenus(resolved)
    }

    /// Suggestions for a template field's label kind (spec §6
    /// `getTemplateSuggestions`): dereferences that field's
    /// `suggestion_refs` the same way `suggestions_after` does.
    pub fn template_suggestions(&self, label_kind: &str, clock: &dyn Clock) -> Vec<Suggestion> {
        let Some(grammar) = self.registry.current() else {
            return Vec::new();
        };
        let Some(template) = &grammar.template else {
            return Vec::new();
        };
        let Some(field) = template.fields.iter().find(|f| f.label_kind == label_kind) else {
            return Vec::new();
        };

        field
            .suggestion_refs
            .iter()
            .filter_map(|id| {
                grammar
                    .suggestions
                    .declarations
                    .iter()
                    .find(|decl| decl.id.as_deref() == Some(id.as_str()))
            })
            .map(|decl| self.resolve(decl, grammar, clock))
            .collect()
    }

    fn dereference<'g>(
        &self,
        entry: &'g AfterEntry,
        grammar: &'g Grammar,
    ) -> Option<&'g SuggestionDeclaration> {
        match entry {
            AfterEntry::Id(id) => grammar
                .suggestions
                .declarations
                .iter()
                .find(|decl| decl.id.as_deref() == Some(id.as_str())),
            AfterEntry::Inline(decl) => Some(decl),
        }
    }

    fn resolve(&self, decl: &SuggestionDeclaration, grammar: &Grammar, clock: &dyn Clock) -> Suggestion {
        let mut text = decl.text.clone().unwrap_or_default();
        let mut description = decl.description.clone();

        if let Some(token_ref) = &decl.token_ref {
            if let Some(token) = grammar.token(token_ref) {
                if text.is_empty() {
                    text = token_ref.clone();
                }
                description = description.or_else(|| Some(token.description.clone()));
            }
        }

        let placeholder = decl
            .pattern
            .as_deref()
            .and_then(|pattern| datetime_suggestion(pattern, clock, decl.description.as_deref()))
            .or_else(|| decl.placeholder.clone());

        let append_to_previous = decl.append_to_previous || is_glued_suffix(&text);

        let children = decl
            .children
            .iter()
            .map(|child| self.resolve(child, grammar, clock))
            .collect();

        Suggestion {
            text,
            placeholder,
            description,
            editable: decl.editable,
            category: decl.category.clone(),
            append_to_previous,
            skip_to_next: decl.skip_to_next,
            new_line_before: decl.new_line_before,
            switch_grammar: decl.switch_grammar.clone(),
            children,
        }
    }
}

/// Builds the nested SIGMET/AIRMET submenu (spec §4.5): top entry is the
/// identifier, its children are one submenu per distinct `category` among
/// the grammars sharing that identifier, each populated with the fixed
/// common-FIR-code fallback list, editable on the FIR span.
fn second_word_submenu(identifier: &str, grammars: &[&Grammar]) -> Suggestion {
    let mut by_category: IndexMap<String, Vec<&Grammar>> = IndexMap::new();
    for grammar in grammars {
        let category = grammar.category.clone().unwrap_or_else(|| identifier.to_string());
        by_category.entry(category).or_default().push(grammar);
    }

    let mut categories: Vec<Suggestion> = by_category
        .into_iter()
        .map(|(category, variants)| {
            let children = variants
                .iter()
                .flat_map(|grammar| {
                    COMMON_FIR_CODES.iter().map(move |fir| Suggestion {
                        text: format!("{fir} {identifier}"),
                        placeholder: None,
                        description: grammar.description.clone(),
                        editable: true,
                        category: None,
                        append_to_previous: false,
                        skip_to_next: false,
                        new_line_before: false,
                        switch_grammar: Some(grammar.name.clone()),
                        children: Vec::new(),
                    })
                })
                .collect();
            Suggestion {
                text: category,
                placeholder: None,
                description: None,
                editable: false,
                category: None,
                append_to_previous: false,
                skip_to_next: false,
                new_line_before: false,
                switch_grammar: None,
                children,
            }
        })
        .collect();
    categories.sort_by(|a, b| a.text.cmp(&b.text));

    Suggestion {
        text: identifier.to_string(),
        placeholder: None,
        description: None,
        editable: false,
        category: None,
        append_to_previous: false,
        skip_to_next: false,
        new_line_before: false,
        switch_grammar: None,
        children: categories,
    }
}

/// Sorts a suggestion list by spec §4.5's ordering rule: editable items
/// first, then category submenus (synthesized entries with children), then
/// plain items — stable within each group, since `sort_by_key` is a stable
/// sort and never reorders two items placed in the same bucket.
fn sort_editable_then_category_then_plain(items: &mut [Suggestion]) {
    items.sort_by_key(|item| {
        if item.editable {
            0
        } else if !item.children.is_empty() {
            1
        } else {
            2
        }
    });
}

/// Entries sharing a `category` with at least one sibling collapse into a
/// single named submenu (spec §4.5), used by SIGMET/AIRMET phenomenon
/// pickers; a category with only one member stays flat.
fn group_into_submenus(items: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut by_category: IndexMap<String, Vec<Suggestion>> = IndexMap::new();
    let mut out = Vec::new();

    for item in items {
        match item.category.clone() {
            Some(category) => by_category.entry(category).or_default().push(item),
            None => out.push(item),
        }
    }

    for (category, mut children) in by_category {
        if children.len() > 1 {
            sort_editable_then_category_then_plain(&mut children);
            out.push(Suggestion {
                text: category,
                placeholder: None,
                description: None,
                editable: false,
                category: None,
                append_to_previous: false,
                skip_to_next: false,
                new_line_before: false,
                switch_grammar: None,
                children,
            });
        } else {
            out.extend(children);
        }
    }

    sort_editable_then_category_then_plain(&mut out);
    out
}
