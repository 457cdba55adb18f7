//! The grammar data model (spec §3) and the registry that resolves
//! `extends` inheritance across grammars (spec §4.4).

pub mod document;
pub mod registry;

use indexmap::IndexMap;
use regex::Regex;

pub use document::{
    AfterEntry, Cardinality, StructureNode, SuggestionDeclaration, SuggestionsDoc,
    TemplateDoc, TemplateFieldDoc,
};
pub use registry::GrammarRegistry;

use crate::error::Error;

/// A compiled token definition (spec §3 "Token Definition"). `pattern` is
/// `Some` only when the document supplied one; `values` backs the
/// case-insensitive membership test used when it didn't (spec §4.1).
#[derive(Debug, Clone)]
pub struct TokenDefinition {
    pub id: String,
    pub pattern: Option<Regex>,
    pub values: Option<Vec<String>>,
    pub style: Option<String>,
    pub description: String,
}

impl TokenDefinition {
    fn compile(id: &str, doc: document::TokenDef) -> Result<Self, Error> {
        let pattern = doc
            .pattern
            .as_deref()
            .map(|src| {
                Regex::new(&anchor(src)).map_err(|e| Error::InvalidPattern {
                    id: id.to_string(),
                    source: e.to_string(),
                })
            })
            .transpose()?;
        Ok(TokenDefinition {
            id: id.to_string(),
            pattern,
            values: doc.values,
            style: doc.style,
            description: doc.description,
        })
    }

    /// spec §4.1 Token Matcher: pattern test wins if present, else
    /// case-insensitive membership in `values`.
    pub fn matches(&self, text: &str) -> bool {
        if let Some(re) = &self.pattern {
            return re.is_match(text);
        }
        if let Some(values) = &self.values {
            return values.iter().any(|v| v.eq_ignore_ascii_case(text));
        }
        false
    }
}

fn anchor(pattern: &str) -> String {
    let starts = pattern.starts_with('^');
    let ends = pattern.ends_with('$');
    match (starts, ends) {
        (true, true) => pattern.to_string(),
        (true, false) => format!("{pattern}$"),
        (false, true) => format!("^{pattern}"),
        (false, false) => format!("^{pattern}$"),
    }
}

#[derive(Debug, Clone)]
pub struct TemplateField {
    pub label: String,
    pub label_kind: String,
    pub value_kind: String,
    pub required: bool,
    pub multiline: bool,
    pub placeholder: Option<String>,
    pub suggestion_refs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub fields: Vec<TemplateField>,
    pub label_column_width: usize,
}

impl From<TemplateDoc> for Template {
    fn from(doc: TemplateDoc) -> Self {
        let label_column_width = doc
            .label_column_width
            .unwrap_or_else(|| doc.fields.iter().map(|f| f.label.len()).max().unwrap_or(0) + 2);
        Template {
            fields: doc
                .fields
                .into_iter()
                .map(|f| TemplateField {
                    label: f.label,
                    label_kind: f.label_kind,
                    value_kind: f.value_kind,
                    required: f.required,
                    multiline: f.multiline,
                    placeholder: f.placeholder,
                    suggestion_refs: f.suggestion_refs,
                })
                .collect(),
            label_column_width,
        }
    }
}

/// A resolved, ready-to-run grammar (spec §3 "Grammar"). Produced by
/// [`Grammar::from_document`] after `extends` has been merged and all token
/// patterns compiled.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub identifier: Vec<String>,
    pub category: Option<String>,
    pub multiline: bool,
    pub template_mode: bool,
    pub tokens: IndexMap<String, TokenDefinition>,
    pub structure: Vec<StructureNode>,
    pub template: Option<Template>,
    pub suggestions: SuggestionsDoc,
    /// Multi-word literal patterns extracted from token patterns, paired
    /// with the token id they belong to, longest literal first (spec §4.2
    /// multiline mode). Only populated when `multiline` is set.
    pub multiword_literals: Vec<(String, String)>,
}

impl Grammar {
    pub fn from_document(doc: document::GrammarDocument) -> Result<Self, Error> {
        let mut tokens = IndexMap::new();
        for (id, def) in doc.tokens {
            tokens.insert(id.clone(), TokenDefinition::compile(&id, def)?);
        }

        let multiline = doc.multiline.unwrap_or(false);
        let multiword_literals = if multiline {
            extract_multiword_literals(&tokens)
        } else {
            Vec::new()
        };

        Ok(Grammar {
            name: doc.name,
            version: doc.version,
            description: doc.description,
            identifier: doc.identifier.unwrap_or_default(),
            category: doc.category,
            multiline,
            template_mode: doc.template_mode.unwrap_or(false),
            tokens,
            structure: doc.structure.unwrap_or_default(),
            template: doc.template.map(Template::from),
            suggestions: doc.suggestions,
            multiword_literals,
        })
    }

    pub fn token(&self, id: &str) -> Option<&TokenDefinition> {
        self.tokens.get(id)
    }
}

/// Extracts multi-word literal patterns from token patterns whose body is a
/// literal alphanumeric-and-punctuation string containing at least one
/// space (spec §4.2, §6: "only the classes `[A-Z0-9 \-+:/]`"), paired with
/// the id of the token definition each literal came from, sorted
/// longest-first so a tokenizer trying them in order finds the most
/// specific match.
fn extract_multiword_literals(tokens: &IndexMap<String, TokenDefinition>) -> Vec<(String, String)> {
    let mut literals: Vec<(String, String)> = tokens
        .values()
        .filter_map(|def| {
            let pattern = def.pattern.as_ref()?.as_str();
            let body = pattern.trim_start_matches('^').trim_end_matches('$');
            let is_plain_literal = !body.is_empty()
                && body
                    .chars()
                    .all(|c| matches!(c, 'A'..='Z' | '0'..='9' | ' ' | '-' | '+' | ':' | '/'));
            if is_plain_literal && body.contains(' ') {
                Some((body.to_string(), def.id.clone()))
            } else {
                None
            }
        })
        .collect();
    literals.sort_by_key(|(lit, _)| std::cmp::Reverse(lit.len()));
    literals
}
