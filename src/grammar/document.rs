//! The raw, wire-shaped [`GrammarDocument`] (spec §6 "Grammar document") and
//! the deep-merge used to resolve `extends` (spec §4.4).
//!
//! Everything in this module is plain data: no compiled regexes, no
//! validation beyond what `serde` gives us for free. [`super::Grammar`] is
//! what you get after [`merge`] + pattern compilation.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// `[min, max]`, with `max: None` meaning unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Cardinality {
    #[serde(default = "one")]
    pub min: u32,
    #[serde(default = "one_some")]
    pub max: Option<u32>,
}

fn one() -> u32 {
    1
}
fn one_some() -> Option<u32> {
    Some(1)
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality { min: 1, max: Some(1) }
    }
}

impl Cardinality {
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Cardinality { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Whether `count` more matches are still permitted.
    pub fn can_match_more(&self, count: u32) -> bool {
        match self.max {
            None => true,
            Some(max) => count < max,
        }
    }

    pub fn satisfied(&self, count: u32) -> bool {
        count >= self.min
    }

    /// `count ≥ min` and, if `max` is finite, `count ≥ max` too. Used by the
    /// root-cursor advance rule in spec §4.3.
    pub fn fully_complete(&self, count: u32) -> bool {
        self.satisfied(count) && self.max.map_or(true, |max| count >= max)
    }

    /// Whether this node could, structurally, ever match more than once.
    pub fn repeatable(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }
}

/// A node in a grammar's structure tree (spec §3 "Structure Node").
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructureNode {
    Token {
        id: String,
        #[serde(default)]
        cardinality: Cardinality,
    },
    OneOf {
        children: Vec<StructureNode>,
        #[serde(default)]
        cardinality: Cardinality,
    },
    Sequence {
        children: Vec<StructureNode>,
        #[serde(default)]
        cardinality: Cardinality,
    },
}

impl StructureNode {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            StructureNode::Token { cardinality, .. }
            | StructureNode::OneOf { cardinality, .. }
            | StructureNode::Sequence { cardinality, .. } => *cardinality,
        }
    }

    /// spec §4.3 `effectivelyOptional`: true iff `min=0`, or a one-of whose
    /// every alternative is effectively optional, or a sequence whose every
    /// child is effectively optional.
    pub fn effectively_optional(&self) -> bool {
        if self.cardinality().min == 0 {
            return true;
        }
        match self {
            StructureNode::Token { .. } => false,
            StructureNode::OneOf { children, .. } => {
                children.iter().all(StructureNode::effectively_optional)
            }
            StructureNode::Sequence { children, .. } => {
                children.iter().all(StructureNode::effectively_optional)
            }
        }
    }
}

/// A raw token definition as it appears in a grammar document (spec §3
/// "Token Definition"). Regex patterns are compiled lazily by
/// [`super::Grammar::from_document`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenDef {
    pub pattern: Option<String>,
    pub values: Option<Vec<String>>,
    pub style: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFieldDoc {
    pub label: String,
    pub label_kind: String,
    pub value_kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiline: bool,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub suggestion_refs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDoc {
    pub fields: Vec<TemplateFieldDoc>,
    pub label_column_width: Option<usize>,
}

/// spec §3 "Suggestion Declaration".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDeclaration {
    pub id: Option<String>,
    #[serde(rename = "ref")]
    pub token_ref: Option<String>,
    pub text: Option<String>,
    pub placeholder: Option<String>,
    pub pattern: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub editable: bool,
    pub category: Option<String>,
    #[serde(default)]
    pub children: Vec<SuggestionDeclaration>,
    #[serde(default)]
    pub append_to_previous: bool,
    #[serde(default)]
    pub skip_to_next: bool,
    #[serde(default)]
    pub new_line_before: bool,
    pub switch_grammar: Option<String>,
}

/// An entry in `suggestions.after`: either a declaration id (new format) or
/// an inline declaration (legacy format, spec §9 "Legacy suggestion format").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AfterEntry {
    Id(String),
    Inline(SuggestionDeclaration),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionsDoc {
    #[serde(default)]
    pub declarations: Vec<SuggestionDeclaration>,
    #[serde(default)]
    pub after: IndexMap<String, Vec<AfterEntry>>,
}

fn deserialize_identifier<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Option::<OneOrMany>::deserialize(deserializer).map(|maybe| {
        maybe.map(|one_or_many| match one_or_many {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        })
    })
}

/// The raw grammar document (spec §6). A document with `extends` set is
/// *raw* until [`merge`] folds its parent in; see
/// [`crate::grammar::registry::GrammarRegistry::resolve_inheritance`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarDocument {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub identifier: Option<Vec<String>>,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub multiline: Option<bool>,
    #[serde(default)]
    pub template_mode: Option<bool>,
    #[serde(default)]
    pub tokens: IndexMap<String, TokenDef>,
    #[serde(default)]
    pub structure: Option<Vec<StructureNode>>,
    #[serde(default)]
    pub template: Option<TemplateDoc>,
    #[serde(default)]
    pub suggestions: SuggestionsDoc,
}

/// Deep-merge `parent` into `child`, per spec §4.4. `child` wins on every
/// scalar and whole-block field; `tokens`, `suggestions.declarations` and
/// `suggestions.after` merge key-by-key.
pub fn merge(parent: &GrammarDocument, child: &GrammarDocument) -> GrammarDocument {
    let mut tokens = parent.tokens.clone();
    for (id, def) in &child.tokens {
        tokens.insert(id.clone(), def.clone());
    }

    let mut after = parent.suggestions.after.clone();
    for (kind, entries) in &child.suggestions.after {
        after.insert(kind.clone(), entries.clone());
    }

    let mut declarations: IndexMap<String, SuggestionDeclaration> = IndexMap::new();
    for decl in &parent.suggestions.declarations {
        declarations.insert(decl.id.clone().unwrap_or_default(), decl.clone());
    }
    for decl in &child.suggestions.declarations {
        declarations.insert(decl.id.clone().unwrap_or_default(), decl.clone());
    }

    GrammarDocument {
        name: child.name.clone(),
        version: child.version.clone().or_else(|| parent.version.clone()),
        description: child
            .description
            .clone()
            .or_else(|| parent.description.clone()),
        identifier: child
            .identifier
            .clone()
            .or_else(|| parent.identifier.clone()),
        extends: None,
        category: child.category.clone().or_else(|| parent.category.clone()),
        multiline: child.multiline.or(parent.multiline),
        template_mode: child.template_mode.or(parent.template_mode),
        tokens,
        structure: child.structure.clone().or_else(|| parent.structure.clone()),
        template: child.template.clone().or_else(|| parent.template.clone()),
        suggestions: SuggestionsDoc {
            declarations: declarations.into_values().collect(),
            after,
        },
    }
}
