use std::fmt;

/// A single diagnostic produced while tokenizing or validating text.
///
/// `tokenize` never returns an `Err`: unknown spans are folded into the token
/// stream as an errored token (see `crate::tokenizer::RawToken::error`).
/// `validate` collects these into its `errors` list instead of stopping at
/// the first one.
#[derive(Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    /// Byte offset the diagnostic applies to. Missing-field diagnostics use
    /// the end of the input text, with an empty `token`.
    index: usize,
    token: String,
}

impl Diagnostic {
    pub fn unknown_token(text: &str, index: usize) -> Self {
        Self {
            message: format!("Unknown token: {text}"),
            index,
            token: text.to_string(),
        }
    }

    pub fn missing_field(description: &str, end_index: usize) -> Self {
        Self {
            message: format!("Missing {description}"),
            index: end_index,
            token: String::new(),
        }
    }

    /// Byte offset the diagnostic applies to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The offending token text, empty for missing-field diagnostics.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR@{} {:?} {:?}", self.index, self.message, self.token)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.message, self.index)
    }
}

/// Errors that can occur while building a [`crate::grammar::Grammar`] from a
/// deserialized document.
///
/// This is distinct from [`Diagnostic`]: a `Diagnostic` describes a defect in
/// the *input text* under a grammar that is assumed sound, while `Error`
/// describes a defect in the document itself (an unparseable token pattern).
/// The three grammar engine misuse categories spec §7 names (an `extends`
/// cycle, a dangling `extends` target, selecting an unregistered grammar) are
/// explicitly a no-op logged as a warning rather than a surfaced error — see
/// `grammar::registry` — so they have no variant here.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid token pattern for `{id}`: {source}")]
    InvalidPattern { id: String, source: String },
}
