//! Table key matchers
//!
//! A key of a schema table is a literal name, a regex pattern (the `*`
//! wildcard is sugar for `^.*$`) or a reference whose target schema decides
//! which key strings are acceptable.

use regex::Regex;

use crate::element::RefId;

/// Pattern the `*` wildcard key stands for
pub const WILDCARD_PATTERN: &str = "^.*$";

/// One permissible key in a schema table
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    pub name: String,
    pub required: bool,
    pub hidden: bool,
    pub(crate) kind: KeyKind,
}

#[derive(Debug, Clone)]
pub(crate) enum KeyKind {
    Literal,
    Pattern { source: String, regex: Regex },
    Ref { path: String, slot: RefId, address: String },
}

impl KeyMatcher {
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            hidden: false,
            kind: KeyKind::Literal,
        }
    }

    /// A pattern key. Errors carry the one-line regex failure.
    pub fn pattern(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = compile_anchored(&source)?;
        Ok(Self {
            name: "pattern".to_string(),
            required: false,
            hidden: false,
            kind: KeyKind::Pattern { source, regex },
        })
    }

    pub fn wildcard() -> Result<Self, regex::Error> {
        Self::pattern(WILDCARD_PATTERN)
    }

    pub(crate) fn reference(path: impl Into<String>, slot: RefId, address: impl Into<String>) -> Self {
        Self {
            name: "ref".to_string(),
            required: false,
            hidden: false,
            kind: KeyKind::Ref {
                path: path.into(),
                slot,
                address: address.into(),
            },
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, KeyKind::Literal)
    }

    pub fn pattern_source(&self) -> Option<&str> {
        match &self.kind {
            KeyKind::Pattern { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn reference_path(&self) -> Option<&str> {
        match &self.kind {
            KeyKind::Ref { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Anchored-at-start regex test; false for non-pattern keys.
    pub fn pattern_match(&self, key: &str) -> bool {
        match &self.kind {
            KeyKind::Pattern { regex, .. } => regex.is_match(key),
            _ => false,
        }
    }

    /// Identity used to reject duplicate keys in one table.
    pub(crate) fn identity(&self) -> (&str, Option<&str>, Option<&str>, bool) {
        (
            &self.name,
            self.pattern_source(),
            self.reference_path(),
            self.hidden,
        )
    }
}

/// Compile a regex that, like the key and string patterns of the grammar,
/// matches from the start of the input but not necessarily to its end.
pub(crate) fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}
