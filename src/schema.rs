//! Compiled schema handles

use std::fmt;
use std::path::{Path, PathBuf};

use toml::Value;

use crate::arena::Arena;
use crate::element::{Element, ElementId};
use crate::equality::elements_equal;
use crate::error::Result;
use crate::render::{render_element, render_key};
use crate::resolver::lookup;
use crate::validate::{ValidateOptions, Validator};

/// A compiled, reference-resolved schema.
///
/// Immutable once built; validation borrows it shared, so one schema can
/// check documents from several threads at once.
///
/// `Display` gives the canonical rendering of the root table, `PartialEq`
/// is structural equality.
#[derive(Debug)]
pub struct Schema {
    arena: Arena,
    root: ElementId,
    source: Option<PathBuf>,
}

impl Schema {
    pub(crate) fn new(arena: Arena, root: ElementId, source: Option<PathBuf>) -> Self {
        Self { arena, root, source }
    }

    /// The root table element.
    pub fn root(&self) -> Node<'_> {
        Node {
            arena: &self.arena,
            id: self.root,
        }
    }

    /// The file the schema was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of elements, including those of documents pulled in by
    /// `file` references.
    pub fn element_count(&self) -> usize {
        self.arena.len()
    }

    /// Validate a document with default options.
    pub fn validate(&self, document: &toml::Table) -> Result<()> {
        self.validate_with(document, &ValidateOptions::default())
    }

    pub fn validate_with(&self, document: &toml::Table, options: &ValidateOptions) -> Result<()> {
        Validator::new(&self.arena, options).validate_table(self.root, document, "")
    }

    /// Validate any value against the root table.
    pub fn validate_value(&self, value: &Value) -> Result<()> {
        self.root().validate(value)
    }

    /// Find the element under a dotted key path, the way `ref` paths are
    /// looked up (hidden keys included).
    pub fn lookup(&self, path: &str) -> Option<Node<'_>> {
        lookup(&self.arena, self.root, path).ok().map(|id| Node {
            arena: &self.arena,
            id,
        })
    }

    /// The schema as a TOML document, one root entry per line.
    ///
    /// Compiling this text yields a schema equal to `self`.
    pub fn to_toml(&self) -> String {
        match self.arena.get(self.root) {
            Element::Table(table) => table
                .entries
                .iter()
                .map(|(key, id)| {
                    format!(
                        "{} = {}\n",
                        render_key(key),
                        render_element(&self.arena, *id)
                    )
                })
                .collect(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root(), f)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

/// A borrowed element of a [`Schema`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    arena: &'a Arena,
    id: ElementId,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn element(&self) -> &'a Element {
        self.arena.get(self.id)
    }

    /// Validate a value at the document root location.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.validate_with(value, &ValidateOptions::default())
    }

    pub fn validate_with(&self, value: &Value, options: &ValidateOptions) -> Result<()> {
        Validator::new(self.arena, options).validate(self.id, value, "")
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_element(self.arena, self.id))
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("element", &self.to_string())
            .finish()
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        elements_equal(self.arena, self.id, other.arena, other.id)
    }
}

#[cfg(test)]
mod tests {
    use crate::loader::loads;

    #[test]
    fn test_schema_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<super::Schema>();
    }

    #[test]
    fn test_to_toml_round_trip() {
        let schema = loads(
            r#"
            "title = { required = true }" = "string"
            "pattern = '^x-'" = "any-value"
            [owner]
            name = "string = { max-len = 40 }"
            "#,
        )
        .unwrap();
        let again = loads(&schema.to_toml()).unwrap();
        assert_eq!(schema, again);
        assert_eq!(schema.to_string(), again.to_string());
    }

    #[test]
    fn test_lookup_nodes() {
        let schema = loads(
            r#"
            ["def = { hidden = true }"]
            number = { union = [ "float", "integer" ] }
            "#,
        )
        .unwrap();
        let node = schema.lookup("def.number").unwrap();
        assert_eq!(node.to_string(), r#"{ union = [ "float", "integer" ] }"#);
        node.validate(&toml::Value::Integer(3)).unwrap();
        assert!(schema.lookup("def.missing").is_none());
    }
}
