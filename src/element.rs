//! Schema element types
//!
//! Every compiled schema node is one [`Element`] stored in an arena and
//! addressed by [`ElementId`]. Containers refer to their children by id;
//! `ref`/`file` indirections hold a [`RefId`] slot that the resolver binds
//! once the whole tree is built.

use std::fmt;

use regex::Regex;

use crate::key::KeyMatcher;

/// Index of an element in its schema arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub(crate) usize);

/// Index of a reference slot, bound to an [`ElementId`] after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefId(pub(crate) usize);

/// Basic type keywords of the declaration grammar.
///
/// This is the closed dispatch table from a keyword string to the element
/// constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKeyword {
    String,
    Enum,
    Pattern,
    Float,
    Integer,
    Boolean,
    OffsetDateTime,
    LocalDateTime,
    Date,
    Time,
    AnyValue,
    Ref,
    File,
}

impl TypeKeyword {
    pub const ALL: [TypeKeyword; 13] = [
        TypeKeyword::String,
        TypeKeyword::Enum,
        TypeKeyword::Pattern,
        TypeKeyword::Float,
        TypeKeyword::Integer,
        TypeKeyword::Boolean,
        TypeKeyword::OffsetDateTime,
        TypeKeyword::LocalDateTime,
        TypeKeyword::Date,
        TypeKeyword::Time,
        TypeKeyword::AnyValue,
        TypeKeyword::Ref,
        TypeKeyword::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKeyword::String => "string",
            TypeKeyword::Enum => "enum",
            TypeKeyword::Pattern => "pattern",
            TypeKeyword::Float => "float",
            TypeKeyword::Integer => "integer",
            TypeKeyword::Boolean => "boolean",
            TypeKeyword::OffsetDateTime => "offset-date-time",
            TypeKeyword::LocalDateTime => "local-date-time",
            TypeKeyword::Date => "date",
            TypeKeyword::Time => "time",
            TypeKeyword::AnyValue => "any-value",
            TypeKeyword::Ref => "ref",
            TypeKeyword::File => "file",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == keyword)
    }

    /// Keywords whose options are a table, so they may appear bare. Used only
    /// while the meta-schemas are bootstrapped; afterwards the types
    /// meta-schema decides.
    pub fn takes_option_table(&self) -> bool {
        !matches!(
            self,
            TypeKeyword::Enum | TypeKeyword::Pattern | TypeKeyword::Ref | TypeKeyword::File
        )
    }
}

impl fmt::Display for TypeKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled schema node
#[derive(Debug)]
pub enum Element {
    String(StringType),
    Enum(EnumType),
    Pattern(PatternType),
    Float(FloatType),
    Integer(IntegerType),
    Boolean,
    OffsetDateTime,
    LocalDateTime,
    Date,
    Time,
    AnyValue,
    Table(TableType),
    Array(ArrayType),
    Union(UnionType),
    Ref(Reference),
    File(FileReference),
}

impl Element {
    /// The basic type keyword, for scalar and reference elements.
    pub fn keyword(&self) -> Option<TypeKeyword> {
        let keyword = match self {
            Element::String(_) => TypeKeyword::String,
            Element::Enum(_) => TypeKeyword::Enum,
            Element::Pattern(_) => TypeKeyword::Pattern,
            Element::Float(_) => TypeKeyword::Float,
            Element::Integer(_) => TypeKeyword::Integer,
            Element::Boolean => TypeKeyword::Boolean,
            Element::OffsetDateTime => TypeKeyword::OffsetDateTime,
            Element::LocalDateTime => TypeKeyword::LocalDateTime,
            Element::Date => TypeKeyword::Date,
            Element::Time => TypeKeyword::Time,
            Element::AnyValue => TypeKeyword::AnyValue,
            Element::Ref(_) => TypeKeyword::Ref,
            Element::File(_) => TypeKeyword::File,
            Element::Table(_) | Element::Array(_) | Element::Union(_) => return None,
        };
        Some(keyword)
    }

    pub fn as_table(&self) -> Option<&TableType> {
        match self {
            Element::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// `string = { min-len = N, max-len = N }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringType {
    pub min_len: Option<i64>,
    pub max_len: Option<i64>,
}

/// `enum = [ ... ]`, duplicate-free
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub values: Vec<String>,
}

/// `pattern = '<regex>'`
#[derive(Debug, Clone)]
pub struct PatternType {
    pub pattern: String,
    pub(crate) regex: Regex,
}

/// `float = { min = F, max = F }`
#[derive(Debug, Clone, Default)]
pub struct FloatType {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// `integer = { min = N, max = N }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerType {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Ordered key matchers and their element schemas
#[derive(Debug, Default)]
pub struct TableType {
    pub(crate) entries: Vec<(KeyMatcher, ElementId)>,
}

impl TableType {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyMatcher> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Ref-path lookup: hidden literal keys win over visible ones.
    pub(crate) fn get_for_reference(&self, name: &str) -> Option<ElementId> {
        self.entries
            .iter()
            .find(|(key, _)| key.hidden && key.is_literal() && key.name == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(key, _)| !key.hidden && key.is_literal() && key.name == name)
            })
            .map(|(_, id)| *id)
    }

    /// Document-key lookup by literal name; hidden keys are invisible.
    pub(crate) fn get_literal(&self, name: &str) -> Option<(&KeyMatcher, ElementId)> {
        self.entries
            .iter()
            .find(|(key, _)| !key.hidden && key.is_literal() && key.name == name)
            .map(|(key, id)| (key, *id))
    }
}

/// Single member schema plus cardinality constraints
#[derive(Debug)]
pub struct ArrayType {
    pub member: ElementId,
    pub min_items: Option<i64>,
    pub max_items: Option<i64>,
    pub unique_items: bool,
}

/// How many union members must accept a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnionMode {
    #[default]
    Any,
    All,
    One,
    None,
}

impl UnionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnionMode::Any => "any",
            UnionMode::All => "all",
            UnionMode::One => "one",
            UnionMode::None => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "any" => Some(UnionMode::Any),
            "all" => Some(UnionMode::All),
            "one" => Some(UnionMode::One),
            "none" => Some(UnionMode::None),
            _ => None,
        }
    }
}

impl fmt::Display for UnionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free alternatives
#[derive(Debug)]
pub struct UnionType {
    pub members: Vec<ElementId>,
    pub mode: UnionMode,
}

/// `ref = '<dotted.path>'` into the same document
#[derive(Debug)]
pub struct Reference {
    pub path: String,
    pub(crate) slot: RefId,
    pub(crate) address: String,
}

/// `file = '<relative/path>'` to another schema document
#[derive(Debug)]
pub struct FileReference {
    pub path: String,
    pub(crate) slot: RefId,
    pub(crate) address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for keyword in TypeKeyword::ALL {
            assert_eq!(TypeKeyword::from_keyword(keyword.as_str()), Some(keyword));
        }
        assert_eq!(TypeKeyword::from_keyword("table"), None);
        assert_eq!(TypeKeyword::from_keyword("String"), None);
    }

    #[test]
    fn test_bare_keywords() {
        assert!(TypeKeyword::OffsetDateTime.takes_option_table());
        assert!(TypeKeyword::AnyValue.takes_option_table());
        assert!(!TypeKeyword::Enum.takes_option_table());
        assert!(!TypeKeyword::Ref.takes_option_table());
    }

    #[test]
    fn test_union_mode_names() {
        for mode in [UnionMode::Any, UnionMode::All, UnionMode::One, UnionMode::None] {
            assert_eq!(UnionMode::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(UnionMode::from_name("some"), None);
    }
}
