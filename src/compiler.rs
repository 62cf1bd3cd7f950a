//! Schema compiler
//!
//! Turns a parsed declaration table into elements in an [`Arena`]. Strings
//! that contain `=` (in keys or in values) are embedded one-entry TOML
//! declarations: they are reparsed, checked against the bootstrap
//! meta-schemas and then dispatched on their single key.
//!
//! References are only recorded here, each with a fresh slot; binding them
//! is the resolver's job.

use toml::Value;

use crate::arena::Arena;
use crate::element::{
    ArrayType, Element, ElementId, EnumType, FileReference, FloatType, IntegerType, PatternType,
    Reference, StringType, TableType, TypeKeyword, UnionMode, UnionType,
};
use crate::equality::elements_equal;
use crate::error::{regex_error_message, toml_error_message, Result, SchemaError};
use crate::key::{compile_anchored, KeyMatcher, WILDCARD_PATTERN};
use crate::meta::{MetaSchemas, ARRAY_OPTIONS};
use crate::render::{display_value, render_key, repr_list};

/// A compiled table key: either a key matcher or the union marker.
#[derive(Debug)]
enum ParsedKey {
    Key(KeyMatcher),
    Union(UnionMode),
}

#[derive(Debug, Default)]
struct ArrayOptions {
    min_items: Option<i64>,
    max_items: Option<i64>,
    unique_items: bool,
}

pub(crate) struct Compiler<'m> {
    pub(crate) arena: Arena,
    meta: Option<&'m MetaSchemas>,
}

impl<'m> Compiler<'m> {
    /// `meta` is `None` only while the meta-schemas themselves are compiled.
    pub fn new(meta: Option<&'m MetaSchemas>) -> Self {
        Self {
            arena: Arena::default(),
            meta,
        }
    }

    pub fn into_arena(self) -> Arena {
        self.arena
    }

    /// Compile a document root table. Root tables may not be unions.
    pub fn compile_root(&mut self, table: &toml::Table, address: &str) -> Result<ElementId> {
        let keys = self.parse_keys(table, address)?;
        self.compile_entries(table, keys, address)
    }

    fn compile_value(&mut self, value: &Value, address: &str) -> Result<ElementId> {
        match value {
            Value::Table(table) => self.compile_table(table, address),
            Value::Array(items) => self.compile_array(items, address),
            Value::String(text) => self.compile_basic(text, address),
            other => Err(SchemaError::new(
                address,
                format!("Schema type '{}' not a string.", display_value(other)),
            )),
        }
    }

    fn compile_table(&mut self, table: &toml::Table, address: &str) -> Result<ElementId> {
        let keys = self.parse_keys(table, address)?;
        let union_mode = keys.iter().find_map(|key| match key {
            ParsedKey::Union(mode) => Some(*mode),
            ParsedKey::Key(_) => None,
        });
        match union_mode {
            Some(mode) => self.compile_union(table, mode, address),
            None => self.compile_entries(table, keys, address),
        }
    }

    fn parse_keys(&mut self, table: &toml::Table, address: &str) -> Result<Vec<ParsedKey>> {
        table.keys().map(|key| self.parse_key(key, address)).collect()
    }

    fn compile_entries(
        &mut self,
        table: &toml::Table,
        keys: Vec<ParsedKey>,
        address: &str,
    ) -> Result<ElementId> {
        let base = if address.is_empty() {
            String::new()
        } else {
            format!("{address}.")
        };

        let mut entries = Vec::with_capacity(table.len());
        let mut has_union_key = false;
        for ((raw, value), key) in table.iter().zip(keys) {
            let element = self.compile_value(value, &format!("{base}{raw}"))?;
            match key {
                ParsedKey::Key(key) => entries.push((key, element)),
                ParsedKey::Union(_) => has_union_key = true,
            }
        }
        if has_union_key {
            return Err(SchemaError::new(address, "'union' cannot be a schema key"));
        }

        let duplicates: Vec<String> = entries
            .iter()
            .filter(|(key, _)| {
                entries
                    .iter()
                    .filter(|(other, _)| other.identity() == key.identity())
                    .count()
                    > 1
            })
            .map(|(key, _)| render_key(key))
            .collect();
        if !duplicates.is_empty() {
            return Err(SchemaError::new(
                address,
                format!("Duplicate keys in table: {}", repr_list(&duplicates)),
            ));
        }

        Ok(self.arena.push(Element::Table(TableType { entries })))
    }

    fn compile_union(&mut self, table: &toml::Table, mode: UnionMode, address: &str) -> Result<ElementId> {
        if table.len() != 1 {
            return Err(SchemaError::new(
                address,
                "Union table must contain exactly one element.",
            ));
        }
        let Some(Value::Array(options)) = table.values().next() else {
            return Err(SchemaError::new(address, "Union value must be a list."));
        };

        let mut members = Vec::with_capacity(options.len());
        for (index, option) in options.iter().enumerate() {
            members.push(self.compile_value(option, &format!("{address}[{index}]"))?);
        }

        let duplicated = members.iter().enumerate().any(|(i, a)| {
            members[i + 1..]
                .iter()
                .any(|b| elements_equal(&self.arena, *a, &self.arena, *b))
        });
        if duplicated {
            return Err(SchemaError::new(address, "Union must not have duplicates."));
        }
        if mode == UnionMode::None && members.len() != 1 {
            return Err(SchemaError::new(
                address,
                "Union 'none' must contain exactly one type option.",
            ));
        }
        if mode != UnionMode::None && members.len() < 2 {
            return Err(SchemaError::new(
                address,
                "Union should contain at least 2 type options.",
            ));
        }
        if members
            .iter()
            .any(|member| matches!(self.arena.get(*member), Element::AnyValue))
        {
            return Err(SchemaError::new(
                address,
                "'any-value' cannot be part of a union schema.",
            ));
        }

        Ok(self.arena.push(Element::Union(UnionType { members, mode })))
    }

    fn compile_array(&mut self, items: &[Value], address: &str) -> Result<ElementId> {
        let mut options = ArrayOptions::default();
        let mut members = Vec::with_capacity(1);
        for (index, item) in items.iter().enumerate() {
            let item_address = format!("{address}[{index}]");
            if let Value::String(text) = item {
                if self.apply_array_option(text, &item_address, &mut options)? {
                    continue;
                }
            }
            members.push(self.compile_value(item, &item_address)?);
        }

        let member = match members.as_slice() {
            [] => return Err(SchemaError::new(address, "Empty array not allowed in schema.")),
            [member] => *member,
            _ => {
                return Err(SchemaError::new(
                    address,
                    "More than one element not allowed in array schema.",
                ))
            }
        };
        Ok(self.arena.push(Element::Array(ArrayType {
            member,
            min_items: options.min_items,
            max_items: options.max_items,
            unique_items: options.unique_items,
        })))
    }

    /// Consume an array constraint string. Returns `false` for anything that
    /// is not one, leaving it to be compiled as the member type.
    fn apply_array_option(
        &mut self,
        text: &str,
        address: &str,
        options: &mut ArrayOptions,
    ) -> Result<bool> {
        if !text.contains('=') {
            return Ok(false);
        }
        let Ok(parsed) = toml::from_str::<toml::Table>(text) else {
            return Ok(false);
        };
        let option = match parsed.iter().next() {
            Some((name, value)) if parsed.len() == 1 && ARRAY_OPTIONS.contains(&name.as_str()) => {
                (name.as_str(), value)
            }
            _ => return Ok(false),
        };
        if let Some(meta) = self.meta {
            meta.check_array_option(&parsed)
                .map_err(|err| SchemaError::new(address, format!("'{text}' schema error: {err}")))?;
        }

        // Repeated options: the last one wins.
        match option {
            ("min-items", Value::Integer(n)) => options.min_items = Some(*n),
            ("max-items", Value::Integer(n)) => options.max_items = Some(*n),
            ("unique-items", Value::Boolean(b)) => options.unique_items = *b,
            _ => {}
        }
        Ok(true)
    }

    fn compile_basic(&mut self, text: &str, address: &str) -> Result<ElementId> {
        if !text.contains('=') {
            let element = TypeKeyword::from_keyword(text)
                .filter(|keyword| self.accepts_bare(*keyword))
                .and_then(bare_element)
                .ok_or_else(|| {
                    SchemaError::new(address, format!("'{text}' is not a valid keyword type."))
                })?;
            return Ok(self.arena.push(element));
        }

        tracing::trace!(declaration = text, address, "compiling embedded type declaration");
        let parsed: toml::Table = toml::from_str(text).map_err(|err| {
            SchemaError::new(
                address,
                format!("'{text}' is not a valid type: {}", toml_error_message(&err, text)),
            )
        })?;
        if let Some(meta) = self.meta {
            meta.check_type(&parsed).map_err(|err| {
                SchemaError::new(address, format!("'{text}' schema error: {err}"))
            })?;
        }
        let Some((name, options)) = single_entry(&parsed) else {
            return Err(single_key_error(text, address));
        };
        let keyword = TypeKeyword::from_keyword(name).ok_or_else(|| {
            SchemaError::new(address, format!("'{text}' is not a valid keyword type."))
        })?;

        let element = match (keyword, options) {
            (TypeKeyword::String, Value::Table(options)) => Element::String(StringType {
                min_len: integer_option(options, "min-len"),
                max_len: integer_option(options, "max-len"),
            }),
            (TypeKeyword::Integer, Value::Table(options)) => Element::Integer(IntegerType {
                min: integer_option(options, "min"),
                max: integer_option(options, "max"),
            }),
            (TypeKeyword::Float, Value::Table(options)) => Element::Float(FloatType {
                min: float_option(options, "min"),
                max: float_option(options, "max"),
            }),
            (TypeKeyword::Enum, Value::Array(values)) => {
                Element::Enum(enum_type(values, text, address)?)
            }
            (TypeKeyword::Pattern, Value::String(pattern)) => {
                let regex = compile_anchored(pattern).map_err(|err| {
                    SchemaError::new(
                        address,
                        format!("String pattern '{pattern}': {}", regex_error_message(&err)),
                    )
                })?;
                Element::Pattern(PatternType {
                    pattern: pattern.clone(),
                    regex,
                })
            }
            (TypeKeyword::Ref, Value::String(path)) => Element::Ref(Reference {
                path: path.clone(),
                slot: self.arena.new_slot(),
                address: address.to_string(),
            }),
            (TypeKeyword::File, Value::String(path)) => Element::File(FileReference {
                path: path.clone(),
                slot: self.arena.new_slot(),
                address: address.to_string(),
            }),
            (keyword, options) => {
                let bare = match options {
                    Value::Table(_) if self.accepts_bare(keyword) => bare_element(keyword),
                    _ => None,
                };
                bare.ok_or_else(|| {
                    SchemaError::new(
                        address,
                        format!("'{text}' schema error: invalid options for '{keyword}'"),
                    )
                })?
            }
        };
        Ok(self.arena.push(element))
    }

    fn parse_key(&mut self, key: &str, address: &str) -> Result<ParsedKey> {
        if !key.contains('=') {
            return match key {
                "union" => Ok(ParsedKey::Union(UnionMode::Any)),
                "*" => Ok(ParsedKey::Key(wildcard(address)?)),
                name => Ok(ParsedKey::Key(KeyMatcher::literal(name))),
            };
        }

        tracing::trace!(key, address, "compiling embedded key declaration");
        let parsed: toml::Table = toml::from_str(key).map_err(|err| {
            SchemaError::new(
                address,
                format!("'{key}' is not a valid TOML: {}", toml_error_message(&err, key)),
            )
        })?;
        if let Some(meta) = self.meta {
            meta.check_key(&parsed, address)?;
        }
        let Some((name, value)) = single_entry(&parsed) else {
            return Err(single_key_error(key, address));
        };

        match (name, value) {
            ("pattern", Value::String(source)) => KeyMatcher::pattern(source.as_str())
                .map(ParsedKey::Key)
                .map_err(|err| {
                    SchemaError::new(
                        address,
                        format!("Key pattern '{source}': {}", regex_error_message(&err)),
                    )
                }),
            ("ref", Value::String(path)) => {
                let slot = self.arena.new_slot();
                Ok(ParsedKey::Key(KeyMatcher::reference(path.as_str(), slot, address)))
            }
            ("union", Value::String(mode)) => UnionMode::from_name(mode)
                .map(ParsedKey::Union)
                .ok_or_else(|| SchemaError::new(address, format!("'{mode}' is not a union mode."))),
            (name, Value::Table(modifiers)) => {
                let required = flag(modifiers, "required");
                let hidden = flag(modifiers, "hidden");
                if name == "*" {
                    if required {
                        return Err(SchemaError::new(
                            address,
                            "Wildcard key '*' cannot be marked as required.",
                        ));
                    }
                    return Ok(ParsedKey::Key(wildcard(address)?.with_hidden(hidden)));
                }
                Ok(ParsedKey::Key(
                    KeyMatcher::literal(name)
                        .with_required(required)
                        .with_hidden(hidden),
                ))
            }
            _ => Err(SchemaError::new(
                address,
                format!("'{key}' is not a valid key declaration."),
            )),
        }
    }

    fn accepts_bare(&self, keyword: TypeKeyword) -> bool {
        match self.meta {
            Some(meta) => meta.accepts_bare(keyword.as_str()),
            None => keyword.takes_option_table(),
        }
    }
}

/// Element for a keyword with default options; `None` for keywords that
/// cannot stand without a value.
fn bare_element(keyword: TypeKeyword) -> Option<Element> {
    let element = match keyword {
        TypeKeyword::String => Element::String(StringType::default()),
        TypeKeyword::Float => Element::Float(FloatType::default()),
        TypeKeyword::Integer => Element::Integer(IntegerType::default()),
        TypeKeyword::Boolean => Element::Boolean,
        TypeKeyword::OffsetDateTime => Element::OffsetDateTime,
        TypeKeyword::LocalDateTime => Element::LocalDateTime,
        TypeKeyword::Date => Element::Date,
        TypeKeyword::Time => Element::Time,
        TypeKeyword::AnyValue => Element::AnyValue,
        TypeKeyword::Enum | TypeKeyword::Pattern | TypeKeyword::Ref | TypeKeyword::File => {
            return None
        }
    };
    Some(element)
}

fn enum_type(values: &[Value], text: &str, address: &str) -> Result<EnumType> {
    let values = values
        .iter()
        .map(|value| match value {
            Value::String(value) => Ok(value.clone()),
            _ => Err(SchemaError::new(
                address,
                format!("'{text}' schema error: enum values must be strings"),
            )),
        })
        .collect::<Result<Vec<String>>>()?;

    let duplicated = values
        .iter()
        .enumerate()
        .any(|(i, a)| values[i + 1..].contains(a));
    if duplicated {
        return Err(SchemaError::new(
            address,
            format!("'enum' must not have duplicates: {}", repr_list(&values)),
        ));
    }
    Ok(EnumType { values })
}

fn wildcard(address: &str) -> Result<KeyMatcher> {
    KeyMatcher::wildcard().map_err(|err| {
        SchemaError::new(
            address,
            format!("Key pattern '{WILDCARD_PATTERN}': {}", regex_error_message(&err)),
        )
    })
}

fn single_entry(table: &toml::Table) -> Option<(&str, &Value)> {
    match table.iter().next() {
        Some((name, value)) if table.len() == 1 => Some((name.as_str(), value)),
        _ => None,
    }
}

fn single_key_error(declaration: &str, address: &str) -> SchemaError {
    let escaped = declaration.replace('\n', "\\n");
    SchemaError::new(address, format!("'{escaped}' must have a single key."))
}

fn integer_option(options: &toml::Table, name: &str) -> Option<i64> {
    options.get(name).and_then(Value::as_integer)
}

fn float_option(options: &toml::Table, name: &str) -> Option<f64> {
    options.get(name).and_then(Value::as_float)
}

fn flag(options: &toml::Table, name: &str) -> bool {
    options.get(name).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::meta_schemas;
    use crate::render::render_element;

    fn compile(text: &str) -> Result<(Arena, ElementId)> {
        let table: toml::Table = toml::from_str(text).unwrap();
        let mut compiler = Compiler::new(Some(meta_schemas().unwrap()));
        let root = compiler.compile_root(&table, "")?;
        Ok((compiler.into_arena(), root))
    }

    fn compile_err(text: &str) -> String {
        compile(text).unwrap_err().to_string()
    }

    #[test]
    fn test_basic_types_render() {
        let (arena, root) = compile(
            r#"
            name = "string = { min-len = 1 }"
            age = "integer = { min = 0, max = 150 }"
            active = "boolean"
            "#,
        )
        .unwrap();
        assert_eq!(
            render_element(&arena, root),
            r#"{ name = "string = { min-len = 1 }", age = "integer = { min = 0, max = 150 }", active = "boolean" }"#
        );
    }

    #[test]
    fn test_keyword_errors() {
        assert_eq!(
            compile_err("name = 'strings'"),
            "'name': 'strings' is not a valid keyword type."
        );
        assert_eq!(
            compile_err("name = 'enum'"),
            "'name': 'enum' is not a valid keyword type."
        );
        assert_eq!(compile_err("name = 3"), "'name': Schema type '3' not a string.");
    }

    #[test]
    fn test_malformed_declarations_single_line() {
        let message = compile_err(r#"x = "integer = { min = }""#);
        assert!(
            message.starts_with("'x': 'integer = { min = }' is not a valid type: "),
            "{message}"
        );
        assert!(!message.contains('\n'), "{message}");

        let message = compile_err(r#""a = { required = }" = "string""#);
        assert!(
            message.starts_with("root: 'a = { required = }' is not a valid TOML: "),
            "{message}"
        );
        assert!(!message.contains('\n'), "{message}");
    }

    #[test]
    fn test_value_keywords_never_bare() {
        assert_eq!(
            compile_err("name = 'ref'"),
            "'name': 'ref' is not a valid keyword type."
        );
        let message = compile_err("name = 'enum = { }'");
        assert!(message.starts_with("'name': 'enum = { }' schema error: "), "{message}");

        for keyword in [TypeKeyword::Enum, TypeKeyword::Pattern, TypeKeyword::Ref, TypeKeyword::File] {
            assert!(bare_element(keyword).is_none(), "{keyword}");
        }
        assert!(matches!(bare_element(TypeKeyword::AnyValue), Some(Element::AnyValue)));
    }

    #[test]
    fn test_value_keywords_rejected_while_bootstrapping() {
        let table: toml::Table = toml::from_str("name = 'file = { }'").unwrap();
        let err = Compiler::new(None).compile_root(&table, "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'name': 'file = { }' schema error: invalid options for 'file'"
        );
    }

    #[test]
    fn test_single_key_required() {
        assert_eq!(
            compile_err(r#"name = "string = { }\ninteger = { }""#),
            r#"'name': 'string = { }\ninteger = { }' must have a single key."#
        );
    }

    #[test]
    fn test_type_option_errors() {
        let message = compile_err("age = 'integer = { minimum = 0 }'");
        assert!(
            message.starts_with("'age': 'integer = { minimum = 0 }' schema error: 'integer': Key 'minimum' not in schema"),
            "{message}"
        );
        assert_eq!(
            compile_err("colour = \"enum = [ 'Red', 'Blue', 'Blue' ]\""),
            "'colour': 'enum' must not have duplicates: ['Red', 'Blue', 'Blue']"
        );
        assert!(compile_err("code = \"pattern = '(ab'\"").starts_with("'code': String pattern '(ab': "));
    }

    #[test]
    fn test_arrays() {
        assert_eq!(compile_err("fruit = []"), "'fruit': Empty array not allowed in schema.");
        assert_eq!(
            compile_err("fruit = ['string', 'boolean']"),
            "'fruit': More than one element not allowed in array schema."
        );
        let (arena, root) = compile(
            r#"numbers = [ "integer", "min-items = 0", "min-items = 2", "unique-items = false" ]"#,
        )
        .unwrap();
        assert_eq!(
            render_element(&arena, root),
            r#"{ numbers = [ "integer", "min-items = 2" ] }"#
        );
    }

    #[test]
    fn test_unions() {
        assert_eq!(
            compile_err("number = { union = [ 'integer' ] }"),
            "'number': Union should contain at least 2 type options."
        );
        assert_eq!(
            compile_err("number = { union = [ 'integer', 'float', 'integer' ] }"),
            "'number': Union must not have duplicates."
        );
        assert_eq!(
            compile_err("number = { union = [ 'integer', 'float', 'any-value' ] }"),
            "'number': 'any-value' cannot be part of a union schema."
        );
        assert_eq!(
            compile_err("number = { union = 'integer' }"),
            "'number': Union value must be a list."
        );
        assert_eq!(
            compile_err("number = { union = [ 'integer', 'float' ], other = 'string' }"),
            "'number': Union table must contain exactly one element."
        );
        assert_eq!(
            compile_err(r#"number = { "union = 'none'" = [ 'integer', 'float' ] }"#),
            "'number': Union 'none' must contain exactly one type option."
        );
        assert_eq!(compile_err("union = 'string'"), "root: 'union' cannot be a schema key");
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            compile_err(r#""'*' = { required = true }" = "string""#),
            "root: Wildcard key '*' cannot be marked as required."
        );
        assert_eq!(
            compile_err(r#""apple = { banana = 'string' }" = "string""#),
            r#"'apple': Value {'banana': 'string'} not in: { union = [ { required = "boolean" }, { hidden = "boolean" } ] }"#
        );
        assert!(compile_err(r#""apple = required = true" = "string""#)
            .starts_with("root: 'apple = required = true' is not a valid TOML: "));
        assert!(compile_err(r#""pattern = '(x'" = "string""#).starts_with("root: Key pattern '(x': "));
    }

    #[test]
    fn test_duplicate_keys() {
        assert_eq!(
            compile_err(r#"name = "string"
"name = { required = true }" = "string""#),
            r#"root: Duplicate keys in table: ['name', '"name = { required = true }"']"#
        );
        assert!(compile(
            r#"name = "string"
"name = { hidden = true }" = "string""#
        )
        .is_ok());
    }
}
