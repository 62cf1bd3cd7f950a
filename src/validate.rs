//! Document validation
//!
//! Walks a parsed TOML value against a compiled element tree and reports the
//! first mismatch with its location. Wildcard/reference key matching and
//! union member trials are probes: a member's error only means "no match",
//! except for the recursion limit, which always propagates.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use toml::Value;

use crate::arena::Arena;
use crate::element::{Element, ElementId, RefId, TableType, UnionMode, UnionType};
use crate::error::{Result, SchemaError};
use crate::key::KeyKind;
use crate::render::{bounded, display_value, format_float, render_element, repr_list, repr_str};

/// Default maximum nesting of element descents during one validation
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default length past which schema renderings are left out of messages
pub const DEFAULT_RENDER_LIMIT: usize = 80;

/// Caller-supplied check run after a `ref` to a registered path validates
pub type FormatCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Knobs for a validation run
#[derive(Clone)]
pub struct ValidateOptions {
    pub max_depth: usize,
    pub render_limit: usize,
    formats: HashMap<String, FormatCheck>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            render_limit: DEFAULT_RENDER_LIMIT,
            formats: HashMap::new(),
        }
    }
}

impl fmt::Debug for ValidateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<&String> = self.formats.keys().collect();
        formats.sort();
        f.debug_struct("ValidateOptions")
            .field("max_depth", &self.max_depth)
            .field("render_limit", &self.render_limit)
            .field("formats", &formats)
            .finish()
    }
}

impl ValidateOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_render_limit(mut self, render_limit: usize) -> Self {
        self.render_limit = render_limit;
        self
    }

    /// Register a format check for values reached through `ref = '<path>'`.
    ///
    /// The check runs only after the referenced schema accepted the value;
    /// returning `false` fails with `Invalid format <path>`.
    pub fn with_format<F>(mut self, path: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.formats.insert(path.into(), Arc::new(check));
        self
    }
}

pub(crate) struct Validator<'a> {
    arena: &'a Arena,
    options: &'a ValidateOptions,
}

impl<'a> Validator<'a> {
    pub fn new(arena: &'a Arena, options: &'a ValidateOptions) -> Self {
        Self { arena, options }
    }

    pub fn validate(&self, id: ElementId, value: &Value, location: &str) -> Result<()> {
        self.element(id, value, location, 0)
    }

    pub fn validate_table(&self, id: ElementId, document: &toml::Table, location: &str) -> Result<()> {
        match self.arena.get(id) {
            Element::Table(table) => self.table(id, table, document, location, 0),
            _ => self.validate(id, &Value::Table(document.clone()), location),
        }
    }

    fn element(&self, id: ElementId, value: &Value, location: &str, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(SchemaError::recursion_limit(location, self.options.max_depth));
        }

        match self.arena.get(id) {
            Element::String(string) => {
                let Value::String(text) = value else {
                    return Err(self.mismatch(id, value, location));
                };
                let len = text.chars().count() as i64;
                if let Some(min_len) = string.min_len {
                    if len < min_len {
                        return Err(SchemaError::new(
                            location,
                            format!("len({}) < {min_len}", repr_str(text)),
                        ));
                    }
                }
                if let Some(max_len) = string.max_len {
                    if len > max_len {
                        return Err(SchemaError::new(
                            location,
                            format!("len({}) > {max_len}", repr_str(text)),
                        ));
                    }
                }
                Ok(())
            }
            Element::Enum(enumeration) => {
                let Value::String(text) = value else {
                    return Err(not_a_string(value, location));
                };
                if enumeration.values.iter().any(|v| v == text) {
                    return Ok(());
                }
                let message = match bounded(repr_list(&enumeration.values), self.options.render_limit) {
                    Some(values) => format!("'{text}' not in: {values}"),
                    None => format!("'{text}' not in enum."),
                };
                Err(SchemaError::new(location, message))
            }
            Element::Pattern(pattern) => {
                let Value::String(text) = value else {
                    return Err(not_a_string(value, location));
                };
                if pattern.regex.is_match(text) {
                    Ok(())
                } else {
                    Err(SchemaError::new(
                        location,
                        format!("'{text}' does not match pattern: {}", pattern.pattern),
                    ))
                }
            }
            Element::Float(float) => {
                let Value::Float(number) = value else {
                    return Err(self.mismatch(id, value, location));
                };
                // NaN compares false either way, so NaN values and NaN
                // bounds never fail the range checks.
                if let Some(min) = float.min {
                    if *number < min {
                        return Err(out_of_range(&format_float(*number), "<", &format_float(min), location));
                    }
                }
                if let Some(max) = float.max {
                    if *number > max {
                        return Err(out_of_range(&format_float(*number), ">", &format_float(max), location));
                    }
                }
                Ok(())
            }
            Element::Integer(integer) => {
                let Value::Integer(number) = value else {
                    return Err(self.mismatch(id, value, location));
                };
                if let Some(min) = integer.min {
                    if *number < min {
                        return Err(out_of_range(&number.to_string(), "<", &min.to_string(), location));
                    }
                }
                if let Some(max) = integer.max {
                    if *number > max {
                        return Err(out_of_range(&number.to_string(), ">", &max.to_string(), location));
                    }
                }
                Ok(())
            }
            Element::Boolean => match value {
                Value::Boolean(_) => Ok(()),
                _ => Err(self.mismatch(id, value, location)),
            },
            Element::OffsetDateTime => match value {
                Value::Datetime(dt) if dt.date.is_some() && dt.time.is_some() => {
                    if dt.offset.is_some() {
                        Ok(())
                    } else {
                        Err(SchemaError::new(
                            location,
                            format!("'offset-date-time' has no offset: {dt}"),
                        ))
                    }
                }
                _ => Err(self.mismatch(id, value, location)),
            },
            Element::LocalDateTime => match value {
                Value::Datetime(dt) if dt.date.is_some() && dt.time.is_some() => {
                    if dt.offset.is_none() {
                        Ok(())
                    } else {
                        Err(SchemaError::new(
                            location,
                            format!("'local-date-time' is not local: {dt}"),
                        ))
                    }
                }
                _ => Err(self.mismatch(id, value, location)),
            },
            Element::Date => match value {
                Value::Datetime(dt) if dt.date.is_some() && dt.time.is_none() => Ok(()),
                _ => Err(self.mismatch(id, value, location)),
            },
            Element::Time => match value {
                Value::Datetime(dt) if dt.date.is_none() && dt.time.is_some() => Ok(()),
                _ => Err(self.mismatch(id, value, location)),
            },
            Element::AnyValue => Ok(()),
            Element::Table(table) => {
                let Value::Table(document) = value else {
                    return Err(self.mismatch(id, value, location));
                };
                self.table(id, table, document, location, depth)
            }
            Element::Array(array) => {
                let Value::Array(items) = value else {
                    return Err(self.mismatch(id, value, location));
                };
                let count = items.len() as i64;
                if let Some(min_items) = array.min_items {
                    if count < min_items {
                        return Err(SchemaError::new(
                            location,
                            format!("Array has less than {min_items} items."),
                        ));
                    }
                }
                if let Some(max_items) = array.max_items {
                    if count > max_items {
                        return Err(SchemaError::new(
                            location,
                            format!("Array has more than {max_items} items."),
                        ));
                    }
                }
                if array.unique_items && has_duplicates(items) {
                    return Err(SchemaError::new(location, "Array has duplicate values."));
                }
                for (index, item) in items.iter().enumerate() {
                    self.element(array.member, item, &format!("{location}[{index}]"), depth + 1)?;
                }
                Ok(())
            }
            Element::Union(union) => self.union(id, union, value, location, depth),
            Element::Ref(reference) => {
                let target = self.target(reference.slot, &reference.path, location)?;
                self.element(target, value, location, depth + 1)?;
                if let Some(check) = self.options.formats.get(&reference.path) {
                    if !check(value) {
                        return Err(SchemaError::new(
                            location,
                            format!("Invalid format {}", reference.path),
                        ));
                    }
                }
                Ok(())
            }
            Element::File(file) => {
                let target = self.target(file.slot, &file.path, location)?;
                self.element(target, value, location, depth + 1)
            }
        }
    }

    fn table(
        &self,
        id: ElementId,
        table: &TableType,
        document: &toml::Table,
        location: &str,
        depth: usize,
    ) -> Result<()> {
        for (key, value) in document {
            let Some(schema) = self.match_key(table, key, location, depth)? else {
                let message = match bounded(render_element(self.arena, id), self.options.render_limit) {
                    Some(rendering) => format!("Key '{key}' not in schema: {rendering}"),
                    None => format!("Key '{key}' not in schema."),
                };
                return Err(SchemaError::new(location, message));
            };
            let key_location = if location.is_empty() {
                key.clone()
            } else {
                format!("{location}.{key}")
            };
            self.element(schema, value, &key_location, depth + 1)?;
        }

        for key in table.keys() {
            if key.required && !document.contains_key(&key.name) {
                return Err(SchemaError::new(
                    location,
                    format!("Missing required key: {}", key.name),
                ));
            }
        }
        Ok(())
    }

    /// Literal names first, then pattern and reference keys in declaration
    /// order. Hidden keys never match document keys.
    fn match_key(&self, table: &TableType, key: &str, location: &str, depth: usize) -> Result<Option<ElementId>> {
        if let Some((_, id)) = table.get_literal(key) {
            return Ok(Some(id));
        }
        for (matcher, id) in &table.entries {
            if matcher.hidden {
                continue;
            }
            match &matcher.kind {
                KeyKind::Literal => {}
                KeyKind::Pattern { regex, .. } => {
                    if regex.is_match(key) {
                        return Ok(Some(*id));
                    }
                }
                KeyKind::Ref { path, slot, .. } => {
                    let target = self.target(*slot, path, location)?;
                    let probe = Value::String(key.to_string());
                    match self.element(target, &probe, location, depth + 1) {
                        Ok(()) => return Ok(Some(*id)),
                        Err(err) if err.is_fatal() => return Err(err),
                        Err(_) => {}
                    }
                }
            }
        }
        Ok(None)
    }

    fn union(&self, id: ElementId, union: &UnionType, value: &Value, location: &str, depth: usize) -> Result<()> {
        let mut matched = 0;
        for member in &union.members {
            match self.element(*member, value, location, depth + 1) {
                Ok(()) => {
                    if union.mode == UnionMode::Any {
                        return Ok(());
                    }
                    matched += 1;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => {
                    if union.mode == UnionMode::None {
                        return Ok(());
                    }
                }
            }
        }

        let accepted = match union.mode {
            UnionMode::All => matched == union.members.len(),
            UnionMode::One => matched == 1,
            UnionMode::Any | UnionMode::None => false,
        };
        if accepted {
            return Ok(());
        }

        let phrase = match union.mode {
            UnionMode::Any => "not",
            UnionMode::All => "does not match all",
            UnionMode::One => "does not match exactly one",
            UnionMode::None => "does not match none",
        };
        let shown = display_value(value);
        let message = match bounded(render_element(self.arena, id), self.options.render_limit) {
            Some(rendering) => format!("Value {shown} {phrase} in: {rendering}"),
            None => format!("Value {shown} {phrase} in union."),
        };
        Err(SchemaError::new(location, message))
    }

    fn target(&self, slot: RefId, path: &str, location: &str) -> Result<ElementId> {
        self.arena
            .target(slot)
            .ok_or_else(|| SchemaError::new(location, format!("Unresolved reference: {path}")))
    }

    fn mismatch(&self, id: ElementId, value: &Value, location: &str) -> SchemaError {
        SchemaError::new(
            location,
            format!(
                "Value {} is not: {}",
                display_value(value),
                render_element(self.arena, id)
            ),
        )
    }
}

fn not_a_string(value: &Value, location: &str) -> SchemaError {
    SchemaError::new(
        location,
        format!("Value {} is not a string.", display_value(value)),
    )
}

fn out_of_range(value: &str, op: &str, bound: &str, location: &str) -> SchemaError {
    SchemaError::new(location, format!("Value out of range: {value} {op} {bound}"))
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, a)| items[i + 1..].iter().any(|b| a == b))
}
