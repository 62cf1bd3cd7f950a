//! Canonical printer
//!
//! Renders elements back to the declaration grammar, emitting only non-default
//! options, and renders document values for error messages.

use toml::Value;

use crate::arena::Arena;
use crate::element::{Element, ElementId, UnionMode};
use crate::key::{KeyKind, KeyMatcher, WILDCARD_PATTERN};

/// Render an element in canonical declaration form.
pub(crate) fn render_element(arena: &Arena, id: ElementId) -> String {
    match arena.get(id) {
        Element::String(string) => {
            let mut options = Vec::new();
            if let Some(min_len) = string.min_len {
                options.push(format!("min-len = {min_len}"));
            }
            if let Some(max_len) = string.max_len {
                options.push(format!("max-len = {max_len}"));
            }
            basic_type("string", &options)
        }
        Element::Enum(enumeration) => {
            let values: Vec<String> = enumeration.values.iter().map(|v| toml_string(v)).collect();
            if values.is_empty() {
                quote_basic("enum = [ ]")
            } else {
                quote_basic(&format!("enum = [ {} ]", values.join(", ")))
            }
        }
        Element::Pattern(pattern) => {
            quote_basic(&format!("pattern = {}", toml_string(&pattern.pattern)))
        }
        Element::Float(float) => {
            let mut options = Vec::new();
            if let Some(min) = float.min {
                options.push(format!("min = {}", format_float(min)));
            }
            if let Some(max) = float.max {
                options.push(format!("max = {}", format_float(max)));
            }
            basic_type("float", &options)
        }
        Element::Integer(integer) => {
            let mut options = Vec::new();
            if let Some(min) = integer.min {
                options.push(format!("min = {min}"));
            }
            if let Some(max) = integer.max {
                options.push(format!("max = {max}"));
            }
            basic_type("integer", &options)
        }
        Element::Boolean => basic_type("boolean", &[]),
        Element::OffsetDateTime => basic_type("offset-date-time", &[]),
        Element::LocalDateTime => basic_type("local-date-time", &[]),
        Element::Date => basic_type("date", &[]),
        Element::Time => basic_type("time", &[]),
        Element::AnyValue => basic_type("any-value", &[]),
        Element::Ref(reference) => quote_basic(&format!("ref = {}", toml_string(&reference.path))),
        Element::File(file) => quote_basic(&format!("file = {}", toml_string(&file.path))),
        Element::Table(table) => {
            if table.entries.is_empty() {
                return "{ }".to_string();
            }
            let entries: Vec<String> = table
                .entries
                .iter()
                .map(|(key, value)| format!("{} = {}", render_key(key), render_element(arena, *value)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
        Element::Array(array) => {
            let mut items = vec![render_element(arena, array.member)];
            if let Some(min_items) = array.min_items {
                items.push(quote_basic(&format!("min-items = {min_items}")));
            }
            if let Some(max_items) = array.max_items {
                items.push(quote_basic(&format!("max-items = {max_items}")));
            }
            if array.unique_items {
                items.push(quote_basic("unique-items = true"));
            }
            format!("[ {} ]", items.join(", "))
        }
        Element::Union(union) => {
            let members: Vec<String> = union
                .members
                .iter()
                .map(|member| render_element(arena, *member))
                .collect();
            let marker = match union.mode {
                UnionMode::Any => "union".to_string(),
                mode => quote_basic(&format!("union = '{mode}'")),
            };
            format!("{{ {marker} = [ {} ] }}", members.join(", "))
        }
    }
}

fn basic_type(keyword: &str, options: &[String]) -> String {
    if options.is_empty() {
        quote_basic(keyword)
    } else {
        quote_basic(&format!("{keyword} = {{ {} }}", options.join(", ")))
    }
}

/// Render a table key, re-embedding its modifiers when any is set.
pub(crate) fn render_key(key: &KeyMatcher) -> String {
    let modifier = if key.required {
        Some("required")
    } else if key.hidden {
        Some("hidden")
    } else {
        None
    };
    match (&key.kind, modifier) {
        (KeyKind::Literal, Some(modifier)) => {
            quote_basic(&format!("{} = {{ {modifier} = true }}", toml_key_name(&key.name)))
        }
        // A bare `union` is the union marker and a bare key with `=` is an
        // embedded declaration, so these names need the explicit form.
        (KeyKind::Literal, None) if key.name == "union" || key.name.contains('=') => {
            quote_basic(&format!("{} = {{ }}", toml_key_name(&key.name)))
        }
        (KeyKind::Literal, None) => toml_key_name(&key.name),
        (KeyKind::Pattern { source, .. }, Some(modifier)) if source == WILDCARD_PATTERN => {
            quote_basic(&format!("\"*\" = {{ {modifier} = true }}"))
        }
        (KeyKind::Pattern { source, .. }, _) => {
            quote_basic(&format!("pattern = {}", toml_string(source)))
        }
        (KeyKind::Ref { path, .. }, _) => quote_basic(&format!("ref = {}", toml_string(path))),
    }
}

fn is_bare_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Quote a TOML key only when it is not a bare key.
pub(crate) fn toml_key_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(is_bare_key_char) {
        name.to_string()
    } else {
        quote_basic(name)
    }
}

/// TOML basic (double-quoted) string.
pub(crate) fn quote_basic(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// TOML string, preferring the literal (single-quoted) form.
pub(crate) fn toml_string(text: &str) -> String {
    if text.contains('\'') || text.chars().any(|c| c.is_control() && c != '\t') {
        quote_basic(text)
    } else {
        format!("'{text}'")
    }
}

/// Floats always carry a fraction or exponent so they re-parse as floats.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:?}")
    }
}

/// A document value as shown in messages: strings unquoted at top level.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => repr_value(other),
    }
}

fn repr_value(value: &Value) -> String {
    match value {
        Value::String(text) => repr_str(text),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(datetime) => datetime.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(repr_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Table(table) => {
            let entries: Vec<String> = table
                .iter()
                .map(|(key, value)| format!("{}: {}", repr_str(key), repr_value(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Quoted string for messages: single quotes unless the text contains one.
pub(crate) fn repr_str(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub(crate) fn repr_list<S: AsRef<str>>(values: &[S]) -> String {
    let values: Vec<String> = values.iter().map(|v| repr_str(v.as_ref())).collect();
    format!("[{}]", values.join(", "))
}

/// `None` when the rendering is too long to be worth quoting in a message.
pub(crate) fn bounded(rendering: String, limit: usize) -> Option<String> {
    (rendering.chars().count() <= limit).then_some(rendering)
}
