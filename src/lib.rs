//! TOML Obvious Minimal Schema
//!
//! Describe the shape of a TOML document in TOML, then validate documents
//! against it.
//!
//! ## Declaration grammar
//!
//! ```toml
//! title = "string"
//! "version = { required = true }" = "pattern = '^[0-9]+\\.[0-9]+$'"
//! ports = [ "integer = { min = 1, max = 65535 }", "unique-items = true" ]
//! owner = { name = "string", dob = "offset-date-time" }
//! number = { union = [ "integer", "float" ] }
//! "*" = "any-value"
//! ```
//!
//! - Values are type keywords, embedded `"<type> = <options>"` declarations,
//!   nested tables, single-member arrays or unions.
//! - Keys may be embedded declarations too, carrying `required`/`hidden`
//!   modifiers, a key `pattern` or a key `ref`.
//! - `"ref = 'a.b'"` points into the same schema (hidden keys included),
//!   `"file = 'other.toml'"` into another schema file.
//!
//! ## Usage
//!
//! ```
//! let schema = toml_schema::loads("title = 'string'").unwrap();
//! let document: toml::Table = toml::from_str("title = 5").unwrap();
//! let err = schema.validate(&document).unwrap_err();
//! assert_eq!(err.to_string(), "'title': Value 5 is not: \"string\"");
//! ```

mod arena;
mod compiler;
pub mod config;
pub mod element;
mod equality;
pub mod error;
pub mod key;
pub mod loader;
mod meta;
mod render;
mod resolver;
pub mod schema;
pub mod validate;

pub use config::Settings;
pub use element::{Element, ElementId, TypeKeyword, UnionMode};
pub use error::{ErrorKind, LoadError, Result, SchemaError};
pub use key::KeyMatcher;
pub use loader::{from_file, from_toml_table, from_toml_table_at, loads, loads_at, read_document};
pub use schema::{Node, Schema};
pub use validate::{FormatCheck, ValidateOptions};
