//! Entry points: build a [`Schema`] from text, a file or a parsed table, and
//! read documents to validate.

use std::fs;
use std::path::Path;

use crate::compiler::Compiler;
use crate::error::{toml_error_message, LoadError, Result};
use crate::meta::meta_schemas;
use crate::resolver::Resolver;
use crate::schema::Schema;

/// Compile a schema from TOML text. `file` references are rejected.
pub fn loads(text: &str) -> std::result::Result<Schema, LoadError> {
    let table = parse(text, None)?;
    Ok(from_toml_table(&table)?)
}

/// Compile a schema from TOML text that was read from `path`; `file`
/// references resolve relative to it.
pub fn loads_at(text: &str, path: impl AsRef<Path>) -> std::result::Result<Schema, LoadError> {
    let path = path.as_ref();
    let table = parse(text, Some(path))?;
    Ok(from_toml_table_at(&table, Some(path))?)
}

/// Read and compile a schema file.
pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Schema, LoadError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading schema");
    let table = read_document(path)?;
    Ok(from_toml_table_at(&table, Some(path))?)
}

/// Compile a schema from an already parsed table.
pub fn from_toml_table(table: &toml::Table) -> Result<Schema> {
    from_toml_table_at(table, None)
}

/// Compile a schema from an already parsed table, read from `path`.
pub fn from_toml_table_at(table: &toml::Table, path: Option<&Path>) -> Result<Schema> {
    let mut compiler = Compiler::new(Some(meta_schemas()?));
    let root = compiler.compile_root(table, "")?;
    let mut resolver = Resolver::new(compiler);
    resolver.resolve_root(root, path)?;
    Ok(Schema::new(
        resolver.into_arena(),
        root,
        path.map(Path::to_path_buf),
    ))
}

/// Read and parse a TOML document.
pub fn read_document(path: impl AsRef<Path>) -> std::result::Result<toml::Table, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, Some(path))
}

fn parse(text: &str, path: Option<&Path>) -> std::result::Result<toml::Table, LoadError> {
    toml::from_str(text).map_err(|err| LoadError::Parse {
        path: path.map(Path::to_path_buf),
        message: toml_error_message(&err, text),
    })
}
