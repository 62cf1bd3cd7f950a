//! Bootstrap meta-schemas
//!
//! The option syntax of embedded declarations is itself described in the
//! declaration grammar and compiled by the same [`Compiler`], with meta
//! checking switched off while bootstrapping. The compiled schemas are built
//! once per process.

use once_cell::sync::Lazy;

use crate::arena::Arena;
use crate::compiler::Compiler;
use crate::element::{Element, ElementId};
use crate::error::{Result, SchemaError};
use crate::validate::{ValidateOptions, Validator};

/// Options accepted by each basic type keyword
const TYPES_SCHEMA: &str = r#"
string = { min-len = "integer", max-len = "integer" }
enum = [ "string" ]
pattern = "string"
float = { min = "float", max = "float" }
integer = { min = "integer", max = "integer" }
boolean = { }
offset-date-time = { }
local-date-time = { }
date = { }
time = { }
any-value = { }
ref = "string"
file = "string"
"#;

/// Modifiers a table key may carry
const KEY_SCHEMA: &str = r#"
"*" = { union = [ { required = "boolean" }, { hidden = "boolean" } ] }
"pattern = { required = false }" = { union = [ "string", { required = "boolean" } ] }
"ref = { required = false }" = { union = [ "string", { required = "boolean" } ] }
"union = { required = false }" = { union = [ "enum = [ 'any', 'all', 'one', 'none' ]", { required = "boolean" } ] }
"#;

/// Constraint strings allowed among the members of an array schema
const ARRAY_OPTIONS_SCHEMA: &str = r#"
min-items = "integer"
max-items = "integer"
unique-items = "boolean"
"#;

/// Names of the array constraint options
pub(crate) const ARRAY_OPTIONS: [&str; 3] = ["min-items", "max-items", "unique-items"];

static META_SCHEMAS: Lazy<Result<MetaSchemas>> = Lazy::new(MetaSchemas::bootstrap);

/// The compiled meta-schemas, built on first use.
pub(crate) fn meta_schemas() -> Result<&'static MetaSchemas> {
    META_SCHEMAS.as_ref().map_err(Clone::clone)
}

#[derive(Debug)]
pub(crate) struct MetaSchemas {
    arena: Arena,
    types: ElementId,
    keys: ElementId,
    array_options: ElementId,
}

impl MetaSchemas {
    fn bootstrap() -> Result<Self> {
        let mut compiler = Compiler::new(None);
        let types = compiler.compile_root(&parse(TYPES_SCHEMA)?, "")?;
        let keys = compiler.compile_root(&parse(KEY_SCHEMA)?, "")?;
        let array_options = compiler.compile_root(&parse(ARRAY_OPTIONS_SCHEMA)?, "")?;
        tracing::debug!("bootstrap meta-schemas compiled");
        Ok(Self {
            arena: compiler.into_arena(),
            types,
            keys,
            array_options,
        })
    }

    /// Check a parsed `"<type> = <options>"` declaration.
    pub fn check_type(&self, declaration: &toml::Table) -> Result<()> {
        self.check(self.types, declaration, "")
    }

    /// Check a parsed `"<name> = <modifiers>"` key declaration; errors are
    /// located under `location`.
    pub fn check_key(&self, declaration: &toml::Table, location: &str) -> Result<()> {
        self.check(self.keys, declaration, location)
    }

    /// Check a parsed `"<array-option> = <value>"` constraint.
    pub fn check_array_option(&self, declaration: &toml::Table) -> Result<()> {
        self.check(self.array_options, declaration, "")
    }

    /// A type keyword may appear bare only if its options are a table.
    pub fn accepts_bare(&self, keyword: &str) -> bool {
        self.arena
            .get(self.types)
            .as_table()
            .and_then(|table| table.get_literal(keyword))
            .is_some_and(|(_, id)| matches!(self.arena.get(id), Element::Table(_)))
    }

    fn check(&self, root: ElementId, declaration: &toml::Table, location: &str) -> Result<()> {
        let options = ValidateOptions::default();
        Validator::new(&self.arena, &options).validate_table(root, declaration, location)
    }
}

fn parse(text: &str) -> Result<toml::Table> {
    toml::from_str(text)
        .map_err(|err| SchemaError::new("", format!("Invalid meta-schema: {}", err.message())))
}
