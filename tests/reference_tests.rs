//! `ref` values, `ref` keys, hidden keys and `file` references

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use toml_schema::{from_file, loads, loads_at, LoadError};

fn table(text: &str) -> toml::Table {
    toml::from_str(text).unwrap()
}

fn validate_err(schema: &str, document: &str) -> String {
    loads(schema)
        .unwrap()
        .validate(&table(document))
        .unwrap_err()
        .to_string()
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

// =============================================================================
// Reference values
// =============================================================================

#[test]
fn test_reference_to_sibling() {
    let schema = r#"
        [person]
        name = "string"
        friend = "ref = 'person.name'"
    "#;
    let schema = loads(schema).unwrap();
    schema
        .validate(&table("person.name = 'Ann'\nperson.friend = 'Bob'"))
        .unwrap();
    assert_eq!(
        schema
            .validate(&table("person.friend = 7"))
            .unwrap_err()
            .to_string(),
        "'person.friend': Value 7 is not: \"string\""
    );
}

#[test]
fn test_reference_to_table_renders_path() {
    let schema = loads(
        r#"
        home = "ref = 'address'"
        [address]
        street = "string"
        "#,
    )
    .unwrap();
    assert_eq!(
        schema.to_string(),
        r#"{ home = "ref = 'address'", address = { street = "string" } }"#
    );
    schema.validate(&table("home.street = 'Main'")).unwrap();
    assert_eq!(
        schema
            .validate(&table("home.number = 3"))
            .unwrap_err()
            .to_string(),
        "'home': Key 'number' not in schema: { street = \"string\" }"
    );
}

#[test]
fn test_reference_errors() {
    assert_eq!(
        loads("name = \"ref = 'missing'\"").unwrap_err().to_string(),
        "'name': Reference to non-existing key: missing"
    );
    assert_eq!(
        loads("name = 'string'\nfull = \"ref = 'name.first'\"")
            .unwrap_err()
            .to_string(),
        "'full': Reference to non-existing sub-key: name.first"
    );
    assert_eq!(
        loads("name = \"ref = 5\"").unwrap_err().to_string(),
        "'name': 'ref = 5' schema error: 'ref': Value 5 is not: \"string\""
    );
}

#[test]
fn test_recursive_structure() {
    let schema = loads(
        r#"
        tree = "ref = 'node'"

        ["node = { hidden = true }"]
        name = "string"
        children = [ "ref = 'node'" ]
        "#,
    )
    .unwrap();
    schema
        .validate(&table(
            r#"
            [tree]
            name = "root"
            children = [
                { name = "left", children = [] },
                { name = "right", children = [ { name = "leaf", children = [] } ] },
            ]
            "#,
        ))
        .unwrap();
    assert_eq!(
        schema
            .validate(&table(
                "tree = { name = 'root', children = [ { name = 3, children = [] } ] }"
            ))
            .unwrap_err()
            .to_string(),
        "'tree.children[0].name': Value 3 is not: \"string\""
    );
}

// =============================================================================
// Hidden keys
// =============================================================================

#[test]
fn test_hidden_key_not_matched_by_documents() {
    let schema = r#"
        value = "ref = 'number'"
        "number = { hidden = true }" = { union = [ "integer", "float" ] }
    "#;
    loads(schema).unwrap().validate(&table("value = 3")).unwrap();
    assert_eq!(validate_err(schema, "number = 3"), "root: Key 'number' not in schema.");
}

#[test]
fn test_hidden_key_preferred_by_reference() {
    let schema = loads(
        r#"
        number = "string"
        "number = { hidden = true }" = "integer"
        value = "ref = 'number'"
        "#,
    )
    .unwrap();
    schema
        .validate(&table("number = 'three'\nvalue = 3"))
        .unwrap();
    assert_eq!(
        schema
            .validate(&table("value = 'three'"))
            .unwrap_err()
            .to_string(),
        "'value': Value three is not: \"integer\""
    );
    assert_eq!(schema, loads(&schema.to_toml()).unwrap());
}

#[test]
fn test_hidden_wildcard() {
    let schema = loads(r#"'"*" = { hidden = true }' = "integer""#).unwrap();
    assert_eq!(
        schema.to_string(),
        r#"{ "\"*\" = { hidden = true }" = "integer" }"#
    );
    assert_eq!(
        schema.validate(&table("x = 1")).unwrap_err().to_string(),
        "root: Key 'x' not in schema: { \"\\\"*\\\" = { hidden = true }\" = \"integer\" }"
    );
}

// =============================================================================
// Reference keys
// =============================================================================

const COLOR_KEYS: &str = r#"
    "ref = 'def.key'" = "boolean"

    ["def = { hidden = true }"]
    key = "enum = [ 'Red', 'Green', 'Blue' ]"
"#;

#[test]
fn test_reference_key() {
    let schema = loads(COLOR_KEYS).unwrap();
    schema.validate(&table("Red = true\nBlue = false")).unwrap();
    assert_eq!(
        schema
            .validate(&table("Red = 'yes'"))
            .unwrap_err()
            .to_string(),
        "'Red': Value yes is not: \"boolean\""
    );
    assert_eq!(
        schema
            .validate(&table("Purple = true"))
            .unwrap_err()
            .to_string(),
        "root: Key 'Purple' not in schema."
    );
    assert_eq!(schema, loads(&schema.to_toml()).unwrap());
}

#[test]
fn test_reference_key_to_pattern() {
    let schema = loads(
        r#"
        "ref = 'def.name'" = "integer"

        ["def = { hidden = true }"]
        name = "pattern = '^[a-z]+$'"
        "#,
    )
    .unwrap();
    schema.validate(&table("apple = 1\nbanana = 2")).unwrap();
    assert!(schema.validate(&table("Apple = 1")).is_err());
}

#[test]
fn test_reference_key_errors() {
    assert_eq!(
        loads(r#""ref = 'def'" = "boolean""#).unwrap_err().to_string(),
        "root: Reference to non-existing key: def"
    );
    assert_eq!(
        loads(
            r#"
            "ref = 'def.my.key'" = "boolean"
            def.my = "string"
            "#
        )
        .unwrap_err()
        .to_string(),
        "root: Reference to non-existing sub-key: def.my.key"
    );
}

// =============================================================================
// File references
// =============================================================================

fn user_schema_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.schema.toml",
        r#"
        title = "string"
        user = "file = 'user.schema.toml'"
        "#,
    );
    dir
}

#[test]
fn test_file_reference() {
    let dir = user_schema_dir();
    write(
        dir.path(),
        "user.schema.toml",
        "name = 'string'\nage = 'integer = { min = 0 }'",
    );

    let schema = from_file(dir.path().join("main.schema.toml")).unwrap();
    assert_eq!(schema.source(), Some(dir.path().join("main.schema.toml").as_path()));
    schema
        .validate(&table("title = 'x'\nuser = { name = 'Ann', age = 30 }"))
        .unwrap();
    assert_eq!(
        schema
            .validate(&table("user = { name = 'Ann', age = -1 }"))
            .unwrap_err()
            .to_string(),
        "'user.age': Value out of range: -1 < 0"
    );
    assert_eq!(
        schema.to_string(),
        r#"{ title = "string", user = "file = 'user.schema.toml'" }"#
    );
}

#[test]
fn test_file_reference_from_text() {
    let dir = user_schema_dir();
    write(dir.path(), "user.schema.toml", "name = 'string'");

    let err = loads("user = \"file = 'user.schema.toml'\"").unwrap_err();
    assert_eq!(
        err.to_string(),
        "'user': Schema has file reference. Must specify document name."
    );

    let schema = loads_at(
        "user = \"file = 'user.schema.toml'\"",
        dir.path().join("inline.toml"),
    )
    .unwrap();
    schema.validate(&table("user.name = 'Ann'")).unwrap();
}

#[test]
fn test_file_reference_missing() {
    let dir = user_schema_dir();
    let err = from_file(dir.path().join("main.schema.toml")).unwrap_err();
    assert!(matches!(err, LoadError::Schema(_)));
    assert!(
        err.to_string()
            .starts_with("'user': Error reading 'user.schema.toml': "),
        "{err}"
    );
}

#[test]
fn test_file_reference_invalid_toml() {
    let dir = user_schema_dir();
    write(dir.path(), "user.schema.toml", "name = ");
    let err = from_file(dir.path().join("main.schema.toml")).unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with("'user': Error reading 'user.schema.toml': "),
        "{message}"
    );
    assert!(!message.contains('\n'));
}

#[test]
fn test_file_reference_invalid_schema() {
    let dir = user_schema_dir();
    write(dir.path(), "user.schema.toml", "name = 'stringly'");
    assert_eq!(
        from_file(dir.path().join("main.schema.toml"))
            .unwrap_err()
            .to_string(),
        "'user': Error reading 'user.schema.toml': 'name': 'stringly' is not a valid keyword type."
    );
}

#[test]
fn test_file_references_in_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("parts")).unwrap();
    write(dir.path(), "main.toml", "owner = \"file = 'parts/owner.toml'\"");
    write(
        &dir.path().join("parts"),
        "owner.toml",
        "name = 'string'\naddress = \"file = 'address.toml'\"",
    );
    write(&dir.path().join("parts"), "address.toml", "city = 'string'");

    let schema = from_file(dir.path().join("main.toml")).unwrap();
    schema
        .validate(&table("owner = { name = 'Ann', address = { city = 'Oslo' } }"))
        .unwrap();
    assert_eq!(
        schema
            .validate(&table("owner.address.city = 1"))
            .unwrap_err()
            .to_string(),
        "'owner.address.city': Value 1 is not: \"string\""
    );
}

#[test]
fn test_file_references_shared_and_cyclic() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "person.toml",
        r#"
        name = "string"
        parent = "file = 'person.toml'"
        pet = "file = 'pet.toml'"
        "#,
    );
    write(
        dir.path(),
        "pet.toml",
        "species = 'string'\nowner = \"file = 'person.toml'\"",
    );

    let schema = from_file(dir.path().join("person.toml")).unwrap();
    schema
        .validate(&table(
            r#"
            name = "Ann"
            parent = { name = "Bea", parent = { name = "Cy" } }
            pet = { species = "cat", owner = { name = "Ann" } }
            "#,
        ))
        .unwrap();
    assert_eq!(
        schema
            .validate(&table("pet = { owner = { pet = { species = 3 } } }"))
            .unwrap_err()
            .to_string(),
        "'pet.owner.pet.species': Value 3 is not: \"string\""
    );

    // Each document is compiled once however often it is referenced.
    let single = from_file(dir.path().join("pet.toml")).unwrap();
    assert_eq!(schema.element_count(), single.element_count());
}

#[test]
fn test_reference_inside_file_uses_its_own_root() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.toml",
        "name = 'integer'\nuser = \"file = 'user.toml'\"",
    );
    write(
        dir.path(),
        "user.toml",
        "name = 'string'\nnickname = \"ref = 'name'\"",
    );

    let schema = from_file(dir.path().join("main.toml")).unwrap();
    schema
        .validate(&table("name = 3\nuser = { name = 'Ann', nickname = 'A' }"))
        .unwrap();
    assert!(schema.validate(&table("user = { nickname = 3 }")).is_err());
}
