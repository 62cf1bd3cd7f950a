//! Error types for schema construction and validation

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// What kind of failure a [`SchemaError`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The schema declaration or the document does not conform
    Invalid,
    /// Validation descended deeper than the configured maximum
    RecursionLimit,
}

/// A schema error located at a dotted/indexed path.
///
/// An empty location denotes the document (or declaration) root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}: {message}", display_location(.location))]
pub struct SchemaError {
    pub location: String,
    pub message: String,
    pub kind: ErrorKind,
}

impl SchemaError {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            kind: ErrorKind::Invalid,
        }
    }

    pub(crate) fn recursion_limit(location: impl Into<String>, max_depth: usize) -> Self {
        Self {
            location: location.into(),
            message: format!("Maximum validation depth of {max_depth} exceeded."),
            kind: ErrorKind::RecursionLimit,
        }
    }

    /// Whether a probing match (wildcard/reference keys, union members) must
    /// propagate this error instead of treating it as "did not match".
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::RecursionLimit
    }
}

fn display_location(location: &str) -> String {
    if location.is_empty() {
        "root".to_string()
    } else {
        format!("'{location}'")
    }
}

/// Errors raised while loading schemas or documents from text or disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", describe_parse(.path.as_ref(), .message))]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl LoadError {
    /// The failure without the `Error reading '<path>'` prefix.
    pub fn detail(&self) -> String {
        match self {
            LoadError::Io { source, .. } => source.to_string(),
            LoadError::Parse { message, .. } => message.clone(),
            LoadError::Schema(err) => err.to_string(),
        }
    }
}

fn describe_parse(path: Option<&PathBuf>, message: &str) -> String {
    match path {
        Some(path) => format!("Error reading '{}': {}", path.display(), message),
        None => format!("Invalid TOML: {message}"),
    }
}

/// Single-line rendering of a document parse error.
pub(crate) fn toml_error_message(err: &toml::de::Error, text: &str) -> String {
    let message = single_line(err.message())
        .or_else(|| rendered_message(&err.to_string()))
        .unwrap_or_else(|| "unexpected end of input".to_string());
    match err.span() {
        Some(span) if span.start >= text.len() => format!("{message} (at end of document)"),
        Some(span) => {
            let before = &text[..span.start];
            let line = before.matches('\n').count() + 1;
            let column = before
                .rfind('\n')
                .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
                + 1;
            format!("{message} (at line {line}, column {column})")
        }
        None => message,
    }
}

/// Join the non-empty lines of a multi-line message with `"; "`.
fn single_line(message: &str) -> Option<String> {
    let lines: Vec<&str> = message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("; "))
}

/// Last line of a rendered parse error that is neither the snippet gutter nor
/// the position header.
fn rendered_message(rendered: &str) -> Option<String> {
    rendered
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| {
            let gutter = line.trim_start_matches(|c: char| c.is_ascii_digit()).trim_start();
            !gutter.starts_with('|') && !line.starts_with("TOML parse error")
        })
        .map(str::to_string)
}

/// Single-line rendering of a regex compile error.
pub(crate) fn regex_error_message(err: &regex::Error) -> String {
    let text = err.to_string();
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or(text)
}
