//! Rich diagnostic error types for the refrigeration-plant twin.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::llm::CollaboratorError;
pub use crate::router::IntentError;

/// Top-level error type for the twin.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum TwinError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fact(#[from] FactError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Intent(#[from] IntentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {source}")]
    #[diagnostic(
        code(reefer::io),
        help("Reading a question or writing an answer failed. Check the terminal or the redirected input and output.")
    )]
    Io {
        #[from]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Fact errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FactError {
    #[error("failed to read fact file {path}")]
    #[diagnostic(
        code(reefer::fact::io),
        help("Check that the fact file exists and is readable, or pass --facts <PATH>.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no JSON array found in fact text")]
    #[diagnostic(
        code(reefer::fact::no_array),
        help(
            "The fact text must contain a JSON array delimited by `[` and `]`. \
             Commentary before or after the array is tolerated, but the array itself is required."
        )
    )]
    NoArray,

    #[error("fact array is not valid JSON: {message}")]
    #[diagnostic(
        code(reefer::fact::invalid_json),
        help(
            "The text between the first `[` and the last `]` could not be parsed as a JSON array. \
             Re-run the extraction step or fix the file by hand."
        )
    )]
    InvalidJson { message: String },

    #[error("fact #{index} is not a JSON object")]
    #[diagnostic(
        code(reefer::fact::not_an_object),
        help("Every element of the fact array must be an object with subject/predicate/object fields.")
    )]
    NotAnObject { index: usize },

    #[error("fact #{index} is missing required field `{field}`")]
    #[diagnostic(
        code(reefer::fact::missing_field),
        help(
            "Required fields are: subject, subject_class, predicate, object, object_class. \
             `source_page` is optional."
        )
    )]
    MissingField { index: usize, field: &'static str },

    #[error("fact #{index} has a non-string value for `{field}`")]
    #[diagnostic(
        code(reefer::fact::invalid_field),
        help("Component names, classes and predicates must be JSON strings.")
    )]
    InvalidField { index: usize, field: &'static str },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("component '{name}' not found in knowledge graph")]
    #[diagnostic(
        code(reefer::graph::component_not_found),
        help(
            "Component names are matched case-insensitively, with underscores treated as spaces. \
             Run `reefer-twin info` to list the known components."
        )
    )]
    ComponentNotFound { name: String },
}

/// Convenience alias for results from the twin.
pub type TwinResult<T> = std::result::Result<T, TwinError>;
