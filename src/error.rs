//! Error types.
//!
//! Hard failures only. Types the mapper cannot express are not errors; they
//! surface as [`crate::mapper::Diagnostic`]s next to the finished mapping.

use std::path::PathBuf;

/// Structural conflict while building the output tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A path segment already exists as a leaf, so nothing can be created below it.
    #[error("cannot create node at `{path}`: `{leaf}` is a leaf")]
    Conflict { path: String, leaf: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A record was reached again while it was still being expanded.
    #[error("cyclic type `{type_name}` reached again at `{path}`")]
    CyclicType { type_name: String, path: String },

    #[error("root type `{type_name}` is not a record")]
    RootNotRecord { type_name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed document, with the JSON path of the offending node.
    #[error("at JSON path {path} → {message}")]
    Json { path: String, message: String },

    #[error("field `{record}.{field}` refers to undefined record `{target}`")]
    UnknownRecord {
        record: String,
        field: String,
        target: String,
    },

    #[error("record `{record}` declares field `{field}` more than once")]
    DuplicateField { record: String, field: String },

    #[error("record `{0}` is declared more than once")]
    DuplicateRecord(String),

    #[error("record `{0}` is not defined in the catalog")]
    MissingRecord(String),

    #[error("catalog declares no root record and none was requested")]
    NoRoot,
}
