//! Error types for variable trees and their flattened views.

use crate::naming::NameDiagnostic;
use crate::value::ValueType;
use thiserror::Error;

/// Errors raised while sealing a tree or looking up its variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariableError {
    /// A node's own name contains the path separator
    #[error("Invalid variable name '{0}', variable must not contain ':'")]
    MalformedName(String),

    /// A leaf's default value fails its own validator
    #[error("Default value of variable '{0}' is rejected by its validator")]
    InvalidDefault(String),

    /// Two leaves flatten to the same full path
    #[error("Duplicate variable path '{0}'")]
    DuplicateName(String),

    /// No leaf matches the requested name
    #[error("Variable (name: {name}) not found: {diagnostic}")]
    NotFound {
        name: String,
        diagnostic: NameDiagnostic,
    },

    /// More than one leaf ends with the requested name
    #[error("Variable (name: {name}) is ambiguous, candidates: {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    /// Positional lookup past the end of the flattened sequence
    #[error("Variable (id: {id}) not found, there are {size} variables")]
    IdOutOfRange { id: usize, size: usize },

    /// Typed read of a value with another dynamic type
    #[error("Variable '{name}' holds {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },

    /// A write was refused by the type check or validator
    #[error("Value '{value}' rejected by variable '{name}'")]
    Rejected { name: String, value: String },
}

impl VariableError {
    /// Creates a not-found error with the matching diagnostic.
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
            diagnostic: NameDiagnostic::of(name),
        }
    }

    /// True for errors a caller can fix by picking another name or id.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Ambiguous { .. } | Self::IdOutOfRange { .. }
        )
    }
}
