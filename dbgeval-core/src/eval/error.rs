//! Evaluation error types
//!
//! Element operations report failure through sentinels; these errors are for
//! hosts that turn a sentinel into something a user sees.

use thiserror::Error;

use crate::debuggee::SnapshotError;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Unknown array: '{name}'")]
    UnknownArray { name: String },

    #[error("Element {index} of '{name}' not found")]
    ElementNotFound { name: String, index: i64 },

    #[error("Unsupported operation on {type_name} '{name}': only single-dimension zero-based arrays can be indexed")]
    UnsupportedShape { name: String, type_name: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("No arrays loaded; send 'initialize' first")]
    NotInitialized,
}

impl EvalError {
    pub fn unknown_array(name: impl Into<String>) -> Self {
        EvalError::UnknownArray { name: name.into() }
    }

    pub fn element_not_found(name: impl Into<String>, index: i64) -> Self {
        EvalError::ElementNotFound {
            name: name.into(),
            index,
        }
    }

    pub fn unsupported_shape(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        EvalError::UnsupportedShape {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        EvalError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
