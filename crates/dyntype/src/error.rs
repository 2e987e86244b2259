// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the runtime type layer.

use crate::types::{Kind, TypeDescriptor};
use std::fmt;

/// Errors returned by conversion, container and dispatch operations.
///
/// Conversion failures are plain return values: call sites that only need a
/// convertibility check can match on `Err` and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Conversion Errors
    // ========================================================================
    /// Incompatible kinds, tuple arity mismatch, integer overflow or an
    /// unsupported direction such as Raw -> String.
    Conversion {
        from: String,
        to: String,
        reason: String,
    },
    /// A value without type descriptor was used as a conversion operand.
    NullType,
    /// List-to-tuple coercion rejected the value.
    Type(String),

    // ========================================================================
    // Container Errors
    // ========================================================================
    /// List or tuple index out of range.
    Index { index: i64, length: usize },
    /// Map key does not convert to the map's key type.
    Key(String),
    /// Operation not defined for the value's kind.
    InvalidOperation { operation: &'static str, kind: Kind },
    /// Dereference of a null pointer.
    NullPointer,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// Wrong number of arguments for an erased callable.
    Arity { expected: usize, got: usize },
    /// No method with that name (and arity) in the object's method table.
    MethodNotFound(String),
    /// No object factory registered under that name.
    FactoryNotFound(String),
    /// Module loader failed.
    ModuleLoad { module: String, reason: String },
}

impl Error {
    /// Build a conversion error between two described types.
    pub fn conversion(
        from: &TypeDescriptor,
        to: &TypeDescriptor,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            from: from.name().to_string(),
            to: to.name().to_string(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-operation error for `kind`.
    pub fn invalid_operation(operation: &'static str, kind: Kind) -> Self {
        Self::InvalidOperation { operation, kind }
    }

    /// Whether this error means "the value cannot be converted".
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. } | Self::NullType)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion { from, to, reason } => {
                write!(f, "Cannot convert {} to {}: {}", from, to, reason)
            }
            Self::NullType => write!(f, "Cannot convert to/from a null type"),
            Self::Type(msg) => write!(f, "Type error: {}", msg),
            Self::Index { index, length } => {
                write!(f, "Index out of range: {} (length {})", index, length)
            }
            Self::Key(msg) => write!(f, "Incompatible key type: {}", msg),
            Self::InvalidOperation { operation, kind } => {
                write!(f, "Invalid operation '{}' on {} value", operation, kind)
            }
            Self::NullPointer => write!(f, "Null pointer dereference"),
            Self::Arity { expected, got } => {
                write!(f, "Wrong argument count: expected {}, got {}", expected, got)
            }
            Self::MethodNotFound(name) => write!(f, "Method not found: {}", name),
            Self::FactoryNotFound(name) => write!(f, "Object factory not found: {}", name),
            Self::ModuleLoad { module, reason } => {
                write!(f, "Failed to load module {}: {}", module, reason)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for results using the crate `Error`.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::Index {
            index: 7,
            length: 3,
        };
        assert_eq!(err.to_string(), "Index out of range: 7 (length 3)");

        let err = Error::invalid_operation("append", Kind::Map);
        assert_eq!(err.to_string(), "Invalid operation 'append' on Map value");
    }

    #[test]
    fn test_is_conversion() {
        assert!(Error::NullType.is_conversion());
        assert!(!Error::Key("x".into()).is_conversion());
    }
}
