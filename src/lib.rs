//! Sphvec: a 3D vector value type with dual coordinate representations
//!
//! This crate provides a single [`Vector`] type that stores a canonical
//! Cartesian triple and derives spherical coordinates (radius, latitude,
//! longitude) lazily, caching each derived field independently. It is
//! designed to sit behind a host scripting binding: the [`host`] module
//! exposes the fallible, loosely typed surface such a binding calls, while
//! [`vector`] and [`convert`] hold the strongly typed core.
//!
//! The host-runtime object lifecycle, argument marshaling, reference
//! counting, and module registration are deliberately not part of this
//! crate; bindings express incoming data as [`host::Value`] and call the
//! checked constructors, setters, and operators from there.

use thiserror::Error;

pub mod convert;
pub mod host;
pub mod vector;

// Re-export commonly used types
pub use host::{Field, Operand, Value};
pub use vector::{Vector, VectorState};

/// Main error type for the sphvec library
///
/// Message texts follow the conventions of dynamic-language bindings: they
/// name the caller-facing field (constructor argument, cartesian component,
/// spherical component), the offending index where one exists, and the
/// host-level type name of the rejected value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorError {
    /// A component triple did not contain exactly three elements.
    #[error("{field} must contain 3 elements, got {got}")]
    WrongLength {
        /// Caller-facing name of the value being validated
        field: Field,
        /// Number of elements actually supplied
        got: usize,
    },

    /// A component triple contained a non-numeric element.
    #[error("{field} must contain numeric values, got \"{type_name}\" at {index}")]
    BadElement {
        /// Caller-facing name of the value being validated
        field: Field,
        /// Index of the offending element
        index: usize,
        /// Host type name of the offending element
        type_name: String,
    },

    /// A component triple was not a sequence at all.
    #[error("{field} must be a sequence of numeric values, got \"{type_name}\"")]
    NotASequence {
        /// Caller-facing name of the value being validated
        field: Field,
        /// Host type name of the rejected value
        type_name: String,
    },

    /// A scalar component setter received a non-numeric value.
    #[error("Vector.{component} must be numeric, got \"{type_name}\"")]
    NotNumeric {
        /// Component attribute name (`x`, `y`, `z`, `r`, `lat`, `lon`)
        component: &'static str,
        /// Host type name of the rejected value
        type_name: String,
    },

    /// A binary operator was applied to an incompatible right-hand operand.
    #[error("unsupported operand type(s) for {op}: 'Vector' and '{type_name}'")]
    UnsupportedOperand {
        /// Operator symbol (`+`, `-`, `*`)
        op: &'static str,
        /// Host type name of the right-hand operand
        type_name: String,
    },

    /// `dot` was called with something other than a vector.
    #[error("Vector.dot takes another Vector as an argument, got {type_name}")]
    BadDotOperand {
        /// Host type name of the rejected operand
        type_name: String,
    },

    /// State restoration received something other than a mapping.
    #[error("serialized vector state must be a mapping, got \"{type_name}\"")]
    StateNotAMapping {
        /// Host type name of the rejected value
        type_name: String,
    },

    /// State restoration was missing a required key.
    #[error("no \"{0}\" key in serialized vector state")]
    MissingStateKey(&'static str),
}

/// Result type for sphvec operations
pub type Result<T> = std::result::Result<T, VectorError>;
