//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// The first three variants indicate a sequencing or shape bug in the caller
/// and are meant to terminate the current training run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrideError {
    /// A step was added to a rollout that already holds a full segment.
    #[error("Capacity exceeded: the rollout already holds {capacity} steps")]
    CapacityExceeded {
        /// Number of steps the rollout can hold.
        capacity: usize,
    },

    /// An operation was called while its precondition does not hold.
    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),

    /// The length of a field does not match the expected one.
    #[error("Shape mismatch in {field}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the offending field.
        field: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl StrideError {
    pub(crate) fn shape(field: &str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            field: field.to_string(),
            expected,
            actual,
        }
    }

    /// Returns `Err(ShapeMismatch)` if `actual != expected`.
    pub(crate) fn check_len(field: &str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::shape(field, expected, actual))
        }
    }
}
