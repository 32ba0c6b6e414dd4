use thiserror::Error;

use crate::{allocator::AllocatorError, dtype::DType};

/// Error type for array creation and manipulation.
///
/// The set of kinds is closed; every operation fails with exactly one of them and
/// [`ArrayError::code`] maps each kind onto a stable [`ErrorCode`].
#[derive(Error, Debug, PartialEq)]
pub enum ArrayError {
    /// An argument is malformed or out of range.
    ///
    /// # Examples
    /// - An axis selector outside `[0, 3]`
    /// - A tile repetition of 0
    /// - An operation that needs a matrix applied to a vector
    #[error("Invalid argument to {operation}: {reason}")]
    InvalidArgument {
        /// Name of the operation that rejected the argument
        operation: String,
        /// Why the argument was rejected
        reason: String,
    },

    /// Operand shapes are incompatible for the requested transform.
    ///
    /// # Examples
    /// - Joining arrays whose extents differ off the join axis
    /// - Reshaping to a shape with a different element count
    #[error("Dimension mismatch: {message}. Expected shape: {expected}, got: {actual}")]
    DimensionMismatch {
        /// Human-readable description of the mismatch
        message: String,
        /// Expected shape description
        expected: String,
        /// Actual shape description
        actual: String,
    },

    /// The element type is not valid for the requested operation.
    #[error("Unsupported type {dtype} for {operation}: {reason}")]
    UnsupportedType {
        /// Name of the operation that rejected the type
        operation: String,
        /// The rejected element type
        dtype: DType,
        /// Why the type is not supported
        reason: String,
    },

    /// The backend could not allocate storage for the result.
    ///
    /// This kind is only ever propagated from the allocator, never produced by
    /// validation.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(#[from] AllocatorError),
}

impl ArrayError {
    /// Creates an InvalidArgument error with context.
    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Creates a DimensionMismatch error with formatted shapes.
    pub fn dimension_mismatch(
        message: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::DimensionMismatch {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates an UnsupportedType error with context.
    pub fn unsupported_type(
        operation: impl Into<String>,
        dtype: DType,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            operation: operation.into(),
            dtype,
            reason: reason.into(),
        }
    }

    /// Returns the status code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            Self::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
        }
    }

    /// Returns true if the error can be recovered from by freeing memory.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::ResourceExhausted(_))
    }

    /// Returns a user-friendly suggestion for resolving the error.
    pub fn suggestion(&self) -> &str {
        match self {
            Self::InvalidArgument { .. } => {
                "Check axis selectors are within [0, 3] and repetition counts are positive"
            }
            Self::DimensionMismatch { .. } => {
                "Check operand shapes agree on every axis the operation does not change"
            }
            Self::UnsupportedType { .. } => {
                "Cast the operands to a supported element type before calling the operation"
            }
            Self::ResourceExhausted(_) => {
                "Release unused arrays or raise the configured memory limit"
            }
        }
    }
}

/// Status codes of the handle boundary.
///
/// The integer values are stable and can be passed across an FFI layer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// The operation succeeded.
    Success = 0,
    /// The backend ran out of memory.
    ResourceExhausted = 101,
    /// An argument was malformed or out of range.
    InvalidArgument = 202,
    /// Operand shapes were incompatible.
    DimensionMismatch = 203,
    /// The element type was not supported.
    UnsupportedType = 204,
}

impl ErrorCode {
    /// Returns the integer value of the code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns true for [`ErrorCode::Success`].
    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }
}

impl<T> From<&Result<T, ArrayError>> for ErrorCode {
    fn from(result: &Result<T, ArrayError>) -> Self {
        match result {
            Ok(_) => ErrorCode::Success,
            Err(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::Success.as_i32(), 0);
        assert_eq!(ErrorCode::ResourceExhausted.as_i32(), 101);
        assert_eq!(ErrorCode::InvalidArgument.as_i32(), 202);
        assert_eq!(ErrorCode::DimensionMismatch.as_i32(), 203);
        assert_eq!(ErrorCode::UnsupportedType.as_i32(), 204);
    }

    #[test]
    fn each_kind_maps_to_its_code() {
        let errors = [
            (
                ArrayError::invalid_argument("flip", "axis 4"),
                ErrorCode::InvalidArgument,
            ),
            (
                ArrayError::dimension_mismatch("join", "[2, 1, 1, 1]", "[3, 1, 1, 1]"),
                ErrorCode::DimensionMismatch,
            ),
            (
                ArrayError::unsupported_type("randn", DType::S32, "integers"),
                ErrorCode::UnsupportedType,
            ),
            (
                ArrayError::from(AllocatorError::OutOfMemory { bytes: 8 }),
                ErrorCode::ResourceExhausted,
            ),
        ];
        for (error, code) in errors {
            assert_eq!(error.code(), code);
            assert!(!error.suggestion().is_empty());
        }
    }

    #[test]
    fn result_to_code() {
        let ok: Result<(), ArrayError> = Ok(());
        assert!(ErrorCode::from(&ok).is_success());

        let err: Result<(), ArrayError> = Err(ArrayError::invalid_argument("tile", "reps"));
        assert_eq!(ErrorCode::from(&err), ErrorCode::InvalidArgument);
    }

    #[test]
    fn messages_carry_context() {
        let error = ArrayError::unsupported_type("range", DType::C32, "complex ranges");
        assert_eq!(
            error.to_string(),
            "Unsupported type c32 for range: complex ranges"
        );
        assert!(ArrayError::from(AllocatorError::OutOfMemory { bytes: 8 }).is_out_of_memory());
    }
}
