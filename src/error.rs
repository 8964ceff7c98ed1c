//! Errors and the tri-state operation outcome.
//!
//! Every mutating operation in the crate returns either a [`Result<T, CdsError>`] for operations that create or look up objects,
//! or a [`Result<Outcome<T>, CdsError>`] for operations that may be intentionally skipped by policy (e.g. a definition lock).
//!
//! Errors are emitted through [`tracing`] with the `cds` target at the point they are created.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::{data_type::UnsupportedDataTypeError, units::UnitsError, DataType};

/// The tracing target used for every event emitted by this crate.
pub(crate) const COMPONENT: &str = "cds";

/// The classification of a [`CdsError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Zero counts, mismatched dimensionality, incompatible types, conflicting definitions.
    InvalidArgument,
    /// A definition lock prevented the requested change.
    Locked,
    /// A referenced object does not exist (or a handle is stale).
    NotFound,
    /// Memory could not be reserved for a buffer.
    AllocationFailure,
    /// A malformed unit string or data type name.
    RangeOrFormat,
}

/// A `cds` error.
#[derive(Debug, Error)]
pub enum CdsError {
    /// An invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The definition lock of an object prevents a structural change.
    #[error("{0}: the definition lock is set")]
    Locked(String),
    /// An object was not found.
    #[error("{0}: not found")]
    NotFound(String),
    /// Buffer growth failed.
    #[error("{context}: memory allocation failed")]
    AllocationFailure {
        /// The path of the object being grown.
        context: String,
        /// The reservation error.
        #[source]
        source: TryReserveError,
    },
    /// String and numeric data cannot be converted into each other.
    #[error("incompatible data types {0} and {1}")]
    TypeMismatch(DataType, DataType),
    /// An unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// A units error.
    #[error(transparent)]
    Units(#[from] UnitsError),
}

impl CdsError {
    /// Returns the [`ErrorKind`] of the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::TypeMismatch(..) => ErrorKind::InvalidArgument,
            Self::Locked(_) => ErrorKind::Locked,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            Self::UnsupportedDataType(_) | Self::Units(_) => ErrorKind::RangeOrFormat,
        }
    }

    /// Emit the error and return it.
    pub(crate) fn logged(self) -> Self {
        tracing::error!(target: COMPONENT, kind = ?self.kind(), "{self}");
        self
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into()).logged()
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into()).logged()
    }

    pub(crate) fn locked(path: impl Into<String>) -> Self {
        Self::Locked(path.into()).logged()
    }

    pub(crate) fn allocation(context: impl Into<String>, source: TryReserveError) -> Self {
        Self::AllocationFailure {
            context: context.into(),
            source,
        }
        .logged()
    }
}

/// The outcome of an operation that may be skipped by policy.
///
/// [`Outcome::Skipped`] is not an error: the request was valid but intentionally not applied,
/// for example because a definition lock is set or an existing value must not be overwritten.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome<T> {
    /// The operation was applied.
    Done(T),
    /// The operation was not applied.
    Skipped,
}

impl<T> Outcome<T> {
    /// Returns true if the operation was applied.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Returns true if the operation was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Converts the outcome into an [`Option`].
    #[must_use]
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Skipped => None,
        }
    }

    /// Maps the applied value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Skipped => Outcome::Skipped,
        }
    }
}
