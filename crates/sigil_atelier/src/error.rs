//! Error types.
//!
//! Positional failures are [`RuneError`]s; they are rendered with the
//! component source before leaving the crate. Edit buffer conflicts are
//! internal faults and are passed through untouched.

use sigil_carton::{EditError, Span};
use thiserror::Error;

use crate::diagnostic::pretty_message;

/// Kind of a positional failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuneErrorKind {
    /// Wrong arity or argument type of a `$css` call
    InvalidCall,
    /// A `$css` call names a class no selector defines
    UndefinedClass,
    /// A rune class sits where a `:global(...)` wrapper is not allowed
    InvalidPlacement,
    /// A `$css` call names a class reserved by `increaseSpecificity`
    ReservedClass,
}

/// Structured positional error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuneError {
    pub kind: RuneErrorKind,
    pub message: String,
    pub start: u32,
    pub end: u32,
    pub detail: Option<String>,
}

impl RuneError {
    pub fn new(
        kind: RuneErrorKind,
        message: impl Into<String>,
        span: Span,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            start: span.start,
            end: span.end,
            detail: Some(detail.into()),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Failure inside one of the rewrite passes.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Rune(#[from] RuneError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Error returned by [`crate::preprocess`].
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The component could not be parsed. Carries no position.
    #[error("{message}")]
    Parse { message: String },
    /// Invalid rune usage, rendered against the component source.
    #[error("{pretty}")]
    Rune { error: RuneError, pretty: String },
    /// Conflicting edits; indicates a bug in the rewrite passes.
    #[error("internal error: {0}")]
    Internal(#[from] EditError),
}

impl PreprocessError {
    pub(crate) fn parse(cause: impl std::fmt::Display) -> Self {
        Self::Parse {
            message: format!("{}\n\nThe component failed to be parsed.", cause),
        }
    }

    pub(crate) fn rune(error: RuneError, filename: &str, source: &str) -> Self {
        let pretty = pretty_message(filename, source, &error);
        Self::Rune { error, pretty }
    }

    pub(crate) fn from_transform(error: TransformError, filename: &str, source: &str) -> Self {
        match error {
            TransformError::Rune(error) => Self::rune(error, filename, source),
            TransformError::Edit(error) => Self::Internal(error),
        }
    }

    /// The positional error, if any.
    pub fn rune_error(&self) -> Option<&RuneError> {
        match self {
            Self::Rune { error, .. } => Some(error),
            _ => None,
        }
    }
}
