//! Error types for the pagesaw library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`JobError`] — **Synchronous**: a job-controller operation failed before
//!   (or without) any background work starting. Admission can be refused
//!   ([`JobError::Busy`], [`JobError::InvalidInput`]) and a download can be
//!   premature ([`JobError::NotReady`]). Returned directly to the caller of
//!   `admit`/`take_output` and mapped straight onto HTTP status codes.
//!
//! * [`SliceError`] — **Background**: the slicing work itself failed (or was
//!   cancelled) after the job was admitted. Never thrown across the
//!   background/foreground boundary; the job controller captures it into the
//!   shared [`crate::job::JobState`] where pollers observe it.
//!
//! The separation keeps the propagation policy honest: validation problems
//! surface immediately, everything after admission surfaces only via polling.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of synchronous job-controller operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// A conversion is already in progress; admission is non-blocking and
    /// fails fast rather than queueing.
    #[error("a conversion is already in progress")]
    Busy,

    /// The uploaded file or the slice parameters failed validation.
    /// The job was never admitted and no state was mutated.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// `take_output` was called while no finished document is available.
    #[error("no converted document is ready for download")]
    NotReady,

    /// Reading or writing a job artifact failed.
    #[error("artifact I/O failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JobError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures produced by the background slicing work.
///
/// `Cancelled` is deliberately part of this enum even though it is not an
/// error from the user's point of view: it travels the same return path out
/// of the slicer, and the finalizer distinguishes it from genuine failures.
#[derive(Debug, Error)]
pub enum SliceError {
    /// The source document contains no pages at all.
    #[error("source PDF has no pages")]
    EmptySource,

    /// The cancellation flag was observed between slices. No output file
    /// exists when this is returned.
    #[error("conversion cancelled")]
    Cancelled,

    /// The PDF engine failed while opening, composing or saving a document.
    #[error("PDF engine error: {0}")]
    Engine(String),

    /// An artifact could not be read or written by the slicing work.
    #[error("I/O failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<crate::engine::EngineError> for SliceError {
    fn from(err: crate::engine::EngineError) -> Self {
        SliceError::Engine(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_display() {
        assert!(JobError::Busy.to_string().contains("already in progress"));
    }

    #[test]
    fn invalid_input_carries_reason() {
        let e = JobError::InvalidInput("overlap must be between 0 and 50 mm".into());
        assert!(e.to_string().contains("overlap"));
    }

    #[test]
    fn engine_error_wraps_message() {
        let e = SliceError::from(crate::engine::EngineError::new("load failed"));
        assert!(matches!(e, SliceError::Engine(_)));
        assert!(e.to_string().contains("load failed"));
    }

    #[test]
    fn cancelled_is_distinct_from_engine_failure() {
        assert!(!matches!(SliceError::Cancelled, SliceError::Engine(_)));
    }
}
