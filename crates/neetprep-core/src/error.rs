//! Error types shared by the core and the store adapters.
//!
//! Defined in `neetprep-core` so callers can tell an unreachable store apart
//! from a rejected session operation without string matching.

use thiserror::Error;

use crate::session::SessionState;

/// Errors raised by a question bank or result history backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The backend rejected our credentials or rules denied access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The backend returned an error response.
    #[error("store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Data at a path did not have the expected shape.
    #[error("malformed data at {path}: {message}")]
    Malformed { path: String, message: String },
}

impl StoreError {
    /// Returns `true` if the backend could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// Rejected quiz session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start` was called with no questions.
    #[error("question set is empty")]
    EmptyQuestionSet,

    /// The operation needs a started session.
    #[error("session has not been started")]
    NotStarted,

    /// The session is already submitted or timed out.
    #[error("session is finished ({0})")]
    Finished(SessionState),

    /// The operation is not valid in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("question index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("option '{option}' is not offered by question {index}")]
    UnknownOption { index: usize, option: String },

    /// The session driver task has stopped.
    #[error("session driver stopped")]
    DriverStopped,
}

/// Errors from loading questions for a test mode.
#[derive(Debug, Error)]
pub enum BankError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Single-chapter modes need a chapter name.
    #[error("mode '{0}' needs a chapter")]
    MissingChapter(String),

    /// Multi-chapter modes need at least one chapter.
    #[error("mode '{0}' needs at least one chapter")]
    NoChaptersSelected(String),
}

/// Errors from saving a score record.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Nobody is signed in; the score can be shown but not saved.
    #[error("no authenticated user, result not saved")]
    Unauthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The background append task panicked or was cancelled.
    #[error("background save failed: {0}")]
    Background(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_classification() {
        assert!(StoreError::Unavailable("connection refused".into()).is_unavailable());
        assert!(StoreError::Timeout(30).is_unavailable());
        assert!(!StoreError::PermissionDenied("rules".into()).is_unavailable());
        assert!(!StoreError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_unavailable());
    }

    #[test]
    fn session_error_messages() {
        assert_eq!(
            SessionError::Finished(SessionState::TimedOut).to_string(),
            "session is finished (timed out)"
        );
        assert_eq!(
            SessionError::InvalidTransition {
                state: SessionState::Paused,
                action: "pause",
            }
            .to_string(),
            "cannot pause while paused"
        );
    }
}
