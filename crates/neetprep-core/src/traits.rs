//! Collaborator traits for the question bank, result history and sign-in.
//!
//! Implemented by the `neetprep-store` crate (Firebase, local files and an
//! in-memory store for tests).

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{HistoryPath, Question, ScoreRecord};

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

/// Read-only source of chapters and their questions.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Human-readable backend name (e.g. "firebase").
    fn name(&self) -> &str;

    /// Chapter names under a subject, sorted.
    async fn list_chapters(&self, subject: &str) -> Result<Vec<String>, StoreError>;

    /// Questions of one chapter in stored key order. A chapter that does
    /// not exist has no questions.
    ///
    /// Backends holding the raw keyed document can decode it with
    /// [`crate::bank::questions_from_value`].
    async fn fetch_questions(&self, subject: &str, chapter: &str)
        -> Result<Vec<Question>, StoreError>;
}

// ---------------------------------------------------------------------------
// Result history
// ---------------------------------------------------------------------------

/// Append-only log of score records per learner.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    fn name(&self) -> &str;

    /// Append a record under `path` and return the key it was stored under.
    async fn append(&self, path: &HistoryPath, record: &ScoreRecord)
        -> Result<String, StoreError>;

    /// Every record of a learner across all subjects and chapters. An
    /// unknown learner has an empty history.
    async fn read_all(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Identity of the signed-in learner, if any.
pub trait AuthProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}
