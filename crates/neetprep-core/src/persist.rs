//! Saving score records to a learner's history.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::bank::QuizPlan;
use crate::error::{PersistError, StoreError};
use crate::model::{HistoryPath, ScoreRecord};
use crate::scoring::{self, ScoreSummary};
use crate::session::FinishedQuiz;
use crate::traits::{AuthProvider, HistoryStore};

/// The outcome of scoring a finished quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub summary: ScoreSummary,
    pub record: ScoreRecord,
    /// Key the record was stored under, `None` if it was not saved.
    pub key: Option<String>,
}

/// Appends score records through a [`HistoryStore`] for the signed-in user.
#[derive(Clone)]
pub struct ResultPersister {
    store: Arc<dyn HistoryStore>,
    auth: Arc<dyn AuthProvider>,
}

impl ResultPersister {
    pub fn new(store: Arc<dyn HistoryStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    /// Append `record` under `userResults/{user}/{subject}[/{chapter}]`.
    ///
    /// Failures are returned as-is; nothing is retried.
    pub async fn persist(
        &self,
        user_id: &str,
        subject: &str,
        chapter: Option<&str>,
        record: &ScoreRecord,
    ) -> Result<String, StoreError> {
        let path = HistoryPath::new(user_id, subject, chapter);
        tracing::debug!(path = %path, score = record.score, "appending score record");
        self.store.append(&path, record).await
    }

    /// Score a finished quiz and save it for the current user.
    ///
    /// With nobody signed in this returns [`PersistError::Unauthenticated`]
    /// without touching the store. Use [`ResultPersister::score`] first when
    /// the score must be shown regardless.
    pub async fn submit(
        &self,
        plan: &QuizPlan,
        finished: &FinishedQuiz,
    ) -> Result<Submission, PersistError> {
        let user_id = self
            .auth
            .current_user_id()
            .ok_or(PersistError::Unauthenticated)?;
        let (summary, record) = Self::score(plan, finished);
        let key = self
            .persist(&user_id, &plan.subject, plan.chapter.as_deref(), &record)
            .await?;
        tracing::info!(
            subject = %plan.subject,
            chapter = ?plan.chapter,
            score = summary.score,
            key = %key,
            "result saved"
        );
        Ok(Submission {
            summary,
            record,
            key: Some(key),
        })
    }

    /// Score a finished quiz without saving it.
    pub fn score(plan: &QuizPlan, finished: &FinishedQuiz) -> (ScoreSummary, ScoreRecord) {
        let summary = scoring::score(&finished.questions, &finished.answers);
        let record = ScoreRecord::new(
            &plan.subject,
            plan.chapter.as_deref(),
            Some(plan.mode),
            &summary,
            finished.elapsed_secs,
        );
        (summary, record)
    }

    /// Run [`ResultPersister::persist`] on a background task.
    ///
    /// Errors surface when the returned handle is awaited.
    pub fn spawn_persist(
        &self,
        user_id: String,
        subject: String,
        chapter: Option<String>,
        record: ScoreRecord,
    ) -> JoinHandle<Result<String, StoreError>> {
        let persister = self.clone();
        tokio::spawn(async move {
            persister
                .persist(&user_id, &subject, chapter.as_deref(), &record)
                .await
        })
    }

    /// Every saved record of the current user.
    pub async fn history(&self) -> Result<Vec<ScoreRecord>, PersistError> {
        let user_id = self
            .auth
            .current_user_id()
            .ok_or(PersistError::Unauthenticated)?;
        Ok(self.store.read_all(&user_id).await?)
    }
}

/// Wait for a [`ResultPersister::spawn_persist`] task.
pub async fn join_persist(
    handle: JoinHandle<Result<String, StoreError>>,
) -> Result<String, PersistError> {
    match handle.await {
        Ok(result) => Ok(result?),
        Err(e) => Err(PersistError::Background(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, TestMode};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        appended: Mutex<Vec<(String, ScoreRecord)>>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl HistoryStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn append(
            &self,
            path: &HistoryPath,
            record: &ScoreRecord,
        ) -> Result<String, StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("network down".into()));
            }
            let mut appended = self.appended.lock().unwrap();
            appended.push((path.to_string(), record.clone()));
            Ok(format!("key-{}", appended.len()))
        }

        async fn read_all(&self, _user_id: &str) -> Result<Vec<ScoreRecord>, StoreError> {
            Ok(self
                .appended
                .lock()
                .unwrap()
                .iter()
                .map(|(_, r)| r.clone())
                .collect())
        }
    }

    struct Signed(Option<&'static str>);

    impl AuthProvider for Signed {
        fn current_user_id(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn plan(chapter: Option<&str>, mode: TestMode) -> QuizPlan {
        let questions = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, correct)| Question {
                id: i.to_string(),
                prompt: format!("q{i}"),
                options: BTreeMap::new(),
                correct: correct.to_string(),
                explanation: None,
            })
            .collect();
        QuizPlan {
            subject: "physics".into(),
            chapter: chapter.map(str::to_string),
            label: chapter.unwrap_or("Group Test").into(),
            mode,
            questions,
            time_limit_secs: mode.time_limit_secs(),
        }
    }

    fn finished(plan: &QuizPlan) -> FinishedQuiz {
        FinishedQuiz {
            questions: plan.questions.clone(),
            answers: BTreeMap::from([(0, "a".to_string()), (1, "c".to_string())]),
            elapsed_secs: 42,
            reason: crate::session::FinishReason::Submitted,
        }
    }

    #[tokio::test]
    async fn submit_appends_under_chapter_path() {
        let store = Arc::new(RecordingStore::default());
        let persister = ResultPersister::new(store.clone(), Arc::new(Signed(Some("u1"))));
        let plan = plan(Some("kinetics"), TestMode::Easy);

        let submission = persister.submit(&plan, &finished(&plan)).await.unwrap();
        assert_eq!(submission.summary.score, 33.33);
        assert_eq!(submission.key.as_deref(), Some("key-1"));
        assert_eq!(submission.record.time_taken_secs, 42);
        assert_eq!(submission.record.mode.as_deref(), Some("easy"));

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].0, "userResults/u1/physics/kinetics");
        assert_eq!(appended[0].1.correct_count, 1);
    }

    #[tokio::test]
    async fn mixed_mode_appends_under_subject() {
        let store = Arc::new(RecordingStore::default());
        let persister = ResultPersister::new(store.clone(), Arc::new(Signed(Some("u1"))));
        let plan = plan(None, TestMode::Group);
        persister.submit(&plan, &finished(&plan)).await.unwrap();
        assert_eq!(store.appended.lock().unwrap()[0].0, "userResults/u1/physics");
    }

    #[tokio::test]
    async fn unauthenticated_submit_saves_nothing() {
        let store = Arc::new(RecordingStore::default());
        let persister = ResultPersister::new(store.clone(), Arc::new(Signed(None)));
        let plan = plan(Some("optics"), TestMode::Individual);

        let err = persister.submit(&plan, &finished(&plan)).await.unwrap_err();
        assert!(matches!(err, PersistError::Unauthenticated));
        assert!(store.appended.lock().unwrap().is_empty());

        // The score is still available for display.
        let (summary, _) = ResultPersister::score(&plan, &finished(&plan));
        assert_eq!(summary.correct, 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let store = Arc::new(RecordingStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let persister = ResultPersister::new(store.clone(), Arc::new(Signed(Some("u1"))));
        let plan = plan(Some("optics"), TestMode::Individual);

        let err = persister.submit(&plan, &finished(&plan)).await.unwrap_err();
        match err {
            PersistError::Store(e) => assert!(e.is_unavailable()),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn background_persist_surfaces_errors_on_join() {
        let store = Arc::new(RecordingStore::default());
        let persister = ResultPersister::new(store.clone(), Arc::new(Signed(Some("u1"))));
        let plan = plan(Some("optics"), TestMode::Individual);
        let (_, record) = ResultPersister::score(&plan, &finished(&plan));

        let handle = persister.spawn_persist("u1".into(), "physics".into(), None, record.clone());
        assert_eq!(join_persist(handle).await.unwrap(), "key-1");

        store.failing.store(true, Ordering::SeqCst);
        let handle = persister.spawn_persist("u1".into(), "physics".into(), None, record);
        assert!(matches!(
            join_persist(handle).await,
            Err(PersistError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn history_needs_a_user() {
        let store = Arc::new(RecordingStore::default());
        let persister = ResultPersister::new(store, Arc::new(Signed(None)));
        assert!(matches!(
            persister.history().await,
            Err(PersistError::Unauthenticated)
        ));
    }
}
