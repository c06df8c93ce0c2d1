//! Local data directory backend.
//!
//! ```text
//! {root}/bank.json              same tree as the remote `test` node
//! {root}/history/{user}.jsonl   one score record per line, append-only
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

use neetprep_core::bank::questions_from_value;
use neetprep_core::error::StoreError;
use neetprep_core::model::{HistoryPath, Question, ScoreRecord};
use neetprep_core::traits::{HistoryStore, QuestionBank};

pub const BANK_FILE: &str = "bank.json";
pub const HISTORY_DIR: &str = "history";

/// One line of a history file.
#[derive(Serialize, Deserialize)]
struct HistoryLine {
    key: String,
    #[serde(flatten)]
    record: ScoreRecord,
}

/// Question bank and history kept in a local directory.
pub struct FileStore {
    root: PathBuf,
    // Serializes appends so concurrent saves never interleave lines.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bank_path(&self) -> PathBuf {
        self.root.join(BANK_FILE)
    }

    pub fn history_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !user_id.is_empty()
            && user_id != "."
            && user_id != ".."
            && !user_id.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::Malformed {
                path: HISTORY_DIR.into(),
                message: format!("invalid user id '{user_id}'"),
            });
        }
        Ok(self.root.join(HISTORY_DIR).join(format!("{user_id}.jsonl")))
    }

    async fn load_bank(&self) -> Result<Value, StoreError> {
        let path = self.bank_path();
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            StoreError::Unavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl QuestionBank for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self))]
    async fn list_chapters(&self, subject: &str) -> Result<Vec<String>, StoreError> {
        let bank = self.load_bank().await?;
        let mut chapters: Vec<String> = match bank.get(subject) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(StoreError::Malformed {
                    path: format!("{BANK_FILE}:{subject}"),
                    message: "expected an object of chapters".into(),
                })
            }
        };
        chapters.sort();
        Ok(chapters)
    }

    #[instrument(skip(self))]
    async fn fetch_questions(
        &self,
        subject: &str,
        chapter: &str,
    ) -> Result<Vec<Question>, StoreError> {
        let mut bank = self.load_bank().await?;
        let node = bank
            .get_mut(subject)
            .and_then(|s| s.get_mut(chapter))
            .and_then(|c| c.get_mut("questions"))
            .map(Value::take)
            .unwrap_or(Value::Null);
        questions_from_value(node, &format!("{BANK_FILE}:{subject}/{chapter}/questions"))
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self, path, record), fields(path = %path))]
    async fn append(&self, path: &HistoryPath, record: &ScoreRecord) -> Result<String, StoreError> {
        let file_path = self.history_path(&path.user_id)?;
        let key = Uuid::new_v4().simple().to_string();

        let mut record = record.clone();
        record.subject = path.subject.clone();
        if path.chapter.is_some() {
            record.chapter = path.chapter.clone();
        }
        let line = HistoryLine {
            key: key.clone(),
            record,
        };
        let mut json = serde_json::to_string(&line).map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        json.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(format!("cannot create {}: {e}", parent.display())))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("cannot open {}: {e}", file_path.display())))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| StoreError::Unavailable(format!("cannot write {}: {e}", file_path.display())))?;
        file.flush()
            .await
            .map_err(|e| StoreError::Unavailable(format!("cannot write {}: {e}", file_path.display())))?;

        tracing::debug!(key = %key, "record appended");
        Ok(key)
    }

    #[instrument(skip(self))]
    async fn read_all(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        let file_path = self.history_path(user_id)?;
        let content = match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {}: {e}",
                    file_path.display()
                )))
            }
        };

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryLine>(line) {
                Ok(entry) => records.push(entry.record),
                Err(e) => tracing::warn!(
                    file = %file_path.display(),
                    line = number + 1,
                    error = %e,
                    "skipping malformed score record"
                ),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neetprep_core::scoring::ScoreSummary;
    use serde_json::json;

    fn write_bank(dir: &Path) {
        let bank = json!({
            "physics": {
                "optics": {"questions": {
                    "1": {"question": "Lens?", "options": {"a": "x", "b": "y"}, "correct": "a"},
                    "2": {"question": "Mirror?", "options": {"a": "x", "b": "y"}, "correct": "b"}
                }},
                "kinetics": {"questions": [
                    {"question": "Speed?", "options": {"a": "x", "b": "y"}, "correct": "a"}
                ]}
            }
        });
        std::fs::write(dir.join(BANK_FILE), bank.to_string()).unwrap();
    }

    fn record(score: f64) -> ScoreRecord {
        let summary = ScoreSummary {
            total: 2,
            correct: 1,
            incorrect: 1,
            skipped: 0,
            score,
        };
        ScoreRecord::new("physics", Some("optics"), None, &summary, 12)
    }

    #[tokio::test]
    async fn reads_chapters_and_questions() {
        let dir = tempfile::tempdir().unwrap();
        write_bank(dir.path());
        let store = FileStore::new(dir.path());

        assert_eq!(
            store.list_chapters("physics").await.unwrap(),
            vec!["kinetics", "optics"]
        );
        assert!(store.list_chapters("biology").await.unwrap().is_empty());

        let optics = store.fetch_questions("physics", "optics").await.unwrap();
        assert_eq!(optics.len(), 2);
        assert_eq!(optics[1].prompt, "Mirror?");

        let kinetics = store.fetch_questions("physics", "kinetics").await.unwrap();
        assert_eq!(kinetics[0].id, "0");

        assert!(store.fetch_questions("physics", "waves").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_bank_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.list_chapters("physics").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn corrupt_bank_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BANK_FILE), "{not json").unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.fetch_questions("physics", "optics").await,
            Err(StoreError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn history_appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = HistoryPath::new("u1", "physics", Some("optics"));

        let first = store.append(&path, &record(40.0)).await.unwrap();
        let second = store.append(&path, &record(60.0)).await.unwrap();
        assert_ne!(first, second);

        let records = store.read_all("u1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].score, 40.0);
        assert_eq!(records[1].score, 60.0);
        assert_eq!(records[1].chapter.as_deref(), Some("optics"));

        let raw = std::fs::read_to_string(dir.path().join("history").join("u1.jsonl")).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.contains(&first));
        assert!(raw.contains("\"correctCount\":1"));
    }

    #[tokio::test]
    async fn unknown_user_has_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read_all("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store
            .append(&HistoryPath::new("u1", "physics", None), &record(80.0))
            .await
            .unwrap();

        let file = dir.path().join("history").join("u1.jsonl");
        let mut content = std::fs::read_to_string(&file).unwrap();
        content.push_str("garbage\n\n");
        std::fs::write(&file, content).unwrap();

        let records = store.read_all("u1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 80.0);
    }

    #[tokio::test]
    async fn user_ids_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for bad in ["", "..", "a/b", "..\\x"] {
            assert!(store.read_all(bad).await.is_err(), "accepted {bad:?}");
        }
    }
}
