//! In-memory backend for tests and demos.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use neetprep_core::bank::questions_from_value;
use neetprep_core::error::StoreError;
use neetprep_core::model::{HistoryPath, Question, ScoreRecord};
use neetprep_core::traits::{HistoryStore, QuestionBank};

/// An appended record and where it went.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub path: HistoryPath,
    pub record: ScoreRecord,
}

/// Question bank and history held in process memory.
///
/// Can be switched offline to exercise unavailability handling.
pub struct MemoryStore {
    /// Same tree shape as the remote `test` node.
    bank: Mutex<Value>,
    history: Mutex<BTreeMap<String, Vec<StoredRecord>>>,
    unavailable: AtomicBool,
    append_count: AtomicU32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_bank(Value::Null)
    }

    pub fn with_bank(bank: Value) -> Self {
        Self {
            bank: Mutex::new(bank),
            history: Mutex::new(BTreeMap::new()),
            unavailable: AtomicBool::new(false),
            append_count: AtomicU32::new(0),
        }
    }

    /// While set, every call fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful appends.
    pub fn append_count(&self) -> u32 {
        self.append_count.load(Ordering::SeqCst)
    }

    /// Every record appended for `user_id`, in append order.
    pub fn stored(&self, user_id: &str) -> Vec<StoredRecord> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a record as if it had been appended.
    pub fn insert(&self, path: HistoryPath, record: ScoreRecord) -> String {
        let key = Uuid::new_v4().simple().to_string();
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(path.user_id.clone())
            .or_default()
            .push(StoredRecord {
                key: key.clone(),
                path,
                record,
            });
        key
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl QuestionBank for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_chapters(&self, subject: &str) -> Result<Vec<String>, StoreError> {
        self.check_online()?;
        let bank = self.bank.lock().unwrap_or_else(|e| e.into_inner());
        let mut chapters: Vec<String> = bank
            .get(subject)
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        chapters.sort();
        Ok(chapters)
    }

    async fn fetch_questions(
        &self,
        subject: &str,
        chapter: &str,
    ) -> Result<Vec<Question>, StoreError> {
        self.check_online()?;
        let node = {
            let bank = self.bank.lock().unwrap_or_else(|e| e.into_inner());
            bank.get(subject)
                .and_then(|s| s.get(chapter))
                .and_then(|c| c.get("questions"))
                .cloned()
                .unwrap_or(Value::Null)
        };
        questions_from_value(node, &format!("test/{subject}/{chapter}/questions"))
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, path: &HistoryPath, record: &ScoreRecord) -> Result<String, StoreError> {
        self.check_online()?;
        let key = self.insert(path.clone(), record.clone());
        self.append_count.fetch_add(1, Ordering::SeqCst);
        Ok(key)
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        self.check_online()?;
        Ok(self.stored(user_id).into_iter().map(|s| s.record).collect())
    }
}
