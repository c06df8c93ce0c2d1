//! Firebase Realtime Database backend over the REST API.
//!
//! Layout:
//!
//! ```text
//! test/{subject}/{chapter}/questions/{key}       question documents
//! userResults/{uid}/{subject}[/{chapter}]/{push} score records
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use neetprep_core::bank::questions_from_value;
use neetprep_core::error::StoreError;
use neetprep_core::model::{HistoryPath, Question, ScoreRecord, HISTORY_ROOT};
use neetprep_core::traits::{HistoryStore, QuestionBank};

use crate::error::{from_reqwest, from_status, DEFAULT_TIMEOUT_SECS};

/// Root node of the question bank.
pub const BANK_ROOT: &str = "test";

/// Firebase Realtime Database client.
pub struct FirebaseStore {
    base_url: Url,
    auth_token: Option<String>,
    client: reqwest::Client,
}

/// Response to a push (`POST`).
#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseStore {
    pub fn new(database_url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        let base_url = Url::parse(database_url).map_err(|e| {
            StoreError::Unavailable(format!("invalid database URL '{database_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "invalid database URL '{database_url}'"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url,
            auth_token: auth_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// `{base}/{segments...}.json` with the auth token and optional shallow flag.
    fn url(&self, segments: &[&str], shallow: bool) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            if let Some((last, parents)) = segments.split_last() {
                path.extend(parents);
                path.push(&format!("{last}.json"));
            }
        }
        if shallow || self.auth_token.is_some() {
            let mut query = url.query_pairs_mut();
            if shallow {
                query.append_pair("shallow", "true");
            }
            if let Some(token) = &self.auth_token {
                query.append_pair("auth", token);
            }
        }
        url
    }

    /// Read a node. A missing node (`404` or `null`) reads as `Value::Null`.
    async fn get(&self, segments: &[&str], shallow: bool) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(self.url(segments, shallow))
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status().as_u16();
        if status == 404 {
            return Ok(Value::Null);
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Malformed {
                path: segments.join("/"),
                message: format!("failed to parse response: {e}"),
            })
    }
}

#[async_trait]
impl QuestionBank for FirebaseStore {
    fn name(&self) -> &str {
        "firebase"
    }

    #[instrument(skip(self))]
    async fn list_chapters(&self, subject: &str) -> Result<Vec<String>, StoreError> {
        match self.get(&[BANK_ROOT, subject], true).await? {
            Value::Null => Ok(Vec::new()),
            Value::Object(map) => {
                let mut chapters: Vec<String> = map.into_iter().map(|(k, _)| k).collect();
                chapters.sort();
                Ok(chapters)
            }
            _ => Err(StoreError::Malformed {
                path: format!("{BANK_ROOT}/{subject}"),
                message: "expected an object of chapters".into(),
            }),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_questions(
        &self,
        subject: &str,
        chapter: &str,
    ) -> Result<Vec<Question>, StoreError> {
        let segments = [BANK_ROOT, subject, chapter, "questions"];
        let value = self.get(&segments, false).await?;
        questions_from_value(value, &segments.join("/"))
    }
}

#[async_trait]
impl HistoryStore for FirebaseStore {
    fn name(&self) -> &str {
        "firebase"
    }

    #[instrument(skip(self, path, record), fields(path = %path))]
    async fn append(&self, path: &HistoryPath, record: &ScoreRecord) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.url(&path.segments(), false))
            .json(record)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, body));
        }

        let pushed: PushResponse = response.json().await.map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            message: format!("failed to parse push response: {e}"),
        })?;
        tracing::debug!(key = %pushed.name, "record pushed");
        Ok(pushed.name)
    }

    #[instrument(skip(self))]
    async fn read_all(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        let tree = self.get(&[HISTORY_ROOT, user_id], false).await?;
        Ok(flatten_history(&tree))
    }
}

/// Every score record in a learner's `userResults` tree, oldest first.
///
/// Any object with a `score` field is a record. Records without a subject
/// take it from the first path segment; records filed under a chapter node
/// take the chapter from the second. Unreadable records are skipped.
pub fn flatten_history(tree: &Value) -> Vec<ScoreRecord> {
    let mut records = Vec::new();
    let mut trail = Vec::new();
    collect_records(tree, &mut trail, &mut records);
    records.sort_by_key(|r| r.created_at);
    records
}

fn collect_records<'a>(value: &'a Value, trail: &mut Vec<&'a str>, out: &mut Vec<ScoreRecord>) {
    let Value::Object(map) = value else {
        return;
    };

    if map.contains_key("score") {
        match serde_json::from_value::<ScoreRecord>(value.clone()) {
            Ok(mut record) => {
                if record.subject.is_empty() {
                    if let Some(subject) = trail.first() {
                        record.subject = subject.to_string();
                    }
                }
                // subject / chapter / push id
                if record.chapter.is_none() && trail.len() >= 3 {
                    record.chapter = Some(trail[1].to_string());
                }
                out.push(record);
            }
            Err(e) => {
                tracing::warn!(path = %trail.join("/"), error = %e, "skipping malformed score record");
            }
        }
        return;
    }

    for (key, child) in map {
        trail.push(key.as_str());
        collect_records(child, trail, out);
        trail.pop();
    }
}
