//! Question loading and selection for each test mode.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::Value;

use crate::error::{BankError, StoreError};
use crate::model::{Question, TestMode};
use crate::traits::QuestionBank;

/// Number of questions drawn for a group or all-chapters test.
pub const DEFAULT_GROUP_SIZE: usize = 20;

/// Display label of a group test.
pub const GROUP_LABEL: &str = "Group Test";
/// Display label of an all-chapters test.
pub const ALL_LABEL: &str = "All Chapters";
/// Display label of a speed test.
pub const SPEED_LABEL: &str = "Speed Test";

/// Decode a chapter's stored `questions` node.
///
/// Accepts a keyed object or an array (`null` entries are holes and are
/// skipped). Questions without an `id` take their key. The result is in
/// natural key order: numeric keys by value first, then the rest as text.
/// Entries that do not parse as a question are skipped with a warning.
pub fn questions_from_value(value: Value, path: &str) -> Result<Vec<Question>, StoreError> {
    let entries: Vec<(String, Value)> = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(StoreError::Malformed {
                path: path.to_string(),
                message: format!("expected an object of questions, got {}", kind(&other)),
            })
        }
    };

    let mut questions = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        if entry.is_null() {
            continue;
        }
        match serde_json::from_value::<Question>(entry) {
            Ok(mut question) => {
                if question.id.is_empty() {
                    question.id = key;
                }
                questions.push(question);
            }
            Err(e) => {
                tracing::warn!(path, key = %key, error = %e, "skipping malformed question");
            }
        }
    }

    questions.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    Ok(questions)
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Problems in a question set that would make a quiz misbehave.
pub fn validate_questions(questions: &[Question]) -> Vec<String> {
    let mut warnings = Vec::new();
    for question in questions {
        let id = &question.id;
        if question.prompt.trim().is_empty() {
            warnings.push(format!("question {id}: empty prompt"));
        }
        if question.options.is_empty() {
            warnings.push(format!("question {id}: no options"));
        }
        if question.correct.trim().is_empty() {
            warnings.push(format!("question {id}: no correct option"));
        } else if !question.options.is_empty() && !question.offers(&question.correct) {
            warnings.push(format!(
                "question {id}: correct option '{}' is not among the options",
                question.correct
            ));
        }
    }
    warnings
}

/// Shuffles and samples question pools.
///
/// Seed it in tests for a reproducible order; production uses OS entropy.
#[derive(Debug, Clone)]
pub struct QuestionSelector {
    rng: StdRng,
}

impl QuestionSelector {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Shuffle `pool` and keep `min(requested, pool.len())` questions.
    pub fn select(&mut self, mut pool: Vec<Question>, requested: usize) -> Vec<Question> {
        pool.shuffle(&mut self.rng);
        pool.truncate(requested);
        pool
    }
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Everything needed to start and later record one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPlan {
    pub subject: String,
    /// Chapter the result is filed under; `None` for mixed-chapter modes.
    pub chapter: Option<String>,
    /// What to show as the quiz title.
    pub label: String,
    pub mode: TestMode,
    pub questions: Vec<Question>,
    pub time_limit_secs: Option<u64>,
}

/// Fetches question sets from a [`QuestionBank`] by subject, chapter and mode.
pub struct QuestionBankAccessor {
    bank: Arc<dyn QuestionBank>,
    group_size: usize,
}

impl QuestionBankAccessor {
    pub fn new(bank: Arc<dyn QuestionBank>) -> Self {
        Self {
            bank,
            group_size: DEFAULT_GROUP_SIZE,
        }
    }

    /// Override how many questions group and all-chapters tests draw.
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    pub fn bank_name(&self) -> &str {
        self.bank.name()
    }

    pub async fn chapters(&self, subject: &str) -> Result<Vec<String>, StoreError> {
        self.bank.list_chapters(subject).await
    }

    pub async fn chapter_questions(
        &self,
        subject: &str,
        chapter: &str,
    ) -> Result<Vec<Question>, StoreError> {
        let questions = self.bank.fetch_questions(subject, chapter).await?;
        tracing::debug!(subject, chapter, count = questions.len(), "fetched chapter");
        Ok(questions)
    }

    /// Questions of several chapters, fetched concurrently and concatenated
    /// in the order the chapters were given.
    pub async fn pooled_questions(
        &self,
        subject: &str,
        chapters: &[String],
    ) -> Result<Vec<Question>, StoreError> {
        let fetches = chapters
            .iter()
            .map(|chapter| self.chapter_questions(subject, chapter));
        let per_chapter = try_join_all(fetches).await?;
        Ok(per_chapter.into_iter().flatten().collect())
    }

    /// Assemble the question set for `mode`.
    ///
    /// Single-chapter modes use the first entry of `chapters`. Group and
    /// speed tests pool the given chapters; all-chapters tests ignore them
    /// and pool the whole subject.
    pub async fn load_for_mode(
        &self,
        subject: &str,
        mode: TestMode,
        chapters: &[String],
        selector: &mut QuestionSelector,
    ) -> Result<QuizPlan, BankError> {
        if mode.is_single_chapter() && chapters.len() > 1 {
            tracing::warn!(%mode, chapter = %chapters[0], "mode uses one chapter, ignoring the rest");
        }

        let (chapter, label, questions) = match mode {
            TestMode::Easy | TestMode::Individual | TestMode::Hard(_) => {
                let chapter = chapters
                    .first()
                    .ok_or_else(|| BankError::MissingChapter(mode.to_string()))?;
                let questions = self.chapter_questions(subject, chapter).await?;
                (Some(chapter.clone()), chapter.clone(), questions)
            }
            TestMode::Group => {
                if chapters.is_empty() {
                    return Err(BankError::NoChaptersSelected(mode.to_string()));
                }
                let pool = self.pooled_questions(subject, chapters).await?;
                (None, GROUP_LABEL.to_string(), selector.select(pool, self.group_size))
            }
            TestMode::All => {
                let every = self.chapters(subject).await?;
                let pool = self.pooled_questions(subject, &every).await?;
                (None, ALL_LABEL.to_string(), selector.select(pool, self.group_size))
            }
            TestMode::Speed { questions, .. } => {
                if chapters.is_empty() {
                    return Err(BankError::NoChaptersSelected(mode.to_string()));
                }
                let pool = self.pooled_questions(subject, chapters).await?;
                (None, SPEED_LABEL.to_string(), selector.select(pool, questions))
            }
        };

        tracing::debug!(
            bank = self.bank_name(),
            subject,
            %mode,
            questions = questions.len(),
            "quiz assembled"
        );
        Ok(QuizPlan {
            subject: subject.to_string(),
            chapter,
            label,
            mode,
            questions,
            time_limit_secs: mode.time_limit_secs(),
        })
    }
}
