//! Core data model types for neetprep.
//!
//! Questions as they come out of the question bank, the test modes a quiz
//! can run in, and the score records appended to a learner's history.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::scoring::ScoreSummary;
use crate::timer::parse_clock;

/// Chosen option key per question index. Absent means skipped.
pub type AnswerMap = BTreeMap<usize, String>;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Key of the question under its chapter. Filled from the map key when
    /// the stored document does not carry one.
    #[serde(default)]
    pub id: String,
    /// The question text.
    #[serde(rename = "question")]
    pub prompt: String,
    /// Option key (e.g. "a") to option text.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Key of the correct option.
    #[serde(default)]
    pub correct: String,
    /// Worked solution shown after the test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Whether `answer` names the correct option (case-insensitive, trimmed).
    pub fn is_correct(&self, answer: &str) -> bool {
        let correct = normalize_key(&self.correct);
        !correct.is_empty() && normalize_key(answer) == correct
    }

    /// Whether `key` names one of this question's options. Questions stored
    /// without options accept any key.
    pub fn offers(&self, key: &str) -> bool {
        if self.options.is_empty() {
            return true;
        }
        let key = normalize_key(key);
        self.options.keys().any(|k| normalize_key(k) == key)
    }
}

/// Canonical form of an option key for comparisons.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Sub-levels of hard mode. Each one shortens the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardLevel {
    Beginner,
    Intermediate,
    Advance,
}

impl HardLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HardLevel::Beginner => "beginner",
            HardLevel::Intermediate => "intermediate",
            HardLevel::Advance => "advance",
        }
    }

    pub fn time_limit_secs(&self) -> u64 {
        match self {
            HardLevel::Beginner => 20 * 60,
            HardLevel::Intermediate => 15 * 60,
            HardLevel::Advance => 10 * 60,
        }
    }
}

impl FromStr for HardLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(HardLevel::Beginner),
            "intermediate" => Ok(HardLevel::Intermediate),
            "advance" | "advanced" => Ok(HardLevel::Advance),
            other => Err(format!("unknown hard level: {other}")),
        }
    }
}

/// Minutes offered for a speed test.
pub const SPEED_MINUTES: [u32; 4] = [5, 10, 15, 20];
/// Question counts offered for a speed test.
pub const SPEED_QUESTIONS: [usize; 4] = [10, 20, 30, 40];

/// Countdown used by the individual, group and all-chapters modes.
pub const MODE_TEST_LIMIT_SECS: u64 = 20 * 60;

/// How a quiz is assembled and timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestMode {
    /// One chapter, untimed (the clock counts up).
    Easy,
    /// One chapter, fixed countdown.
    Individual,
    /// Questions pooled from selected chapters and sampled.
    Group,
    /// Questions pooled from every chapter of the subject and sampled.
    All,
    /// One chapter with a level-dependent countdown.
    Hard(HardLevel),
    /// Selected chapters with a user-picked duration and size.
    Speed { minutes: u32, questions: usize },
}

impl TestMode {
    /// Build a speed mode, rejecting durations and sizes the app does not offer.
    pub fn speed(minutes: u32, questions: usize) -> Result<Self, String> {
        if !SPEED_MINUTES.contains(&minutes) {
            return Err(format!(
                "speed test duration must be one of {SPEED_MINUTES:?} minutes, got {minutes}"
            ));
        }
        if !SPEED_QUESTIONS.contains(&questions) {
            return Err(format!(
                "speed test size must be one of {SPEED_QUESTIONS:?} questions, got {questions}"
            ));
        }
        Ok(TestMode::Speed { minutes, questions })
    }

    /// Countdown length, or `None` for a count-up clock.
    pub fn time_limit_secs(&self) -> Option<u64> {
        match self {
            TestMode::Easy => None,
            TestMode::Individual | TestMode::Group | TestMode::All => Some(MODE_TEST_LIMIT_SECS),
            TestMode::Hard(level) => Some(level.time_limit_secs()),
            TestMode::Speed { minutes, .. } => Some(u64::from(*minutes) * 60),
        }
    }

    /// Whether the mode runs on exactly one chapter.
    pub fn is_single_chapter(&self) -> bool {
        matches!(
            self,
            TestMode::Easy | TestMode::Individual | TestMode::Hard(_)
        )
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMode::Easy => write!(f, "easy"),
            TestMode::Individual => write!(f, "individual"),
            TestMode::Group => write!(f, "group"),
            TestMode::All => write!(f, "all"),
            TestMode::Hard(level) => write!(f, "hard-{}", level.as_str()),
            TestMode::Speed { minutes, questions } => {
                write!(f, "speed-{minutes}m-{questions}q")
            }
        }
    }
}

impl FromStr for TestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "easy" => return Ok(TestMode::Easy),
            "individual" => return Ok(TestMode::Individual),
            "group" => return Ok(TestMode::Group),
            "all" => return Ok(TestMode::All),
            "hard" => return Ok(TestMode::Hard(HardLevel::Beginner)),
            _ => {}
        }
        if let Some(level) = s.strip_prefix("hard-").or_else(|| s.strip_prefix("hard:")) {
            return level.parse().map(TestMode::Hard);
        }
        if let Ok(level) = s.parse::<HardLevel>() {
            return Ok(TestMode::Hard(level));
        }
        if let Some(rest) = s.strip_prefix("speed-") {
            // speed-{minutes}m-{questions}q
            let (minutes, questions) = rest
                .split_once('-')
                .ok_or_else(|| format!("malformed speed mode: {s}"))?;
            let minutes = minutes
                .strip_suffix('m')
                .and_then(|m| m.parse::<u32>().ok())
                .ok_or_else(|| format!("malformed speed duration: {s}"))?;
            let questions = questions
                .strip_suffix('q')
                .and_then(|q| q.parse::<usize>().ok())
                .ok_or_else(|| format!("malformed speed size: {s}"))?;
            return TestMode::speed(minutes, questions);
        }
        Err(format!("unknown test mode: {s}"))
    }
}

/// Location of a history collection: `userResults/{user}/{subject}[/{chapter}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryPath {
    pub user_id: String,
    pub subject: String,
    pub chapter: Option<String>,
}

/// Root node of all result histories in the store.
pub const HISTORY_ROOT: &str = "userResults";

impl HistoryPath {
    pub fn new(user_id: &str, subject: &str, chapter: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            chapter: chapter.map(str::to_string),
        }
    }

    /// Path segments below the store root.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec![HISTORY_ROOT, self.user_id.as_str(), self.subject.as_str()];
        if let Some(chapter) = &self.chapter {
            segments.push(chapter.as_str());
        }
        segments
    }
}

impl fmt::Display for HistoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

/// One submitted quiz, as appended to the learner's history.
///
/// Serialized with the store's camelCase field names so records written by
/// earlier clients read back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub total_questions: usize,
    #[serde(default)]
    pub correct_count: usize,
    #[serde(default)]
    pub incorrect_count: usize,
    #[serde(default)]
    pub skipped_count: usize,
    /// Percentage, two decimals. Older records stored it as a string.
    #[serde(deserialize_with = "number_or_string")]
    pub score: f64,
    /// Older records stored a `timeTaken` clock string instead.
    #[serde(default, alias = "timeTaken", deserialize_with = "seconds_or_clock")]
    pub time_taken_secs: u64,
    #[serde(
        rename = "timestamp",
        with = "chrono::serde::ts_milliseconds",
        default = "Utc::now"
    )]
    pub created_at: DateTime<Utc>,
}

impl ScoreRecord {
    /// Build a record for a freshly scored quiz, stamped now.
    pub fn new(
        subject: &str,
        chapter: Option<&str>,
        mode: Option<TestMode>,
        summary: &ScoreSummary,
        time_taken_secs: u64,
    ) -> Self {
        Self {
            subject: subject.to_string(),
            chapter: chapter.map(str::to_string),
            mode: mode.map(|m| m.to_string()),
            total_questions: summary.total,
            correct_count: summary.correct,
            incorrect_count: summary.incorrect,
            skipped_count: summary.skipped,
            score: summary.score,
            time_taken_secs,
            created_at: Utc::now(),
        }
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid score: {s:?}"))),
    }
}

/// Seconds as a number, or an `MM:SS` / `HH:MM:SS` clock. An unreadable
/// clock counts as 0 so the rest of the record survives.
fn seconds_or_clock<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n.is_finite() && n > 0.0 => n.round() as u64,
        Raw::Number(_) => 0,
        Raw::Text(s) => parse_clock(&s)
            .or_else(|| s.trim().parse::<u64>().ok())
            .unwrap_or(0),
    })
}
