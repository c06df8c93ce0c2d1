//! The quiz session state machine.
//!
//! ```text
//! Created -> Running <-> Paused -> Submitted | TimedOut
//! ```
//!
//! `Submitted` and `TimedOut` are terminal: every mutating call afterwards
//! returns [`SessionError::Finished`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::{normalize_key, AnswerMap, Question};
use crate::timer::{QuizTimer, TickOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Running,
    Paused,
    Submitted,
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Submitted | SessionState::TimedOut)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::Running => write!(f, "running"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Submitted => write!(f, "submitted"),
            SessionState::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of a selection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded,
    /// The question was already answered; the stored answer is unchanged.
    AlreadyAnswered { existing: String },
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Submitted,
    TimedOut,
}

/// The frozen questions and answers handed to the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedQuiz {
    pub questions: Vec<Question>,
    pub answers: AnswerMap,
    pub elapsed_secs: u64,
    pub reason: FinishReason,
}

/// What a one-second tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// Not running (created or paused); the clock did not move.
    Ignored,
    Advanced {
        elapsed_secs: u64,
        remaining_secs: Option<u64>,
    },
    /// The countdown reached zero. The session is now `TimedOut` and the
    /// caller must submit this result. Emitted exactly once.
    TimeUp(FinishedQuiz),
}

/// One learner's pass through an ordered question list.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    answers: AnswerMap,
    timer: QuizTimer,
    state: SessionState,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    /// A session in the `Created` state with no questions.
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            current: 0,
            answers: AnswerMap::new(),
            timer: QuizTimer::count_up(),
            state: SessionState::Created,
        }
    }

    /// Load questions and start the clock. The clock counts down from
    /// `time_limit_secs` when given and counts up otherwise.
    ///
    /// An empty question list is refused and the session stays `Created`.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        time_limit_secs: Option<u64>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Created {
            return Err(self.reject("start"));
        }
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }

        self.questions = questions;
        self.current = 0;
        self.answers.clear();
        self.timer = QuizTimer::from_limit(time_limit_secs);
        self.state = SessionState::Running;
        tracing::debug!(
            questions = self.questions.len(),
            limit = ?time_limit_secs,
            "quiz session started"
        );
        Ok(())
    }

    /// Record an answer for `index`. The first answer for a question locks it.
    pub fn select_answer(
        &mut self,
        index: usize,
        option: &str,
    ) -> Result<AnswerOutcome, SessionError> {
        self.ensure_active("answer")?;
        let question = self
            .questions
            .get(index)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            })?;

        if let Some(existing) = self.answers.get(&index) {
            tracing::warn!(index, existing = %existing, attempted = option, "answer already locked");
            return Ok(AnswerOutcome::AlreadyAnswered {
                existing: existing.clone(),
            });
        }

        let option = option.trim();
        if option.is_empty() || !question.offers(option) {
            return Err(SessionError::UnknownOption {
                index,
                option: option.to_string(),
            });
        }

        self.answers.insert(index, normalize_key(option));
        Ok(AnswerOutcome::Recorded)
    }

    /// Answer the question at the current position.
    pub fn select_current(&mut self, option: &str) -> Result<AnswerOutcome, SessionError> {
        self.select_answer(self.current, option)
    }

    /// Move forward. Returns `false` at the last question.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.ensure_active("move")?;
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Move back. Returns `false` at the first question.
    pub fn prev(&mut self) -> Result<bool, SessionError> {
        self.ensure_active("move")?;
        if self.current > 0 {
            self.current -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Paused;
                Ok(())
            }
            _ => Err(self.reject("pause")),
        }
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Paused => {
                self.state = SessionState::Running;
                Ok(())
            }
            _ => Err(self.reject("resume")),
        }
    }

    /// Advance the clock by one second. Only a running session's clock moves.
    pub fn tick(&mut self) -> Result<TickEvent, SessionError> {
        match self.state {
            SessionState::Created | SessionState::Paused => return Ok(TickEvent::Ignored),
            SessionState::Submitted | SessionState::TimedOut => {
                return Err(SessionError::Finished(self.state))
            }
            SessionState::Running => {}
        }

        match self.timer.tick() {
            TickOutcome::Advanced => Ok(TickEvent::Advanced {
                elapsed_secs: self.timer.elapsed_secs(),
                remaining_secs: self.timer.remaining_secs(),
            }),
            TickOutcome::Expired => {
                self.state = SessionState::TimedOut;
                tracing::info!(elapsed = self.timer.elapsed_secs(), "quiz time is up");
                Ok(TickEvent::TimeUp(self.freeze(FinishReason::TimedOut)))
            }
        }
    }

    /// End the quiz and hand back the frozen questions and answers.
    pub fn submit(&mut self) -> Result<FinishedQuiz, SessionError> {
        self.ensure_active("submit")?;
        self.state = SessionState::Submitted;
        Ok(self.freeze(FinishReason::Submitted))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.timer.remaining_secs()
    }

    fn freeze(&self, reason: FinishReason) -> FinishedQuiz {
        FinishedQuiz {
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            elapsed_secs: self.timer.elapsed_secs(),
            reason,
        }
    }

    /// Running or paused. Answers and navigation stay available while
    /// paused; only the clock stops.
    fn ensure_active(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running | SessionState::Paused => Ok(()),
            _ => Err(self.reject(action)),
        }
    }

    fn reject(&self, action: &'static str) -> SessionError {
        match self.state {
            SessionState::Created if action != "start" && action != "resume" => {
                SessionError::NotStarted
            }
            state if state.is_terminal() => SessionError::Finished(state),
            state => SessionError::InvalidTransition { state, action },
        }
    }
}
