//! Runs a [`QuizSession`] on its own task.
//!
//! User commands and the one-second tick go through a single task that owns
//! the session, so they can never interleave. The tick only runs while the
//! session is running; pausing, finishing or dropping the handle stops it.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::SessionError;
use crate::model::Question;
use crate::session::{AnswerOutcome, FinishedQuiz, QuizSession, SessionState, TickEvent};

/// How often the driver ticks a running session.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 32;

/// Pushed to the host as the session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Tick {
        elapsed_secs: u64,
        remaining_secs: Option<u64>,
    },
    /// The countdown ran out. Sent once; the host must score and save it.
    TimedOut(FinishedQuiz),
}

/// Read-only view of a driven session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub current_index: usize,
    pub total: usize,
    pub answered: usize,
    pub elapsed_secs: u64,
    pub remaining_secs: Option<u64>,
    pub question: Option<Question>,
    /// The locked answer for the current question.
    pub answer: Option<String>,
}

impl SessionSnapshot {
    fn of(session: &QuizSession) -> Self {
        let current_index = session.current_index();
        Self {
            state: session.state(),
            current_index,
            total: session.len(),
            answered: session.answered_count(),
            elapsed_secs: session.elapsed_secs(),
            remaining_secs: session.remaining_secs(),
            question: session.current_question().cloned(),
            answer: session.answer_for(current_index).map(str::to_string),
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    Select {
        index: Option<usize>,
        option: String,
        reply: Reply<AnswerOutcome>,
    },
    Next(Reply<bool>),
    Prev(Reply<bool>),
    Pause(Reply<()>),
    Resume(Reply<()>),
    Submit(Reply<FinishedQuiz>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Spawn a driver task for `session` and return its handle plus the event
/// stream. The session is usually already started.
pub fn spawn_session(session: QuizSession) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(session, command_rx, event_tx));
    (
        SessionHandle {
            commands: command_tx,
            task,
        },
        event_rx,
    )
}

/// Sends commands to a driven session. Dropping it stops the driver.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Answer question `index`.
    pub async fn select_answer(
        &self,
        index: usize,
        option: impl Into<String>,
    ) -> Result<AnswerOutcome, SessionError> {
        let option = option.into();
        self.request(|reply| Command::Select {
            index: Some(index),
            option,
            reply,
        })
        .await?
    }

    /// Answer the question at the current position.
    pub async fn select_current(
        &self,
        option: impl Into<String>,
    ) -> Result<AnswerOutcome, SessionError> {
        let option = option.into();
        self.request(|reply| Command::Select {
            index: None,
            option,
            reply,
        })
        .await?
    }

    pub async fn next(&self) -> Result<bool, SessionError> {
        self.request(Command::Next).await?
    }

    pub async fn prev(&self) -> Result<bool, SessionError> {
        self.request(Command::Prev).await?
    }

    pub async fn pause(&self) -> Result<(), SessionError> {
        self.request(Command::Pause).await?
    }

    pub async fn resume(&self) -> Result<(), SessionError> {
        self.request(Command::Resume).await?
    }

    pub async fn submit(&self) -> Result<FinishedQuiz, SessionError> {
        self.request(Command::Submit).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Snapshot).await
    }

    /// Stop the driver and wait for its task to end.
    pub async fn shutdown(self) {
        let SessionHandle { commands, task } = self;
        drop(commands);
        if let Err(e) = task.await {
            tracing::error!(error = %e, "session driver task failed");
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::DriverStopped)?;
        rx.await.map_err(|_| SessionError::DriverStopped)
    }
}

async fn run(
    mut session: QuizSession,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let mut ticker: Option<Interval> = None;

    loop {
        sync_ticker(&session, &mut ticker);

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(command) => handle(&mut session, command),
                None => break,
            },

            _ = next_tick(&mut ticker) => match session.tick() {
                Ok(TickEvent::Advanced { elapsed_secs, remaining_secs }) => {
                    let _ = events.send(SessionEvent::Tick { elapsed_secs, remaining_secs });
                }
                Ok(TickEvent::TimeUp(finished)) => {
                    let _ = events.send(SessionEvent::TimedOut(finished));
                }
                Ok(TickEvent::Ignored) => {}
                Err(e) => tracing::debug!(error = %e, "tick after finish"),
            },
        }
    }

    tracing::debug!(state = %session.state(), "session driver stopped");
}

/// Arm the ticker while running, drop it otherwise.
fn sync_ticker(session: &QuizSession, ticker: &mut Option<Interval>) {
    if session.state() == SessionState::Running {
        if ticker.is_none() {
            let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(interval);
        }
    } else {
        *ticker = None;
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn handle(session: &mut QuizSession, command: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Select {
            index,
            option,
            reply,
        } => {
            let result = match index {
                Some(index) => session.select_answer(index, &option),
                None => session.select_current(&option),
            };
            let _ = reply.send(result);
        }
        Command::Next(reply) => {
            let _ = reply.send(session.next());
        }
        Command::Prev(reply) => {
            let _ = reply.send(session.prev());
        }
        Command::Pause(reply) => {
            let _ = reply.send(session.pause());
        }
        Command::Resume(reply) => {
            let _ = reply.send(session.resume());
        }
        Command::Submit(reply) => {
            let _ = reply.send(session.submit());
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(SessionSnapshot::of(session));
        }
    }
}
