//! The `neetprep take` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc::UnboundedReceiver;

use neetprep_core::bank::{QuestionBankAccessor, QuestionSelector, QuizPlan};
use neetprep_core::driver::{spawn_session, SessionEvent, SessionHandle};
use neetprep_core::error::{PersistError, SessionError};
use neetprep_core::model::TestMode;
use neetprep_core::persist::{join_persist, ResultPersister};
use neetprep_core::scoring::{review, Outcome, ScoreSummary};
use neetprep_core::session::{
    AnswerOutcome, FinishReason, FinishedQuiz, QuizSession, SessionState,
};
use neetprep_core::timer::format_clock;
use neetprep_store::{Backend, NeetprepConfig};

#[derive(Args)]
pub struct TakeArgs {
    /// Subject, e.g. "physics"
    #[arg(long)]
    subject: String,

    /// Chapter to test (repeat for group and speed tests)
    #[arg(long = "chapter")]
    chapters: Vec<String>,

    /// Mode: easy, individual, group, all, hard-beginner, hard-intermediate, hard-advance, speed
    #[arg(long, default_value = "easy")]
    mode: String,

    /// Speed test duration in minutes (5, 10, 15 or 20)
    #[arg(long, default_value = "10")]
    minutes: u32,

    /// Speed test size (10, 20, 30 or 40)
    #[arg(long, default_value = "20")]
    questions: usize,

    /// Seed for question shuffling
    #[arg(long)]
    seed: Option<u64>,
}

impl TakeArgs {
    fn test_mode(&self) -> Result<TestMode> {
        if self.mode.trim().eq_ignore_ascii_case("speed") {
            return TestMode::speed(self.minutes, self.questions).map_err(anyhow::Error::msg);
        }
        self.mode.parse().map_err(anyhow::Error::msg)
    }
}

/// What the quiz loop ended with.
enum Step {
    Continue,
    Finished(FinishedQuiz),
    Quit,
    /// The countdown ran out while handling input; the driver has already
    /// queued the auto-submitted quiz.
    Expired,
}

pub async fn execute(args: TakeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mode = args.test_mode()?;
    let (config, backend) = super::open(config_path)?;

    let accessor = QuestionBankAccessor::new(backend.bank.clone())
        .with_group_size(config.group_question_count);
    let mut selector = match args.seed {
        Some(seed) => QuestionSelector::seeded(seed),
        None => QuestionSelector::from_entropy(),
    };
    let plan = accessor
        .load_for_mode(&args.subject, mode, &args.chapters, &mut selector)
        .await
        .with_context(|| format!("failed to load {} questions", args.subject))?;

    let mut session = QuizSession::new();
    session
        .start(plan.questions.clone(), plan.time_limit_secs)
        .with_context(|| format!("cannot start {} ({})", plan.label, plan.mode))?;

    println!(
        "{} / {} ({}): {} questions, {}",
        plan.subject,
        plan.label,
        plan.mode,
        plan.questions.len(),
        match plan.time_limit_secs {
            Some(limit) => format!("{} on the clock", format_clock(limit)),
            None => "untimed".to_string(),
        }
    );
    print_help();

    let (handle, mut events) = spawn_session(session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = run_quiz(&handle, &mut events, &mut lines).await;
    handle.shutdown().await;

    let Some(finished) = outcome? else {
        println!("Quit without saving.");
        return Ok(());
    };

    finish(&plan, &finished, &config, &backend).await
}

async fn run_quiz<R>(
    handle: &SessionHandle,
    events: &mut UnboundedReceiver<SessionEvent>,
    lines: &mut Lines<R>,
) -> Result<Option<FinishedQuiz>>
where
    R: AsyncBufRead + Unpin,
{
    show_question(handle).await?;

    loop {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(SessionEvent::TimedOut(finished)) => {
                    println!("\nTime is up!");
                    return Ok(Some(finished));
                }
                Some(SessionEvent::Tick { .. }) => {}
                None => anyhow::bail!("quiz session stopped unexpectedly"),
            },

            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    return Ok(None);
                };
                match step(handle, line.trim()).await? {
                    Step::Continue => {}
                    Step::Finished(finished) => return Ok(Some(finished)),
                    Step::Quit => return Ok(None),
                    Step::Expired => return await_time_up(events).await.map(Some),
                }
            }
        }
    }
}

async fn step(handle: &SessionHandle, input: &str) -> Result<Step> {
    match apply(handle, input).await {
        Ok(step) => Ok(step),
        Err(SessionError::Finished(SessionState::TimedOut)) => Ok(Step::Expired),
        Err(e) => Err(e.into()),
    }
}

/// Skip queued ticks up to the auto-submitted quiz.
async fn await_time_up(events: &mut UnboundedReceiver<SessionEvent>) -> Result<FinishedQuiz> {
    while let Some(event) = events.recv().await {
        if let SessionEvent::TimedOut(finished) = event {
            println!("\nTime is up!");
            return Ok(finished);
        }
    }
    anyhow::bail!("quiz session stopped before reporting the time-up")
}

async fn apply(handle: &SessionHandle, input: &str) -> Result<Step, SessionError> {
    match input.to_lowercase().as_str() {
        "" => show_question(handle).await?,
        "next" | "n" | ">" => {
            if !handle.next().await? {
                println!("Already at the last question. Type 'submit' to finish.");
            }
            show_question(handle).await?;
        }
        "prev" | "p" | "<" => {
            if !handle.prev().await? {
                println!("Already at the first question.");
            }
            show_question(handle).await?;
        }
        "pause" => match handle.pause().await {
            Ok(()) => println!("Paused. Type 'resume' to continue."),
            Err(e @ SessionError::Finished(_)) => return Err(e),
            Err(e) => println!("{e}"),
        },
        "resume" => match handle.resume().await {
            Ok(()) => show_question(handle).await?,
            Err(e @ SessionError::Finished(_)) => return Err(e),
            Err(e) => println!("{e}"),
        },
        "submit" | "s" => return Ok(Step::Finished(handle.submit().await?)),
        "quit" | "q" => return Ok(Step::Quit),
        "help" | "?" => print_help(),
        key => match handle.select_current(key).await {
            Ok(AnswerOutcome::Recorded) => {
                if handle.next().await? {
                    show_question(handle).await?;
                } else {
                    println!("That was the last question. Type 'submit' to finish.");
                }
            }
            Ok(AnswerOutcome::AlreadyAnswered { existing }) => {
                println!("Already answered ({existing}). Answers are locked.");
            }
            Err(SessionError::UnknownOption { .. }) => {
                println!("'{key}' is not an option. Type 'help' for commands.");
            }
            Err(e) => return Err(e),
        },
    }
    Ok(Step::Continue)
}

async fn show_question(handle: &SessionHandle) -> Result<(), SessionError> {
    let snapshot = handle.snapshot().await?;
    let Some(question) = snapshot.question else {
        return Ok(());
    };

    let clock = match snapshot.remaining_secs {
        Some(remaining) => format!("{} left", format_clock(remaining)),
        None => format!("{} elapsed", format_clock(snapshot.elapsed_secs)),
    };
    println!(
        "\n[{}/{}] {}  ({} answered)",
        snapshot.current_index + 1,
        snapshot.total,
        clock,
        snapshot.answered
    );
    println!("{}", question.prompt);
    for (key, text) in &question.options {
        println!("  {key}) {text}");
    }
    if let Some(answer) = snapshot.answer {
        println!("  answered: {answer}");
    }
    Ok(())
}

fn print_help() {
    println!("Type an option key to answer; next/prev to move; pause/resume; submit; quit.");
}

async fn finish(
    plan: &QuizPlan,
    finished: &FinishedQuiz,
    config: &NeetprepConfig,
    backend: &Backend,
) -> Result<()> {
    let (summary, record) = ResultPersister::score(plan, finished);

    // Save in the background while the results are printed.
    let persister = ResultPersister::new(backend.history.clone(), config.auth());
    let pending = config.auth().current_user_id().map(|user_id| {
        persister.spawn_persist(
            user_id,
            plan.subject.clone(),
            plan.chapter.clone(),
            record.clone(),
        )
    });

    print_summary(&summary, finished);
    print_review(finished);

    match pending {
        Some(handle) => {
            let key = join_persist(handle)
                .await
                .with_context(|| format!("failed to save result to the {} store", backend.name))?;
            println!("Result saved ({key}).");
            Ok(())
        }
        None => Err(anyhow::Error::new(PersistError::Unauthenticated)
            .context("not signed in: set user_id in neetprep.toml or NEETPREP_USER_ID")),
    }
}

fn print_summary(summary: &ScoreSummary, finished: &FinishedQuiz) {
    let how = match finished.reason {
        FinishReason::Submitted => "submitted",
        FinishReason::TimedOut => "timed out",
    };
    println!(
        "\nScore: {:.2}% ({} correct, {} incorrect, {} skipped of {}), {} in {}",
        summary.score,
        summary.correct,
        summary.incorrect,
        summary.skipped,
        summary.total,
        how,
        format_clock(finished.elapsed_secs)
    );
}

fn print_review(finished: &FinishedQuiz) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Yours", "Correct", "Result", "Explanation"]);

    for item in review(&finished.questions, &finished.answers) {
        let result = match item.outcome {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "wrong",
            Outcome::Skipped => "skipped",
        };
        table.add_row(vec![
            Cell::new(item.index + 1),
            Cell::new(&item.prompt),
            Cell::new(item.chosen.as_deref().unwrap_or("-")),
            Cell::new(&item.correct),
            Cell::new(result),
            Cell::new(item.explanation.as_deref().unwrap_or("")),
        ]);
    }

    println!("\n{table}");
}
