//! The `neetprep validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use neetprep_core::bank::{validate_questions, QuestionBankAccessor};

pub async fn execute(
    subject: String,
    chapter: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, backend) = super::open(config_path)?;
    let accessor = QuestionBankAccessor::new(backend.bank.clone());

    let chapters = match chapter {
        Some(chapter) => vec![chapter],
        None => accessor
            .chapters(&subject)
            .await
            .with_context(|| format!("failed to list chapters of {subject}"))?,
    };
    anyhow::ensure!(!chapters.is_empty(), "no chapters found for {subject}");

    let mut total_warnings = 0;

    for chapter in &chapters {
        let questions = accessor
            .chapter_questions(&subject, chapter)
            .await
            .with_context(|| format!("failed to fetch {subject}/{chapter}"))?;
        println!("Chapter: {chapter} ({} questions)", questions.len());

        let mut warnings = validate_questions(&questions);
        if questions.is_empty() {
            warnings.push("no questions".to_string());
        }
        for w in &warnings {
            println!("  WARNING: {w}");
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All chapters valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
