//! The `neetprep chapters` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use neetprep_core::bank::QuestionBankAccessor;

pub async fn execute(subject: String, config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = super::open(config_path)?;
    let accessor = QuestionBankAccessor::new(backend.bank.clone());

    let chapters = accessor
        .chapters(&subject)
        .await
        .with_context(|| {
            format!(
                "failed to list chapters of {subject} from the {} bank",
                accessor.bank_name()
            )
        })?;

    if chapters.is_empty() {
        println!("No chapters found for {subject}.");
        return Ok(());
    }

    println!("{subject} ({} chapters):", chapters.len());
    for chapter in &chapters {
        println!("  {chapter}");
    }

    Ok(())
}
