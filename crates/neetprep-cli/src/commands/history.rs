//! The `neetprep history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use neetprep_core::timer::format_clock;

pub async fn execute(
    subject: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, backend) = super::open(config_path)?;
    let (user_id, mut records) = super::load_history(&config, &backend).await?;

    if let Some(subject) = &subject {
        records.retain(|r| &r.subject == subject);
    }
    records.sort_by_key(|r| r.created_at);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No results saved for {user_id} yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Subject", "Chapter", "Mode", "Score", "Correct", "Wrong", "Skipped", "Time",
    ]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&r.subject),
            Cell::new(r.chapter.as_deref().unwrap_or("-")),
            Cell::new(r.mode.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.2}%", r.score)),
            Cell::new(r.correct_count),
            Cell::new(r.incorrect_count),
            Cell::new(r.skipped_count),
            Cell::new(format_clock(r.time_taken_secs)),
        ]);
    }

    println!("{table}");
    println!("{} result(s) for {user_id}", records.len());
    Ok(())
}
