//! The `neetprep progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use neetprep_core::recommend::subject_progress;

pub async fn execute(format: String, config_path: Option<PathBuf>) -> Result<()> {
    let (config, backend) = super::open(config_path)?;
    let (_, records) = super::load_history(&config, &backend).await?;
    let progress = subject_progress(&records);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }

    if progress.is_empty() {
        println!("No progress data available.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Subject", "Average", "Tests"]);
    for p in &progress {
        table.add_row(vec![
            Cell::new(&p.subject),
            Cell::new(format!("{:.2}%", p.average)),
            Cell::new(p.tests),
        ]);
    }
    println!("{table}");
    Ok(())
}
