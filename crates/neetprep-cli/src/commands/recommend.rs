//! The `neetprep recommend` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use neetprep_core::report::WeakTopicReport;

pub async fn execute(
    threshold: Option<f64>,
    format: String,
    save: bool,
    fail_on_weak: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, backend) = super::open(config_path)?;
    let threshold = threshold.unwrap_or(config.weak_threshold);
    anyhow::ensure!(
        (0.0..=100.0).contains(&threshold),
        "threshold must be between 0 and 100"
    );

    let (user_id, records) = super::load_history(&config, &backend).await?;
    let report = WeakTopicReport::build(&user_id, &records, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            if report.has_weak_topics() {
                let mut table = Table::new();
                table.set_header(vec!["Subject", "Chapter", "Average", "Attempts"]);
                for entry in &report.recommendations {
                    for weak in &entry.weak_chapters {
                        table.add_row(vec![
                            Cell::new(&entry.subject),
                            Cell::new(&weak.chapter),
                            Cell::new(format!("{:.2}%", weak.average)),
                            Cell::new(weak.attempts),
                        ]);
                    }
                }
                println!("Chapters to revise (average below {threshold:.0}%):");
                println!("{table}");
            } else {
                println!("You're doing great! No weak chapters detected.");
            }
        }
    }

    if save {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = config
            .output_dir
            .join(format!("recommendations-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    if fail_on_weak && report.has_weak_topics() {
        std::process::exit(1);
    }

    Ok(())
}
