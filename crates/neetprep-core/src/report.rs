//! Weak-topic report with JSON persistence and Markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ScoreRecord;
use crate::recommend::{recommend_with_threshold, subject_progress, RecommendationEntry, SubjectProgress};

/// Recommendations and progress for one learner at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakTopicReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    /// Chapters averaging below this were flagged.
    pub threshold: f64,
    /// Number of records the report was built from.
    pub records: usize,
    pub recommendations: Vec<RecommendationEntry>,
    pub progress: Vec<SubjectProgress>,
}

impl WeakTopicReport {
    pub fn build(user_id: &str, history: &[ScoreRecord], threshold: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_id: user_id.to_string(),
            threshold,
            records: history.len(),
            recommendations: recommend_with_threshold(history, threshold),
            progress: subject_progress(history),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: WeakTopicReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn has_weak_topics(&self) -> bool {
        !self.recommendations.is_empty()
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## Recommendations for {}\n\n**Summary:** {} weak chapters across {} subjects ({} tests, threshold {:.0}%)\n\n",
            self.user_id,
            self.recommendations
                .iter()
                .map(|r| r.weak_chapters.len())
                .sum::<usize>(),
            self.recommendations.len(),
            self.records,
            self.threshold
        ));

        if self.has_weak_topics() {
            md.push_str("### Weak chapters\n\n");
            md.push_str("| Subject | Chapter | Average | Attempts |\n");
            md.push_str("|---------|---------|---------|----------|\n");
            for entry in &self.recommendations {
                for weak in &entry.weak_chapters {
                    md.push_str(&format!(
                        "| {} | {} | {:.2}% | {} |\n",
                        entry.subject, weak.chapter, weak.average, weak.attempts
                    ));
                }
            }
            md.push('\n');
        } else {
            md.push_str("No weak chapters detected.\n\n");
        }

        if !self.progress.is_empty() {
            md.push_str("### Progress\n\n");
            md.push_str("| Subject | Average | Tests |\n");
            md.push_str("|---------|---------|-------|\n");
            for p in &self.progress {
                md.push_str(&format!("| {} | {:.2}% | {} |\n", p.subject, p.average, p.tests));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str, chapter: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            subject: subject.into(),
            chapter: Some(chapter.into()),
            mode: Some("easy".into()),
            total_questions: 4,
            correct_count: 0,
            incorrect_count: 0,
            skipped_count: 0,
            score,
            time_taken_secs: 30,
            created_at: Utc::now(),
        }
    }

    fn history() -> Vec<ScoreRecord> {
        vec![
            record("physics", "kinetics", 40.0),
            record("physics", "kinetics", 45.0),
            record("physics", "kinetics", 50.0),
            record("physics", "optics", 60.0),
            record("physics", "optics", 70.0),
        ]
    }

    #[test]
    fn build_collects_both_views() {
        let report = WeakTopicReport::build("u1", &history(), 50.0);
        assert!(report.has_weak_topics());
        assert_eq!(report.records, 5);
        assert_eq!(report.recommendations[0].weak_chapters[0].chapter, "kinetics");
        assert_eq!(report.progress[0].tests, 5);
    }

    #[test]
    fn json_roundtrip() {
        let report = WeakTopicReport::build("u1", &history(), 50.0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = WeakTopicReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.recommendations, report.recommendations);
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = WeakTopicReport::load_json(&dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
    }

    #[test]
    fn markdown_output() {
        let md = WeakTopicReport::build("u1", &history(), 50.0).to_markdown();
        assert!(md.contains("Weak chapters"));
        assert!(md.contains("| physics | kinetics | 45.00% | 3 |"));
        assert!(!md.contains("| physics | optics |"));
        assert!(md.contains("| physics | 53.00% | 5 |"));
    }

    #[test]
    fn markdown_without_weak_chapters() {
        let md = WeakTopicReport::build("u1", &[record("biology", "cells", 95.0)], 50.0).to_markdown();
        assert!(md.contains("No weak chapters detected."));
        assert!(!md.contains("Weak chapters"));
    }
}
