//! Weak-chapter recommendations and per-subject progress.
//!
//! Both are pure functions of a learner's history. Subjects and chapters
//! come out in sorted order so the same history always gives the same
//! result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ScoreRecord;
use crate::scoring::round2;

/// Chapters averaging below this percentage are weak.
pub const WEAK_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakChapter {
    pub chapter: String,
    /// Mean score over every attempt, two decimals.
    pub average: f64,
    pub attempts: usize,
}

/// The weak chapters of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub subject: String,
    pub weak_chapters: Vec<WeakChapter>,
}

/// Weak chapters per subject at the default threshold.
pub fn recommend(history: &[ScoreRecord]) -> Vec<RecommendationEntry> {
    recommend_with_threshold(history, WEAK_THRESHOLD)
}

/// Weak chapters per subject: those whose average score is below
/// `threshold`. Subjects without a weak chapter are left out.
///
/// Records that carry no chapter (mixed-chapter tests) are not attributed to
/// any chapter and are ignored here.
pub fn recommend_with_threshold(history: &[ScoreRecord], threshold: f64) -> Vec<RecommendationEntry> {
    let mut scores: BTreeMap<&str, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
    for record in history {
        let Some(chapter) = record.chapter.as_deref() else {
            continue;
        };
        scores
            .entry(record.subject.as_str())
            .or_default()
            .entry(chapter)
            .or_default()
            .push(record.score);
    }

    scores
        .into_iter()
        .filter_map(|(subject, chapters)| {
            let weak_chapters: Vec<WeakChapter> = chapters
                .into_iter()
                .filter_map(|(chapter, scores)| {
                    let average = mean(&scores);
                    (average < threshold).then(|| WeakChapter {
                        chapter: chapter.to_string(),
                        average: round2(average),
                        attempts: scores.len(),
                    })
                })
                .collect();
            (!weak_chapters.is_empty()).then(|| RecommendationEntry {
                subject: subject.to_string(),
                weak_chapters,
            })
        })
        .collect()
}

/// Mean score and test count of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub subject: String,
    pub average: f64,
    pub tests: usize,
}

/// Mean score per subject over every record, chapter or not.
pub fn subject_progress(history: &[ScoreRecord]) -> Vec<SubjectProgress> {
    let mut scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in history {
        scores
            .entry(record.subject.as_str())
            .or_default()
            .push(record.score);
    }

    scores
        .into_iter()
        .map(|(subject, scores)| SubjectProgress {
            subject: subject.to_string(),
            average: round2(mean(&scores)),
            tests: scores.len(),
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(subject: &str, chapter: Option<&str>, score: f64) -> ScoreRecord {
        ScoreRecord {
            subject: subject.into(),
            chapter: chapter.map(str::to_string),
            mode: None,
            total_questions: 10,
            correct_count: 0,
            incorrect_count: 0,
            skipped_count: 0,
            score,
            time_taken_secs: 0,
            created_at: Utc::now(),
        }
    }

    fn physics_history() -> Vec<ScoreRecord> {
        vec![
            record("physics", Some("kinetics"), 40.0),
            record("physics", Some("optics"), 60.0),
            record("physics", Some("kinetics"), 45.0),
            record("physics", Some("optics"), 70.0),
            record("physics", Some("kinetics"), 50.0),
        ]
    }

    #[test]
    fn flags_chapters_below_fifty() {
        let entries = recommend(&physics_history());
        assert_eq!(
            entries,
            vec![RecommendationEntry {
                subject: "physics".into(),
                weak_chapters: vec![WeakChapter {
                    chapter: "kinetics".into(),
                    average: 45.0,
                    attempts: 3,
                }],
            }]
        );
    }

    #[test]
    fn exactly_fifty_is_not_weak() {
        let history = vec![
            record("chemistry", Some("acids"), 50.0),
            record("chemistry", Some("bases"), 49.99),
        ];
        let entries = recommend(&history);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weak_chapters.len(), 1);
        assert_eq!(entries[0].weak_chapters[0].chapter, "bases");
    }

    #[test]
    fn strong_subjects_are_omitted() {
        let mut history = physics_history();
        history.push(record("biology", Some("cells"), 90.0));
        let entries = recommend(&history);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "physics");
    }

    #[test]
    fn records_without_chapter_are_skipped() {
        let history = vec![
            record("physics", None, 5.0),
            record("physics", Some("optics"), 80.0),
        ];
        assert!(recommend(&history).is_empty());
    }

    #[test]
    fn empty_history_gives_nothing() {
        assert!(recommend(&[]).is_empty());
        assert!(subject_progress(&[]).is_empty());
    }

    #[test]
    fn output_is_sorted_and_order_independent() {
        let mut history = vec![
            record("zoology", Some("b"), 10.0),
            record("botany", Some("z"), 20.0),
            record("botany", Some("a"), 30.0),
        ];
        let first = recommend(&history);
        history.reverse();
        assert_eq!(recommend(&history), first);

        assert_eq!(first[0].subject, "botany");
        assert_eq!(first[0].weak_chapters[0].chapter, "a");
        assert_eq!(first[0].weak_chapters[1].chapter, "z");
        assert_eq!(first[1].subject, "zoology");
    }

    #[test]
    fn custom_threshold() {
        let entries = recommend_with_threshold(&physics_history(), 70.0);
        let chapters: Vec<&str> = entries[0]
            .weak_chapters
            .iter()
            .map(|w| w.chapter.as_str())
            .collect();
        assert_eq!(chapters, vec!["kinetics", "optics"]);
    }

    #[test]
    fn averages_are_rounded() {
        let history = vec![
            record("physics", Some("waves"), 10.0),
            record("physics", Some("waves"), 10.0),
            record("physics", Some("waves"), 11.0),
        ];
        assert_eq!(recommend(&history)[0].weak_chapters[0].average, 10.33);
    }

    #[test]
    fn progress_counts_every_record() {
        let mut history = physics_history();
        history.push(record("physics", None, 15.0));
        history.push(record("chemistry", None, 80.0));
        let progress = subject_progress(&history);
        assert_eq!(
            progress,
            vec![
                SubjectProgress {
                    subject: "chemistry".into(),
                    average: 80.0,
                    tests: 1,
                },
                SubjectProgress {
                    subject: "physics".into(),
                    average: 46.67,
                    tests: 6,
                },
            ]
        );
    }
}
