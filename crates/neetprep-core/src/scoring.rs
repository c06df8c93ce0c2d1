//! Quiz scoring and the per-question solution review.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Question};

/// Counts and percentage for one submitted quiz.
///
/// Always satisfies `correct + incorrect + skipped == total`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    /// `100 * correct / total`, rounded to two decimals. 0 for an empty quiz.
    pub score: f64,
}

/// How a single question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Skipped,
}

/// Classify one answer. A missing or blank answer is a skip.
pub fn classify(question: &Question, answer: Option<&str>) -> Outcome {
    match answer.map(str::trim) {
        None | Some("") => Outcome::Skipped,
        Some(a) if question.is_correct(a) => Outcome::Correct,
        Some(_) => Outcome::Incorrect,
    }
}

/// Score a quiz.
pub fn score(questions: &[Question], answers: &AnswerMap) -> ScoreSummary {
    let mut summary = ScoreSummary {
        total: questions.len(),
        correct: 0,
        incorrect: 0,
        skipped: 0,
        score: 0.0,
    };

    for (index, question) in questions.iter().enumerate() {
        match classify(question, answers.get(&index).map(String::as_str)) {
            Outcome::Correct => summary.correct += 1,
            Outcome::Incorrect => summary.incorrect += 1,
            Outcome::Skipped => summary.skipped += 1,
        }
    }

    summary.score = percentage(summary.correct, summary.total);
    summary
}

/// `100 * part / total` rounded to two decimals, 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 * 100.0 / total as f64)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One row of the post-test solution review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub index: usize,
    pub prompt: String,
    pub chosen: Option<String>,
    pub correct: String,
    pub outcome: Outcome,
    pub explanation: Option<String>,
}

/// Pair every question with the learner's answer and the solution.
pub fn review(questions: &[Question], answers: &AnswerMap) -> Vec<ReviewItem> {
    questions
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let chosen = answers.get(&index).cloned();
            ReviewItem {
                index,
                prompt: q.prompt.clone(),
                outcome: classify(q, chosen.as_deref()),
                chosen,
                correct: q.correct.clone(),
                explanation: q.explanation.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn q(correct: &str) -> Question {
        Question {
            id: String::new(),
            prompt: format!("answer is {correct}"),
            options: BTreeMap::new(),
            correct: correct.into(),
            explanation: Some("because".into()),
        }
    }

    fn answers(pairs: &[(usize, &str)]) -> AnswerMap {
        pairs.iter().map(|(i, a)| (*i, a.to_string())).collect()
    }

    #[test]
    fn one_of_each_outcome() {
        let questions = vec![q("a"), q("b"), q("c")];
        let summary = score(&questions, &answers(&[(0, "a"), (1, "c")]));
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.score, 33.33);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let summary = score(&[], &AnswerMap::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.correct + summary.incorrect + summary.skipped, 0);
        assert_eq!(summary.score, 0.0);
    }

    #[test]
    fn answers_compare_case_insensitively() {
        let questions = vec![q("B"), q("c ")];
        let summary = score(&questions, &answers(&[(0, " b"), (1, "C")]));
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.score, 100.0);
    }

    #[test]
    fn blank_answer_is_skipped() {
        let questions = vec![q("a")];
        let summary = score(&questions, &answers(&[(0, "  ")]));
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.incorrect, 0);
    }

    #[test]
    fn answers_past_the_end_are_ignored() {
        let questions = vec![q("a")];
        let summary = score(&questions, &answers(&[(0, "a"), (5, "a")]));
        assert_eq!(summary.total, 1);
        assert_eq!(summary.correct, 1);
    }

    #[test]
    fn counts_always_add_up() {
        let keys = ["a", "b", "c", "d"];
        for n in 0..12usize {
            let questions: Vec<Question> = (0..n).map(|i| q(keys[i % 4])).collect();
            let given: AnswerMap = (0..n)
                .filter(|i| i % 3 != 0)
                .map(|i| (i, keys[(i * 7) % 4].to_string()))
                .collect();
            let s = score(&questions, &given);
            assert_eq!(s.correct + s.incorrect + s.skipped, s.total);
            assert_eq!(s.score, percentage(s.correct, s.total));
        }
    }

    #[test]
    fn rounding_to_two_decimals() {
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(1, 7), 14.29);
        assert_eq!(percentage(0, 5), 0.0);
        assert_eq!(round2(12.345678), 12.35);
    }

    #[test]
    fn review_lists_every_question() {
        let questions = vec![q("a"), q("b")];
        let items = review(&questions, &answers(&[(1, "d")]));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].outcome, Outcome::Skipped);
        assert_eq!(items[0].chosen, None);
        assert_eq!(items[1].outcome, Outcome::Incorrect);
        assert_eq!(items[1].chosen.as_deref(), Some("d"));
        assert_eq!(items[1].correct, "b");
        assert_eq!(items[1].explanation.as_deref(), Some("because"));
    }
}
