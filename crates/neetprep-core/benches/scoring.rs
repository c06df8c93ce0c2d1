use std::collections::BTreeMap;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use neetprep_core::model::{AnswerMap, Question, ScoreRecord};
use neetprep_core::recommend::{recommend, subject_progress};
use neetprep_core::scoring::score;

fn make_quiz(n: usize) -> (Vec<Question>, AnswerMap) {
    let keys = ["a", "b", "c", "d"];
    let questions = (0..n)
        .map(|i| Question {
            id: i.to_string(),
            prompt: format!("question {i}"),
            options: keys
                .iter()
                .map(|k| (k.to_string(), format!("option {k}")))
                .collect::<BTreeMap<_, _>>(),
            correct: keys[i % 4].to_string(),
            explanation: None,
        })
        .collect();
    let answers = (0..n)
        .filter(|i| i % 5 != 0)
        .map(|i| (i, keys[(i * 3) % 4].to_string()))
        .collect();
    (questions, answers)
}

fn make_history(n: usize) -> Vec<ScoreRecord> {
    let subjects = ["physics", "chemistry", "biology"];
    (0..n)
        .map(|i| ScoreRecord {
            subject: subjects[i % 3].to_string(),
            chapter: Some(format!("chapter_{}", i % 17)),
            mode: Some("easy".into()),
            total_questions: 20,
            correct_count: i % 21,
            incorrect_count: 20 - i % 21,
            skipped_count: 0,
            score: ((i * 37) % 101) as f64,
            time_taken_secs: 600,
            created_at: Utc::now(),
        })
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    for n in [20, 40, 200] {
        let (questions, answers) = make_quiz(n);
        group.bench_function(format!("{n}_questions"), |b| {
            b.iter(|| score(black_box(&questions), black_box(&answers)))
        });
    }

    group.finish();
}

fn bench_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for n in [10, 500, 5000] {
        let history = make_history(n);
        group.bench_function(format!("{n}_records"), |b| {
            b.iter(|| recommend(black_box(&history)))
        });
        group.bench_function(format!("progress_{n}_records"), |b| {
            b.iter(|| subject_progress(black_box(&history)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_score, bench_recommend);
criterion_main!(benches);
