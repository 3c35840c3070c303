// src/quiz/grading.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    models::{
        completed_quiz::{
            CompletedQuizRecord, CompletedQuizView, QuestionResult, QuestionResultView,
            QuizResultsSummary, StudentAnswer, StudentResultRow,
        },
        question::Question,
    },
    quiz::reconcile::{display_answer, is_correct, resolve_answer_letter, selected_letter},
};

pub const NO_ANSWER: &str = "No answer provided";
pub const FORCED_ZERO_ANSWER: &str = "No answer (Cheating behavior detected)";

/// Percentage of correct answers. An empty quiz scores 0 instead of dividing by zero.
pub fn calculate_score(correct_count: usize, total_questions: usize) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    (correct_count as f64 / total_questions as f64) * 100.0
}

/// Grades an attempt against its question snapshot.
///
/// * Questions are graded in snapshot order.
/// * A question is correct when the selected letter equals the canonical
///   letter of the stored answer. Unanswered questions are always wrong.
/// * Deterministic: the same inputs always produce the same record.
pub fn grade(
    student_id: i64,
    quiz_title: &str,
    questions: &[Question],
    selections: &HashMap<i64, usize>,
    completed_at: DateTime<Utc>,
) -> CompletedQuizRecord {
    if questions.is_empty() {
        tracing::warn!(
            "Grading an empty quiz '{}' for student {}; score forced to 0",
            quiz_title,
            student_id
        );
    }

    let mut correct_count = 0;
    let mut detailed_results = Vec::with_capacity(questions.len());
    let mut student_answers = Vec::with_capacity(questions.len());

    for question in questions {
        let options = &question.options.0;
        let correct_letter = resolve_answer_letter(options, &question.answer);
        if correct_letter.is_none() {
            tracing::warn!(
                "Question {} has an answer matching no option: {:?}",
                question.id,
                question.answer
            );
        }

        let selected_index = selections
            .get(&question.id)
            .copied()
            .filter(|&index| index < options.len());
        let student_letter = selected_letter(options, selected_index);
        let correct = is_correct(student_letter, correct_letter);
        if correct {
            correct_count += 1;
        }

        let student_answer = selected_index
            .and_then(|index| options.get(index))
            .cloned()
            .unwrap_or_else(|| NO_ANSWER.to_string());

        detailed_results.push(QuestionResult {
            question_id: question.id,
            question: question.question.clone(),
            options: options.clone(),
            student_answer,
            student_answer_index: selected_index,
            student_answer_letter: student_letter,
            correct_answer: question.answer.clone(),
            correct_answer_letter: correct_letter,
            is_correct: correct,
        });
        student_answers.push(StudentAnswer {
            question_id: question.id,
            selected_option_index: selected_index,
            selected_option_letter: student_letter,
        });
    }

    CompletedQuizRecord {
        student_id,
        quiz_title: quiz_title.to_string(),
        score: calculate_score(correct_count, questions.len()),
        correct_answers: correct_count as i64,
        total_questions: questions.len() as i64,
        detailed_results,
        student_answers,
        tab_switching_detected: false,
        completed_at,
    }
}

/// Builds the record for an attempt ended by integrity violations.
/// Selections are never consulted: every question is unanswered and the score is 0.
pub fn grade_forced_zero(
    student_id: i64,
    quiz_title: &str,
    questions: &[Question],
    completed_at: DateTime<Utc>,
) -> CompletedQuizRecord {
    let detailed_results = questions
        .iter()
        .map(|question| QuestionResult {
            question_id: question.id,
            question: question.question.clone(),
            options: question.options.0.clone(),
            student_answer: FORCED_ZERO_ANSWER.to_string(),
            student_answer_index: None,
            student_answer_letter: None,
            correct_answer: question.answer.clone(),
            correct_answer_letter: resolve_answer_letter(&question.options, &question.answer),
            is_correct: false,
        })
        .collect();

    let student_answers = questions
        .iter()
        .map(|question| StudentAnswer {
            question_id: question.id,
            selected_option_index: None,
            selected_option_letter: None,
        })
        .collect();

    CompletedQuizRecord {
        student_id,
        quiz_title: quiz_title.to_string(),
        score: 0.0,
        correct_answers: 0,
        total_questions: questions.len() as i64,
        detailed_results,
        student_answers,
        tab_switching_detected: true,
        completed_at,
    }
}

/// Aggregates the records of one quiz for its instructor.
/// `records` pairs each record with the student's username.
pub fn summarize_results(
    quiz_title: &str,
    records: Vec<(CompletedQuizRecord, String)>,
) -> QuizResultsSummary {
    let attempts = records.len();
    let scores: Vec<f64> = records.iter().map(|(r, _)| r.score).collect();

    let (average_score, highest_score, lowest_score) = if scores.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            scores.iter().sum::<f64>() / scores.len() as f64,
            scores.iter().copied().fold(f64::MIN, f64::max),
            scores.iter().copied().fold(f64::MAX, f64::min),
        )
    };

    let flagged_attempts = records
        .iter()
        .filter(|(r, _)| r.tab_switching_detected)
        .count();

    let mut results: Vec<StudentResultRow> = records
        .into_iter()
        .map(|(record, username)| StudentResultRow {
            student_id: record.student_id,
            username,
            score: record.score,
            correct_answers: record.correct_answers,
            total_questions: record.total_questions,
            tab_switching_detected: record.tab_switching_detected,
            completed_at: record.completed_at,
        })
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    QuizResultsSummary {
        quiz_title: quiz_title.to_string(),
        attempts,
        average_score,
        highest_score,
        lowest_score,
        flagged_attempts,
        results,
    }
}

/// Adds display strings to a stored record for the results page.
pub fn render_record(record: CompletedQuizRecord) -> CompletedQuizView {
    let detailed_results = record
        .detailed_results
        .into_iter()
        .map(|result| {
            let your_answer = display_answer(&result.options, result.student_answer_letter, None);
            let correct_answer_display = display_answer(
                &result.options,
                result.correct_answer_letter,
                Some(&result.correct_answer),
            );
            QuestionResultView {
                result,
                your_answer,
                correct_answer_display,
            }
        })
        .collect();

    CompletedQuizView {
        quiz_title: record.quiz_title,
        score: record.score,
        correct_answers: record.correct_answers,
        total_questions: record.total_questions,
        detailed_results,
        tab_switching_detected: record.tab_switching_detected,
        completed_at: record.completed_at,
    }
}
