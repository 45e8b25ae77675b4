pub mod rules;

use chrono::{DateTime, Utc};

use crate::types::constant::DEFAULT_QUESTION_POINTS;
use crate::types::{
    AnswerKey, CanonicalQuestion, GradingResult, OutcomeStatus, QuestionOutcome, QuizSubmission, SubmittedAnswer,
};
use rules::{AnswerRule, GradingRules};

/// Scores a submission against the answer key.
///
/// Pure: the same submission, answer key, rules and `evaluated_at` always give the
/// same result. Outcomes follow submission order, one per answer. A question id
/// missing from the key is scored as incorrect with zero points instead of
/// failing the submission.
pub fn evaluate<K>(
    submission: &QuizSubmission,
    answer_key: &K,
    rules: &GradingRules,
    evaluated_at: DateTime<Utc>,
) -> GradingResult
where
    K: AnswerKey + ?Sized,
{
    let rule = rules.rule_for(&submission.subject);
    let per_question_outcome: Vec<QuestionOutcome> = submission
        .answers
        .iter()
        .map(|answer| match answer_key.lookup(&answer.question_id) {
            Some(question) => grade_answer(answer, question, rule),
            None => unknown_question(answer),
        })
        .collect();

    let score = per_question_outcome.iter().map(|outcome| outcome.awarded_points).sum();
    let max_score = per_question_outcome.iter().map(|outcome| outcome.max_points).sum();

    GradingResult {
        submission_id: submission.submission_id.clone(),
        student_id: submission.student_id.clone(),
        subject: submission.subject.clone(),
        semester: submission.semester.clone(),
        unit: submission.unit.clone(),
        score,
        max_score,
        per_question_outcome,
        evaluated_at,
    }
}

fn grade_answer(answer: &SubmittedAnswer, question: &CanonicalQuestion, rule: AnswerRule) -> QuestionOutcome {
    let max_points = question_points(question);

    if answer.is_blank() {
        return QuestionOutcome {
            question_id: answer.question_id.clone(),
            correct: false,
            awarded_points: 0.0,
            max_points,
            status: OutcomeStatus::Unanswered,
            student_answer: answer.student_answer.clone(),
            matched_answer: None,
        };
    }

    let matched_answer =
        question.correct_answers.iter().find(|accepted| rule.matches(&answer.student_answer, accepted)).cloned();
    let correct = matched_answer.is_some();

    QuestionOutcome {
        question_id: answer.question_id.clone(),
        correct,
        awarded_points: if correct { max_points } else { 0.0 },
        max_points,
        status: OutcomeStatus::Graded,
        student_answer: answer.student_answer.clone(),
        matched_answer,
    }
}

fn unknown_question(answer: &SubmittedAnswer) -> QuestionOutcome {
    QuestionOutcome {
        question_id: answer.question_id.clone(),
        correct: false,
        awarded_points: 0.0,
        max_points: DEFAULT_QUESTION_POINTS,
        status: OutcomeStatus::UnknownQuestion,
        student_answer: answer.student_answer.clone(),
        matched_answer: None,
    }
}

/// Negative or non-finite points in stored questions would break `0 <= score <= max_score`
fn question_points(question: &CanonicalQuestion) -> f64 {
    if question.points.is_finite() && question.points >= 0.0 {
        question.points
    } else {
        DEFAULT_QUESTION_POINTS
    }
}
