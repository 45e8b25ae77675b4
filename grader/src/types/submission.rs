use serde::{Deserialize, Serialize};

/// One `(questionId, studentAnswer)` pair of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    /// Empty when the student left the question blank.
    pub student_answer: String,
}

impl SubmittedAnswer {
    pub fn new(question_id: impl Into<String>, student_answer: impl Into<String>) -> Self {
        Self { question_id: question_id.into(), student_answer: student_answer.into() }
    }

    pub fn is_blank(&self) -> bool {
        self.student_answer.trim().is_empty()
    }
}

/// A decoded grading request.
///
/// Derived from the queue payload on every delivery and never stored on its own.
/// `answers` is non-empty and question ids are unique within it; the decoder
/// enforces both before a submission reaches the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    /// Idempotency key. Taken from the payload, or from the queue message id when absent.
    pub submission_id: String,
    pub student_id: String,
    pub subject: String,
    pub semester: String,
    pub unit: String,
    pub answers: Vec<SubmittedAnswer>,
}

impl QuizSubmission {
    /// Question ids in submission order.
    pub fn question_ids(&self) -> Vec<String> {
        self.answers.iter().map(|answer| answer.question_id.clone()).collect()
    }
}
