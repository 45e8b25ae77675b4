use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The answer was compared against the canonical answers
    Graded,
    /// The student left the question blank
    Unanswered,
    /// The question id did not resolve to a canonical question
    UnknownQuestion,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub correct: bool,
    pub awarded_points: f64,
    pub max_points: f64,
    pub status: OutcomeStatus,
    pub student_answer: String,
    /// The accepted answer the student's answer matched, if any
    pub matched_answer: Option<String>,
}

/// Durable output of evaluating one submission.
///
/// Created at most once per `submission_id` and never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GradingResult {
    /// Unique in the result store
    pub submission_id: String,
    pub student_id: String,
    pub subject: String,
    pub semester: String,
    pub unit: String,
    /// Sum of `awarded_points`, within `[0, max_score]`
    pub score: f64,
    pub max_score: f64,
    pub per_question_outcome: Vec<QuestionOutcome>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub evaluated_at: DateTime<Utc>,
}
