use std::collections::HashSet;

use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{QuizSubmission, SubmittedAnswer};

/// Why a payload can never become a valid submission.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Required field `{0}` is missing or blank")]
    MissingField(&'static str),

    #[error("Submission has no answers")]
    EmptyAnswers,

    #[error("Answer at position {0} has no question id")]
    MissingQuestionId(usize),

    #[error("Question id `{0}` appears more than once")]
    DuplicateQuestionId(String),
}

/// Identifiers arrive as strings, but older producers send numbers for some of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_non_blank(self) -> Option<String> {
        let value = match self {
            Scalar::Text(text) => text.trim().to_string(),
            Scalar::Number(number) => number.to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerMessage {
    question_id: Option<Scalar>,
    #[serde(default)]
    student_answer: Option<Scalar>,
}

/// Queue payload as produced by the submission API. `quizId` and any other
/// extra keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionMessage {
    submission_id: Option<Scalar>,
    student_id: Option<Scalar>,
    subject: Option<Scalar>,
    semester: Option<Scalar>,
    unit: Option<Scalar>,
    answers: Option<Vec<AnswerMessage>>,
}

/// ObjectId-shaped ids are rewritten to the lowercase hex the answer-key store returns
fn canonical_question_id(question_id: String) -> String {
    match ObjectId::parse_str(&question_id) {
        Ok(object_id) => object_id.to_hex(),
        Err(_) => question_id,
    }
}

fn required(value: Option<Scalar>, field: &'static str) -> Result<String, DecodeError> {
    value.and_then(Scalar::into_non_blank).ok_or(DecodeError::MissingField(field))
}

/// Parses a raw queue payload into a [`QuizSubmission`].
///
/// `message_id` stands in for the submission id when the payload carries none, so
/// redeliveries of the same message keep the same idempotency key.
pub fn decode(raw: &[u8], message_id: &str) -> Result<QuizSubmission, DecodeError> {
    let message: SubmissionMessage = serde_json::from_slice(raw)?;

    let submission_id = match message.submission_id.and_then(Scalar::into_non_blank) {
        Some(id) => id,
        None if !message_id.trim().is_empty() => message_id.trim().to_string(),
        None => return Err(DecodeError::MissingField("submissionId")),
    };
    let student_id = required(message.student_id, "studentId")?;
    let subject = required(message.subject, "subject")?;
    let semester = required(message.semester, "semester")?;
    let unit = required(message.unit, "unit")?;

    let answers = message.answers.ok_or(DecodeError::MissingField("answers"))?;
    if answers.is_empty() {
        return Err(DecodeError::EmptyAnswers);
    }

    let mut seen = HashSet::with_capacity(answers.len());
    let mut decoded = Vec::with_capacity(answers.len());
    for (position, answer) in answers.into_iter().enumerate() {
        let question_id = answer
            .question_id
            .and_then(Scalar::into_non_blank)
            .map(canonical_question_id)
            .ok_or(DecodeError::MissingQuestionId(position))?;
        if !seen.insert(question_id.clone()) {
            return Err(DecodeError::DuplicateQuestionId(question_id));
        }
        // A blank answer is kept; the evaluator marks it unanswered.
        let student_answer = match answer.student_answer {
            Some(Scalar::Text(text)) => text,
            Some(Scalar::Number(number)) => number.to_string(),
            None => String::new(),
        };
        decoded.push(SubmittedAnswer { question_id, student_answer });
    }

    Ok(QuizSubmission { submission_id, student_id, subject, semester, unit, answers: decoded })
}
