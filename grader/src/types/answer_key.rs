use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::constant::DEFAULT_QUESTION_POINTS;

/// The canonical record for one quiz question, owned by the CRUD layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CanonicalQuestion {
    pub question_id: String,
    pub task_text: String,
    /// Every answer accepted as correct. The first one is the representative answer.
    pub correct_answers: Vec<String>,
    pub points: f64,
}

impl CanonicalQuestion {
    pub fn new(question_id: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            task_text: String::new(),
            correct_answers: vec![correct_answer.into()],
            points: DEFAULT_QUESTION_POINTS,
        }
    }

    pub fn with_accepted_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answers.push(answer.into());
        self
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = points;
        self
    }

    pub fn with_task_text(mut self, task_text: impl Into<String>) -> Self {
        self.task_text = task_text.into();
        self
    }
}

/// Read access to canonical answers by question id.
pub trait AnswerKey {
    fn lookup(&self, question_id: &str) -> Option<&CanonicalQuestion>;
}

impl AnswerKey for HashMap<String, CanonicalQuestion> {
    fn lookup(&self, question_id: &str) -> Option<&CanonicalQuestion> {
        self.get(question_id)
    }
}
