pub mod answer_key;
pub mod constant;
pub mod job;
pub mod params;
pub mod result;
pub mod submission;

pub use answer_key::{AnswerKey, CanonicalQuestion};
pub use job::Job;
pub use result::{GradingResult, OutcomeStatus, QuestionOutcome};
pub use submission::{QuizSubmission, SubmittedAnswer};
