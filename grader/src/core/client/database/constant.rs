pub const RESULTS_COLLECTION: &str = "grading_results";
pub const QUIZZES_COLLECTION: &str = "quizzes";

pub const SUBMISSION_ID_INDEX_NAME: &str = "submission_id_unique";

/// MongoDB server error code for a unique index violation
pub const DUPLICATE_KEY_ERROR_CODE: i32 = 11000;
