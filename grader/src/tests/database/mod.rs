use assert_matches::assert_matches;
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use rstest::*;
use uuid::Uuid;

use crate::core::client::database::constant::QUIZZES_COLLECTION;
use crate::core::client::database::mongodb::MongoDbClient;
use crate::core::client::database::{AnswerKeyProvider, DatabaseError, ResultStore};
use crate::types::params::DatabaseArgs;
use crate::types::{GradingResult, OutcomeStatus, QuestionOutcome};

/// Connects to the MongoDB named by `QUIZ_GRADER_MONGODB_CONNECTION_URL` using a
/// throwaway database, with the result index in place.
async fn scratch_database() -> color_eyre::Result<MongoDbClient> {
    let connection_uri = std::env::var("QUIZ_GRADER_MONGODB_CONNECTION_URL")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let args = DatabaseArgs { connection_uri, database_name: format!("quiz_grader_test_{}", Uuid::new_v4().simple()) };
    let database = MongoDbClient::new(&args).await?;
    database.health_check().await?;
    database.ensure_indexes().await?;
    Ok(database)
}

async fn drop_scratch_database(database: &MongoDbClient) -> color_eyre::Result<()> {
    database.client().database(database.database_name()).drop(None).await?;
    Ok(())
}

fn graded_result(submission_id: &str) -> GradingResult {
    GradingResult {
        submission_id: submission_id.to_string(),
        student_id: "65f0c1b2a3d4e5f601234567".to_string(),
        subject: "math".to_string(),
        semester: "1".to_string(),
        unit: "3".to_string(),
        score: 1.0,
        max_score: 1.0,
        per_question_outcome: vec![QuestionOutcome {
            question_id: "q1".to_string(),
            correct: true,
            awarded_points: 1.0,
            max_points: 1.0,
            status: OutcomeStatus::Graded,
            student_answer: "4".to_string(),
            matched_answer: Some("4".to_string()),
        }],
        evaluated_at: Utc::now(),
    }
}

#[rstest]
#[tokio::test]
#[ignore] // Requires a running MongoDB
async fn saved_result_is_found_by_exists() -> color_eyre::Result<()> {
    let database = scratch_database().await?;

    assert!(!database.exists("s1").await?);
    database.save(&graded_result("s1")).await?;
    assert!(database.exists("s1").await?);
    assert!(!database.exists("s2").await?);

    drop_scratch_database(&database).await
}

#[rstest]
#[tokio::test]
#[ignore] // Requires a running MongoDB
async fn second_save_of_a_submission_is_a_duplicate_key() -> color_eyre::Result<()> {
    let database = scratch_database().await?;

    database.save(&graded_result("s1")).await?;
    assert_matches!(database.save(&graded_result("s1")).await, Err(DatabaseError::DuplicateKey(id)) if id == "s1");
    // Re-running the index setup is harmless
    database.ensure_indexes().await?;

    drop_scratch_database(&database).await
}

#[rstest]
#[tokio::test]
#[ignore] // Requires a running MongoDB
async fn answer_keys_resolve_from_quiz_tasks() -> color_eyre::Result<()> {
    let database = scratch_database().await?;
    let task_id = ObjectId::new();
    let quiz = doc! {
        "subject": "math",
        "tasks": [
            { "_id": task_id, "taskText": "2 + 2 = ?", "correctAnswers": ["4", "four"], "points": 2.0 },
            { "_id": "legacy-q", "taskText": "3 * 3 = ?", "correctAnswer": "9" },
        ],
    };
    database.client().database(database.database_name()).collection::<Document>(QUIZZES_COLLECTION).insert_one(quiz, None).await?;

    let questions =
        database.fetch_questions(&[task_id.to_hex(), "legacy-q".to_string(), "missing".to_string()]).await?;

    assert_eq!(questions.len(), 2);
    let by_object_id = questions.iter().find(|q| q.question_id == task_id.to_hex()).unwrap();
    assert_eq!(by_object_id.correct_answers, vec!["4".to_string(), "four".to_string()]);
    assert_eq!(by_object_id.points, 2.0);
    let legacy = questions.iter().find(|q| q.question_id == "legacy-q").unwrap();
    assert_eq!(legacy.correct_answers, vec!["9".to_string()]);
    assert_eq!(legacy.points, 1.0);

    drop_scratch_database(&database).await
}
