use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rstest::fixture;
use serde_json::{json, Value};

use crate::core::client::database::{AnswerKeyProvider, DatabaseError, ResultStore};
use crate::core::client::queue::{QueueClient, QueueError};
use crate::types::{CanonicalQuestion, GradingResult, Job};

/// Decrements `counter` if it is positive and reports whether it did
fn take_failure(counter: &AtomicU32) -> bool {
    counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

#[derive(Debug, Clone)]
struct QueuedMessage {
    message_id: String,
    body: String,
    receive_count: u32,
}

/// A queue with SQS-like leasing: polled messages stay leased until acknowledged,
/// and [`InMemoryQueue::expire_leases`] plays the role of the visibility timeout.
#[derive(Default)]
pub struct InMemoryQueue {
    ready: Mutex<VecDeque<QueuedMessage>>,
    leased: Mutex<HashMap<String, QueuedMessage>>,
    acknowledged: Mutex<Vec<String>>,
    poll_requests: Mutex<Vec<usize>>,
    poll_instants: Mutex<Vec<tokio::time::Instant>>,
    next_id: AtomicUsize,
    poll_failures: AtomicU32,
    ack_failures: AtomicU32,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a payload and returns its message id
    pub fn push(&self, body: impl Into<String>) -> String {
        let message_id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.push_with_id(message_id.clone(), body);
        message_id
    }

    /// Enqueues a payload under a given message id, e.g. a duplicate publish
    pub fn push_with_id(&self, message_id: impl Into<String>, body: impl Into<String>) {
        let message = QueuedMessage { message_id: message_id.into(), body: body.into(), receive_count: 0 };
        self.ready.lock().unwrap().push_back(message);
    }

    /// Makes every leased, unacknowledged message visible again
    pub fn expire_leases(&self) {
        // Same lock order as `poll`
        let mut ready = self.ready.lock().unwrap();
        let mut leased = self.leased.lock().unwrap();
        ready.extend(leased.drain().map(|(_, message)| message));
    }

    pub fn fail_next_polls(&self, count: u32) {
        self.poll_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_acks(&self, count: u32) {
        self.ack_failures.store(count, Ordering::SeqCst);
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }

    pub fn acknowledged_count(&self) -> usize {
        self.acknowledged.lock().unwrap().len()
    }

    pub fn leased_count(&self) -> usize {
        self.leased.lock().unwrap().len()
    }

    pub fn ready_count(&self) -> usize {
        self.ready.lock().unwrap().len()
    }

    /// `max_batch` of every poll, in order
    pub fn poll_requests(&self) -> Vec<usize> {
        self.poll_requests.lock().unwrap().clone()
    }

    /// When each poll happened, in order
    pub fn poll_instants(&self) -> Vec<tokio::time::Instant> {
        self.poll_instants.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn poll(&self, max_batch: usize, _wait: Duration) -> Result<Vec<Job>, QueueError> {
        self.poll_requests.lock().unwrap().push(max_batch);
        self.poll_instants.lock().unwrap().push(tokio::time::Instant::now());
        if take_failure(&self.poll_failures) {
            return Err(QueueError::Unavailable("queue endpoint unreachable".to_string()));
        }

        let mut ready = self.ready.lock().unwrap();
        let mut leased = self.leased.lock().unwrap();
        let mut jobs = Vec::new();
        while jobs.len() < max_batch {
            let Some(mut message) = ready.pop_front() else {
                break;
            };
            message.receive_count += 1;
            let receipt_handle = format!("{}-r{}", message.message_id, message.receive_count);
            jobs.push(Job::new(&message.message_id, &receipt_handle, &message.body, message.receive_count));
            leased.insert(receipt_handle, message);
        }
        Ok(jobs)
    }

    async fn acknowledge(&self, job: &Job) -> Result<(), QueueError> {
        if take_failure(&self.ack_failures) {
            return Err(QueueError::Unavailable("delete timed out".to_string()));
        }
        self.leased.lock().unwrap().remove(job.receipt_handle());
        self.acknowledged.lock().unwrap().push(job.message_id().to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

/// A result store with a unique key on `submission_id` and failure injection.
#[derive(Default)]
pub struct InMemoryResultStore {
    results: Mutex<HashMap<String, GradingResult>>,
    save_failures: AtomicU32,
    exists_failures: AtomicU32,
    /// Makes `exists` always answer `false`, as when two workers race past the existence check
    blind_exists: AtomicBool,
    save_delay: Mutex<Option<Duration>>,
    save_calls: AtomicUsize,
    saves_in_flight: AtomicUsize,
    max_saves_in_flight: AtomicUsize,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_saves(&self, count: u32) {
        self.save_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_exists(&self, count: u32) {
        self.exists_failures.store(count, Ordering::SeqCst);
    }

    pub fn blind_existence_check(&self) {
        self.blind_exists.store(true, Ordering::SeqCst);
    }

    pub fn delay_saves(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    pub fn get(&self, submission_id: &str) -> Option<GradingResult> {
        self.results.lock().unwrap().get(submission_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().unwrap().is_empty()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn max_saves_in_flight(&self) -> usize {
        self.max_saves_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn exists(&self, submission_id: &str) -> Result<bool, DatabaseError> {
        if take_failure(&self.exists_failures) {
            return Err(DatabaseError::Unavailable("connection reset".to_string()));
        }
        if self.blind_exists.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.results.lock().unwrap().contains_key(submission_id))
    }

    async fn save(&self, result: &GradingResult) -> Result<(), DatabaseError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.saves_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_saves_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = if take_failure(&self.save_failures) {
            Err(DatabaseError::Unavailable("connection reset".to_string()))
        } else {
            let mut results = self.results.lock().unwrap();
            if results.contains_key(&result.submission_id) {
                Err(DatabaseError::DuplicateKey(result.submission_id.clone()))
            } else {
                results.insert(result.submission_id.clone(), result.clone());
                Ok(())
            }
        };
        self.saves_in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Answer keys served from memory
#[derive(Default)]
pub struct StaticAnswerKeys {
    questions: HashMap<String, CanonicalQuestion>,
    fetch_calls: AtomicUsize,
    failures: AtomicU32,
}

impl StaticAnswerKeys {
    pub fn new(questions: Vec<CanonicalQuestion>) -> Self {
        Self { questions: questions.into_iter().map(|q| (q.question_id.clone(), q)).collect(), ..Default::default() }
    }

    pub fn fail_next_fetches(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerKeyProvider for StaticAnswerKeys {
    async fn fetch_questions(&self, question_ids: &[String]) -> Result<Vec<CanonicalQuestion>, DatabaseError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failures) {
            return Err(DatabaseError::Unavailable("quizzes collection unreachable".to_string()));
        }
        Ok(question_ids.iter().filter_map(|id| self.questions.get(id).cloned()).collect())
    }
}

/// Builds a queue payload in the producer's camelCase format
pub fn submission_payload(submission_id: &str, answers: &[(&str, &str)]) -> String {
    let answers: Vec<Value> =
        answers.iter().map(|(question_id, answer)| json!({ "questionId": question_id, "studentAnswer": answer })).collect();
    json!({
        "submissionId": submission_id,
        "studentId": "65f0c1b2a3d4e5f601234567",
        "quizId": "quiz-1",
        "subject": "math",
        "semester": "1",
        "unit": "3",
        "answers": answers,
    })
    .to_string()
}

#[fixture]
pub fn math_answer_key() -> Vec<CanonicalQuestion> {
    vec![
        CanonicalQuestion::new("q1", "4").with_task_text("2 + 2 = ?"),
        CanonicalQuestion::new("q2", "9").with_task_text("3 * 3 = ?"),
        CanonicalQuestion::new("q3", "0.5").with_accepted_answer("1/2").with_points(2.0),
    ]
}

/// Polls `condition` until it holds, panicking after `timeout`
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met within {:?}", timeout);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
