use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use rstest::*;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::tests::common::{math_answer_key, submission_payload, wait_until, InMemoryQueue, InMemoryResultStore, StaticAnswerKeys};
use crate::tests::config::TestConfigBuilder;
use crate::types::params::WorkerParams;
use crate::types::CanonicalQuestion;
use crate::worker::controller::grading_worker::{GradingWorker, WorkerStats};
use crate::worker::controller::worker_controller::WorkerController;
use crate::worker::initialize_worker;
use crate::GraderError;

struct Fakes {
    queue: Arc<InMemoryQueue>,
    store: Arc<InMemoryResultStore>,
}

impl Fakes {
    fn config(&self, answer_key: Vec<CanonicalQuestion>, configure: impl FnOnce(&mut WorkerParams)) -> Arc<Config> {
        TestConfigBuilder::new()
            .configure_queue(self.queue.clone())
            .configure_store(self.store.clone())
            .configure_answer_keys(Arc::new(StaticAnswerKeys::new(answer_key)))
            .configure_params(configure)
            .build()
    }
}

#[fixture]
fn fakes() -> Fakes {
    Fakes { queue: Arc::new(InMemoryQueue::new()), store: Arc::new(InMemoryResultStore::new()) }
}

fn spawn_worker(config: Arc<Config>) -> (CancellationToken, tokio::task::JoinHandle<WorkerStats>) {
    let token = CancellationToken::new();
    let worker = GradingWorker::new(config, token.clone());
    let handle = tokio::spawn(async move { worker.run().await });
    (token, handle)
}

#[rstest]
#[tokio::test]
async fn worker_drains_the_queue_within_its_concurrency_limit(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    for i in 0..12 {
        fakes.queue.push(submission_payload(&format!("s{i}"), &[("q1", "4"), ("q2", "8")]));
    }
    let config = fakes.config(math_answer_key, |params| {
        params.concurrency_limit = 4;
        params.max_batch_size = 10;
    });

    let (token, handle) = spawn_worker(config);
    wait_until(Duration::from_secs(5), || fakes.queue.acknowledged_count() == 12).await;
    token.cancel();
    let stats = handle.await.unwrap();

    assert_eq!(fakes.store.len(), 12);
    assert_eq!(fakes.store.get("s3").unwrap().score, 1.0);
    assert_eq!(stats.polled, 12);
    assert_eq!(stats.acknowledged, 12);
    assert_eq!(fakes.queue.ready_count(), 0);
    assert_eq!(fakes.queue.leased_count(), 0);
    let requests = fakes.queue.poll_requests();
    assert!(requests.iter().all(|&max_batch| (1..=4).contains(&max_batch)), "poll requests: {requests:?}");
}

#[rstest]
#[tokio::test]
async fn in_flight_jobs_never_exceed_the_concurrency_limit(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    fakes.store.delay_saves(Duration::from_millis(20));
    for i in 0..6 {
        fakes.queue.push(submission_payload(&format!("s{i}"), &[("q1", "4")]));
    }
    let config = fakes.config(math_answer_key, |params| params.concurrency_limit = 2);

    let (token, handle) = spawn_worker(config);
    wait_until(Duration::from_secs(5), || fakes.queue.acknowledged_count() == 6).await;
    token.cancel();
    handle.await.unwrap();

    assert_eq!(fakes.store.len(), 6);
    assert!(fakes.store.max_saves_in_flight() <= 2);
}

#[rstest]
#[tokio::test]
async fn failing_job_does_not_affect_its_siblings(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    fakes.store.delay_saves(Duration::from_millis(5));
    fakes.store.fail_next_saves(1);
    for i in 0..3 {
        fakes.queue.push(submission_payload(&format!("s{i}"), &[("q2", "9")]));
    }
    fakes.queue.push("not a submission");
    let config = fakes.config(math_answer_key, |params| params.concurrency_limit = 4);

    let (token, handle) = spawn_worker(config);
    wait_until(Duration::from_secs(5), || fakes.store.save_calls() == 3 && fakes.queue.acknowledged_count() == 3).await;
    token.cancel();
    let stats = handle.await.unwrap();

    assert_eq!(
        stats,
        WorkerStats { polled: 4, acknowledged: 3, acknowledge_failed: 0, left_for_redelivery: 1, panicked: 0 }
    );
    assert_eq!(fakes.store.len(), 2);
    // The failed delivery stays leased until its visibility timeout runs out.
    assert_eq!(fakes.queue.leased_count(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling_and_waits_for_in_flight_jobs(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    fakes.store.delay_saves(Duration::from_secs(10));
    fakes.queue.push(submission_payload("slow", &[("q1", "4")]));
    let config = fakes.config(math_answer_key, |_| {});

    let (token, handle) = spawn_worker(config);
    wait_until(Duration::from_secs(5), || fakes.store.save_calls() == 1).await;
    token.cancel();
    let polls_at_cancel = fakes.queue.poll_requests().len();
    fakes.queue.push(submission_payload("late", &[("q1", "4")]));

    let stats = handle.await.unwrap();

    assert_eq!(stats.acknowledged, 1);
    assert!(fakes.store.get("slow").is_some());
    assert!(fakes.store.get("late").is_none());
    assert_eq!(fakes.queue.poll_requests().len(), polls_at_cancel);
    assert_eq!(fakes.queue.ready_count(), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn poll_failures_back_off_then_recover(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    fakes.queue.fail_next_polls(3);
    fakes.queue.push(submission_payload("s1", &[("q1", "4")]));
    let config = fakes.config(math_answer_key, |params| {
        params.idle_backoff_initial = Duration::from_millis(100);
        params.idle_backoff_max = Duration::from_secs(1);
    });
    let started = tokio::time::Instant::now();

    let (token, handle) = spawn_worker(config);
    wait_until(Duration::from_secs(5), || fakes.queue.acknowledged_count() == 1).await;
    token.cancel();
    handle.await.unwrap();

    // 100 + 200 + 400 ms of backoff before the fourth poll succeeds
    assert!(started.elapsed() >= Duration::from_millis(700));
    assert!(fakes.queue.poll_requests().len() >= 4);
    assert!(fakes.store.get("s1").is_some());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn store_outage_slows_polling_down(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    fakes.store.fail_next_saves(u32::MAX);
    for i in 0..24 {
        fakes.queue.push(submission_payload(&format!("s{i}"), &[("q1", "4")]));
    }
    let config = fakes.config(math_answer_key, |params| {
        params.concurrency_limit = 4;
        params.idle_backoff_initial = Duration::from_millis(100);
        params.idle_backoff_max = Duration::from_secs(10);
    });

    let (token, handle) = spawn_worker(config);
    tokio::time::sleep(Duration::from_secs(2)).await;
    token.cancel();
    let stats = handle.await.unwrap();

    // Polls at 0, 100, 300, 700 and 1500 ms
    let polls = fakes.queue.poll_instants();
    let gaps: Vec<Duration> = polls.windows(2).map(|pair| pair[1] - pair[0]).collect();
    assert!(gaps.len() >= 3, "gaps: {gaps:?}");
    assert!(gaps.windows(2).all(|pair| pair[1] > pair[0]), "gaps: {gaps:?}");
    assert!(fakes.queue.ready_count() > 0, "the backlog was drained during the outage");
    assert!(fakes.store.is_empty());
    assert_eq!(stats.acknowledged, 0);
    assert_eq!(stats.left_for_redelivery, stats.polled);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn grading_resumes_once_the_store_recovers(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    fakes.store.fail_next_saves(4);
    for i in 0..8 {
        fakes.queue.push(submission_payload(&format!("s{i}"), &[("q1", "4")]));
    }
    let config = fakes.config(math_answer_key, |params| {
        params.concurrency_limit = 4;
        params.idle_backoff_initial = Duration::from_millis(100);
        params.idle_backoff_max = Duration::from_secs(10);
    });
    let started = tokio::time::Instant::now();

    let (token, handle) = spawn_worker(config);
    wait_until(Duration::from_secs(5), || fakes.queue.acknowledged_count() == 4).await;
    token.cancel();
    let stats = handle.await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(fakes.store.len(), 4);
    assert_eq!(stats.left_for_redelivery, 4);
    assert_eq!(stats.acknowledged, 4);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn idle_queue_is_polled_with_growing_delays(fakes: Fakes) {
    let config = fakes.config(Vec::new(), |params| {
        params.idle_backoff_initial = Duration::from_millis(10);
        params.idle_backoff_max = Duration::from_millis(160);
    });

    let (token, handle) = spawn_worker(config);
    tokio::time::sleep(Duration::from_secs(2)).await;
    token.cancel();
    let stats = handle.await.unwrap();

    // 10 + 20 + 40 + 80 ms, then a poll every 160 ms
    let polls = fakes.queue.poll_requests().len();
    assert!((10..=20).contains(&polls), "polled {polls} times");
    assert_eq!(stats, WorkerStats::default());
}

#[rstest]
#[tokio::test]
async fn controller_refuses_a_second_start(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    let config = fakes.config(math_answer_key, |_| {});
    let mut controller = WorkerController::new(config, CancellationToken::new());

    controller.start().unwrap();
    assert!(controller.is_running());
    assert_matches!(controller.start(), Err(GraderError::WorkerError(_)));

    fakes.queue.push(submission_payload("s1", &[("q1", "4")]));
    wait_until(Duration::from_secs(5), || fakes.queue.acknowledged_count() == 1).await;

    let stats = controller.shutdown().await.unwrap();
    assert_eq!(stats.acknowledged, 1);
}

#[rstest]
#[tokio::test]
async fn controller_that_never_started_shuts_down_cleanly(fakes: Fakes) {
    let controller = WorkerController::new(fakes.config(Vec::new(), |_| {}), CancellationToken::new());
    assert!(!controller.is_running());
    assert_eq!(controller.shutdown().await.unwrap(), WorkerStats::default());
}

#[rstest]
#[tokio::test]
async fn cancelling_the_application_token_stops_the_worker(fakes: Fakes, math_answer_key: Vec<CanonicalQuestion>) {
    let app_token = CancellationToken::new();
    let controller = initialize_worker(fakes.config(math_answer_key, |_| {}), app_token.clone()).await.unwrap();

    fakes.queue.push(submission_payload("s1", &[("q3", "0.5")]));
    wait_until(Duration::from_secs(5), || fakes.store.len() == 1).await;
    app_token.cancel();
    wait_until(Duration::from_secs(5), || !controller.is_running()).await;

    let stats = controller.shutdown().await.unwrap();
    assert_eq!(stats.polled, 1);
    assert_eq!(fakes.store.get("s1").unwrap().score, 2.0);
}
