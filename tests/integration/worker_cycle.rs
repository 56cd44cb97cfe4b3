use crate::helpers::{
    test_config, MemoryTermSource, RecordingStore, Reply, SchedulerHarness, ScriptedSearchClient,
};
use search_poller::core::{
    AccountWorker, CycleOutcome, DispatchOutcome, SearchDispatcher, SearchKind, TermQueue,
    WorkerState,
};
use search_poller::monitoring::Metrics;
use search_poller::search::{SearchClient, SearchOptions};
use search_poller::sink::{ResultSink, ResultStore};
use search_poller::source::TermSource;
use std::sync::Arc;
use std::time::Duration;

fn abc_source() -> MemoryTermSource {
    MemoryTermSource::new().with_dictionary(&["alpha", "bravo", "charlie"])
}

async fn standalone_worker(
    source: Arc<MemoryTermSource>,
    client: Arc<ScriptedSearchClient>,
) -> (AccountWorker, Arc<TermQueue>) {
    let metrics = Arc::new(Metrics::new());
    let queue = Arc::new(TermQueue::new(source.clone() as Arc<dyn TermSource>, "20km"));
    queue.load().await.unwrap();
    let sink = Arc::new(ResultSink::new(
        Arc::new(RecordingStore::new()) as Arc<dyn ResultStore>,
        metrics.clone(),
    ));
    let dispatcher = Arc::new(SearchDispatcher::new(
        SearchOptions {
            language: "es".to_string(),
            page_size: 100,
        },
        sink,
        source as Arc<dyn TermSource>,
        metrics.clone(),
    ));

    let worker = AccountWorker::new(
        0,
        client as Arc<dyn SearchClient>,
        queue.clone(),
        dispatcher,
        metrics,
        Duration::ZERO,
        Duration::from_millis(100),
    );
    (worker, queue)
}

#[tokio::test]
async fn test_failed_search_still_rotates_term() {
    let source = Arc::new(abc_source());
    let client = Arc::new(ScriptedSearchClient::new("acct", Reply::ApiError));
    let (mut worker, queue) = standalone_worker(source.clone(), client).await;

    let outcome = worker.cycle().await;

    assert_eq!(
        outcome,
        CycleOutcome::Completed(DispatchOutcome::Failed {
            kind: SearchKind::Keyword
        })
    );
    let order: Vec<String> = queue
        .snapshot()
        .await
        .iter()
        .map(|d| d.term().to_string())
        .collect();
    assert_eq!(order, vec!["bravo", "charlie", "alpha"]);
    assert_eq!(source.cursor_value(), 1);
    assert_eq!(worker.state(), WorkerState::Searching);
    assert_eq!(worker.probe().status().failures, 1);
}

#[tokio::test]
async fn test_empty_queue_cycle_is_idle() {
    let source = Arc::new(MemoryTermSource::new());
    let client = Arc::new(ScriptedSearchClient::new("acct", Reply::Statuses(1)));
    let (mut worker, _queue) = standalone_worker(source.clone(), client.clone()).await;

    assert_eq!(worker.cycle().await, CycleOutcome::Idle);
    assert!(client.calls().is_empty());
    assert_eq!(source.cursor_value(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_worker_rotates_through_queue_once() {
    // 300ms window with 3 requests gives a 100ms per-account delay
    let harness = SchedulerHarness::new(
        test_config(&["acct"], 300, 3),
        abc_source(),
        vec![ScriptedSearchClient::new("acct", Reply::Statuses(1))],
    )
    .unwrap();
    assert_eq!(
        harness.scheduler.budget().per_account_delay(),
        Duration::from_millis(100)
    );

    let handle = harness.spawn();
    tokio::time::sleep(Duration::from_millis(250)).await;
    harness.scheduler.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(harness.clients[0].calls().len(), 3);
    assert_eq!(
        harness.queued_terms().await,
        vec!["alpha", "bravo", "charlie"]
    );
    assert_eq!(harness.source.cursor_value(), 3);
    assert_eq!(harness.scheduler.queue().served(), 3);
    assert_eq!(
        harness.store.tweet_terms(),
        vec!["alpha", "bravo", "charlie"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_search_errors_do_not_stall_rotation() {
    let harness = SchedulerHarness::new(
        test_config(&["acct"], 300, 3),
        abc_source(),
        vec![ScriptedSearchClient::new("acct", Reply::ApiError)],
    )
    .unwrap();

    let handle = harness.spawn();
    tokio::time::sleep(Duration::from_millis(250)).await;
    harness.scheduler.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(
        harness.queued_terms().await,
        vec!["alpha", "bravo", "charlie"]
    );
    assert_eq!(harness.source.cursor_value(), 3);
    assert_eq!(harness.store.writes(), 0);
    let snapshot = harness.scheduler.metrics.get_snapshot().await;
    assert_eq!(snapshot.total_search_failures, 3);
    assert_eq!(snapshot.total_terms_rotated, 3);
}

#[tokio::test(start_paused = true)]
async fn test_workers_are_staggered_by_request_lapse() {
    // 300ms per account across 3 accounts: one request every 100ms overall
    let harness = SchedulerHarness::new(
        test_config(&["a", "b", "c"], 300, 1),
        MemoryTermSource::new().with_dictionary(&["t1", "t2", "t3", "t4", "t5", "t6"]),
        vec![
            ScriptedSearchClient::new("a", Reply::Statuses(0)),
            ScriptedSearchClient::new("b", Reply::Statuses(0)),
            ScriptedSearchClient::new("c", Reply::Statuses(0)),
        ],
    )
    .unwrap();
    let calls = |h: &SchedulerHarness| -> Vec<usize> {
        h.clients.iter().map(|c| c.calls().len()).collect()
    };

    let handle = harness.spawn();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(calls(&harness), vec![1, 0, 0]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls(&harness), vec![1, 1, 0]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls(&harness), vec![1, 1, 1]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls(&harness), vec![2, 1, 1]);

    harness.scheduler.stop().await.unwrap();
    handle.await.unwrap().unwrap();
    assert_eq!(harness.source.cursor_value(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_empty_queue_workers_idle_without_advancing_cursor() {
    let harness = SchedulerHarness::new(
        test_config(&["acct"], 300, 3),
        MemoryTermSource::new(),
        vec![ScriptedSearchClient::new("acct", Reply::Statuses(1))],
    )
    .unwrap();

    let handle = harness.spawn();
    tokio::time::sleep(Duration::from_millis(250)).await;
    harness.scheduler.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    assert!(harness.clients[0].calls().is_empty());
    assert_eq!(harness.source.cursor_value(), 0);
    assert_eq!(
        harness.scheduler.metrics.get_snapshot().await.total_empty_polls,
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_cursor_write_failures_are_not_fatal() {
    let harness = SchedulerHarness::new(
        test_config(&["acct"], 300, 3),
        abc_source().failing_cursor_writes(),
        vec![ScriptedSearchClient::new("acct", Reply::Statuses(0))],
    )
    .unwrap();

    let handle = harness.spawn();
    tokio::time::sleep(Duration::from_millis(250)).await;
    harness.scheduler.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(
        harness.queued_terms().await,
        vec!["alpha", "bravo", "charlie"]
    );
    assert_eq!(harness.source.cursor_value(), 0);
    assert_eq!(harness.scheduler.queue().served(), 3);
    assert_eq!(
        harness
            .scheduler
            .metrics
            .get_snapshot()
            .await
            .total_cursor_advance_failures,
        3
    );
}
