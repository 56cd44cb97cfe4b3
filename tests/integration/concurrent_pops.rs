use crate::helpers::{
    test_config, InFlightTerms, MemoryTermSource, Reply, SchedulerHarness, ScriptedSearchClient,
};
use search_poller::core::TermQueue;
use search_poller::source::TermSource;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_term_is_never_held_twice() {
    let source = Arc::new(MemoryTermSource::new().with_dictionary(&["solo"]));
    let queue = Arc::new(TermQueue::new(source.clone() as Arc<dyn TermSource>, "20km"));
    queue.load().await.unwrap();

    let holders = Arc::new(AtomicUsize::new(0));
    let max_holders = Arc::new(AtomicUsize::new(0));
    let served = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let queue = queue.clone();
        let holders = holders.clone();
        let max_holders = max_holders.clone();
        let served = served.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..200 {
                if let Some(term) = queue.pop().await {
                    let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                    max_holders.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    holders.fetch_sub(1, Ordering::SeqCst);
                    served.fetch_add(1, Ordering::SeqCst);
                    queue.rotate(term).await.unwrap();
                } else {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(max_holders.load(Ordering::SeqCst), 1);
    assert_eq!(queue.len().await, 1);
    assert_eq!(
        source.cursor_value(),
        served.load(Ordering::SeqCst) as u64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_workers_share_one_term_without_overlap() {
    let in_flight = Arc::new(InFlightTerms::default());
    // 20ms per account, second worker offset by 10ms; searches take 15ms
    let harness = SchedulerHarness::new(
        test_config(&["a", "b"], 20, 1),
        MemoryTermSource::new().with_dictionary(&["solo"]),
        vec![
            ScriptedSearchClient::new("a", Reply::Statuses(1))
                .with_latency(Duration::from_millis(15))
                .tracking(in_flight.clone()),
            ScriptedSearchClient::new("b", Reply::Statuses(1))
                .with_latency(Duration::from_millis(15))
                .tracking(in_flight.clone()),
        ],
    )
    .unwrap();

    let handle = harness.spawn();
    tokio::time::sleep(Duration::from_millis(400)).await;
    harness.scheduler.stop().await.unwrap();
    handle.await.unwrap().unwrap();

    assert!(!in_flight.overlapped());

    let searches: usize = harness.clients.iter().map(|c| c.calls().len()).sum();
    assert!(searches > 0);
    assert_eq!(harness.source.cursor_value(), searches as u64);
    assert_eq!(harness.queued_terms().await, vec!["solo"]);

    // One tweet per pop: a duplicated pop would store the tag twice for one search
    let tags = harness.store.tweet_terms();
    assert_eq!(tags.len(), searches);
    assert!(tags.iter().all(|t| t == "solo"));
}
