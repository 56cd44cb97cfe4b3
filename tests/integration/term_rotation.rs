use crate::helpers::MemoryTermSource;
use search_poller::core::TermQueue;
use search_poller::source::TermSource;
use search_poller::PollerError;
use std::sync::Arc;

fn queue_over(source: MemoryTermSource) -> (Arc<MemoryTermSource>, TermQueue) {
    let source = Arc::new(source);
    let queue = TermQueue::new(source.clone() as Arc<dyn TermSource>, "20km");
    (source, queue)
}

fn five_term_source() -> MemoryTermSource {
    MemoryTermSource::new()
        .with_dictionary(&["charlie", "alpha", "bravo"])
        .with_location("Sevilla,Andalucia", "37.38,-5.98")
        .with_location("Madrid,Madrid", "40.41,-3.70")
}

#[tokio::test]
async fn test_load_orders_dictionary_before_locations() {
    let (_source, queue) = queue_over(five_term_source());

    let loaded = queue.load().await.unwrap();
    assert_eq!(loaded, 5);

    let snapshot = queue.snapshot().await;
    let terms: Vec<&str> = snapshot.iter().map(|d| d.term()).collect();
    assert_eq!(
        terms,
        vec!["alpha", "bravo", "charlie", "Madrid,Madrid", "Sevilla,Andalucia"]
    );

    let madrid = &snapshot[3];
    assert_eq!(madrid.query(), "Madrid");
    assert_eq!(madrid.geocode(), Some("40.41,-3.70"));
    assert_eq!(madrid.radius(), Some("20km"));
}

#[tokio::test]
async fn test_pop_then_push_preserves_working_set() {
    let (_source, queue) = queue_over(five_term_source());
    queue.load().await.unwrap();

    let mut before: Vec<String> = queue
        .snapshot()
        .await
        .iter()
        .map(|d| d.term().to_string())
        .collect();

    for _ in 0..7 {
        let term = queue.pop().await.unwrap();
        assert_eq!(queue.len().await, 4);
        queue.push(term).await;
        assert_eq!(queue.len().await, 5);
    }

    let mut after: Vec<String> = queue
        .snapshot()
        .await
        .iter()
        .map(|d| d.term().to_string())
        .collect();
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_resume_skips_consumed_terms() {
    for cursor in 0..=5u64 {
        let (_source, queue) = queue_over(five_term_source().with_cursor(cursor));

        let loaded = queue.load().await.unwrap();
        assert_eq!(loaded, 5 - cursor as usize, "cursor {cursor}");
    }

    let (_source, queue) = queue_over(five_term_source().with_cursor(2));
    queue.load().await.unwrap();
    assert_eq!(queue.pop().await.unwrap().term(), "charlie");
}

#[tokio::test]
async fn test_cursor_at_term_count_leaves_queue_empty() {
    let (source, queue) = queue_over(five_term_source().with_cursor(5));

    assert_eq!(queue.load().await.unwrap(), 0);
    assert!(queue.pop().await.is_none());
    assert_eq!(source.cursor_value(), 5);
}

#[tokio::test]
async fn test_cursor_past_end_wraps_around() {
    let (_source, queue) = queue_over(five_term_source().with_cursor(12));

    assert_eq!(queue.load().await.unwrap(), 3);
    assert_eq!(queue.pop().await.unwrap().term(), "charlie");
}

#[tokio::test]
async fn test_rotate_advances_cursor_by_one() {
    let (source, queue) = queue_over(five_term_source().with_cursor(1));
    queue.load().await.unwrap();

    let head = queue.pop().await.unwrap();
    let cursor = queue.rotate(head.clone()).await.unwrap();

    assert_eq!(cursor, 2);
    assert_eq!(source.cursor_value(), 2);
    assert_eq!(queue.served(), 1);
    assert_eq!(queue.snapshot().await.last(), Some(&head));
}

#[tokio::test]
async fn test_unavailable_source_fails_load() {
    let (_source, queue) = queue_over(five_term_source().unavailable());

    let err = queue.load().await.unwrap_err();
    assert!(matches!(err, PollerError::SourceUnavailable(_)));
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_empty_source_loads_empty_queue() {
    let (_source, queue) = queue_over(MemoryTermSource::new());

    assert_eq!(queue.load().await.unwrap(), 0);
    assert!(queue.pop().await.is_none());
}
