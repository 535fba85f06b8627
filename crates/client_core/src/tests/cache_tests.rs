use super::*;

#[tokio::test]
async fn missing_entry_is_stale_and_empty() {
    let cache = QueryCache::<u32>::new();
    let key = QueryKey::images();
    assert!(cache.get(&key).await.is_none());
    assert!(cache.is_stale(&key).await);
    assert!(!cache.invalidate(&key).await);
}

#[tokio::test]
async fn replace_makes_entry_fresh_until_invalidated() {
    let cache = QueryCache::<u32>::new();
    let key = QueryKey::images();
    cache.replace(&key, InfiniteData::first(1)).await;
    assert!(!cache.is_stale(&key).await);

    assert!(cache.invalidate(&key).await);
    assert!(cache.is_stale(&key).await);
    assert_eq!(cache.get(&key).await.map(|d| d.pages), Some(vec![1]));
}

#[tokio::test]
async fn storing_same_cursor_twice_keeps_one_page() {
    let cache = QueryCache::<&'static str>::new();
    let key = QueryKey::images();
    cache.store_page(&key, None, "first").await;
    cache.store_page(&key, Some(Cursor::new("5")), "second").await;
    cache
        .store_page(&key, Some(Cursor::new("5")), "second-again")
        .await;

    let data = cache.get(&key).await.expect("entry");
    assert_eq!(data.pages, vec!["first", "second-again"]);
    assert_eq!(data.page_params, vec![None, Some(Cursor::new("5"))]);
}

#[tokio::test]
async fn inflight_fetches_are_deduplicated_per_cursor() {
    let cache = QueryCache::<u32>::new();
    let key = QueryKey::images();
    let cursor = Cursor::new("5");

    assert!(cache.try_begin_fetch(&key, Some(&cursor)).await);
    assert!(!cache.try_begin_fetch(&key, Some(&cursor)).await);
    assert!(cache.try_begin_fetch(&key, None).await);

    cache.finish_fetch(&key, Some(&cursor)).await;
    assert!(cache.try_begin_fetch(&key, Some(&cursor)).await);
    assert!(!cache.try_begin_fetch(&key, None).await);
}

#[tokio::test]
async fn subscribers_observe_invalidation() {
    let cache = QueryCache::<u32>::new();
    let key = QueryKey::images();
    let mut events = cache.subscribe();

    cache.replace(&key, InfiniteData::first(7)).await;
    cache.invalidate(&key).await;

    assert_eq!(
        events.recv().await.expect("updated"),
        CacheEvent::Updated(key.clone())
    );
    assert_eq!(
        events.recv().await.expect("invalidated"),
        CacheEvent::Invalidated(key)
    );
}

#[tokio::test]
async fn keys_are_independent() {
    let cache = QueryCache::<u32>::new();
    let images = QueryKey::images();
    let other = QueryKey::new("favorites");
    cache.replace(&images, InfiniteData::first(1)).await;
    cache.replace(&other, InfiniteData::first(2)).await;

    cache.invalidate(&images).await;
    assert!(cache.is_stale(&images).await);
    assert!(!cache.is_stale(&other).await);
    assert_eq!(cache.get(&other).await.map(|d| d.pages), Some(vec![2]));
}
