//! Integration Tests for the In-Memory Backend
//!
//! Runs the LRU and TTL scenarios through the public `Cache` contract.

mod common;

use std::sync::Arc;
use std::time::Duration;

use kv_cache::{Cache, CacheOptions, MemoryCache};
use tokio::time::advance;

const TICK: Duration = Duration::from_millis(1);
const TTL: Duration = Duration::from_millis(10);

// == Helper Functions ==

/// Capacity-3 cache holding `foo` then `bar`, one tick apart.
async fn lru_cache() -> MemoryCache<String> {
    common::init_tracing();
    let cache = MemoryCache::new(CacheOptions::new().with_max_size(3));
    cache.set("foo", "Hello World".to_string()).await.unwrap();
    advance(TICK).await;
    cache.set("bar", "KTHXBYE".to_string()).await.unwrap();
    advance(TICK).await;
    cache
}

async fn ttl_cache() -> MemoryCache<String> {
    common::init_tracing();
    let cache = MemoryCache::new(CacheOptions::new().with_ttl(TTL));
    cache.set("foo", "Hello World".to_string()).await.unwrap();
    cache.set("bar", "KTHXBYE".to_string()).await.unwrap();
    cache
}

async fn get(cache: &MemoryCache<String>, key: &str) -> Option<String> {
    cache.get(key).await.unwrap()
}

// == LRU Tests ==

#[tokio::test(start_paused = true)]
async fn test_lru_returns_none_on_miss() {
    let cache = lru_cache().await;
    assert_eq!(get(&cache, "baz").await, None);
}

#[tokio::test(start_paused = true)]
async fn test_lru_returns_value_on_hit() {
    let cache = lru_cache().await;
    assert_eq!(get(&cache, "foo").await.as_deref(), Some("Hello World"));
}

#[tokio::test(start_paused = true)]
async fn test_lru_evicts_least_recently_written() {
    let cache = lru_cache().await;

    // foo has been in the cache the longest
    cache.set("baz", "42".to_string()).await.unwrap();
    advance(TICK).await;
    cache.set("qux", "123".to_string()).await.unwrap();

    assert_eq!(cache.keys().await, vec!["bar", "baz", "qux"]);
    assert_eq!(get(&cache, "foo").await, None);
    assert_eq!(get(&cache, "bar").await.as_deref(), Some("KTHXBYE"));
    assert_eq!(get(&cache, "baz").await.as_deref(), Some("42"));
    assert_eq!(get(&cache, "qux").await.as_deref(), Some("123"));
}

#[tokio::test(start_paused = true)]
async fn test_lru_preserves_last_accessed() {
    let cache = lru_cache().await;

    // Reading foo makes bar the least recently used
    assert!(get(&cache, "foo").await.is_some());
    advance(TICK).await;
    cache.set("baz", "42".to_string()).await.unwrap();
    advance(TICK).await;
    cache.set("qux", "123".to_string()).await.unwrap();

    assert_eq!(cache.keys().await, vec!["baz", "foo", "qux"]);
    assert_eq!(get(&cache, "foo").await.as_deref(), Some("Hello World"));
    assert_eq!(get(&cache, "bar").await, None);
    assert_eq!(get(&cache, "baz").await.as_deref(), Some("42"));
    assert_eq!(get(&cache, "qux").await.as_deref(), Some("123"));
}

// == TTL Tests ==

#[tokio::test(start_paused = true)]
async fn test_ttl_returns_none_on_miss() {
    let cache = ttl_cache().await;
    assert_eq!(get(&cache, "baz").await, None);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_returns_value_on_hit() {
    let cache = ttl_cache().await;
    assert_eq!(get(&cache, "foo").await.as_deref(), Some("Hello World"));
}

#[tokio::test(start_paused = true)]
async fn test_ttl_evicts_stale_values() {
    let cache = ttl_cache().await;

    advance(TTL * 2 + TICK).await;
    cache.set("baz", "42".to_string()).await.unwrap();
    cache.set("qux", "123".to_string()).await.unwrap();

    // Swept by the writes, before any read
    assert_eq!(cache.keys().await, vec!["baz", "qux"]);
    assert_eq!(get(&cache, "foo").await, None);
    assert_eq!(get(&cache, "bar").await, None);
    assert_eq!(get(&cache, "baz").await.as_deref(), Some("42"));
    assert_eq!(get(&cache, "qux").await.as_deref(), Some("123"));

    let stats = cache.stats();
    assert_eq!(stats.expirations, 2);
    assert_eq!(stats.evictions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_and_capacity_compose() {
    common::init_tracing();
    let cache = MemoryCache::new(CacheOptions::new().with_ttl(TTL).with_max_size(2));
    cache.set("old", "1".to_string()).await.unwrap();
    advance(TTL).await;

    cache.set("a", "2".to_string()).await.unwrap();
    advance(TICK).await;
    cache.set("b", "3".to_string()).await.unwrap();

    // "old" expired; "a" survives because the stale entry did not count
    // against capacity
    assert_eq!(cache.keys().await, vec!["a", "b"]);
    let stats = cache.stats();
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.evictions, 0);
}

// == Contract Tests ==

#[tokio::test]
async fn test_usable_as_trait_object() {
    let cache: Arc<dyn Cache<String>> = Arc::new(MemoryCache::new(CacheOptions::default()));

    cache.set("k", "v".to_string()).await.unwrap();
    assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    cache.delete("k").await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None);

    cache.set("k", "v".to_string()).await.unwrap();
    cache.delete_all().await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_respect_capacity() {
    let cache = Arc::new(MemoryCache::new(CacheOptions::new().with_max_size(5)));

    let mut handles = Vec::new();
    for i in 0..50 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.set(&format!("key{i}"), i).await.unwrap();
            cache.get(&format!("key{}", i / 2)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.len().await, 5);
}
