//! Per-run memoization of HTTP round trips.
//!
//! The catalog endpoint is consulted once per output variant and stream
//! details can be looked up repeatedly, so completed GET/HEAD round trips
//! are answered from memory after the first network call. Only concrete
//! responses are stored (any status code, 2xx or not); transport failures
//! propagate to the caller uncached so a later attempt may still succeed.
//! Entries live for the whole run and are never evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Method;

/// The read-only verbs the cache will memoize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Head,
}

impl Verb {
    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Head => Method::HEAD,
        }
    }
}

/// A completed round trip: status code plus body text. HEAD responses
/// carry an empty body.
#[derive(Debug)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Run-scoped response cache keyed by (verb, url). Hands out shared
/// handles, so every lookup of the same key returns the same response
/// object.
#[derive(Debug, Default)]
pub struct RequestCache {
    entries: Mutex<HashMap<(Verb, String), Arc<CachedResponse>>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, verb: Verb, url: &str) -> Option<Arc<CachedResponse>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&(verb, url.to_string())).cloned()
    }

    /// Stores a response under (verb, url) and returns the cached handle.
    /// First writer wins: if the key is already present the existing
    /// response is kept and returned, and `response` is dropped.
    pub fn insert(&self, verb: Verb, url: &str, response: CachedResponse) -> Arc<CachedResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry((verb, url.to_string()))
            .or_insert_with(|| Arc::new(response))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_returns_none() {
        let cache = RequestCache::new();
        assert!(cache.get(Verb::Get, "https://example.com/api").is_none());
    }

    #[test]
    fn test_hit_returns_identical_response() {
        let cache = RequestCache::new();
        let stored = cache.insert(
            Verb::Get,
            "https://example.com/api",
            CachedResponse::new(200, "{}"),
        );
        let hit = cache.get(Verb::Get, "https://example.com/api").unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
        let again = cache.get(Verb::Get, "https://example.com/api").unwrap();
        assert!(Arc::ptr_eq(&hit, &again));
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = RequestCache::new();
        let first = cache.insert(Verb::Head, "https://example.com", CachedResponse::new(200, ""));
        let second = cache.insert(Verb::Head, "https://example.com", CachedResponse::new(404, ""));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.status, 200);
    }

    #[test]
    fn test_verbs_are_separate_keys() {
        let cache = RequestCache::new();
        cache.insert(Verb::Get, "https://example.com", CachedResponse::new(200, "body"));
        assert!(cache.get(Verb::Head, "https://example.com").is_none());
    }

    #[test]
    fn test_non_2xx_responses_are_cached() {
        let cache = RequestCache::new();
        cache.insert(Verb::Get, "https://example.com/gone", CachedResponse::new(404, ""));
        let hit = cache.get(Verb::Get, "https://example.com/gone").unwrap();
        assert_eq!(hit.status, 404);
    }
}
