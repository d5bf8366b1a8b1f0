use std::sync::Arc;

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::{CachedResponse, RequestCache, Verb};
use crate::config::USER_AGENT;
use crate::errors::FetchError;

/// Reachability checks are unreliable this close to a stream's scheduled
/// start, so a failed probe inside this window does not invalidate it.
const SCHEDULE_TOLERANCE_SECS: i64 = 2 * 86400;

/// Listing-level view of one stream, as returned by the catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamStub {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub uri_name: String,
    pub starts_at: i64,
    pub ends_at: i64,
    #[serde(default)]
    pub always_live: u8, // upstream sends 0 or 1
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub viewers: String,
}

/// A named grouping of streams. Categories arrive unordered relative to
/// each other; only the streams inside one are sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamCategory {
    pub category: String,
    pub id: u64,
    #[serde(default)]
    pub always_live: u8,
    pub streams: Vec<StreamStub>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSource {
    pub name: String,
    #[serde(default, rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub data: String,
}

/// Per-stream detail fetched when the playable address is needed. Only
/// `m3u8` is consumed here; the remaining fields are carried through
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDetail {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub poster: String,
    pub m3u8: String,
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub sources: Vec<StreamSource>,
    #[serde(default)]
    pub start_timestamp: i64,
    #[serde(default)]
    pub end_timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    streams: Vec<StreamCategory>,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    success: bool,
    #[serde(default)]
    data: Option<StreamDetail>,
}

/// Client for one catalog mirror. All traffic goes through the per-run
/// request cache, so repeated calls to the same endpoint hit the network
/// once.
#[derive(Debug, Clone)]
pub struct PpvClient {
    pub base_url: String,
    http: reqwest::Client,
    cache: Arc<RequestCache>,
}

impl PpvClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_cache(base_url, Arc::new(RequestCache::new()))
    }

    /// Same as [`PpvClient::new`] with a caller-supplied cache. Tests seed
    /// canned responses through this.
    pub fn with_cache(base_url: &str, cache: Arc<RequestCache>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url,
            http,
            cache,
        }
    }

    /// One cached round trip. A network call only happens on a cache miss,
    /// and only concrete responses enter the cache.
    async fn request(&self, verb: Verb, url: &str) -> Result<Arc<CachedResponse>, FetchError> {
        if let Some(hit) = self.cache.get(verb, url) {
            return Ok(hit);
        }

        let response = self
            .http
            .request(verb.as_method(), url)
            .header("Accept", "application/json, text/plain, */*")
            .header("Referer", format!("{}/", self.base_url))
            .header("Origin", self.base_url.as_str())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        Ok(self.cache.insert(verb, url, CachedResponse::new(status, body)))
    }

    /// Liveness probe. True only when the catalog endpoint answers 200;
    /// never returns an error.
    pub async fn is_working(&self) -> bool {
        let url = format!("{}/api/streams", self.base_url);
        match self.request(Verb::Head, &url).await {
            Ok(response) => response.status == 200,
            Err(_) => false,
        }
    }

    /// Fetches the catalog. Streams inside each category are sorted by
    /// descending start time (stable, so equal starts keep their upstream
    /// order); category order is preserved as received.
    pub async fn get_streams(&self) -> Result<Vec<StreamCategory>, FetchError> {
        let url = format!("{}/api/streams", self.base_url);
        let response = self.request(Verb::Get, &url).await?;
        if response.status != 200 {
            return Err(FetchError::Status {
                url,
                status: response.status,
            });
        }

        let listing: StreamsResponse = serde_json::from_str(&response.body)
            .map_err(|source| FetchError::Decode { url, source })?;

        let mut categories = listing.streams;
        for category in &mut categories {
            category.streams.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
            debug!(
                "{} streams in category {}",
                category.streams.len(),
                category.category
            );
        }
        Ok(categories)
    }

    /// Resolves a stream's playable manifest URL from the detail endpoint.
    pub async fn get_video_url(&self, stream: &StreamStub) -> Result<String, FetchError> {
        let url = format!("{}/api/streams/{}", self.base_url, stream.id);
        let response = self.request(Verb::Get, &url).await?;
        if response.status != 200 {
            return Err(FetchError::Status {
                url,
                status: response.status,
            });
        }

        let detail: StreamResponse = serde_json::from_str(&response.body)
            .map_err(|source| FetchError::Decode { url, source })?;
        match detail.data {
            Some(data) if detail.success => Ok(data.m3u8),
            _ => Err(FetchError::Api { id: stream.id }),
        }
    }

    /// HEADs an arbitrary URL (typically a manifest) and reports its status
    /// code. A transport error that still carries a status yields that
    /// status; anything else propagates.
    pub async fn get_url_status(&self, url: &str) -> Result<u16, FetchError> {
        match self.request(Verb::Head, url).await {
            Ok(response) => Ok(response.status),
            Err(FetchError::Transport { url, source }) => match source.status() {
                Some(status) => Ok(status.as_u16()),
                None => Err(FetchError::Transport { url, source }),
            },
            Err(other) => Err(other),
        }
    }

    /// A stream counts as valid when its manifest answers 200, or, failing
    /// that, when its scheduled start is close enough to now that the probe
    /// result cannot be trusted.
    pub async fn is_stream_valid(&self, stream: &StreamStub, manifest_url: &str) -> bool {
        if let Ok(200) = self.get_url_status(manifest_url).await {
            return true;
        }
        schedule_tolerates(stream.starts_at, Utc::now().timestamp())
    }
}

fn schedule_tolerates(starts_at: i64, now: i64) -> bool {
    let started_ago = starts_at - now;
    started_ago < SCHEDULE_TOLERANCE_SECS && started_ago > -SCHEDULE_TOLERANCE_SECS
}
