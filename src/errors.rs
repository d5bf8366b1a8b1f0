use thiserror::Error;

/// Error type for catalog and manifest fetches.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or DNS level failure, no HTTP status available
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a status other than 200
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The endpoint answered 200 but the payload did not decode
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 200 but the payload reported failure
    #[error("stream {id} lookup reported success=false")]
    Api { id: u64 },

    /// A full catalog scan admitted nothing
    #[error("no valid streams detected")]
    NoValidStreams,
}
