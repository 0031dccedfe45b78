use thiserror::Error;

/// Raised once at startup when the sync configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PROVIDER_API_KEY (or YOUTUBE_API_KEY) environment variable must be set")]
    MissingApiKey,
    #[error("invalid channel reference: {0:?}")]
    InvalidChannelRef(String),
    #[error("unknown CATALOG_BACKEND: {0:?} (expected \"elasticsearch\" or \"memory\")")]
    UnknownBackend(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to YouTube API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("YouTube API answered {status} for {endpoint}")]
    Status { endpoint: &'static str, status: u16 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("elasticsearch request failed: {0}")]
    Elasticsearch(#[from] elasticsearch::Error),
    #[error("elasticsearch answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode stored video: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a sync tier could not run to completion.
#[derive(Debug, Error)]
pub enum SyncSkipped {
    #[error("no channel reference configured")]
    MissingChannelRef,
    #[error("could not resolve channel {0}")]
    ChannelNotFound(String),
    #[error("channel {0} has no uploads playlist")]
    NoUploadsPlaylist(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
