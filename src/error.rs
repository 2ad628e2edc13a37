use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: {status} {status_text}")]
    Fetch {
        url: String,
        status: u16,
        status_text: String,
    },

    #[error("failed to parse {context}: {reason}")]
    Parse { context: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("batch of {len} businesses exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },
}
