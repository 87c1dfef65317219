use thiserror::Error;

/// Soft failures from the catalog API. Callers treat every variant as "no
/// data" and move on; none of them aborts a sync.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No response from {url}")]
    NoResponse { url: String },

    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed response from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
