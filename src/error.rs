// src/error.rs
use reqwest::StatusCode;

/// Failure modes of the scrape/upload pipeline.
///
/// Nothing here is retried within a run: an error aborts the run that hit
/// it and the next scheduled run is a fresh attempt.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// With fixed endpoints this is a configuration bug, not a runtime
    /// condition.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (DNS, connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-2xx status.
    #[error("unexpected status {status}")]
    HttpStatus { status: StatusCode },

    /// The response body could not be decoded as text.
    #[error("no usable data in response body")]
    NoData,

    /// The calendar table is missing: the page layout changed. Not
    /// transient; the parser targets one known markup shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The destination store rejected the batch. Status and body are kept
    /// for diagnostics.
    #[error("upload rejected with status {status}: {body}")]
    Upload { status: StatusCode, body: String },
}
