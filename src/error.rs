//! Error types for org-fetch.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fetching and cloning operations.
#[derive(Error, Debug)]
pub enum OrgFetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request to {url} failed ({status}): {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Clone failed for {url}: {message}")]
    CloneTool { url: String, message: String },

    #[error("Could not read organization list {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// A specialized Result type for org-fetch operations.
pub type Result<T> = std::result::Result<T, OrgFetchError>;
