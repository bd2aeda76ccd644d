//! Error types for repository harvesting

use thiserror::Error;

/// Failure taxonomy for the harvesting pipeline.
///
/// Every variant except `InvalidUrl` is source-local: the orchestrator
/// downgrades it to "no contribution" from that source and continues.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("authentication with {service} failed: {reason}")]
    Auth { service: String, reason: String },

    #[error("no {registry} record matches hostname '{hostname}'")]
    NoMatch { registry: String, hostname: String },

    #[error("{registry} returned {candidates} candidate(s) for '{hostname}', none usable")]
    AmbiguousMatch {
        registry: String,
        hostname: String,
        candidates: usize,
    },

    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
