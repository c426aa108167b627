//! Error types for terrain streaming

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Heightmap error: {0}")]
    Heightmap(String),

    /// A reconciliation was requested while the rebuilder still had work in flight.
    #[error("chunk rebuild in progress ({pending} pending, active: {active})")]
    RebuildInProgress { pending: usize, active: bool },
}
