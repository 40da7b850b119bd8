pub mod influx;
pub mod memory;

use crate::encode::Point;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected write with status {status}: {message}")]
    Backend { status: u16, message: String },
}

/// Destination for encoded batches. The shipper owns exactly one sink and
/// never exposes it to producers.
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Ship one batch. Called with a non-empty slice only; the shipper
    /// skips the call entirely for an empty drain.
    async fn write_points(&self, points: &[Point]) -> Result<(), WriteError>;
}
