//! Publishing color commands

use async_trait::async_trait;
use thiserror::Error;

mod file;
pub use file::File;

mod stdout;
pub use stdout::Stdout;

#[cfg(test)]
pub mod recording;

/// Failure to deliver a command
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("publisher closed")]
    Closed,
}

/// Sink for commands addressed to named channels
///
/// Implementations are shared by every animator and must accept concurrent
/// calls.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver `payload` on `channel`
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}
