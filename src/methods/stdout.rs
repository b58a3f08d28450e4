//! Definition of the Stdout publisher

use async_trait::async_trait;
use tokio::{
    io::{AsyncWriteExt, Stdout as TokioStdout},
    sync::Mutex,
};

use super::{PublishError, Publisher};

/// Publisher that writes `channel payload` lines to stdout
pub struct Stdout {
    out: Mutex<TokioStdout>,
}

impl Stdout {
    /// Publisher writing to the process standard output
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for Stdout {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for Stdout {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let mut line = Vec::with_capacity(channel.len() + payload.len() + 2);
        line.extend_from_slice(channel.as_bytes());
        line.push(b' ');
        line.extend_from_slice(&payload);
        line.push(b'\n');

        // Lines from concurrent animators must not interleave
        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;

        Ok(())
    }
}
