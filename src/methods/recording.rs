//! Publisher fake that records every command

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use tokio::time::Instant;

use super::{PublishError, Publisher};
use crate::api::ColorPayload;

/// A recorded command
#[derive(Debug, Clone)]
pub struct Published {
    /// Channel the command was sent to
    pub channel: String,
    /// Decoded command
    pub payload: ColorPayload,
    /// Time of the publish call
    pub at: Instant,
}

/// Publisher keeping every command in memory
#[derive(Default)]
pub struct Recording {
    published: Mutex<Vec<Published>>,
    failing: AtomicBool,
}

impl Recording {
    /// Empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail after being recorded
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every command so far, in publish order
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    /// Number of publish calls
    pub fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    /// Distinct channels, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<_> = self
            .published()
            .into_iter()
            .map(|published| published.channel)
            .collect();
        channels.sort();
        channels.dedup();
        channels
    }
}

#[async_trait]
impl Publisher for Recording {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let payload = serde_json::from_slice(&payload)
            .map_err(|err| PublishError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;

        self.published.lock().unwrap().push(Published {
            channel: channel.to_owned(),
            payload,
            at: Instant::now(),
        });

        if self.failing.load(Ordering::SeqCst) {
            Err(PublishError::Closed)
        } else {
            Ok(())
        }
    }
}
