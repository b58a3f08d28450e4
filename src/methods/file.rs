use std::{fmt::Write, path::Path, time::Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use super::{PublishError, Publisher};

struct FileState {
    handle: fs::File,
    last_write_time: Instant,
    buf: String,
}

/// Publisher that appends timestamped commands to a file
pub struct File {
    state: Mutex<FileState>,
}

impl File {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PublishError> {
        let handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            state: Mutex::new(FileState {
                handle: fs::File::from_std(handle),
                last_write_time: Instant::now(),
                buf: String::new(),
            }),
        })
    }
}

#[async_trait]
impl Publisher for File {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let elapsed_time_ms = state.last_write_time.elapsed().as_millis();
        state.last_write_time = Instant::now();

        state.buf.clear();
        writeln!(
            state.buf,
            "{} | +{} {} {}",
            Utc::now(),
            elapsed_time_ms,
            channel,
            String::from_utf8_lossy(&payload)
        )?;

        state.handle.write_all(state.buf.as_bytes()).await?;
        state.handle.flush().await?;

        Ok(())
    }
}
