use std::path::Path;

use thiserror::Error;

use crate::api::z2m::{BridgeDevice, BridgeGroup};

/// Failure to decode a topology snapshot
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bridge payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown bridge topic: {0}")]
    UnknownTopic(String),
}

/// Topology snapshot received from the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyUpdate {
    /// Every device known to the bridge
    Devices(Vec<BridgeDevice>),
    /// Every group known to the bridge
    Groups(Vec<BridgeGroup>),
}

impl TopologyUpdate {
    /// Decode the payload of a bridge topic
    ///
    /// This is the entry point for every topology source: snapshot files go
    /// through it, and so should messages received from a bus client. Both
    /// the retained `bridge/devices` and `bridge/groups` topics and their
    /// `bridge/config/...` replies are understood, with or without the base
    /// topic prefix.
    pub fn from_bridge(topic: &str, payload: &[u8]) -> Result<Self, TopologyError> {
        let path = topic
            .split_once("/bridge/")
            .map(|(_, path)| path)
            .or_else(|| topic.strip_prefix("bridge/"))
            .unwrap_or(topic);

        match path.trim_start_matches("config/") {
            "devices" => Ok(Self::Devices(serde_json::from_slice(payload)?)),
            "groups" => Ok(Self::Groups(serde_json::from_slice(payload)?)),
            _ => Err(TopologyError::UnknownTopic(topic.to_owned())),
        }
    }
}

/// Decode a file holding the retained payload of `topic`
async fn load_snapshot(path: &Path, topic: &str) -> Result<TopologyUpdate, TopologyError> {
    let contents = tokio::fs::read(path).await?;
    TopologyUpdate::from_bridge(topic, &contents)
}

/// Load a `bridge/devices` snapshot
pub async fn load_devices(path: &Path) -> Result<TopologyUpdate, TopologyError> {
    load_snapshot(path, "bridge/devices").await
}

/// Load a `bridge/groups` snapshot
pub async fn load_groups(path: &Path) -> Result<TopologyUpdate, TopologyError> {
    load_snapshot(path, "bridge/groups").await
}
