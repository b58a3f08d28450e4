//! Device orchestration
//!
//! The [`Orchestrator`] owns one [`AnimatorHandle`] per controlled device.
//! Whenever the topology or the configuration changes, it computes a fresh
//! [`DeviceAssignment`], stops every running animator and starts new ones
//! from the current configuration snapshot.

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    animation::{Animator, AnimatorHandle},
    api::z2m::{BridgeDevice, BridgeGroup},
    methods::Publisher,
    runtime::CompiledConfig,
};

mod assignment;
pub use assignment::DeviceAssignment;

mod topology;
pub use topology::{load_devices, load_groups, TopologyError, TopologyUpdate};

struct OrchestratorData {
    config: Arc<CompiledConfig>,
    publisher: Arc<dyn Publisher>,
    devices: Option<Vec<BridgeDevice>>,
    groups: Option<Vec<BridgeGroup>>,
    assignment: Option<DeviceAssignment>,
    animators: BTreeMap<String, AnimatorHandle>,
    closed: bool,
}

impl OrchestratorData {
    async fn stop_all(&mut self) {
        let animators = std::mem::take(&mut self.animators);

        // Cancel everything first so no animator keeps publishing while
        // another one is being joined
        for handle in animators.values() {
            handle.cancel();
        }

        for (_, handle) in animators {
            handle.stop().await;
        }
    }

    async fn recompute(&mut self) {
        if self.closed {
            debug!("orchestrator closed, ignoring update");
            return;
        }

        let (devices, groups) = match (&self.devices, &self.groups) {
            (Some(devices), Some(groups)) => (devices, groups),
            _ => {
                debug!("waiting for both device and group lists");
                return;
            }
        };

        let assignment = DeviceAssignment::compute(&self.config, devices, groups);

        self.stop_all().await;

        let mut animators = BTreeMap::new();
        for (device, group) in assignment.iter() {
            let runtime = match self.config.groups.get(group) {
                Some(group) => group.runtime.clone(),
                None => continue,
            };

            let animator = Animator::new(
                device.to_owned(),
                self.config.channel(device),
                runtime,
                self.config.payload,
                self.publisher.clone(),
            );

            info!(device = %device, group = %group, "controlling device");
            animators.insert(device.to_owned(), AnimatorHandle::spawn(animator));
        }

        self.animators = animators;
        self.assignment = Some(assignment);
    }
}

/// Shared handle to the device orchestrator
#[derive(Clone)]
pub struct Orchestrator(Arc<Mutex<OrchestratorData>>);

impl Orchestrator {
    /// Orchestrator without topology, no animator runs until both device and
    /// group lists are received
    pub fn new(config: CompiledConfig, publisher: Arc<dyn Publisher>) -> Self {
        Self(Arc::new(Mutex::new(OrchestratorData {
            config: Arc::new(config),
            publisher,
            devices: None,
            groups: None,
            assignment: None,
            animators: BTreeMap::new(),
            closed: false,
        })))
    }

    /// Apply a topology snapshot
    ///
    /// Animators are only started once both the device list and the group
    /// list have been received.
    pub async fn update(&self, update: TopologyUpdate) {
        let mut data = self.0.lock().await;

        match update {
            TopologyUpdate::Devices(devices) => {
                debug!(count = devices.len(), "received device list");
                data.devices = Some(devices);
            }
            TopologyUpdate::Groups(groups) => {
                debug!(count = groups.len(), "received group list");
                data.groups = Some(groups);
            }
        }

        data.recompute().await;
    }

    /// Shorthand for a [`TopologyUpdate::Devices`] update
    pub async fn set_devices(&self, devices: Vec<BridgeDevice>) {
        self.update(TopologyUpdate::Devices(devices)).await
    }

    /// Shorthand for a [`TopologyUpdate::Groups`] update
    pub async fn set_groups(&self, groups: Vec<BridgeGroup>) {
        self.update(TopologyUpdate::Groups(groups)).await
    }

    /// Replace the configuration snapshot and restart every animator
    pub async fn reload(&self, config: CompiledConfig) {
        let mut data = self.0.lock().await;
        data.config = Arc::new(config);

        info!("configuration reloaded");
        data.recompute().await;
    }

    /// Devices with a running animator
    pub async fn running(&self) -> Vec<String> {
        let data = self.0.lock().await;

        data.animators
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(device, _)| device.clone())
            .collect()
    }

    /// Assignment computed by the last recomputation
    pub async fn assignment(&self) -> Option<DeviceAssignment> {
        self.0.lock().await.assignment.clone()
    }

    /// Stop every animator and ignore further updates
    pub async fn shutdown(&self) {
        let mut data = self.0.lock().await;
        data.closed = true;
        data.stop_all().await;

        info!("orchestrator stopped");
    }
}
