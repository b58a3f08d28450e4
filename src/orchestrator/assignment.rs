use std::collections::BTreeMap;

use crate::{
    api::z2m::{BridgeDevice, BridgeGroup},
    runtime::CompiledConfig,
};

/// Group selected for every controlled device, keyed by friendly name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceAssignment {
    assignments: BTreeMap<String, String>,
}

impl DeviceAssignment {
    /// Assign each device to its highest priority configured group
    ///
    /// Equal priorities resolve to the group whose name sorts first. Groups
    /// missing from the configuration are ignored, as are group members
    /// missing from the device list and devices without any configured group.
    pub fn compute(
        config: &CompiledConfig,
        devices: &[BridgeDevice],
        groups: &[BridgeGroup],
    ) -> Self {
        let mut memberships: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for group in groups {
            if !config.groups.contains_key(&group.friendly_name) {
                trace!(group = %group.friendly_name, "ignoring unconfigured group");
                continue;
            }

            for member in &group.members {
                memberships
                    .entry(member.ieee_address.as_str())
                    .or_default()
                    .push(group.friendly_name.as_str());
            }
        }

        let mut assignments = BTreeMap::new();
        for device in devices {
            let selected = memberships
                .get(device.ieee_address.as_str())
                .and_then(|names| {
                    names.iter().copied().max_by(|a, b| {
                        config
                            .priority(a)
                            .cmp(&config.priority(b))
                            .then_with(|| b.cmp(a))
                    })
                });

            if let Some(group) = selected {
                assignments.insert(device.friendly_name.clone(), group.to_owned());
            }
        }

        Self { assignments }
    }

    /// Group controlling `device`
    pub fn group(&self, device: &str) -> Option<&str> {
        self.assignments.get(device).map(String::as_str)
    }

    /// `(device, group)` pairs, sorted by device name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignments
            .iter()
            .map(|(device, group)| (device.as_str(), group.as_str()))
    }

    /// Number of controlled devices
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// `true` if no device is controlled
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
