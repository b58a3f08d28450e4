use serde_derive::{Deserialize, Serialize};

/// Entry of the `bridge/devices` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDevice {
    /// Name used in command topics
    pub friendly_name: String,
    /// Hardware address, referenced by group members
    pub ieee_address: String,
}

/// Entry of the `bridge/groups` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeGroup {
    /// Name matched against the configured groups
    pub friendly_name: String,
    /// Numeric group id
    pub id: i32,
    /// Devices in the group, empty when the bridge omits the field
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

/// Device endpoint belonging to a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Endpoint of the device added to the group
    pub endpoint: i32,
    /// Hardware address of the member device
    pub ieee_address: String,
}
