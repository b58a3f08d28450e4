//! Wire formats exchanged with the light bridge

mod payload;
pub use payload::*;

/// Schema of the zigbee2mqtt bridge topology messages
pub mod z2m;
