//! `lumos` drives the color of networked light fixtures from a declarative,
//! group-based configuration.
//!
//! Each group carries an ambient color pool, optionally blended with
//! time-of-day and seasonal overlays. Every controlled device runs its own
//! animator task which endlessly picks a target color, interpolates towards
//! it in OkLCh space and holds it for a while. The [`orchestrator`] maps
//! devices to groups and restarts animators whenever the topology changes.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod animation;
pub mod api;
pub mod color;
pub mod methods;
pub mod models;
pub mod orchestrator;
pub mod overlay;
pub mod pool;
pub mod runtime;
pub mod serde;
