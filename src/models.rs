//! Declarative configuration
//!
//! These types mirror the configuration file. Colors, clock times and dates
//! are kept as written so the file can be dumped back unchanged; they are
//! only parsed by [`Config::compile`].

use std::{collections::BTreeMap, time::Duration};

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::{
    api::PayloadFormat,
    color::ColorParseError,
    overlay::MarkerParseError,
    pool::EmptyPool,
    runtime::{DurationRange, SelectionStrategy},
};

mod compile;

mod file;
pub use file::ConfigExt;

/// Failure to load or compile a configuration
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error parsing TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("error parsing JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("timestep must be greater than zero")]
    Timestep,
    #[error("{field}: min ({min:?}) is greater than max ({max:?})")]
    Range {
        field: String,
        min: Duration,
        max: Duration,
    },
    #[error("group {group}: {source}")]
    Color {
        group: String,
        #[source]
        source: ColorParseError,
    },
    #[error("group {group}: {source}")]
    Marker {
        group: String,
        #[source]
        source: MarkerParseError,
    },
    #[error("group {group}: {source}")]
    EmptyPool {
        group: String,
        #[source]
        source: EmptyPool,
    },
}

fn default_timestep() -> Duration {
    Duration::from_secs(1)
}

fn default_base_topic() -> String {
    "zigbee2mqtt".to_owned()
}

fn default_range() -> DurationRange {
    DurationRange::fixed(Duration::from_secs(5))
}

/// Root of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Interval between two published frames of a transition
    #[serde(with = "crate::serde::duration")]
    pub timestep: Duration,
    /// Prefix of the channels commands are published to
    pub base_topic: String,
    /// How overlays are combined with the ambient colors
    pub selection: SelectionStrategy,
    /// Color representation sent to devices
    pub payload: PayloadFormat,
    /// IANA time zone used to evaluate overlays, defaults to local time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<chrono_tz::Tz>,
    /// Default transition duration
    pub transition: DurationRange,
    /// Default hold duration
    pub hold: DurationRange,
    /// Groups by bridge friendly name
    #[validate(length(min = 1))]
    pub groups: BTreeMap<String, GroupConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            base_topic: default_base_topic(),
            selection: SelectionStrategy::default(),
            payload: PayloadFormat::default(),
            timezone: None,
            transition: default_range(),
            hold: default_range(),
            groups: BTreeMap::new(),
        }
    }
}

/// Colors and timings of one bridge group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GroupConfig {
    /// Groups with a higher priority take precedence for shared devices
    #[serde(default)]
    pub priority: i32,
    /// Ambient colors
    #[validate(length(min = 1))]
    pub colors: Vec<String>,
    /// Overrides the default transition duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<DurationRange>,
    /// Overrides the default hold duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<DurationRange>,
    /// Overlays, evaluated in order
    #[serde(default)]
    #[validate(nested)]
    pub overlays: Vec<OverlayConfig>,
}

/// Overlay colors and the windows during which they apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OverlayConfig {
    /// Overlay colors
    #[validate(length(min = 1))]
    pub colors: Vec<String>,
    /// Daily window, the overlay applies all day without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeConfig>,
    /// Seasonal window, the overlay applies all year without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<SeasonalConfig>,
}

/// Start and end markers of a fade
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fader {
    pub start: String,
    pub end: String,
}

/// Daily window, markers are clock times such as `20:00` or `8:00PM`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TimeConfig {
    pub fade_in: Fader,
    pub fade_out: Fader,
}

/// Seasonal window, markers are `MM-DD` dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SeasonalConfig {
    pub fade_in: Fader,
    pub fade_out: Fader,
}
