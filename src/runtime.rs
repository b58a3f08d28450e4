//! Executable form of the configuration
//!
//! A [`CompiledConfig`] is an immutable snapshot: every group has been turned
//! into a [`RuntimeConfig`] whose color pools are ready for selection. Each
//! animator receives its own clone, so pool state is never shared between
//! devices.

use std::{collections::BTreeMap, time::Duration};

use chrono::NaiveDateTime;
use parse_display::{Display, FromStr};
use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use crate::{api::PayloadFormat, color::Color, overlay::Overlay, pool::ColorPool};

/// How overlays are combined with the ambient pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Start from an ambient color and successively blend each overlay's
    /// pick in, using the overlay weight as interpolation factor
    #[default]
    Blend,
    /// Walk the overlays in order and take the first one whose weight beats
    /// a uniform random draw, falling back to the ambient pool
    Override,
}

/// Inclusive range of wall-clock durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Shortest duration
    #[serde(with = "crate::serde::duration")]
    pub min: Duration,
    /// Longest duration
    #[serde(with = "crate::serde::duration")]
    pub max: Duration,
}

impl DurationRange {
    /// Create a range from its bounds
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Range that always yields `duration`
    pub fn fixed(duration: Duration) -> Self {
        Self::new(duration, duration)
    }

    /// `true` if `min <= max`
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Draw a uniform duration from the range
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min >= self.max {
            return self.min;
        }

        let span = (self.max - self.min).as_secs_f64();
        self.min + Duration::from_secs_f64(span * rng.random::<f64>())
    }
}

/// Source of the local wall-clock time used to evaluate overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Process-local time zone, which honors `TZ`
    #[default]
    Local,
    /// Fixed IANA time zone
    Zone(chrono_tz::Tz),
}

impl Clock {
    /// Current wall-clock time in this clock's zone
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::Local => chrono::Local::now().naive_local(),
            Clock::Zone(tz) => chrono::Utc::now().with_timezone(tz).naive_local(),
        }
    }
}

/// Everything an animator needs to drive one device
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Baseline colors, used whenever no overlay applies
    pub ambient: ColorPool,
    /// Overlays, in configuration order
    pub overlays: Vec<Overlay>,
    /// Duration of a transition towards a new color
    pub transition: DurationRange,
    /// Time spent on a color once it has been reached
    pub hold: DurationRange,
    /// Interval between two frames of a transition
    pub timestep: Duration,
    /// How overlays are combined with the ambient pool
    pub strategy: SelectionStrategy,
    /// Clock used to evaluate overlays
    pub clock: Clock,
}

impl RuntimeConfig {
    /// Runtime configuration with default timings and no overlays
    pub fn new(ambient: ColorPool) -> Self {
        Self {
            ambient,
            overlays: Vec::new(),
            transition: DurationRange::fixed(Duration::from_secs(5)),
            hold: DurationRange::fixed(Duration::from_secs(5)),
            timestep: Duration::from_secs(1),
            strategy: SelectionStrategy::default(),
            clock: Clock::default(),
        }
    }

    /// Pick the next target color for the instant `now`
    pub fn select_color<R: Rng + ?Sized>(&mut self, now: &NaiveDateTime, rng: &mut R) -> Color {
        match self.strategy {
            SelectionStrategy::Blend => {
                let mut color = self.ambient.select(rng);

                for overlay in &mut self.overlays {
                    let weight = overlay.mix(now);
                    if weight > 0.0 {
                        color = color.lerp(&overlay.select(rng), weight);
                    }
                }

                color
            }
            SelectionStrategy::Override => {
                // Draws are in [0, 1): a weight of 1 always wins, 0 never does
                for overlay in &mut self.overlays {
                    if rng.random::<f64>() < overlay.mix(now) {
                        return overlay.select(rng);
                    }
                }

                self.ambient.select(rng)
            }
        }
    }

    /// Pick the next target color for the current time
    pub fn select_color_now<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Color {
        let now = self.clock.now();
        self.select_color(&now, rng)
    }

    /// Draw the duration of the next transition
    pub fn transition<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.transition.draw(rng)
    }

    /// Draw the duration of the next hold
    pub fn hold<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.hold.draw(rng)
    }
}

/// Compiled form of a configured group
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGroup {
    /// Devices belonging to several groups follow the highest priority one
    pub priority: i32,
    /// Template cloned into every animator of the group
    pub runtime: RuntimeConfig,
}

/// Immutable configuration snapshot handed to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConfig {
    /// Groups by name
    pub groups: BTreeMap<String, CompiledGroup>,
    /// Prefix of every command channel
    pub base_topic: String,
    /// Color representation sent to devices
    pub payload: PayloadFormat,
}

impl CompiledConfig {
    /// Priority of `group`, if it is configured
    pub fn priority(&self, group: &str) -> Option<i32> {
        self.groups.get(group).map(|group| group.priority)
    }

    /// Channel on which commands for `device` are published
    pub fn channel(&self, device: &str) -> String {
        format!("{}/{}/set", self.base_topic, device)
    }
}
