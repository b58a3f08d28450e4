use std::collections::BTreeMap;

use validator::Validate;

use super::{Config, ConfigError, Fader, GroupConfig, OverlayConfig};
use crate::{
    color::Color,
    overlay::{DailyWindow, MarkerParseError, MonthDay, Overlay, SeasonalWindow, TimeOfDay},
    pool::ColorPool,
    runtime::{Clock, CompiledConfig, CompiledGroup, DurationRange, RuntimeConfig},
};

fn check_range(field: impl Into<String>, range: &DurationRange) -> Result<(), ConfigError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::Range {
            field: field.into(),
            min: range.min,
            max: range.max,
        })
    }
}

fn compile_pool(group: &str, colors: &[String]) -> Result<ColorPool, ConfigError> {
    let colors = colors
        .iter()
        .map(|literal| literal.parse::<Color>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::Color {
            group: group.to_owned(),
            source,
        })?;

    ColorPool::new(colors).map_err(|source| ConfigError::EmptyPool {
        group: group.to_owned(),
        source,
    })
}

fn parse_fader<T>(fader: &Fader) -> Result<(T, T), MarkerParseError>
where
    T: std::str::FromStr<Err = MarkerParseError>,
{
    Ok((fader.start.parse()?, fader.end.parse()?))
}

fn compile_overlay(group: &str, overlay: &OverlayConfig) -> Result<Overlay, ConfigError> {
    let marker = |source| ConfigError::Marker {
        group: group.to_owned(),
        source,
    };

    let daily = overlay
        .time
        .as_ref()
        .map(|time| -> Result<_, MarkerParseError> {
            Ok(DailyWindow::new(
                parse_fader::<TimeOfDay>(&time.fade_in)?,
                parse_fader::<TimeOfDay>(&time.fade_out)?,
            ))
        })
        .transpose()
        .map_err(marker)?;

    let seasonal = overlay
        .date
        .as_ref()
        .map(|date| -> Result<_, MarkerParseError> {
            Ok(SeasonalWindow::new(
                parse_fader::<MonthDay>(&date.fade_in)?,
                parse_fader::<MonthDay>(&date.fade_out)?,
            ))
        })
        .transpose()
        .map_err(marker)?;

    Ok(Overlay::new(
        compile_pool(group, &overlay.colors)?,
        daily,
        seasonal,
    ))
}

impl Config {
    /// Validate the configuration and build its executable form
    ///
    /// Every color literal, clock time, date and duration range is checked
    /// here, so a configuration that compiles cannot fail at runtime.
    pub fn compile(&self) -> Result<CompiledConfig, ConfigError> {
        self.validate()?;

        if self.timestep.is_zero() {
            return Err(ConfigError::Timestep);
        }

        check_range("transition", &self.transition)?;
        check_range("hold", &self.hold)?;

        let clock = self.timezone.map_or(Clock::Local, Clock::Zone);

        let groups = self
            .groups
            .iter()
            .map(|(name, group)| Ok((name.clone(), self.compile_group(name, group, clock)?)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        Ok(CompiledConfig {
            groups,
            base_topic: self.base_topic.clone(),
            payload: self.payload,
        })
    }

    fn compile_group(
        &self,
        name: &str,
        group: &GroupConfig,
        clock: Clock,
    ) -> Result<CompiledGroup, ConfigError> {
        group.validate()?;

        let transition = group.transition.unwrap_or(self.transition);
        let hold = group.hold.unwrap_or(self.hold);
        check_range(format!("{}.transition", name), &transition)?;
        check_range(format!("{}.hold", name), &hold)?;

        let mut runtime = RuntimeConfig::new(compile_pool(name, &group.colors)?);
        runtime.overlays = group
            .overlays
            .iter()
            .map(|overlay| compile_overlay(name, overlay))
            .collect::<Result<_, _>>()?;
        runtime.transition = transition;
        runtime.hold = hold;
        runtime.timestep = self.timestep;
        runtime.strategy = self.selection;
        runtime.clock = clock;

        Ok(CompiledGroup {
            priority: group.priority,
            runtime,
        })
    }
}
