//! Time-of-day and seasonal overlays
//!
//! An overlay pairs a color pool with up to two fade windows. Each window
//! yields a mix weight from the current clock or calendar position, and the
//! overlay weight is the product of both. A missing window always weighs 1.

use chrono::{Datelike, NaiveDateTime};
use rand::Rng;

use crate::{color::Color, pool::ColorPool};

mod arc;
pub use arc::{Ring, Window};

mod marker;
pub use marker::{year_length, MarkerParseError, MonthDay, TimeOfDay};

/// Fade window over the minutes of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    window: Window,
}

impl DailyWindow {
    /// Create a window from its `(start, end)` fade markers
    pub fn new(fade_in: (TimeOfDay, TimeOfDay), fade_out: (TimeOfDay, TimeOfDay)) -> Self {
        Self {
            window: Window {
                fade_in_start: fade_in.0.minutes(),
                fade_in_end: fade_in.1.minutes(),
                fade_out_start: fade_out.0.minutes(),
                fade_out_end: fade_out.1.minutes(),
            },
        }
    }

    /// Mix weight at the time of day of `now`
    pub fn mix(&self, now: &NaiveDateTime) -> f64 {
        self.window.mix(Ring::DAY, TimeOfDay::of(now).minutes())
    }
}

/// Fade window over the days of a year
///
/// Markers are re-anchored to the year of the evaluated instant, so leap
/// years shift them consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalWindow {
    fade_in: (MonthDay, MonthDay),
    fade_out: (MonthDay, MonthDay),
}

impl SeasonalWindow {
    /// Create a window from its `(start, end)` fade markers
    pub fn new(fade_in: (MonthDay, MonthDay), fade_out: (MonthDay, MonthDay)) -> Self {
        Self { fade_in, fade_out }
    }

    /// Mix weight at the calendar day of `now`
    pub fn mix(&self, now: &NaiveDateTime) -> f64 {
        let year = now.year();

        let window = Window {
            fade_in_start: self.fade_in.0.ordinal0_in(year),
            fade_in_end: self.fade_in.1.ordinal0_in(year),
            fade_out_start: self.fade_out.0.ordinal0_in(year),
            fade_out_end: self.fade_out.1.ordinal0_in(year),
        };

        window.mix(Ring::new(year_length(year)), now.ordinal0())
    }
}

/// Color pool that takes over from the ambient pool during its windows
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pool: ColorPool,
    daily: Option<DailyWindow>,
    seasonal: Option<SeasonalWindow>,
}

impl Overlay {
    /// Overlay without any window applies all the time
    pub fn new(
        pool: ColorPool,
        daily: Option<DailyWindow>,
        seasonal: Option<SeasonalWindow>,
    ) -> Self {
        Self {
            pool,
            daily,
            seasonal,
        }
    }

    /// Colors of this overlay
    pub fn pool(&self) -> &ColorPool {
        &self.pool
    }

    /// Current weight of this overlay, in `[0, 1]`
    pub fn mix(&self, now: &NaiveDateTime) -> f64 {
        let daily = self.daily.as_ref().map_or(1.0, |window| window.mix(now));
        let seasonal = self.seasonal.as_ref().map_or(1.0, |window| window.mix(now));

        daily * seasonal
    }

    /// Draw a color from the overlay pool
    pub fn select<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Color {
        self.pool.select(rng)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn evening() -> DailyWindow {
        DailyWindow::new(
            ("20:00".parse().unwrap(), "22:00".parse().unwrap()),
            ("08:00".parse().unwrap(), "10:00".parse().unwrap()),
        )
    }

    fn winter() -> SeasonalWindow {
        SeasonalWindow::new(
            ("12-01".parse().unwrap(), "12-15".parse().unwrap()),
            ("01-15".parse().unwrap(), "02-01".parse().unwrap()),
        )
    }

    fn pool() -> ColorPool {
        ColorPool::new(vec![Color::new(0.5, 0.1, 40.0)]).unwrap()
    }

    #[test]
    fn daily_mix() {
        let window = evening();

        assert_eq!(window.mix(&at(2025, 6, 1, 21, 0)), 0.5);
        assert_eq!(window.mix(&at(2025, 6, 1, 23, 0)), 1.0);
        assert_eq!(window.mix(&at(2025, 6, 1, 14, 0)), 0.0);
    }

    #[test]
    fn seasonal_mix_over_new_year() {
        let window = winter();

        // Dec 1st is day 334 of 2025, Dec 15th day 348
        assert_eq!(window.mix(&at(2025, 12, 8, 12, 0)), 0.5);
        assert_eq!(window.mix(&at(2025, 12, 25, 12, 0)), 1.0);
        assert_eq!(window.mix(&at(2026, 1, 2, 12, 0)), 1.0);
        assert_eq!(window.mix(&at(2026, 1, 20, 12, 0)), 1.0 - 5.0 / 17.0);
        assert_eq!(window.mix(&at(2026, 7, 4, 12, 0)), 0.0);
    }

    #[test]
    fn seasonal_mix_in_leap_year() {
        let window = SeasonalWindow::new(
            ("02-28".parse().unwrap(), "03-02".parse().unwrap()),
            ("06-01".parse().unwrap(), "06-01".parse().unwrap()),
        );

        // Feb 28th -> Mar 2nd spans three days in 2024, two in 2025
        assert_eq!(window.mix(&at(2024, 2, 29, 0, 0)), 1.0 / 3.0);
        assert_eq!(window.mix(&at(2025, 3, 1, 0, 0)), 0.5);
    }

    #[test]
    fn missing_windows_are_always_active() {
        let overlay = Overlay::new(pool(), None, None);
        assert_eq!(overlay.mix(&at(2025, 7, 4, 14, 0)), 1.0);
    }

    #[test]
    fn windows_multiply() {
        let overlay = Overlay::new(pool(), Some(evening()), Some(winter()));

        assert_eq!(overlay.mix(&at(2025, 12, 8, 21, 0)), 0.25);
        assert_eq!(overlay.mix(&at(2025, 12, 25, 23, 0)), 1.0);
        // Daily window active, season off
        assert_eq!(overlay.mix(&at(2025, 7, 4, 23, 0)), 0.0);
        // Season active, daily window off
        assert_eq!(overlay.mix(&at(2025, 12, 25, 14, 0)), 0.0);
    }
}
