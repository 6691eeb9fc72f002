//! Market-hours gate.
//!
//! A run outside the configured trading window is skipped entirely unless the
//! caller forces it. Open and close are wall-clock times in an IANA zone, so
//! daylight-saving shifts move the UTC window with them.

use crate::config::{ConfigError, ScheduleConfig};
use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
    weekdays_only: bool,
}

impl MarketHours {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime, weekdays_only: bool) -> Self {
        Self {
            tz,
            open,
            close,
            weekdays_only,
        }
    }

    pub fn from_config(schedule: &ScheduleConfig) -> Result<Self, ConfigError> {
        let tz = schedule.parse_timezone()?;
        let (open, close) = schedule.parse_times()?;
        Ok(Self::new(tz, open, close, schedule.weekdays_only))
    }

    /// True when `now` falls in `[open, close)` local time on a trading day.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        if self.weekdays_only && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        self.open <= time && time < self.close
    }

    /// Wall-clock time in the market's zone, used for digest headers.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.tz).naive_local()
    }
}

/// Whether a run may proceed at `now`. No schedule means always open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunGate {
    hours: Option<MarketHours>,
}

impl RunGate {
    pub fn new(hours: Option<MarketHours>) -> Self {
        Self { hours }
    }

    pub fn from_config(schedule: Option<&ScheduleConfig>) -> Result<Self, ConfigError> {
        Ok(Self::new(schedule.map(MarketHours::from_config).transpose()?))
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.hours.map_or(true, |h| h.is_open(now))
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        self.hours
            .map_or_else(|| now.naive_utc(), |h| h.local_time(now))
    }
}
