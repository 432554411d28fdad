use std::{fmt, str::FromStr, time::Duration};

use chrono::{NaiveTime, Timelike as _};
use strum::EnumString;
use thiserror::Error;

/// When a task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fixed interval, counted from scheduler start.
    Every(Duration),
    /// Once a day at the given local time.
    DailyAt(NaiveTime),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TriggerParseError {
    #[error("Unknown schedule: '{0}'")]
    Unknown(String),
    #[error("Invalid time of day: '{0}'")]
    InvalidTime(String),
    #[error("Invalid interval: '{0}'")]
    InvalidInterval(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum TimeUnit {
    #[strum(serialize = "second", serialize = "seconds")]
    Second,
    #[strum(serialize = "minute", serialize = "minutes")]
    Minute,
    #[strum(serialize = "hour", serialize = "hours")]
    Hour,
}

impl TimeUnit {
    fn seconds(self) -> u64 {
        match self {
            TimeUnit::Second => 1,
            TimeUnit::Minute => 60,
            TimeUnit::Hour => 60 * 60,
        }
    }
}

impl Trigger {
    /// Six field cron expression (`sec min hour dom mon dow`) for daily
    /// triggers.
    pub fn cron(&self) -> Option<String> {
        match self {
            Trigger::Every(_) => None,
            Trigger::DailyAt(time) => Some(format!(
                "{} {} {} * * *",
                time.second(),
                time.minute(),
                time.hour()
            )),
        }
    }
}

impl FromStr for Trigger {
    type Err = TriggerParseError;

    /// Accepts `every day at 08:30`, `every 10 minutes`, `every hour`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        match tokens.as_slice() {
            ["every", "day", "at", time] => NaiveTime::parse_from_str(time, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
                .map(Trigger::DailyAt)
                .map_err(|_| TriggerParseError::InvalidTime(time.to_string())),
            ["every", count, unit] => {
                let count: u64 = count
                    .parse()
                    .map_err(|_| TriggerParseError::InvalidInterval(s.to_owned()))?;
                let unit: TimeUnit = unit
                    .parse()
                    .map_err(|_| TriggerParseError::Unknown(s.to_owned()))?;
                if count == 0 {
                    return Err(TriggerParseError::InvalidInterval(s.to_owned()));
                }
                let seconds = count
                    .checked_mul(unit.seconds())
                    .ok_or_else(|| TriggerParseError::InvalidInterval(s.to_owned()))?;
                Ok(Trigger::Every(Duration::from_secs(seconds)))
            }
            ["every", unit] => {
                let unit: TimeUnit = unit
                    .parse()
                    .map_err(|_| TriggerParseError::Unknown(s.to_owned()))?;
                Ok(Trigger::Every(Duration::from_secs(unit.seconds())))
            }
            _ => Err(TriggerParseError::Unknown(s.to_owned())),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Every(period) => write!(f, "every {} seconds", period.as_secs()),
            Trigger::DailyAt(time) => write!(f, "every day at {}", time.format("%H:%M:%S")),
        }
    }
}
