//! Clock formatting and the persisted hour-format preference.

use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::store::{SharedStore, StoreError, TIME_FORMAT_KEY};

/// 12-hour vs 24-hour display preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl FromStr for TimeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12h" => Ok(Self::TwelveHour),
            "24h" => Ok(Self::TwentyFourHour),
            other => Err(format!("unknown time format '{other}', expected 12h or 24h")),
        }
    }
}

impl TimeFormat {
    /// Load the persisted preference, defaulting to 12-hour.
    pub fn load(store: &SharedStore) -> Self {
        store
            .lock()
            .get(TIME_FORMAT_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    /// Persist the preference.
    ///
    /// # Errors
    /// Fails when the backing store cannot be written.
    pub fn save(self, store: &SharedStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self)?;
        store.lock().set(TIME_FORMAT_KEY, &json)
    }
}

/// Zero-padded display components of a wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    /// "AM"/"PM" in 12-hour mode, absent in 24-hour mode.
    pub period: Option<String>,
}

impl TimeParts {
    /// Split a time into display components according to the format.
    pub fn of(time: NaiveTime, format: TimeFormat) -> Self {
        let (hours, period) = match format {
            TimeFormat::TwentyFourHour => (time.hour(), None),
            TimeFormat::TwelveHour => {
                let (pm, hour12) = time.hour12();
                (hour12, Some(if pm { "PM" } else { "AM" }.to_string()))
            }
        };

        Self {
            hours: format!("{hours:02}"),
            minutes: format!("{:02}", time.minute()),
            seconds: format!("{:02}", time.second()),
            period,
        }
    }
}

impl std::fmt::Display for TimeParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.hours, self.minutes, self.seconds)?;
        if let Some(period) = &self.period {
            write!(f, " {period}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::store::{shared, MemoryStore};

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_24h_parts() {
        let parts = TimeParts::of(t(9, 5, 3), TimeFormat::TwentyFourHour);
        assert_eq!(parts.hours, "09");
        assert_eq!(parts.minutes, "05");
        assert_eq!(parts.seconds, "03");
        assert!(parts.period.is_none());
    }

    #[test]
    fn test_12h_afternoon() {
        let parts = TimeParts::of(t(15, 30, 0), TimeFormat::TwelveHour);
        assert_eq!(parts.hours, "03");
        assert_eq!(parts.period.as_deref(), Some("PM"));
    }

    #[test]
    fn test_12h_midnight_and_noon() {
        let midnight = TimeParts::of(t(0, 0, 0), TimeFormat::TwelveHour);
        assert_eq!(midnight.hours, "12");
        assert_eq!(midnight.period.as_deref(), Some("AM"));

        let noon = TimeParts::of(t(12, 0, 0), TimeFormat::TwelveHour);
        assert_eq!(noon.hours, "12");
        assert_eq!(noon.period.as_deref(), Some("PM"));
    }

    #[test]
    fn test_display() {
        let parts = TimeParts::of(t(23, 59, 59), TimeFormat::TwentyFourHour);
        assert_eq!(parts.to_string(), "23:59:59");

        let parts = TimeParts::of(t(23, 59, 59), TimeFormat::TwelveHour);
        assert_eq!(parts.to_string(), "11:59:59 PM");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("12h".parse::<TimeFormat>().unwrap(), TimeFormat::TwelveHour);
        assert_eq!("24h".parse::<TimeFormat>().unwrap(), TimeFormat::TwentyFourHour);
        assert!("25h".parse::<TimeFormat>().is_err());
    }

    #[test]
    fn test_preference_persistence() {
        let store = shared(MemoryStore::new());
        assert_eq!(TimeFormat::load(&store), TimeFormat::TwelveHour);

        TimeFormat::TwentyFourHour.save(&store).unwrap();
        assert_eq!(TimeFormat::load(&store), TimeFormat::TwentyFourHour);
    }
}
