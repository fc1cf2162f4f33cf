use serde::{Deserialize, Serialize};

/// Absolute in-game date, hour resolution. Month and day are 1-indexed, hour is 0-23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarValue {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl CalendarValue {
    pub fn new(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self { year, month, day, hour }
    }
}

impl Default for CalendarValue {
    fn default() -> Self {
        Self::new(1, 1, 1, 8)
    }
}

/// Relative time shift. A missing component means zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
}

impl TimeDelta {
    pub fn hours(hours: i64) -> Self {
        Self {
            hours: Some(hours),
            ..Self::default()
        }
    }

    /// True when every component is absent or zero.
    pub fn is_empty(&self) -> bool {
        [self.years, self.months, self.days, self.hours, self.minutes]
            .iter()
            .all(|c| c.unwrap_or(0) == 0)
    }
}
