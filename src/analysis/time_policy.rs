use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

const MORNING_PEAK: Range<u32> = 7..10;
const EVENING_PEAK: Range<u32> = 16..19;
const NIGHT: Range<u32> = 0..5;
const WEEKEND_DAYTIME: Range<u32> = 10..18;

const RUSH_MULTIPLIER: f64 = 1.3;
const NIGHT_MULTIPLIER: f64 = 0.4;
const WEEKEND_DAY_MULTIPLIER: f64 = 1.2;
const WEEKEND_OTHER_MULTIPLIER: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRegime {
    MorningPeak,
    EveningPeak,
    OffPeak,
    Night,
    WeekendDay,
    WeekendOther,
}

impl TimeRegime {
    /// Selects the allocator's peak-hour branch.
    pub fn is_peak(self) -> bool {
        matches!(self, TimeRegime::MorningPeak | TimeRegime::EveningPeak)
    }
}

impl fmt::Display for TimeRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeRegime::MorningPeak => "morning_peak",
            TimeRegime::EveningPeak => "evening_peak",
            TimeRegime::OffPeak => "off_peak",
            TimeRegime::Night => "night",
            TimeRegime::WeekendDay => "weekend_day",
            TimeRegime::WeekendOther => "weekend_other",
        };
        f.write_str(name)
    }
}

/// Local wall-clock reading the policy is evaluated against.
/// `weekday` counts from Monday = 0, so 5 and 6 are the weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeContext {
    hour: u32,
    minute: u32,
    weekday: u32,
}

impl TimeContext {
    pub fn new(hour: u32, minute: u32, weekday: u32) -> Self {
        Self {
            hour: hour.min(23),
            minute: minute.min(59),
            weekday: weekday.min(6),
        }
    }

    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self::new(
            at.hour(),
            at.minute(),
            at.weekday().num_days_from_monday(),
        )
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn weekday(&self) -> u32 {
        self.weekday
    }

    pub fn is_weekend(&self) -> bool {
        self.weekday >= 5
    }

    /// Rush windows are hour-based and apply on any day.
    pub fn is_rush_hour(&self) -> bool {
        MORNING_PEAK.contains(&self.hour) || EVENING_PEAK.contains(&self.hour)
    }

    pub fn is_night(&self) -> bool {
        NIGHT.contains(&self.hour)
    }

    pub fn is_weekend_daytime(&self) -> bool {
        self.is_weekend() && WEEKEND_DAYTIME.contains(&self.hour)
    }

    /// Peak-hour status, on any day. Always agrees with `regime().is_peak()`.
    pub fn is_peak(&self) -> bool {
        self.is_rush_hour()
    }

    /// Peak windows win over the weekend buckets; the weekend factor is
    /// still applied separately by `count_multipliers`.
    pub fn regime(&self) -> TimeRegime {
        if MORNING_PEAK.contains(&self.hour) {
            TimeRegime::MorningPeak
        } else if EVENING_PEAK.contains(&self.hour) {
            TimeRegime::EveningPeak
        } else if self.is_weekend() {
            if WEEKEND_DAYTIME.contains(&self.hour) {
                TimeRegime::WeekendDay
            } else {
                TimeRegime::WeekendOther
            }
        } else if self.is_night() {
            TimeRegime::Night
        } else {
            TimeRegime::OffPeak
        }
    }

    /// Multipliers applied to a fused count, in order. Rush and night are
    /// exclusive; the weekend factor composes on top of either.
    pub fn count_multipliers(&self) -> Vec<f64> {
        let mut multipliers = Vec::with_capacity(2);

        if self.is_rush_hour() {
            multipliers.push(RUSH_MULTIPLIER);
        } else if self.is_night() {
            multipliers.push(NIGHT_MULTIPLIER);
        }

        if self.is_weekend() {
            multipliers.push(if self.is_weekend_daytime() {
                WEEKEND_DAY_MULTIPLIER
            } else {
                WEEKEND_OTHER_MULTIPLIER
            });
        }

        multipliers
    }

    /// Each multiplier truncates toward zero before the next one applies.
    pub fn adjust_count(&self, count: u32) -> u32 {
        self.count_multipliers()
            .into_iter()
            .fold(count, |acc, m| (acc as f64 * m) as u32)
    }
}
