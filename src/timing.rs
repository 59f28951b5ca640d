use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};

/// A signed duration with millisecond precision.
///
/// Stored as whole milliseconds so comparisons against a goal time are
/// exact; formatted and parsed as `[-][H:]MM:SS[.fff]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan {
    millis: i64,
}

impl TimeSpan {
    pub const ZERO: TimeSpan = TimeSpan { millis: 0 };

    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            millis: (seconds * 1000.0).round() as i64,
        }
    }

    pub fn from_hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            millis: ((hours * 60 + minutes) * 60 + seconds) * 1000,
        }
    }

    pub fn total_milliseconds(&self) -> i64 {
        self.millis
    }

    pub fn total_seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub fn is_negative(&self) -> bool {
        self.millis < 0
    }

    /// Parse `[-][H:]MM:SS[.fff]` or a bare seconds value.
    /// Returns None for empty or malformed input.
    pub fn parse(text: &str) -> Option<TimeSpan> {
        let text = text.trim();
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if text.is_empty() {
            return None;
        }

        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() > 3 {
            return None;
        }
        let (&seconds_part, unit_parts) = parts.split_last()?;

        // Hours/minutes fields, weighted base-60.
        let mut units: i64 = 0;
        for part in unit_parts {
            let value: i64 = part.parse().ok()?;
            if value < 0 {
                return None;
            }
            units = units * 60 + value;
        }

        let seconds: f64 = seconds_part.parse().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }

        let millis = units * 60_000 + (seconds * 1000.0).round() as i64;
        Some(TimeSpan {
            millis: if negative { -millis } else { millis },
        })
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.millis.unsigned_abs();
        let frac = millis % 1000;
        let total_secs = millis / 1000;
        let secs = total_secs % 60;
        let mins = (total_secs / 60) % 60;
        let hours = total_secs / 3600;

        if self.millis < 0 {
            write!(f, "-")?;
        }
        if hours > 0 {
            write!(f, "{}:{:02}:{:02}", hours, mins, secs)?;
        } else {
            write!(f, "{}:{:02}", mins, secs)?;
        }
        if frac > 0 {
            write!(f, ".{:03}", frac)?;
        }
        Ok(())
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;
    fn add(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan {
            millis: self.millis + rhs.millis,
        }
    }
}

impl Sub for TimeSpan {
    type Output = TimeSpan;
    fn sub(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan {
            millis: self.millis - rhs.millis,
        }
    }
}

impl Serialize for TimeSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TimeSpan::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid time span: {:?}", text)))
    }
}

/// Which clock is authoritative when reading an attempt's time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, Default,
)]
pub enum TimingMethod {
    #[default]
    #[strum(serialize = "Real Time")]
    RealTime,
    #[strum(serialize = "Game Time")]
    GameTime,
}

impl TimingMethod {
    pub fn toggled(self) -> TimingMethod {
        match self {
            TimingMethod::RealTime => TimingMethod::GameTime,
            TimingMethod::GameTime => TimingMethod::RealTime,
        }
    }
}

/// An attempt's recorded times, one slot per timing method.
/// A `None` slot means no time was recorded for that clock.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Time {
    pub real_time: Option<TimeSpan>,
    pub game_time: Option<TimeSpan>,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_real_time(mut self, span: TimeSpan) -> Self {
        self.real_time = Some(span);
        self
    }

    pub fn with_game_time(mut self, span: TimeSpan) -> Self {
        self.game_time = Some(span);
        self
    }

    pub fn get(&self, method: TimingMethod) -> Option<TimeSpan> {
        match method {
            TimingMethod::RealTime => self.real_time,
            TimingMethod::GameTime => self.game_time,
        }
    }
}
