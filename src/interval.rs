//! Candle interval codes such as `1m`, `4h`, `1d`, `2w`.

use crate::error::RoboError;
use std::fmt;
use std::str::FromStr;

/// Unit suffix of an interval code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
    Week,
}

impl IntervalUnit {
    pub const fn seconds(&self) -> u64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 60 * 60,
            Self::Day => 60 * 60 * 24,
            Self::Week => 7 * 60 * 60 * 24,
        }
    }

    pub const fn code(&self) -> char {
        match self {
            Self::Minute => 'm',
            Self::Hour => 'h',
            Self::Day => 'd',
            Self::Week => 'w',
        }
    }

    fn from_code(code: char) -> Option<Self> {
        match code {
            'm' => Some(Self::Minute),
            'h' => Some(Self::Hour),
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            _ => None,
        }
    }
}

/// A fixed candle width, `<magnitude><unit>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    magnitude: u32,
    unit: IntervalUnit,
}

impl Interval {
    pub fn new(magnitude: u32, unit: IntervalUnit) -> Result<Self, RoboError> {
        if magnitude == 0 {
            return Err(RoboError::config("interval magnitude must be positive"));
        }
        Ok(Self { magnitude, unit })
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// Width of one candle in milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.magnitude as i64 * self.unit.seconds() as i64 * 1000
    }
}

impl FromStr for Interval {
    type Err = RoboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let code = s
            .chars()
            .last()
            .ok_or_else(|| RoboError::config("empty interval"))?;
        let unit = IntervalUnit::from_code(code)
            .ok_or_else(|| RoboError::config(format!("unknown interval unit in '{}'", s)))?;

        let digits = &s[..s.len() - code.len_utf8()];
        let magnitude: u32 = digits
            .parse()
            .map_err(|_| RoboError::config(format!("invalid interval magnitude in '{}'", s)))?;

        Self::new(magnitude, unit)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.code())
    }
}

/// Parse an interval code and return its width in milliseconds.
pub fn interval_to_ms(interval: &str) -> Result<i64, RoboError> {
    interval.parse::<Interval>().map(|i| i.as_millis())
}
