//! Relative time-window expressions ("7d", "3M", "1y") and their resolution
//! to absolute epoch cutoffs.

use crate::error::{Error, Result};

const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowUnit {
    Hours,
    Days,
    Weeks,
    /// 30-day months.
    Months,
    /// 365-day years.
    Years,
}

impl WindowUnit {
    fn seconds(&self) -> i64 {
        match self {
            WindowUnit::Hours => HOUR_SECS,
            WindowUnit::Days => DAY_SECS,
            WindowUnit::Weeks => 7 * DAY_SECS,
            WindowUnit::Months => 30 * DAY_SECS,
            WindowUnit::Years => 365 * DAY_SECS,
        }
    }
}

/// A parsed window expression. Sign of the magnitude is ignored; an
/// unrecognized (non-digit) unit char falls back to hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub length: u32,
    pub unit: WindowUnit,
}

impl Window {
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        let unit_char = expr
            .chars()
            .last()
            .ok_or_else(|| Error::InvalidWindowFormat(expr.to_string()))?;
        if unit_char.is_ascii_digit() {
            // Bare number: no unit suffix at all.
            return Err(Error::InvalidWindowFormat(expr.to_string()));
        }
        let magnitude = &expr[..expr.len() - unit_char.len_utf8()];
        let length: i64 = magnitude
            .parse()
            .map_err(|_| Error::InvalidWindowFormat(expr.to_string()))?;
        let unit = match unit_char {
            'h' => WindowUnit::Hours,
            'd' => WindowUnit::Days,
            'w' => WindowUnit::Weeks,
            'M' => WindowUnit::Months,
            'y' => WindowUnit::Years,
            _ => WindowUnit::Hours,
        };
        Ok(Window { length: length.unsigned_abs() as u32, unit })
    }

    /// Cutoff instant for this window given `now`, in epoch seconds.
    pub fn epoch_at(&self, now: i64) -> i64 {
        now - self.length as i64 * self.unit.seconds()
    }

    /// Cutoff instant against the wall clock.
    pub fn epoch(&self) -> i64 {
        self.epoch_at(now_ts())
    }
}

pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
