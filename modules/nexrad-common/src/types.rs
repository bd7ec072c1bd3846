use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};

use crate::error::{CommonError, Result};

// ---------------------------------------------------------------------------
// Radar site
// ---------------------------------------------------------------------------

/// Four-character WSR-88D identifier, e.g. `KMKX`. Always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(String);

impl SiteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SiteId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().to_ascii_uppercase();
        if id.len() != 4 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CommonError::InvalidSite(s.to_string()));
        }
        Ok(SiteId(id))
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Scan dates
// ---------------------------------------------------------------------------

/// A UTC calendar day of radar data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanDate(NaiveDate);

impl ScanDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| CommonError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// `days` consecutive dates beginning at `start`.
    pub fn range(start: ScanDate, days: u32) -> impl Iterator<Item = ScanDate> {
        (0..days as u64).filter_map(move |n| start.0.checked_add_days(Days::new(n)).map(ScanDate))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// `YYYYMMDD`, the form used in volume file names.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl FromStr for ScanDate {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
            .map(ScanDate)
            .map_err(|_| CommonError::InvalidDate(s.to_string()))
    }
}

impl fmt::Display for ScanDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.month(), self.day(), self.year())
    }
}

// ---------------------------------------------------------------------------
// Time window
// ---------------------------------------------------------------------------

/// Half-open time-of-day window `[start, end)`. An end of `None` is the
/// end of the day, so the window reaches 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: Option<NaiveTime>,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: Option<NaiveTime>) -> Result<Self> {
        if let Some(end) = end {
            if start >= end {
                return Err(CommonError::EmptyWindow { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Build a window from two `HHMM` strings, seconds pinned to `00`. The
    /// end may be `2400`.
    pub fn parse_hhmm(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_hhmm(start)?, parse_window_end(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// `None` when the window runs to midnight.
    pub fn end(&self) -> Option<NaiveTime> {
        self.end
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && self.end.map_or(true, |end| t < end)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(7, 20, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(7, 22, 0),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start.format("%H%M%S"), end.format("%H%M%S")),
            None => write!(f, "[{}, 240000)", self.start.format("%H%M%S")),
        }
    }
}

/// Parse `HHMM` (or `HMM`) into a time of day.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    if s.is_empty() || s.len() > 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(CommonError::InvalidTime(s.to_string()));
    }
    let n: u32 = s.parse().map_err(|_| CommonError::InvalidTime(s.to_string()))?;
    NaiveTime::from_hms_opt(n / 100, n % 100, 0).ok_or_else(|| CommonError::InvalidTime(s.to_string()))
}

/// Like [`parse_hhmm`], but `2400` is accepted and means end of day (`None`).
pub fn parse_window_end(s: &str) -> Result<Option<NaiveTime>> {
    if s.trim() == "2400" {
        return Ok(None);
    }
    parse_hhmm(s).map(Some)
}
