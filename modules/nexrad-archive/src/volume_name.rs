use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::links::file_name_of;

/// A Level II volume file name: `SSSSYYYYMMDD_HHMMSS_Vnn[...]`,
/// e.g. `KMKX20170206_072023_V06` or `KABR20110101_000123_V03.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeName {
    file_name: String,
    site: String,
    timestamp: NaiveDateTime,
}

impl VolumeName {
    /// Parse a bare file name. `None` if it isn't a volume name.
    pub fn parse(file_name: &str) -> Option<Self> {
        let bytes = file_name.as_bytes();
        if bytes.len() < 19 || bytes[12] != b'_' {
            return None;
        }

        let site = file_name.get(0..4)?;
        if !site.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }

        let date = NaiveDate::parse_from_str(file_name.get(4..12)?, "%Y%m%d").ok()?;
        let time = file_name.get(13..19)?;
        if !time.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let time = NaiveTime::parse_from_str(time, "%H%M%S").ok()?;

        Some(Self {
            file_name: file_name.to_string(),
            site: site.to_string(),
            timestamp: date.and_time(time),
        })
    }

    /// Parse the last path segment of a download link.
    pub fn from_link(link: &str) -> Option<Self> {
        file_name_of(link).and_then(Self::parse)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// Model-data metadata files sit next to the volumes and aren't scans.
    pub fn is_mdm(&self) -> bool {
        self.file_name.ends_with("MDM")
    }
}

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}
