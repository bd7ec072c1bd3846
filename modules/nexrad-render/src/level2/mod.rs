//! Archive II (Level II) volume decoding.
//!
//! A volume file is a 24-byte header followed by LDM records. Each record is
//! a big-endian `i32` length and a bzip2 stream; decompressed, a record is a
//! run of messages, each behind a 12-byte CTM prefix and a 16-byte message
//! header. Only the messages needed for velocity images are decoded: type 5
//! (VCP elevation angles) and type 31 (digital radar data).

mod view;
mod message;
#[cfg(any(test, feature = "test-support"))]
pub mod synth;

use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::error::{RenderError, Result};
use crate::volume::{Radial, Volume};
use view::ByteView;

pub const VOLUME_HEADER_LEN: usize = 24;
pub(crate) const CTM_LEN: usize = 12;
pub(crate) const MESSAGE_HEADER_LEN: usize = 16;
/// Fixed slot size of every message other than type 31.
pub(crate) const RECORD_LEN: usize = 2432;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHeader {
    /// e.g. `AR2V0006`
    pub version: String,
    pub extension: String,
    pub timestamp: Option<NaiveDateTime>,
    pub icao: String,
}

impl VolumeHeader {
    fn parse(data: &[u8]) -> Result<Self> {
        let view = ByteView::new(data, "volume header");
        let tape = view.slice(0, 9)?;
        if !tape.starts_with(b"AR2V") {
            return Err(RenderError::NotLevel2(format!(
                "bad magic {:?}",
                String::from_utf8_lossy(&tape[..4])
            )));
        }

        let days = view.u32_at(12)?;
        let millis = view.u32_at(16)?;

        Ok(Self {
            version: String::from_utf8_lossy(&tape[..8]).into_owned(),
            extension: String::from_utf8_lossy(view.slice(9, 3)?).into_owned(),
            timestamp: julian_timestamp(days, millis),
            icao: String::from_utf8_lossy(view.slice(20, 4)?).trim().to_string(),
        })
    }
}

/// NEXRAD dates count days from 1 = 1970-01-01.
pub(crate) fn julian_timestamp(days: u32, millis: u32) -> Option<NaiveDateTime> {
    if days == 0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1969, 12, 31)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(TimeDelta::days(days as i64) + TimeDelta::milliseconds(millis as i64))
}

/// Read and decode a volume file, gzipped or not.
pub fn read_volume(path: &Path) -> Result<Volume> {
    let data = std::fs::read(path).map_err(RenderError::io(path))?;
    decode_volume(&data)
}

pub fn decode_volume(data: &[u8]) -> Result<Volume> {
    let data = gunzip_if_needed(data)?;
    let header = VolumeHeader::parse(&data)?;
    let body = &data[VOLUME_HEADER_LEN..];

    let mut decoded = Decoded::default();

    if body.get(4..7) == Some(BZIP2_MAGIC) {
        if let Err(e) = decode_records(body, &mut decoded) {
            if decoded.radials.is_empty() {
                return Err(e);
            }
            warn!(icao = %header.icao, error = %e, radials = decoded.radials.len(), "Volume truncated, keeping decoded radials");
        }
    } else {
        decoded.walk_messages(body)?;
    }

    if decoded.radials.is_empty() {
        if decoded.legacy_radials > 0 {
            warn!(icao = %header.icao, radials = decoded.legacy_radials, "Legacy message 1 volume, not supported");
            return Err(RenderError::LegacyFormat);
        }
        return Err(RenderError::Empty);
    }

    debug!(icao = %header.icao, radials = decoded.radials.len(), cuts = decoded.vcp_angles.len(), "Decoded volume");
    Ok(Volume::assemble(header, decoded.vcp_angles, decoded.radials))
}

fn gunzip_if_needed(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(data));
    }
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(RenderError::Decompress)?;
    Ok(Cow::Owned(out))
}

/// Decompress each LDM record in turn and feed its messages to `decoded`.
fn decode_records(body: &[u8], decoded: &mut Decoded) -> Result<()> {
    let view = ByteView::new(body, "LDM record");
    let mut pos = 0;

    while pos + 4 <= body.len() {
        let len = view.i32_at(pos)?.unsigned_abs() as usize;
        pos += 4;
        if len == 0 {
            break;
        }
        let compressed = view.slice(pos, len)?;
        pos += len;

        let mut record = Vec::new();
        bzip2::read::BzDecoder::new(compressed)
            .read_to_end(&mut record)
            .map_err(RenderError::Decompress)?;
        decoded.walk_messages(&record)?;
    }

    Ok(())
}

#[derive(Default)]
struct Decoded {
    vcp_angles: Vec<f32>,
    radials: Vec<Radial>,
    /// Pre-2008 digital radar data (message 1), counted but not decoded.
    legacy_radials: usize,
}

impl Decoded {
    fn walk_messages(&mut self, buf: &[u8]) -> Result<()> {
        let mut pos = 0;

        while pos + CTM_LEN + MESSAGE_HEADER_LEN <= buf.len() {
            let header = message::MessageHeader::parse(&buf[pos + CTM_LEN..])?;
            let body_start = pos + CTM_LEN + MESSAGE_HEADER_LEN;

            let len = match header.message_type {
                31 => CTM_LEN + header.size_halfwords as usize * 2,
                _ => RECORD_LEN,
            };
            let len = len.max(CTM_LEN + MESSAGE_HEADER_LEN);
            let body_end = (pos + len).min(buf.len());
            let body = &buf[body_start..body_end];

            match header.message_type {
                5 if self.vcp_angles.is_empty() => self.vcp_angles = message::parse_vcp(body)?,
                31 => self.radials.push(message::parse_radial(body)?),
                1 => self.legacy_radials += 1,
                _ => {}
            }

            pos += len;
        }

        Ok(())
    }
}
