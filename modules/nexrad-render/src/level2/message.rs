use super::view::ByteView;
use crate::error::Result;
use crate::volume::{Moment, Radial};

/// Coded elevation angles in message 5 are binary angles: 180° / 2^15 per bit.
const VCP_ANGLE_SCALE: f32 = 180.0 / 32768.0;
const VCP_HEADER_LEN: usize = 22;
const VCP_CUT_LEN: usize = 46;

/// Message 31 block pointers start after the fixed radial header.
const RADIAL_POINTERS_AT: usize = 32;
/// Generic data moment header length; gate data follows.
const MOMENT_HEADER_LEN: usize = 28;

/// Raw gate codes with no measurement behind them.
const BELOW_THRESHOLD: u16 = 0;
const RANGE_FOLDED: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MessageHeader {
    /// Message length in halfwords, this header included.
    pub size_halfwords: u16,
    pub message_type: u8,
}

impl MessageHeader {
    pub(crate) fn parse(buf: &[u8]) -> Result<Self> {
        let view = ByteView::new(buf, "message header");
        Ok(Self {
            size_halfwords: view.u16_at(0)?,
            message_type: view.u8_at(3)?,
        })
    }
}

/// Elevation angle of each cut in the volume coverage pattern.
pub(crate) fn parse_vcp(body: &[u8]) -> Result<Vec<f32>> {
    let view = ByteView::new(body, "VCP message");
    let cuts = view.u16_at(6)? as usize;

    (0..cuts)
        .map(|i| {
            let coded = view.u16_at(VCP_HEADER_LEN + i * VCP_CUT_LEN)?;
            Ok(coded as f32 * VCP_ANGLE_SCALE)
        })
        .collect()
}

/// One message 31 radial with its `VEL` moment, if the cut carries one.
pub(crate) fn parse_radial(body: &[u8]) -> Result<Radial> {
    let view = ByteView::new(body, "digital radar data");

    let azimuth = view.f32_at(12)?;
    let elevation_number = view.u8_at(22)?;
    let elevation = view.f32_at(24)?;
    let block_count = view.u16_at(30)? as usize;

    let mut velocity = None;
    for i in 0..block_count {
        let ptr = view.u32_at(RADIAL_POINTERS_AT + i * 4)? as usize;
        if ptr == 0 || ptr + 4 > view.len() {
            continue;
        }
        if view.slice(ptr, 4)? == b"DVEL" {
            velocity = Some(parse_moment(&body[ptr..])?);
            break;
        }
    }

    Ok(Radial {
        azimuth,
        elevation,
        elevation_number,
        velocity,
    })
}

fn parse_moment(block: &[u8]) -> Result<Moment> {
    let view = ByteView::new(block, "data moment");

    let gate_count = view.u16_at(8)? as usize;
    let first_gate_m = view.i16_at(10)? as f32;
    let gate_spacing_m = view.u16_at(12)? as f32;
    let word_size = view.u8_at(19)?;
    let scale = view.f32_at(20)?;
    let offset = view.f32_at(24)?;

    let decode = |raw: u16| -> Option<f32> {
        if raw == BELOW_THRESHOLD || raw == RANGE_FOLDED || scale == 0.0 {
            None
        } else {
            Some((raw as f32 - offset) / scale)
        }
    };

    let gates = match word_size {
        16 => view
            .slice(MOMENT_HEADER_LEN, gate_count * 2)?
            .chunks_exact(2)
            .map(|w| decode(u16::from_be_bytes([w[0], w[1]])))
            .collect(),
        _ => view
            .slice(MOMENT_HEADER_LEN, gate_count)?
            .iter()
            .map(|&b| decode(b as u16))
            .collect(),
    };

    Ok(Moment {
        first_gate_m,
        gate_spacing_m,
        gates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moment_block(word_size: u8, scale: f32, offset: f32, data: &[u8], gates: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"DVEL");
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&gates.to_be_bytes());
        b.extend_from_slice(&2125i16.to_be_bytes());
        b.extend_from_slice(&250u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0i16.to_be_bytes());
        b.push(0);
        b.push(word_size);
        b.extend_from_slice(&scale.to_be_bytes());
        b.extend_from_slice(&offset.to_be_bytes());
        b.extend_from_slice(data);
        b
    }

    #[test]
    fn eight_bit_moment_masks_flags() {
        let block = moment_block(8, 2.0, 129.0, &[0, 1, 129, 169, 89], 5);
        let m = parse_moment(&block).unwrap();
        assert_eq!(m.first_gate_m, 2125.0);
        assert_eq!(m.gate_spacing_m, 250.0);
        assert_eq!(m.gates, vec![None, None, Some(0.0), Some(20.0), Some(-20.0)]);
    }

    #[test]
    fn sixteen_bit_moment() {
        let data: Vec<u8> = [0u16, 1, 1000, 1100].iter().flat_map(|v| v.to_be_bytes()).collect();
        let block = moment_block(16, 10.0, 1000.0, &data, 4);
        let m = parse_moment(&block).unwrap();
        assert_eq!(m.gates, vec![None, None, Some(0.0), Some(10.0)]);
    }

    #[test]
    fn short_moment_is_truncated() {
        let block = moment_block(8, 2.0, 129.0, &[130, 131], 10);
        assert!(parse_moment(&block).is_err());
    }

    #[test]
    fn vcp_angles_decode() {
        let mut body = vec![0u8; VCP_HEADER_LEN + 2 * VCP_CUT_LEN];
        body[6..8].copy_from_slice(&2u16.to_be_bytes());
        // 0.5° and 1.5° as coded binary angles.
        body[22..24].copy_from_slice(&91u16.to_be_bytes());
        body[68..70].copy_from_slice(&273u16.to_be_bytes());
        let angles = parse_vcp(&body).unwrap();
        assert_eq!(angles.len(), 2);
        assert!((angles[0] - 0.4999).abs() < 0.01);
        assert!((angles[1] - 1.4996).abs() < 0.01);
    }

    #[test]
    fn header_reads_type_and_size() {
        let mut buf = [0u8; 16];
        buf[0..2].copy_from_slice(&1208u16.to_be_bytes());
        buf[3] = 31;
        let h = MessageHeader::parse(&buf).unwrap();
        assert_eq!(h.size_halfwords, 1208);
        assert_eq!(h.message_type, 31);
    }
}
