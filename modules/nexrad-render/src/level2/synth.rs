//! Synthetic Archive II volumes for tests.

use std::io::Write;

use super::{CTM_LEN, MESSAGE_HEADER_LEN, RECORD_LEN};

const JULIAN_DATE: u16 = 17204; // 2017-02-06
const MILLIS: u32 = (7 * 3600 + 20 * 60 + 23) * 1000;
const VEL_SCALE: f32 = 2.0;
const VEL_OFFSET: f32 = 129.0;

type GateFn = Box<dyn Fn(usize, usize) -> Option<f32>>;

/// What each radial of a synthetic sweep carries.
pub enum RadialSpec {
    ReflectivityOnly,
    /// Velocity per `(radial index, gate index)`; also carries reflectivity.
    Velocity(GateFn),
}

impl RadialSpec {
    pub fn reflectivity_only() -> Self {
        RadialSpec::ReflectivityOnly
    }

    pub fn velocity(f: impl Fn(usize, usize) -> Option<f32> + 'static) -> Self {
        RadialSpec::Velocity(Box::new(f))
    }
}

struct SweepSpec {
    elevation_number: u8,
    elevation: f32,
    radials: usize,
    spec: RadialSpec,
}

pub struct VolumeBuilder {
    icao: [u8; 4],
    vcp: Vec<f32>,
    gates: u16,
    first_gate_m: i16,
    gate_spacing_m: u16,
    sweeps: Vec<SweepSpec>,
}

impl VolumeBuilder {
    pub fn new(icao: &str) -> Self {
        let mut id = [b' '; 4];
        for (dst, src) in id.iter_mut().zip(icao.bytes()) {
            *dst = src;
        }
        Self {
            icao: id,
            vcp: Vec::new(),
            gates: 400,
            first_gate_m: 2125,
            gate_spacing_m: 250,
            sweeps: Vec::new(),
        }
    }

    pub fn vcp(mut self, angles: &[f32]) -> Self {
        self.vcp = angles.to_vec();
        self
    }

    pub fn gates(mut self, count: u16, spacing_m: u16) -> Self {
        self.gates = count;
        self.gate_spacing_m = spacing_m;
        self
    }

    pub fn sweep(mut self, elevation_number: u8, elevation: f32, radials: usize, spec: RadialSpec) -> Self {
        self.sweeps.push(SweepSpec {
            elevation_number,
            elevation,
            radials,
            spec,
        });
        self
    }

    /// Volume header, an optional metadata record holding message 5, then
    /// one bzip2 record per sweep.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"AR2V0006.001");
        out.extend_from_slice(&(JULIAN_DATE as u32).to_be_bytes());
        out.extend_from_slice(&MILLIS.to_be_bytes());
        out.extend_from_slice(&self.icao);

        if !self.vcp.is_empty() {
            push_record(&mut out, &self.vcp_message());
        }
        for sweep in &self.sweeps {
            let mut record = Vec::new();
            for i in 0..sweep.radials {
                record.extend_from_slice(&self.radial_message(sweep, i));
            }
            push_record(&mut out, &record);
        }
        out
    }

    fn vcp_message(&self) -> Vec<u8> {
        let mut body = vec![0u8; 22 + 46 * self.vcp.len()];
        body[6..8].copy_from_slice(&(self.vcp.len() as u16).to_be_bytes());
        for (i, angle) in self.vcp.iter().enumerate() {
            let coded = (angle * 32768.0 / 180.0).round() as u16;
            body[22 + i * 46..24 + i * 46].copy_from_slice(&coded.to_be_bytes());
        }
        let mut msg = message(5, &body);
        msg.resize(RECORD_LEN, 0);
        msg
    }

    fn radial_message(&self, sweep: &SweepSpec, index: usize) -> Vec<u8> {
        let azimuth = (index as f32 + 0.5) * 360.0 / sweep.radials as f32;

        let mut blocks = vec![self.moment(b"DREF", |_| Some(20.0))];
        if let RadialSpec::Velocity(f) = &sweep.spec {
            blocks.push(self.moment(b"DVEL", |gate| f(index, gate)));
        }

        let pointers_len = blocks.len() * 4;
        let mut body = Vec::new();
        body.extend_from_slice(&self.icao);
        body.extend_from_slice(&MILLIS.to_be_bytes());
        body.extend_from_slice(&JULIAN_DATE.to_be_bytes());
        body.extend_from_slice(&(index as u16 + 1).to_be_bytes());
        body.extend_from_slice(&azimuth.to_be_bytes());
        body.push(0); // compression
        body.push(0); // spare
        body.extend_from_slice(&0u16.to_be_bytes()); // radial length, unused
        body.push(2); // 1° azimuth spacing
        body.push(if index == 0 { 0 } else { 1 });
        body.push(sweep.elevation_number);
        body.push(1); // cut sector
        body.extend_from_slice(&sweep.elevation.to_be_bytes());
        body.push(0);
        body.push(0);
        body.extend_from_slice(&(blocks.len() as u16).to_be_bytes());

        let mut ptr = body.len() + pointers_len;
        for block in &blocks {
            body.extend_from_slice(&(ptr as u32).to_be_bytes());
            ptr += block.len();
        }
        for block in &blocks {
            body.extend_from_slice(block);
        }
        if body.len() % 2 == 1 {
            body.push(0);
        }

        message(31, &body)
    }

    fn moment(&self, name: &[u8; 4], value: impl Fn(usize) -> Option<f32>) -> Vec<u8> {
        let mut b = Vec::with_capacity(28 + self.gates as usize);
        b.extend_from_slice(name);
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(&self.gates.to_be_bytes());
        b.extend_from_slice(&self.first_gate_m.to_be_bytes());
        b.extend_from_slice(&self.gate_spacing_m.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&0i16.to_be_bytes());
        b.push(0);
        b.push(8);
        b.extend_from_slice(&VEL_SCALE.to_be_bytes());
        b.extend_from_slice(&VEL_OFFSET.to_be_bytes());
        for gate in 0..self.gates as usize {
            let raw = match value(gate) {
                Some(v) => (v * VEL_SCALE + VEL_OFFSET).round().clamp(2.0, 255.0) as u8,
                None => 0,
            };
            b.push(raw);
        }
        b
    }
}

/// CTM prefix + message header + body. Size counts halfwords from the header on.
pub(crate) fn message(message_type: u8, body: &[u8]) -> Vec<u8> {
    let mut msg = vec![0u8; CTM_LEN];
    let size = ((MESSAGE_HEADER_LEN + body.len()) / 2) as u16;
    msg.extend_from_slice(&size.to_be_bytes());
    msg.push(0); // channel
    msg.push(message_type);
    msg.extend_from_slice(&0u16.to_be_bytes()); // sequence
    msg.extend_from_slice(&JULIAN_DATE.to_be_bytes());
    msg.extend_from_slice(&MILLIS.to_be_bytes());
    msg.extend_from_slice(&1u16.to_be_bytes());
    msg.extend_from_slice(&1u16.to_be_bytes());
    msg.extend_from_slice(body);
    msg
}

fn push_record(out: &mut Vec<u8>, record: &[u8]) {
    let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::fast());
    enc.write_all(record).expect("write to Vec");
    let compressed = enc.finish().expect("finish bzip2 stream");
    out.extend_from_slice(&(compressed.len() as i32).to_be_bytes());
    out.extend_from_slice(&compressed);
}

/// Gzip a whole file, as the archive does for some older volumes.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).expect("write to Vec");
    enc.finish().expect("finish gzip stream")
}
