//! Viridis, sampled at ten evenly spaced stops and linearly interpolated.

const VIRIDIS: [[u8; 3]; 10] = [
    [0x44, 0x01, 0x54],
    [0x48, 0x28, 0x78],
    [0x3e, 0x4a, 0x89],
    [0x31, 0x68, 0x8e],
    [0x26, 0x82, 0x8e],
    [0x1f, 0x9e, 0x89],
    [0x35, 0xb7, 0x79],
    [0x6d, 0xcd, 0x59],
    [0xb4, 0xde, 0x2c],
    [0xfd, 0xe7, 0x25],
];

/// Colour for `t` in `[0, 1]`; values outside are clamped.
pub fn viridis(t: f32) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * (VIRIDIS.len() - 1) as f32;
    let i = (pos.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = pos - i as f32;

    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |k: usize| (a[k] as f32 + (b[k] as f32 - a[k] as f32) * frac).round() as u8;
    [mix(0), mix(1), mix(2)]
}

/// Linear normalisation onto `[0, 1]`. A degenerate range maps to 0.
pub fn normalize(v: f32, min: f32, max: f32) -> f32 {
    if max > min {
        (v - min) / (max - min)
    } else {
        0.0
    }
}
