//! Beam geometry under the standard 4/3 effective-Earth-radius model.

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const EFFECTIVE_RADIUS_M: f64 = EARTH_RADIUS_M * 4.0 / 3.0;

/// Distance along the ground to the point under a gate at `slant_m` range.
pub fn ground_range_m(slant_m: f64, elevation_deg: f64) -> f64 {
    let e = elevation_deg.to_radians();
    let r = slant_m;
    let height = (r * r + EFFECTIVE_RADIUS_M * EFFECTIVE_RADIUS_M + 2.0 * r * EFFECTIVE_RADIUS_M * e.sin()).sqrt()
        - EFFECTIVE_RADIUS_M;
    EFFECTIVE_RADIUS_M * (r * e.cos() / (EFFECTIVE_RADIUS_M + height)).asin()
}

/// Ground-range gate boundaries in km: `gates + 1` increasing values, the
/// first half a gate before the first gate centre.
pub fn gate_edges_km(first_gate_m: f32, gate_spacing_m: f32, gates: usize, elevation_deg: f32) -> Vec<f32> {
    let start = first_gate_m as f64 - gate_spacing_m as f64 / 2.0;
    (0..=gates)
        .map(|i| {
            let slant = (start + i as f64 * gate_spacing_m as f64).max(0.0);
            (ground_range_m(slant, elevation_deg as f64) / 1000.0) as f32
        })
        .collect()
}

/// Compass azimuth in degrees `[0, 360)` of the point `(x east, y north)`.
pub fn azimuth_deg(x: f32, y: f32) -> f32 {
    x.atan2(y).to_degrees().rem_euclid(360.0)
}
