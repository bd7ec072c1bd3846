use image::{Rgb, RgbImage};

use crate::colormap::{normalize, viridis};
use crate::geometry::{azimuth_deg, gate_edges_km};
use crate::volume::{Moment, Sweep};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
/// Azimuth lookup resolution: 0.1°.
const AZ_BINS: usize = 3600;

/// How a sweep's velocities map onto the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plot {
    /// Edge length in pixels.
    pub size: u32,
    /// Axis limits are `[-extent_km, extent_km]` on both axes.
    pub extent_km: f32,
    /// Multiplier applied to every gate before colouring.
    pub factor: f32,
    /// Colour range, applied after `factor`.
    pub vmin: f32,
    pub vmax: f32,
}

struct Ray<'a> {
    moment: &'a Moment,
    edges: Vec<f32>,
}

/// Paint the sweep's velocity field in plan view, radar at the centre,
/// north up. Pixels with no gate behind them stay white.
pub fn rasterize(sweep: &Sweep, plot: &Plot) -> RgbImage {
    let mut img = RgbImage::from_pixel(plot.size, plot.size, BACKGROUND);

    let rays: Vec<(f32, Ray)> = sweep
        .radials
        .iter()
        .filter_map(|r| {
            let m = r.velocity.as_ref()?;
            let edges = gate_edges_km(m.first_gate_m, m.gate_spacing_m, m.gates.len(), r.elevation);
            Some((r.azimuth.rem_euclid(360.0), Ray { moment: m, edges }))
        })
        .collect();
    if rays.is_empty() || plot.size == 0 {
        return img;
    }

    let lut = azimuth_lookup(&rays);
    let px_km = 2.0 * plot.extent_km / plot.size as f32;

    for (px, py, pixel) in img.enumerate_pixels_mut() {
        let x = -plot.extent_km + (px as f32 + 0.5) * px_km;
        let y = plot.extent_km - (py as f32 + 0.5) * px_km;

        let bin = ((azimuth_deg(x, y) * 10.0) as usize).min(AZ_BINS - 1);
        let Some(ray_idx) = lut[bin] else { continue };
        let ray = &rays[ray_idx].1;

        let ground = x.hypot(y);
        let gate = ray.edges.partition_point(|&edge| edge <= ground);
        if gate == 0 || gate >= ray.edges.len() {
            continue;
        }
        if let Some(Some(v)) = ray.moment.gates.get(gate - 1) {
            let t = normalize(v * plot.factor, plot.vmin, plot.vmax);
            *pixel = Rgb(viridis(t));
        }
    }

    img
}

/// For each 0.1° azimuth bin, the nearest ray within three quarters of the
/// typical ray spacing. Gaps in the sweep stay `None`.
fn azimuth_lookup(rays: &[(f32, Ray)]) -> Vec<Option<usize>> {
    let mut order: Vec<usize> = (0..rays.len()).collect();
    order.sort_by(|&a, &b| rays[a].0.total_cmp(&rays[b].0));
    let sorted: Vec<f32> = order.iter().map(|&i| rays[i].0).collect();

    let tolerance = 0.75 * typical_spacing(&sorted);
    let n = sorted.len();

    (0..AZ_BINS)
        .map(|bin| {
            let az = (bin as f32 + 0.5) * 360.0 / AZ_BINS as f32;
            let above = sorted.partition_point(|&a| a < az) % n;
            let below = (above + n - 1) % n;

            [above, below]
                .into_iter()
                .map(|k| (k, angular_distance(sorted[k], az)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .filter(|&(_, d)| d <= tolerance)
                .map(|(k, _)| order[k])
        })
        .collect()
}

/// Median gap between neighbouring azimuths, 1° when undeterminable.
fn typical_spacing(sorted: &[f32]) -> f32 {
    if sorted.len() < 2 {
        return 1.0;
    }
    let mut gaps: Vec<f32> = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|g| *g > 0.0)
        .collect();
    if gaps.is_empty() {
        return 1.0;
    }
    gaps.sort_by(f32::total_cmp);
    gaps[gaps.len() / 2]
}

fn angular_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}
