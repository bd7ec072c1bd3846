use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use nexrad_common::RenderSettings;
use tracing::{debug, info};

use crate::error::{RenderError, Result};
use crate::level2::read_volume;
use crate::raster::{rasterize, Plot};
use crate::volume::Sweep;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub image_size: u32,
    pub range_limit_km: f32,
    pub velocity_scale: f32,
    pub jpeg_quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RenderSettings::default())
    }
}

impl From<&RenderSettings> for RenderOptions {
    fn from(s: &RenderSettings) -> Self {
        Self {
            image_size: s.image_size,
            range_limit_km: s.range_limit_km,
            velocity_scale: s.velocity_scale,
            jpeg_quality: s.jpeg_quality,
        }
    }
}

/// Render one velocity image per sweep of the volume at `path` into
/// `image_dir`. Sweeps without non-zero velocity are skipped. Returns the
/// written image paths.
pub fn render_volume(path: &Path, image_dir: &Path, opts: &RenderOptions) -> Result<Vec<PathBuf>> {
    let volume = read_volume(path)?;
    std::fs::create_dir_all(image_dir).map_err(RenderError::io(image_dir))?;

    let stem = volume_stem(path);
    let mut written = Vec::new();

    for sweep in &volume.sweeps {
        let Some(img) = render_sweep(sweep, opts) else {
            debug!(sweep = sweep.number, "No velocity data in sweep");
            continue;
        };

        let angle = format_angle(sweep.fixed_angle);
        let out = unique_image_path(image_dir, &stem, &angle);
        info!(angle = %angle, file = %out.display(), "Saving velocity at sweep angle");
        save_jpeg(&img, &out, opts.jpeg_quality)?;
        written.push(out);
    }

    Ok(written)
}

/// Velocities rescaled so the strongest gate reaches `velocity_scale`, then
/// coloured between the rescaled minimum and maximum.
pub fn render_sweep(sweep: &Sweep, opts: &RenderOptions) -> Option<RgbImage> {
    if !sweep.has_velocity() {
        return None;
    }
    let extent = sweep.velocity_extent()?;
    let factor = opts.velocity_scale / extent.max_abs;

    Some(rasterize(
        sweep,
        &Plot {
            size: opts.image_size,
            extent_km: opts.range_limit_km,
            factor,
            vmin: extent.min * factor,
            vmax: extent.max * factor,
        },
    ))
}

/// Two-decimal angle in shortest form with at least one fractional digit:
/// `0.48`, `1.5`, `2.0`.
pub fn format_angle(angle: f32) -> String {
    let rounded = (angle as f64 * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        format!("{rounded}")
    }
}

fn volume_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "volume".to_string())
}

/// `vel_<stem>_<angle>.jpg`, or the first free `_2`, `_3`, … variant.
fn unique_image_path(dir: &Path, stem: &str, angle: &str) -> PathBuf {
    let base = format!("vel_{stem}_{angle}");
    let first = dir.join(format!("{base}.jpg"));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{base}_{n}.jpg")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

fn save_jpeg(img: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    let file = File::create(path).map_err(RenderError::io(path))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality).encode_image(img)?;
    writer.flush().map_err(RenderError::io(path))
}
