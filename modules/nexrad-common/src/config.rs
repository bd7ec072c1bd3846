use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::{CommonError, Result};
use crate::file_config::FileConfig;

pub const DEFAULT_INVENTORY_URL: &str = "https://www.ncdc.noaa.gov/nexradinv/bdp-download.jsp";
/// Level-II base data: reflectivity, radial velocity, spectrum width and the
/// dual-pol moments.
pub const DEFAULT_PRODUCT: &str = "AAL2";
/// Volume files live in the public S3 bucket; the inventory page links to them.
pub const DEFAULT_LINK_PATTERN: &str = "amazonaws";

/// Image parameters for the velocity renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Edge length of the square output image in pixels.
    pub image_size: u32,
    /// Plot extent in km from the radar along both axes.
    pub range_limit_km: f32,
    /// Velocities are rescaled so the largest magnitude equals this value.
    pub velocity_scale: f32,
    pub jpeg_quality: u8,
    /// Cap on files rendered per pass.
    pub max_files: usize,
}

impl RenderSettings {
    /// Reject settings the renderer cannot produce an image from.
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 {
            return Err(CommonError::Config("render.image_size must be greater than 0".into()));
        }
        if !(self.range_limit_km > 0.0) {
            return Err(CommonError::Config(format!(
                "render.range_limit_km must be positive, got {}",
                self.range_limit_km
            )));
        }
        if !(self.velocity_scale > 0.0) {
            return Err(CommonError::Config(format!(
                "render.velocity_scale must be positive, got {}",
                self.velocity_scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CommonError::Config(format!(
                "render.jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            image_size: 2500,
            range_limit_km: 250.0,
            velocity_scale: 70.0,
            jpeg_quality: 90,
            max_files: 160,
        }
    }
}

/// Effective runtime configuration: defaults, then TOML file, then env.
#[derive(Debug, Clone)]
pub struct Config {
    // Archive
    pub inventory_url: String,
    pub product: String,
    pub link_pattern: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub http_timeout: Duration,
    pub skip_existing: bool,

    // Filesystem
    pub raw_dir: PathBuf,
    pub image_dir: PathBuf,
    pub links_dir: PathBuf,

    // Rendering
    pub render: RenderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inventory_url: DEFAULT_INVENTORY_URL.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            link_pattern: DEFAULT_LINK_PATTERN.to_string(),
            max_retries: 5,
            retry_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(60),
            skip_existing: true,
            raw_dir: PathBuf::from("training/raw"),
            image_dir: PathBuf::from("training/im"),
            links_dir: PathBuf::from("links"),
            render: RenderSettings::default(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the optional file config and the process env
    /// (after loading `.env`).
    pub fn load(file: Option<&FileConfig>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file);
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Run again after any later override, e.g. CLI flags.
    pub fn validate(&self) -> Result<()> {
        self.render.validate()
    }

    pub fn apply_file(&mut self, file: &FileConfig) {
        let a = &file.archive;
        if let Some(v) = &a.inventory_url {
            self.inventory_url = v.clone();
        }
        if let Some(v) = &a.product {
            self.product = v.clone();
        }
        if let Some(v) = &a.link_pattern {
            self.link_pattern = v.clone();
        }
        if let Some(v) = a.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = a.retry_delay_secs {
            self.retry_delay = Duration::from_secs(v);
        }
        if let Some(v) = a.http_timeout_secs {
            self.http_timeout = Duration::from_secs(v);
        }
        if let Some(v) = a.skip_existing {
            self.skip_existing = v;
        }

        let p = &file.paths;
        if let Some(v) = &p.raw_dir {
            self.raw_dir = v.clone();
        }
        if let Some(v) = &p.image_dir {
            self.image_dir = v.clone();
        }
        if let Some(v) = &p.links_dir {
            self.links_dir = v.clone();
        }

        let r = &file.render;
        if let Some(v) = r.image_size {
            self.render.image_size = v;
        }
        if let Some(v) = r.range_limit_km {
            self.render.range_limit_km = v;
        }
        if let Some(v) = r.velocity_scale {
            self.render.velocity_scale = v;
        }
        if let Some(v) = r.jpeg_quality {
            self.render.jpeg_quality = v;
        }
        if let Some(v) = r.max_files {
            self.render.max_files = v;
        }
    }

    /// Apply `TRAINPREP_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TRAINPREP_INVENTORY_URL") {
            self.inventory_url = v;
        }
        if let Some(v) = lookup("TRAINPREP_PRODUCT") {
            self.product = v;
        }
        if let Some(v) = lookup("TRAINPREP_RAW_DIR") {
            self.raw_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRAINPREP_IMAGE_DIR") {
            self.image_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRAINPREP_LINKS_DIR") {
            self.links_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRAINPREP_MAX_RETRIES") {
            self.max_retries = parse_env("TRAINPREP_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("TRAINPREP_RETRY_DELAY_SECS") {
            self.retry_delay = Duration::from_secs(parse_env("TRAINPREP_RETRY_DELAY_SECS", &v)?);
        }
        if let Some(v) = lookup("TRAINPREP_HTTP_TIMEOUT_SECS") {
            self.http_timeout = Duration::from_secs(parse_env("TRAINPREP_HTTP_TIMEOUT_SECS", &v)?);
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("Config loaded:");
        info!("  inventory_url: {}", self.inventory_url);
        info!("  product: {}", self.product);
        info!("  link_pattern: {}", self.link_pattern);
        info!(
            "  retries: {} (delay {:?}, timeout {:?})",
            self.max_retries, self.retry_delay, self.http_timeout
        );
        info!("  raw_dir: {}", self.raw_dir.display());
        info!("  image_dir: {}", self.image_dir.display());
        info!("  links_dir: {}", self.links_dir.display());
        info!(
            "  render: {}px, ±{} km, scale {}, max {} files",
            self.render.image_size,
            self.render.range_limit_km,
            self.render.velocity_scale,
            self.render.max_files
        );
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CommonError::Config(format!("{key} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.product, "AAL2");
        assert_eq!(c.max_retries, 5);
        assert_eq!(c.retry_delay, Duration::from_secs(1));
        assert_eq!(c.render.max_files, 160);
        assert_eq!(c.render.image_size, 2500);
    }

    #[test]
    fn file_overrides_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            [archive]
            product = "AAL3"
            [paths]
            image_dir = "out"
            [render]
            velocity_scale = 35.0
            "#,
        )
        .unwrap();
        let mut c = Config::default();
        c.apply_file(&file);
        assert_eq!(c.product, "AAL3");
        assert_eq!(c.image_dir, PathBuf::from("out"));
        assert_eq!(c.render.velocity_scale, 35.0);
        assert_eq!(c.max_retries, 5);
    }

    #[test]
    fn env_overrides_file() {
        let file: FileConfig = toml::from_str("[archive]\nmax_retries = 2\n").unwrap();
        let mut c = Config::default();
        c.apply_file(&file);
        c.apply_env(env(&[("TRAINPREP_MAX_RETRIES", "9"), ("TRAINPREP_RAW_DIR", "/tmp/raw")]))
            .unwrap();
        assert_eq!(c.max_retries, 9);
        assert_eq!(c.raw_dir, PathBuf::from("/tmp/raw"));
    }

    #[test]
    fn unusable_render_settings_are_rejected() {
        assert!(Config::default().validate().is_ok());

        let cases: [fn(&mut RenderSettings); 5] = [
            |r| r.image_size = 0,
            |r| r.range_limit_km = 0.0,
            |r| r.velocity_scale = -70.0,
            |r| r.velocity_scale = f32::NAN,
            |r| r.jpeg_quality = 0,
        ];
        for breakage in cases {
            let mut c = Config::default();
            breakage(&mut c.render);
            assert!(matches!(c.validate(), Err(CommonError::Config(_))), "{:?}", c.render);
        }

        let mut c = Config::default();
        c.render.jpeg_quality = 101;
        assert!(c.validate().is_err());
    }

    #[test]
    fn bad_numeric_env_is_an_error() {
        let mut c = Config::default();
        let err = c
            .apply_env(env(&[("TRAINPREP_RETRY_DELAY_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("TRAINPREP_RETRY_DELAY_SECS"));
    }
}
