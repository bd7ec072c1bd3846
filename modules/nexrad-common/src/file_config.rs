use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CommonError, Result};

/// TOML-backed overrides loaded from disk. Every key is optional; anything
/// left out keeps the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub render: RenderSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSection {
    pub inventory_url: Option<String>,
    pub product: Option<String>,
    pub link_pattern: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub skip_existing: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub raw_dir: Option<PathBuf>,
    pub image_dir: Option<PathBuf>,
    pub links_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSection {
    pub image_size: Option<u32>,
    pub range_limit_km: Option<f32>,
    pub velocity_scale: Option<f32>,
    pub jpeg_quality: Option<u8>,
    pub max_files: Option<usize>,
}

/// Load and parse a TOML config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| CommonError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| CommonError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_parses() {
        let cfg: FileConfig = toml::from_str(
            r#"
            [archive]
            max_retries = 3

            [render]
            image_size = 512
            "#,
        )
        .unwrap();
        assert_eq!(cfg.archive.max_retries, Some(3));
        assert_eq!(cfg.render.image_size, Some(512));
        assert!(cfg.paths.raw_dir.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = toml::from_str::<FileConfig>("[archive]\nretries = 3\n");
        assert!(err.is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_file_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, CommonError::ConfigRead { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[paths]\nraw_dir = \"data/raw\"").unwrap();
        let cfg = load_file_config(file.path()).unwrap();
        assert_eq!(cfg.paths.raw_dir, Some(PathBuf::from("data/raw")));
    }
}
