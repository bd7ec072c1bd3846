use std::fmt;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use ncei_client::ArchiveFetcher;
use nexrad_common::{SiteId, TimeWindow};
use tracing::{debug, info};

use crate::error::{ArchiveError, Result};
use crate::volume_name::VolumeName;

/// Tally of one `download_all` pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub considered: usize,
    /// Not a volume name, wrong site, or an MDM file.
    pub skipped_pattern: usize,
    pub skipped_window: usize,
    pub skipped_existing: usize,
    pub downloaded: usize,
    pub bytes: u64,
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} links: {} downloaded ({} bytes), {} outside window, {} not volumes, {} already present",
            self.considered,
            self.downloaded,
            self.bytes,
            self.skipped_window,
            self.skipped_pattern,
            self.skipped_existing
        )
    }
}

impl AddAssign for DownloadReport {
    fn add_assign(&mut self, other: Self) {
        self.considered += other.considered;
        self.skipped_pattern += other.skipped_pattern;
        self.skipped_window += other.skipped_window;
        self.skipped_existing += other.skipped_existing;
        self.downloaded += other.downloaded;
        self.bytes += other.bytes;
    }
}

/// Fetches volume files one at a time into `raw_dir`.
pub struct Downloader<'a> {
    fetcher: &'a dyn ArchiveFetcher,
    raw_dir: PathBuf,
    skip_existing: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(fetcher: &'a dyn ArchiveFetcher, raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            raw_dir: raw_dir.into(),
            skip_existing: true,
        }
    }

    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// Download every link naming a `site` volume scanned inside `window`.
    /// A fetch that exhausts its retries aborts the pass.
    pub async fn download_all(
        &self,
        links: &[String],
        site: &SiteId,
        window: &TimeWindow,
    ) -> Result<DownloadReport> {
        tokio::fs::create_dir_all(&self.raw_dir)
            .await
            .map_err(ArchiveError::io(&self.raw_dir))?;

        let mut report = DownloadReport::default();

        for link in links {
            report.considered += 1;

            let Some(name) = VolumeName::from_link(link) else {
                debug!(link, "Not a volume file, skipping");
                report.skipped_pattern += 1;
                continue;
            };
            if name.site() != site.as_str() || name.is_mdm() {
                debug!(file = %name, "Filtered by name, skipping");
                report.skipped_pattern += 1;
                continue;
            }
            if !window.contains(name.time()) {
                report.skipped_window += 1;
                continue;
            }

            let path = self.raw_dir.join(name.file_name());
            if self.skip_existing
                && tokio::fs::try_exists(&path)
                    .await
                    .map_err(ArchiveError::io(&path))?
            {
                info!(file = %path.display(), "Already downloaded");
                report.skipped_existing += 1;
                continue;
            }

            let bytes = self.fetcher.fetch_bytes(link).await?;
            info!(file = %path.display(), bytes = bytes.len(), "Writing to file");
            write_atomic(&path, &bytes).await?;

            report.downloaded += 1;
            report.bytes += bytes.len() as u64;
        }

        Ok(report)
    }
}

/// Write through `<name>.part` and rename, so an interrupted write never
/// leaves a partial file under the final name.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    tokio::fs::write(&part, bytes)
        .await
        .map_err(ArchiveError::io(&part))?;
    tokio::fs::rename(&part, path)
        .await
        .map_err(ArchiveError::io(path))
}
