use std::path::{Path, PathBuf};

use ncei_client::ArchiveFetcher;
use nexrad_common::{ScanDate, SiteId};
use tracing::{debug, info, warn};

use crate::error::{ArchiveError, Result};
use crate::links::extract_links_by_pattern;

/// Plain-text list of download links for one site and day, one per line.
/// Once written, later runs read it instead of scraping the inventory page.
#[derive(Debug, Clone)]
pub struct LinkList {
    path: PathBuf,
}

impl LinkList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<links_dir>/<SITE>_<YYYYMMDD>_data_links.txt`
    pub fn for_site(links_dir: &Path, site: &SiteId, date: &ScanDate) -> Self {
        Self::new(links_dir.join(format!("{}_{}_data_links.txt", site, date.compact())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored list if present; otherwise scrape `page_url`, keep the
    /// links containing `pattern` and record them. An empty scrape is not
    /// recorded, and an empty stored list counts as missing, so the next run
    /// scrapes again.
    pub async fn load_or_fetch(
        &self,
        fetcher: &dyn ArchiveFetcher,
        page_url: &str,
        pattern: &str,
    ) -> Result<Vec<String>> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(ArchiveError::io(&self.path))?
        {
            let links = self.read().await?;
            if !links.is_empty() {
                info!(path = %self.path.display(), links = links.len(), "Using stored links");
                return Ok(links);
            }
            debug!(path = %self.path.display(), "Stored link list is empty, scraping again");
        }

        let html = fetcher.fetch_page(page_url).await?;
        let links = extract_links_by_pattern(&html, page_url, pattern);
        if links.is_empty() {
            warn!(page = page_url, pattern, "No matching links on inventory page, not storing");
            return Ok(links);
        }
        info!(path = %self.path.display(), links = links.len(), "Writing links");
        self.write(&links).await?;
        Ok(links)
    }

    pub async fn read(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(ArchiveError::io(&self.path))?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    pub async fn write(&self, links: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ArchiveError::io(parent))?;
        }
        let mut content = links.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(ArchiveError::io(&self.path))
    }

    /// Delete the stored list. Missing is fine.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArchiveError::io(&self.path)(e)),
        }
    }
}
