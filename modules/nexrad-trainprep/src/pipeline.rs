use std::path::PathBuf;

use anyhow::{Context, Result};
use ncei_client::{inventory_page_url, ArchiveFetcher, NceiClient, RetryPolicy};
use nexrad_archive::{DownloadReport, Downloader, LinkList};
use nexrad_common::{Config, ScanDate, SiteId, TimeWindow};
use nexrad_render::{list_files, render_volume, RenderOptions};
use tracing::{info, warn};

use crate::prompt;

/// What to fetch: every site on every date, inside one daily window.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub dates: Vec<ScanDate>,
    pub window: TimeWindow,
    pub sites: Vec<SiteId>,
}

/// Create the raw, image and link directories.
pub fn ensure_dirs(config: &Config) -> Result<()> {
    for dir in [&config.raw_dir, &config.image_dir, &config.links_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

pub fn client(config: &Config) -> Result<NceiClient> {
    let retry = RetryPolicy {
        max_attempts: config.max_retries,
        delay: config.retry_delay,
    };
    NceiClient::new(config.http_timeout, retry).context("building HTTP client")
}

/// Scrape, filter and download for each date and site in turn.
pub async fn download(
    fetcher: &dyn ArchiveFetcher,
    config: &Config,
    scan: &Scan,
    refresh_links: bool,
) -> Result<DownloadReport> {
    let downloader = Downloader::new(fetcher, &config.raw_dir).skip_existing(config.skip_existing);
    let mut total = DownloadReport::default();

    for date in &scan.dates {
        for site in &scan.sites {
            info!(site = %site, date = %date, window = %scan.window, "Fetching volume list");

            let page_url = inventory_page_url(&config.inventory_url, date, site, &config.product)?;
            let list = LinkList::for_site(&config.links_dir, site, date);
            if refresh_links {
                list.remove().await?;
            }
            let links = list
                .load_or_fetch(fetcher, &page_url, &config.link_pattern)
                .await
                .with_context(|| format!("listing volumes for {site} on {date}"))?;

            let report = downloader
                .download_all(&links, site, &scan.window)
                .await
                .with_context(|| format!("downloading volumes for {site} on {date}"))?;
            info!(site = %site, date = %date, "{report}");
            total += report;
        }
    }

    Ok(total)
}

/// Render the first `max_files` volumes under `raw_dir`. Files that do not
/// decode are skipped. Returns the written image paths.
pub fn render(config: &Config, pause: bool) -> Result<Vec<PathBuf>> {
    let files = list_files(&config.raw_dir, config.render.max_files)
        .with_context(|| format!("listing {}", config.raw_dir.display()))?;
    let opts = RenderOptions::from(&config.render);
    info!(files = files.len(), dir = %config.raw_dir.display(), "Rendering volumes");

    let mut images = Vec::new();
    for (i, path) in files.iter().enumerate() {
        if pause && i > 0 {
            prompt::pause("Hit enter for the next file")?;
        }
        info!(file = %path.display(), "Rendering");

        match render_volume(path, &config.image_dir, &opts) {
            Ok(written) => images.extend(written),
            Err(e) if e.is_decode() => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable volume");
            }
            Err(e) => return Err(e).with_context(|| format!("rendering {}", path.display())),
        }
    }

    info!(images = images.len(), "Rendering done");
    Ok(images)
}
