pub mod error;
pub mod retry;

pub use error::{NceiError, Result};
pub use retry::{with_retries, RetryPolicy};

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use nexrad_common::{ScanDate, SiteId};
use tracing::debug;

/// Build the inventory page URL listing one site's files for one day.
pub fn inventory_page_url(base: &str, date: &ScanDate, site: &SiteId, product: &str) -> Result<String> {
    let mut url = url::Url::parse(base).map_err(|e| NceiError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    url.query_pairs_mut()
        .clear()
        .append_pair("yyyy", &format!("{:04}", date.year()))
        .append_pair("mm", &format!("{:02}", date.month()))
        .append_pair("dd", &format!("{:02}", date.day()))
        .append_pair("id", site.as_str())
        .append_pair("product", product);
    Ok(url.to_string())
}

/// The two reads the download pipeline needs. Implemented by [`NceiClient`];
/// tests substitute an in-memory archive.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch an HTML page as text.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Fetch a binary file.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;
}

pub struct NceiClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl NceiClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nexrad-trainprep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, retry })
    }

    /// Single GET with no retry. Non-2xx statuses are errors.
    async fn get_once(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NceiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp)
    }
}

#[async_trait]
impl ArchiveFetcher for NceiClient {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        with_retries(&self.retry, url, || async move {
            Ok::<_, NceiError>(self.get_once(url).await?.text().await?)
        })
        .await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        with_retries(&self.retry, url, || async move {
            Ok::<_, NceiError>(self.get_once(url).await?.bytes().await?)
        })
        .await
    }
}
