//! Scrape → filter → download against an in-memory archive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use ncei_client::{ArchiveFetcher, NceiError};
use nexrad_archive::{ArchiveError, Downloader, LinkList};
use nexrad_common::{ScanDate, SiteId, TimeWindow};

const BUCKET: &str = "https://noaa-nexrad-level2.s3.amazonaws.com/2017/02/06/KMKX";
const PAGE_URL: &str = "https://inventory.test/bdp-download.jsp?yyyy=2017&mm=02&dd=06&id=KMKX&product=AAL2";

#[derive(Default)]
struct FakeArchive {
    pages: HashMap<String, String>,
    files: HashMap<String, Bytes>,
    requests: Mutex<Vec<String>>,
}

impl FakeArchive {
    fn with_inventory(names: &[&str]) -> Self {
        let mut html = String::from("<html><body><a href=\"/help\">Help</a><ul>");
        let mut files = HashMap::new();
        for name in names {
            let link = format!("{BUCKET}/{name}");
            html.push_str(&format!("<li><a href=\"{link}\">{name}</a></li>"));
            files.insert(link, Bytes::from(format!("volume:{name}")));
        }
        html.push_str("</ul></body></html>");

        Self {
            pages: HashMap::from([(PAGE_URL.to_string(), html)]),
            files,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveFetcher for FakeArchive {
    async fn fetch_page(&self, url: &str) -> ncei_client::Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| NceiError::Http {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> ncei_client::Result<Bytes> {
        self.requests.lock().unwrap().push(url.to_string());
        self.files.get(url).cloned().ok_or_else(|| NceiError::RetriesExhausted {
            url: url.to_string(),
            attempts: 5,
            last_error: Box::new(NceiError::Http {
                status: 404,
                url: url.to_string(),
            }),
        })
    }
}

fn kmkx() -> SiteId {
    "KMKX".parse().unwrap()
}

fn window() -> TimeWindow {
    TimeWindow::parse_hhmm("0720", "0722").unwrap()
}

#[tokio::test]
async fn downloads_only_files_inside_window() {
    let archive = FakeArchive::with_inventory(&[
        "KMKX20170206_071627_V06",
        "KMKX20170206_072000_V06",
        "KMKX20170206_072023_V06",
        "KMKX20170206_072023_V06_MDM",
        "KMKX20170206_072200_V06",
    ]);
    let dir = tempfile::tempdir().unwrap();
    let date = ScanDate::from_ymd(2017, 2, 6).unwrap();

    let list = LinkList::for_site(&dir.path().join("links"), &kmkx(), &date);
    let links = list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    assert_eq!(links.len(), 5, "help link is filtered out");

    let raw = dir.path().join("raw");
    let report = Downloader::new(&archive, &raw)
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap();

    assert_eq!(report.considered, 5);
    assert_eq!(report.downloaded, 2);
    assert_eq!(report.skipped_pattern, 1);
    assert_eq!(report.skipped_window, 2);

    let written = std::fs::read(raw.join("KMKX20170206_072023_V06")).unwrap();
    assert_eq!(written, b"volume:KMKX20170206_072023_V06");
    assert!(raw.join("KMKX20170206_072000_V06").exists());
    assert!(!raw.join("KMKX20170206_072200_V06").exists());
    assert!(!raw.join("KMKX20170206_072023_V06_MDM").exists());

    let fetched: Vec<_> = archive
        .requests()
        .into_iter()
        .filter(|u| u.starts_with(BUCKET))
        .collect();
    assert_eq!(fetched.len(), 2, "filtered files are never requested");
}

#[tokio::test]
async fn stored_link_list_skips_the_inventory_page() {
    let archive = FakeArchive::with_inventory(&["KMKX20170206_072023_V06"]);
    let dir = tempfile::tempdir().unwrap();
    let date = ScanDate::from_ymd(2017, 2, 6).unwrap();
    let list = LinkList::for_site(dir.path(), &kmkx(), &date);

    let first = list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    let second = list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    assert_eq!(first, second);

    let page_hits = archive.requests().iter().filter(|u| *u == PAGE_URL).count();
    assert_eq!(page_hits, 1);

    list.remove().await.unwrap();
    list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    let page_hits = archive.requests().iter().filter(|u| *u == PAGE_URL).count();
    assert_eq!(page_hits, 2, "refresh re-scrapes the page");
}

/// Inventory page that has no bucket links until the second request.
struct FillingArchive {
    page_hits: AtomicUsize,
}

#[async_trait]
impl ArchiveFetcher for FillingArchive {
    async fn fetch_page(&self, _url: &str) -> ncei_client::Result<String> {
        if self.page_hits.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok("<html><body><a href=\"/help\">No data yet</a></body></html>".to_string())
        } else {
            Ok(format!("<a href=\"{BUCKET}/KMKX20170206_072023_V06\">072023</a>"))
        }
    }

    async fn fetch_bytes(&self, url: &str) -> ncei_client::Result<Bytes> {
        Err(NceiError::Network(format!("unexpected fetch {url}")))
    }
}

#[tokio::test]
async fn empty_scrape_is_not_stored() {
    let archive = FillingArchive {
        page_hits: AtomicUsize::new(0),
    };
    let dir = tempfile::tempdir().unwrap();
    let date = ScanDate::from_ymd(2017, 2, 6).unwrap();
    let list = LinkList::for_site(dir.path(), &kmkx(), &date);

    let first = list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    assert!(first.is_empty());
    assert!(!list.path().exists());

    let second = list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    assert_eq!(second, vec![format!("{BUCKET}/KMKX20170206_072023_V06")]);
    assert_eq!(archive.page_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_stored_list_is_scraped_again() {
    let archive = FakeArchive::with_inventory(&["KMKX20170206_072023_V06"]);
    let dir = tempfile::tempdir().unwrap();
    let date = ScanDate::from_ymd(2017, 2, 6).unwrap();
    let list = LinkList::for_site(dir.path(), &kmkx(), &date);
    std::fs::write(list.path(), "").unwrap();

    let links = list.load_or_fetch(&archive, PAGE_URL, "amazonaws").await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(list.read().await.unwrap(), links);
}

#[tokio::test]
async fn leftover_part_file_is_not_a_download() {
    let archive = FakeArchive::with_inventory(&["KMKX20170206_072023_V06"]);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("KMKX20170206_072023_V06.part"), b"trunc").unwrap();

    let links = vec![format!("{BUCKET}/KMKX20170206_072023_V06")];
    let report = Downloader::new(&archive, dir.path())
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap();

    assert_eq!(report.skipped_existing, 0);
    assert_eq!(report.downloaded, 1);
    assert_eq!(
        std::fs::read(dir.path().join("KMKX20170206_072023_V06")).unwrap(),
        b"volume:KMKX20170206_072023_V06"
    );
    assert!(!dir.path().join("KMKX20170206_072023_V06.part").exists());
}

#[tokio::test]
async fn failed_fetch_leaves_no_file_behind() {
    let archive = FakeArchive::default();
    let dir = tempfile::tempdir().unwrap();
    let links = vec![format!("{BUCKET}/KMKX20170206_072023_V06")];

    Downloader::new(&archive, dir.path())
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap_err();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn existing_files_are_not_fetched_again() {
    let archive = FakeArchive::with_inventory(&["KMKX20170206_072023_V06"]);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("KMKX20170206_072023_V06"), b"cached").unwrap();

    let links = vec![format!("{BUCKET}/KMKX20170206_072023_V06")];
    let report = Downloader::new(&archive, dir.path())
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap();

    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.downloaded, 0);
    assert!(archive.requests().is_empty());

    let report = Downloader::new(&archive, dir.path())
        .skip_existing(false)
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap();
    assert_eq!(report.downloaded, 1);
    assert_eq!(
        std::fs::read(dir.path().join("KMKX20170206_072023_V06")).unwrap(),
        b"volume:KMKX20170206_072023_V06"
    );
}

#[tokio::test]
async fn other_sites_are_skipped() {
    let archive = FakeArchive::default();
    let dir = tempfile::tempdir().unwrap();
    let links = vec![format!("{BUCKET}/KGRB20170206_072023_V06")];

    let report = Downloader::new(&archive, dir.path())
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap();
    assert_eq!(report.skipped_pattern, 1);
    assert!(archive.requests().is_empty());
}

#[tokio::test]
async fn exhausted_fetch_aborts_the_pass() {
    let archive = FakeArchive::default();
    let dir = tempfile::tempdir().unwrap();
    let links = vec![
        format!("{BUCKET}/KMKX20170206_072023_V06"),
        format!("{BUCKET}/KMKX20170206_072100_V06"),
    ];

    let err = Downloader::new(&archive, dir.path())
        .download_all(&links, &kmkx(), &window())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ArchiveError::Fetch(NceiError::RetriesExhausted { attempts: 5, .. })
    ));
    assert_eq!(archive.requests().len(), 1, "run stops at the first failure");
}
