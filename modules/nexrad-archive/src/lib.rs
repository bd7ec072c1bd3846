pub mod downloader;
pub mod error;
pub mod link_list;
pub mod links;
pub mod volume_name;

pub use downloader::{DownloadReport, Downloader};
pub use error::{ArchiveError, Result};
pub use link_list::LinkList;
pub use links::{extract_all_links, extract_links_by_pattern};
pub use volume_name::VolumeName;
