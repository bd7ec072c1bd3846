use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nexrad_common::{Config, ScanDate, SiteId, TimeWindow};

use crate::pipeline::Scan;

#[derive(Parser, Debug)]
#[command(name = "trainprep")]
#[command(about = "Fetch NEXRAD Level II volumes and render velocity training images")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Prompt for the date, time window and sites instead of using flags
    #[arg(long, global = true)]
    pub manual: bool,

    /// First scan date (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, global = true, default_value = "2017-02-06")]
    pub date: ScanDate,

    /// Number of consecutive days starting at --date
    #[arg(long, global = true, default_value_t = 1)]
    pub days: u32,

    /// Window start, HHMM UTC
    #[arg(long, global = true, default_value = "0720")]
    pub start: String,

    /// Window end (exclusive), HHMM UTC; 2400 runs to midnight
    #[arg(long, global = true, default_value = "0722")]
    pub end: String,

    /// Radar site, repeatable
    #[arg(long = "site", global = true, default_value = "KMKX")]
    pub sites: Vec<SiteId>,

    /// Scrape the inventory page again even if a link list is stored
    #[arg(long, global = true)]
    pub refresh_links: bool,

    /// Wait for enter before rendering and between files
    #[arg(long, global = true)]
    pub pause: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config TOML file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for downloaded volumes
    #[arg(long, global = true)]
    pub raw_dir: Option<PathBuf>,

    /// Directory for rendered images
    #[arg(long, global = true)]
    pub image_dir: Option<PathBuf>,

    /// Directory for stored link lists
    #[arg(long, global = true)]
    pub links_dir: Option<PathBuf>,

    /// Attempts per request before giving up
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Edge length of rendered images in pixels
    #[arg(long, global = true)]
    pub image_size: Option<u32>,

    /// Re-download volumes already present in the raw directory
    #[arg(long, global = true)]
    pub overwrite: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Scrape the inventory, filter links and download volumes
    Download,
    /// Render velocity images for the downloaded volumes
    Render,
    /// Download, then render
    Run,
}

impl Cli {
    pub fn subcommand(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    /// Scan parameters from the flags.
    pub fn scan(&self) -> nexrad_common::Result<Scan> {
        Ok(Scan {
            dates: ScanDate::range(self.date, self.days.max(1)).collect(),
            window: TimeWindow::parse_hhmm(&self.start, &self.end)?,
            sites: self.sites.clone(),
        })
    }

    /// CLI flags are the last configuration layer.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.raw_dir {
            config.raw_dir = dir.clone();
        }
        if let Some(dir) = &self.image_dir {
            config.image_dir = dir.clone();
        }
        if let Some(dir) = &self.links_dir {
            config.links_dir = dir.clone();
        }
        if let Some(n) = self.max_retries {
            config.max_retries = n;
        }
        if let Some(size) = self.image_size {
            config.render.image_size = size;
        }
        if self.overwrite {
            config.skip_existing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("trainprep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_reproduce_the_sample_run() {
        let cli = parse(&[]);
        assert_eq!(cli.subcommand(), Command::Run);

        let scan = cli.scan().unwrap();
        assert_eq!(scan.dates, vec![ScanDate::from_ymd(2017, 2, 6).unwrap()]);
        assert_eq!(scan.window, TimeWindow::default());
        assert_eq!(scan.sites, vec!["KMKX".parse::<SiteId>().unwrap()]);
    }

    #[test]
    fn flags_after_subcommand() {
        let cli = parse(&[
            "download", "--date", "20110427", "--days", "2", "--start", "1900", "--end", "2100", "--site",
            "kbmx", "--site", "KHTX",
        ]);
        assert_eq!(cli.subcommand(), Command::Download);

        let scan = cli.scan().unwrap();
        assert_eq!(scan.dates.len(), 2);
        assert_eq!(scan.dates[1].compact(), "20110428");
        assert_eq!(scan.sites.len(), 2);
        assert_eq!(scan.sites[0].as_str(), "KBMX");
        assert_eq!(scan.window.to_string(), "[190000, 210000)");
    }

    #[test]
    fn bad_site_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["trainprep", "--site", "MKX"]).is_err());
    }

    #[test]
    fn end_of_day_window() {
        let scan = parse(&["--start", "2300", "--end", "2400"]).scan().unwrap();
        assert_eq!(scan.window.end(), None);
        assert!(scan.window.contains(chrono::NaiveTime::from_hms_opt(23, 59, 30).unwrap()));
    }

    #[test]
    fn empty_window_is_an_error() {
        let cli = parse(&["--start", "0800", "--end", "0800"]);
        assert!(cli.scan().is_err());
    }

    #[test]
    fn overrides_beat_config() {
        let cli = parse(&["render", "--raw-dir", "/data/raw", "--image-size", "800", "--overwrite"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.raw_dir, PathBuf::from("/data/raw"));
        assert_eq!(config.render.image_size, 800);
        assert!(!config.skip_existing);
        assert_eq!(config.image_dir, Config::default().image_dir);
    }

    #[test]
    fn zero_image_size_fails_validation() {
        let cli = parse(&["render", "--image-size", "0"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }
}
