use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use nexrad_common::{parse_hhmm, parse_window_end, ScanDate, SiteId, TimeWindow};

use crate::pipeline::Scan;

/// Ask for the scan date, window and sites.
pub fn ask_scan(days: u32) -> Result<Scan> {
    let theme = ColorfulTheme::default();

    let year: i32 = Input::with_theme(&theme)
        .with_prompt("Year")
        .default(2017)
        .interact_text()?;
    let month: u32 = Input::with_theme(&theme)
        .with_prompt("Month")
        .default(2)
        .validate_with(|m: &u32| if (1..=12).contains(m) { Ok(()) } else { Err("month must be 1-12") })
        .interact_text()?;
    let day: u32 = Input::with_theme(&theme)
        .with_prompt("Day")
        .default(6)
        .validate_with(|d: &u32| if (1..=31).contains(d) { Ok(()) } else { Err("day must be 1-31") })
        .interact_text()?;
    let date = ScanDate::from_ymd(year, month, day)?;

    let start = ask_hhmm(&theme, "Start time (HHMM)", "0720", |s| parse_hhmm(s).map(|_| ()))?;
    let end = ask_hhmm(&theme, "End time (HHMM, 2400 for end of day)", "0722", |s| {
        parse_window_end(s).map(|_| ())
    })?;
    let window = TimeWindow::parse_hhmm(&start, &end)?;

    let count: usize = Input::with_theme(&theme)
        .with_prompt("Number of sites")
        .default(1)
        .interact_text()?;
    let sites = (1..=count)
        .map(|i| {
            Input::<SiteId>::with_theme(&theme)
                .with_prompt(format!("Site {i}"))
                .interact_text()
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Scan {
        dates: ScanDate::range(date, days.max(1)).collect(),
        window,
        sites,
    })
}

fn ask_hhmm(
    theme: &ColorfulTheme,
    prompt: &str,
    default: &str,
    check: fn(&str) -> nexrad_common::Result<()>,
) -> Result<String> {
    let value = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(|s: &String| check(s).map_err(|e| e.to_string()))
        .interact_text()?;
    Ok(value)
}

/// Block until the user hits enter.
pub fn pause(message: &str) -> Result<()> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}
