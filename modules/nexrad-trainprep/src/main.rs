use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nexrad_common::{load_file_config, Config};
use tracing_subscriber::EnvFilter;

mod cli;
mod pipeline;
mod prompt;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path.display(), "Loading config");
            Some(load_file_config(path).with_context(|| {
                format!("Config file not usable: {}. Fix it or drop --config", path.display())
            })?)
        }
        None => None,
    };
    let mut config = Config::load(file_config.as_ref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    config.log_summary();

    pipeline::ensure_dirs(&config)?;

    let command = cli.subcommand();
    if command != Command::Render {
        let scan = if cli.manual {
            prompt::ask_scan(cli.days)?
        } else {
            cli.scan()?
        };
        let client = pipeline::client(&config)?;
        let report = pipeline::download(&client, &config, &scan, cli.refresh_links).await?;
        tracing::info!("Download finished: {report}");
    }

    if command != Command::Download {
        if cli.pause && command == Command::Run {
            prompt::pause("Dump the files you don't need, then hit enter")?;
        }
        pipeline::render(&config, cli.pause)?;
    }

    Ok(())
}
