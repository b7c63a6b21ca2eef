use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    ufcstats_scraper::logging::init("info").context("init logging")?;

    let cli = ufcstats_scraper::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        ufcstats_scraper::cli::Command::Update(args) => {
            ufcstats_scraper::update::run(args).context("update")?;
        }
    }

    Ok(())
}
