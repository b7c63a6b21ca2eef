use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape newly completed events and new fighters, then rewrite both tables.
    Update(UpdateArgs),
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Directory holding `fight_stats.csv` and `fighter_stats.csv`.
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Site root (must be http/https).
    #[arg(long, default_value = "http://ufcstats.com")]
    pub base_url: String,

    /// Retries for rate-limited or server-error responses.
    #[arg(long, default_value_t = 5)]
    pub retries: u32,

    /// Backoff factor in seconds; retry n waits factor * 2^(n-1).
    #[arg(long, default_value_t = 2.0, value_parser = parse_backoff_factor)]
    pub backoff_factor: f64,

    /// Per-request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

fn parse_backoff_factor(raw: &str) -> Result<f64, String> {
    let factor = raw
        .parse::<f64>()
        .map_err(|err| format!("not a number: {err}"))?;
    if !factor.is_finite() || factor < 0.0 {
        return Err(format!("must be a finite, non-negative number of seconds: {raw}"));
    }
    Ok(factor)
}
