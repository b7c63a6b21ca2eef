use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use scraper::Html;
use url::Url;

use crate::card::extract_bouts;
use crate::cli::UpdateArgs;
use crate::error::FetchError;
use crate::events::extract_event_urls;
use crate::fetch::{Fetch, HttpFetcher, RetryPolicy};
use crate::fight_stats::extract_fight_stats;
use crate::fighter::extract_fighter;
use crate::formats::{FightRecord, FightStatLine, FighterRecord};
use crate::store::{
    FIGHT_STATS_FILE, FIGHTER_STATS_FILE, FighterTable, load_fighters, load_fights,
    write_fighters, write_fights,
};

/// Completed-events listing, relative to the site root.
pub const EVENTS_PATH: &str = "/statistics/events/completed?page=all";

/// Both tables after an update, plus what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub fights: Vec<FightRecord>,
    pub fighters: FighterTable,
    pub new_events: Vec<String>,
    pub new_fight_rows: usize,
    pub new_fighters: usize,
}

/// Drives extraction against one page source. Strictly sequential: one
/// request at a time.
pub struct Scraper<F> {
    fetcher: F,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    fn document(&self, url: &str) -> Result<Html, FetchError> {
        let body = self.fetcher.fetch(url)?;
        Ok(Html::parse_document(&body))
    }

    /// Completed events newer than anything in `known`, newest first.
    ///
    /// Completed events never change once listed, so the walk stops at the
    /// first event already on file instead of diffing the whole listing.
    pub fn new_event_urls(
        &self,
        listing_url: &str,
        known: &HashSet<&str>,
    ) -> anyhow::Result<Vec<String>> {
        let listing = self
            .document(listing_url)
            .context("fetch completed events listing")?;
        let events =
            extract_event_urls(&listing, listing_url).context("extract completed events")?;
        Ok(events
            .into_iter()
            .take_while(|event| !known.contains(event.as_str()))
            .collect())
    }

    /// All rows for one event's card, two per bout, in listed order.
    pub fn scrape_card(&self, event_url: &str) -> anyhow::Result<Vec<FightRecord>> {
        let document = self
            .document(event_url)
            .with_context(|| format!("fetch event {event_url}"))?;
        let bouts = extract_bouts(&document, event_url)
            .with_context(|| format!("extract fight card {event_url}"))?;

        let mut rows = Vec::with_capacity(bouts.len() * 2);
        for mut bout in bouts {
            if let Some(lines) = self.bout_stats(&bout.fight_url)? {
                bout.join_stats(&lines);
            }
            rows.extend(bout.into_rows());
        }
        Ok(rows)
    }

    /// Detailed statistics for one bout. A page that is missing, has no
    /// statistics or cannot be read leaves the bout's stat fields empty;
    /// network errors and exhausted retries stay fatal.
    fn bout_stats(&self, fight_url: &str) -> anyhow::Result<Option<Vec<FightStatLine>>> {
        let document = match self.document(fight_url) {
            Ok(document) => document,
            Err(FetchError::Status { status, .. }) => {
                tracing::warn!(%fight_url, %status, "fight details unavailable");
                return Ok(None);
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!("fetch fight {fight_url}")));
            }
        };
        match extract_fight_stats(&document, fight_url) {
            Ok(Some(lines)) => Ok(Some(lines)),
            Ok(None) => {
                tracing::warn!(%fight_url, "missing fight details");
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(%fight_url, error = %err, "unreadable fight details");
                Ok(None)
            }
        }
    }

    /// New events' rows ahead of `old`.
    pub fn update_fights(
        &self,
        listing_url: &str,
        old: Vec<FightRecord>,
    ) -> anyhow::Result<(Vec<FightRecord>, Vec<String>)> {
        let new_events = {
            let known = old
                .iter()
                .map(|row| row.event_url.as_str())
                .collect::<HashSet<_>>();
            self.new_event_urls(listing_url, &known)?
        };

        let mut rows = Vec::new();
        for event_url in &new_events {
            tracing::info!(%event_url, "scraping new event");
            rows.extend(self.scrape_card(event_url)?);
        }

        rows.extend(old);
        Ok((rows, new_events))
    }

    /// Adds every fighter referenced by `fights` that `roster` lacks.
    pub fn update_fighters(
        &self,
        fights: &[FightRecord],
        mut roster: FighterTable,
    ) -> anyhow::Result<(FighterTable, usize)> {
        let mut seen = roster
            .rows
            .iter()
            .map(|row| row.url.clone())
            .collect::<HashSet<_>>();

        let mut added: Vec<FighterRecord> = Vec::new();
        for row in fights {
            let fighter_url = row.fighter_url.as_str();
            if !seen.insert(fighter_url.to_owned()) {
                continue;
            }
            tracing::info!(%fighter_url, "adding new fighter");
            let document = self
                .document(fighter_url)
                .with_context(|| format!("fetch fighter {fighter_url}"))?;
            let fighter = extract_fighter(&document, fighter_url)
                .with_context(|| format!("extract fighter {fighter_url}"))?;
            added.push(fighter);
        }

        let count = added.len();
        roster.prepend(added);
        Ok((roster, count))
    }

    /// Fight table first, then the fighter roster derived from it.
    pub fn update(
        &self,
        listing_url: &str,
        fights: Vec<FightRecord>,
        fighters: FighterTable,
    ) -> anyhow::Result<UpdateOutcome> {
        let old_rows = fights.len();
        let (fights, new_events) = self
            .update_fights(listing_url, fights)
            .context("update fight table")?;
        let (fighters, new_fighters) = self
            .update_fighters(&fights, fighters)
            .context("update fighter table")?;

        Ok(UpdateOutcome {
            new_fight_rows: fights.len() - old_rows,
            fights,
            fighters,
            new_events,
            new_fighters,
        })
    }
}

pub fn listing_url(base_url: &str) -> anyhow::Result<Url> {
    let base = Url::parse(base_url).context("parse --base-url")?;
    if base.scheme() != "http" && base.scheme() != "https" {
        anyhow::bail!("--base-url must be http/https: {base}");
    }
    base.join(EVENTS_PATH).context("build events listing url")
}

pub fn run(args: UpdateArgs) -> anyhow::Result<()> {
    let data_dir = PathBuf::from(&args.data_dir);
    let fights_path = data_dir.join(FIGHT_STATS_FILE);
    let fighters_path = data_dir.join(FIGHTER_STATS_FILE);

    let listing = listing_url(&args.base_url)?;
    let policy = RetryPolicy::new(args.retries, args.backoff_factor);
    let fetcher = HttpFetcher::new(policy, Duration::from_secs(args.timeout_secs))?;
    let scraper = Scraper::new(fetcher);

    let fights = load_fights(&fights_path).context("load fight table")?;
    let fighters = load_fighters(&fighters_path).context("load fighter table")?;
    tracing::debug!(
        fight_rows = fights.len(),
        fighters = fighters.rows.len(),
        "loaded tables"
    );

    // Nothing is written unless both tables were rebuilt.
    let outcome = scraper.update(listing.as_str(), fights, fighters)?;

    write_fights(&fights_path, &outcome.fights)?;
    write_fighters(&fighters_path, &outcome.fighters)?;

    tracing::info!(
        new_events = outcome.new_events.len(),
        new_fight_rows = outcome.new_fight_rows,
        new_fighters = outcome.new_fighters,
        fights = %fights_path.display(),
        fighters = %fighters_path.display(),
        "update complete"
    );
    Ok(())
}
