use scraper::Html;

use crate::error::ExtractError;
use crate::html::{href, selector};

/// Completed event URLs, newest first.
///
/// The listing always leads with the upcoming (or in-progress) event, so the
/// first anchor is dropped.
pub fn extract_event_urls(document: &Html, url: &str) -> Result<Vec<String>, ExtractError> {
    let tbody = selector("tbody")?;
    let anchor = selector("a")?;

    let table = document
        .select(&tbody)
        .next()
        .ok_or_else(|| ExtractError::missing("events table (tbody)", url))?;

    Ok(table
        .select(&anchor)
        .skip(1)
        .filter_map(href)
        .collect())
}
