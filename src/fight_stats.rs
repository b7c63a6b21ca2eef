use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;
use crate::formats::{Attempts, FightStatLine, parse_count};
use crate::html::{find_next, paragraphs, selector, text};

// Column positions in the per-fight "Totals" table. 3 and 6 are percentages.
const TOTALS_FIGHTER: usize = 0;
const TOTALS_KNOCKDOWNS: usize = 1;
const TOTALS_SIG_STRIKES: usize = 2;
const TOTALS_TOTAL_STRIKES: usize = 4;
const TOTALS_TAKEDOWNS: usize = 5;
const TOTALS_SUB_ATTEMPTS: usize = 7;
const TOTALS_REVERSALS: usize = 8;
const TOTALS_CONTROL: usize = 9;

// Column positions in the "Significant Strikes" table. 1 and 2 repeat the
// totals and are skipped.
const SIG_FIGHTER: usize = 0;
const SIG_HEAD: usize = 3;
const SIG_BODY: usize = 4;
const SIG_LEG: usize = 5;
const SIG_DISTANCE: usize = 6;
const SIG_CLINCH: usize = 7;
const SIG_GROUND: usize = 8;

/// Splits `"<landed> of <attempted>"` into its two counts.
pub fn parse_attempts(field: &str, value: &str) -> Result<Attempts, ExtractError> {
    let parts = value.trim().split(" of ").collect::<Vec<_>>();
    let [landed, attempted] = parts.as_slice() else {
        return Err(ExtractError::coercion(field, value));
    };
    let landed = landed
        .trim()
        .parse::<i64>()
        .map_err(|_| ExtractError::coercion(field, value))?;
    let attempted = attempted
        .trim()
        .parse::<i64>()
        .map_err(|_| ExtractError::coercion(field, value))?;
    Ok(Attempts { landed, attempted })
}

/// `"Time format: 3 Rnd (5-5-5)"` becomes `"5-5-5"`; without a parenthesized
/// clause the last word is kept, `"Limit"` standing for "No Time Limit".
pub fn normalize_time_format(raw: &str) -> String {
    if let Some((_, after)) = raw.split_once('(') {
        return after.split(')').next().unwrap_or_default().trim().to_owned();
    }
    match raw.split_whitespace().last() {
        Some("Limit") => "No Time Limit".to_owned(),
        Some(last) => last.to_owned(),
        None => String::new(),
    }
}

/// Per-fighter statistics of one bout.
///
/// `Ok(None)` means the page carries no statistics table at all, which is how
/// the site renders cancelled or not-yet-entered bouts.
pub fn extract_fight_stats(
    document: &Html,
    url: &str,
) -> Result<Option<Vec<FightStatLine>>, ExtractError> {
    let table_body = selector("tbody.b-fight-details__table-body")?;
    let Some(totals) = document.select(&table_body).next() else {
        return Ok(None);
    };

    let referee = document
        .select(&selector(
            "i.b-fight-details__text-item:nth-child(5) > span:nth-child(2)",
        )?)
        .next()
        .map(text)
        .unwrap_or_default();
    let time_format = document
        .select(&selector("i.b-fight-details__text-item:nth-child(4)")?)
        .next()
        .map(|item| normalize_time_format(&text(item)))
        .unwrap_or_default();

    let col = selector("td.b-fight-details__table-col")?;
    let p = selector("p")?;

    let totals = table_columns(totals, &col, &p);
    if totals.len() <= TOTALS_CONTROL {
        return Err(ExtractError::missing("totals table columns", url));
    }
    if totals[TOTALS_FIGHTER].is_empty() {
        return Err(ExtractError::missing("fighter rows in totals table", url));
    }

    let collapse_link = selector("p.b-fight-details__collapse-link_tot")?;
    let sig_heading = document
        .select(&collapse_link)
        .find(|heading| text(*heading).contains("Significant Strikes"))
        .ok_or_else(|| ExtractError::missing("significant strikes heading", url))?;
    let sig_body = find_next(document, sig_heading, &table_body)
        .ok_or_else(|| ExtractError::missing("significant strikes table", url))?;
    let sig = table_columns(sig_body, &col, &p);
    if sig.len() <= SIG_GROUND {
        return Err(ExtractError::missing("significant strikes table columns", url));
    }

    let mut lines = Vec::with_capacity(2);
    for (row, fighter) in totals[TOTALS_FIGHTER].iter().enumerate() {
        let cell = |index: usize| cell_at(&totals, index, row, url);
        let sig_row = sig[SIG_FIGHTER]
            .iter()
            .position(|name| name == fighter)
            .ok_or_else(|| ExtractError::missing("significant strikes row for fighter", url))?;
        let sig_cell = |index: usize| cell_at(&sig, index, sig_row, url);

        lines.push(FightStatLine {
            fighter: fighter.clone(),
            referee: referee.clone(),
            time_format: time_format.clone(),
            knockdowns: parse_count("knockdowns", cell(TOTALS_KNOCKDOWNS)?)?,
            sub_attempts: parse_count("sub_attempts", cell(TOTALS_SUB_ATTEMPTS)?)?,
            reversals: parse_count("reversals", cell(TOTALS_REVERSALS)?)?,
            control: cell(TOTALS_CONTROL)?.to_owned(),
            takedowns: parse_attempts("takedowns", cell(TOTALS_TAKEDOWNS)?)?,
            sig_strikes: parse_attempts("sig_strikes", cell(TOTALS_SIG_STRIKES)?)?,
            total_strikes: parse_attempts("total_strikes", cell(TOTALS_TOTAL_STRIKES)?)?,
            head_strikes: parse_attempts("head_strikes", sig_cell(SIG_HEAD)?)?,
            body_strikes: parse_attempts("body_strikes", sig_cell(SIG_BODY)?)?,
            leg_strikes: parse_attempts("leg_strikes", sig_cell(SIG_LEG)?)?,
            distance_strikes: parse_attempts("distance_strikes", sig_cell(SIG_DISTANCE)?)?,
            clinch_strikes: parse_attempts("clinch_strikes", sig_cell(SIG_CLINCH)?)?,
            ground_strikes: parse_attempts("ground_strikes", sig_cell(SIG_GROUND)?)?,
        });
    }

    Ok(Some(lines))
}

/// Each stats cell stacks one `p` per fighter; returns `columns[col][fighter]`.
fn table_columns(body: ElementRef<'_>, col: &Selector, p: &Selector) -> Vec<Vec<String>> {
    body.select(col).map(|td| paragraphs(td, p)).collect()
}

fn cell_at<'a>(
    columns: &'a [Vec<String>],
    index: usize,
    row: usize,
    url: &str,
) -> Result<&'a str, ExtractError> {
    columns
        .get(index)
        .and_then(|column| column.get(row))
        .map(String::as_str)
        .ok_or_else(|| ExtractError::missing("statistics cell", url))
}
