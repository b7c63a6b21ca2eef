use scraper::Html;

use crate::error::ExtractError;
use crate::formats::{FightRecord, FightResult, FightStatLine};
use crate::html::{href, paragraphs, selector, text};

/// Bouts flagged in `last_5_comps_per_event`, counted from the top of the card.
pub const RECENT_BOUTS_PER_EVENT: usize = 5;

// Cell positions in an event's bout table. 2..=5 hold per-bout summary
// counts that the fight page reports in more detail.
const CELL_RESULT: usize = 0;
const CELL_FIGHTERS: usize = 1;
const CELL_DIVISION: usize = 6;
const CELL_METHOD: usize = 7;
const CELL_ROUND: usize = 8;
const CELL_TIME: usize = 9;

/// One bout of a card: the fighter's row and the mirrored opponent's row.
#[derive(Debug, Clone, PartialEq)]
pub struct Bout {
    pub fight_url: String,
    pub rows: [FightRecord; 2],
}

impl Bout {
    /// Left-joins per-fighter statistics onto the two rows by fighter name.
    pub fn join_stats(&mut self, lines: &[FightStatLine]) {
        for row in &mut self.rows {
            if let Some(line) = lines.iter().find(|line| line.fighter == row.fighter) {
                row.apply_stats(line);
            }
        }
    }

    pub fn into_rows(self) -> [FightRecord; 2] {
        self.rows
    }
}

/// Every bout listed on an event page, in listed (main event first) order,
/// without detailed statistics.
pub fn extract_bouts(document: &Html, event_url: &str) -> Result<Vec<Bout>, ExtractError> {
    let date_item = selector("li.b-list__box-list-item")?;
    let row = selector("tr.b-fight-details__table-row")?;
    let td = selector("td")?;
    let p = selector("p")?;
    let a = selector("a")?;

    let date = document
        .select(&date_item)
        .next()
        .map(|item| {
            text(item)
                .split('\n')
                .last()
                .unwrap_or_default()
                .trim()
                .to_owned()
        })
        .ok_or_else(|| ExtractError::missing("event date", event_url))?;

    let mut bouts = Vec::new();
    // The first row is the table header.
    for (index, tr) in document.select(&row).skip(1).enumerate() {
        let cells = tr.select(&td).collect::<Vec<_>>();
        if cells.len() <= CELL_TIME {
            return Err(ExtractError::missing("bout row cells", event_url));
        }

        let fight_url = cells[CELL_RESULT]
            .select(&a)
            .next()
            .and_then(href)
            .ok_or_else(|| ExtractError::missing("bout link", event_url))?;

        // A draw shows a marker for each fighter; otherwise the winner is
        // listed first.
        let (first_result, second_result) = if cells[CELL_RESULT].select(&p).count() == 2 {
            (FightResult::Draw, FightResult::Draw)
        } else {
            (FightResult::Win, FightResult::Loss)
        };

        let names = paragraphs(cells[CELL_FIGHTERS], &p);
        let links = cells[CELL_FIGHTERS]
            .select(&a)
            .filter_map(href)
            .collect::<Vec<_>>();
        let (Some(fighter), Some(opponent)) = (names.first(), names.get(1)) else {
            return Err(ExtractError::missing("fighter names", event_url));
        };
        let (Some(fighter_url), Some(opponent_url)) = (links.first(), links.get(1)) else {
            return Err(ExtractError::missing("fighter links", event_url));
        };

        let first_p = |cell: usize| {
            cells[cell]
                .select(&p)
                .next()
                .map(text)
                .ok_or_else(|| ExtractError::missing("bout detail cell", event_url))
        };
        let division = first_p(CELL_DIVISION)?;
        let method = first_p(CELL_METHOD)?;
        let round = first_p(CELL_ROUND)?;
        let time = first_p(CELL_TIME)?;

        let recent = u8::from(index < RECENT_BOUTS_PER_EVENT);
        let row_for = |result: FightResult,
                       fighter: &str,
                       fighter_url: &str,
                       opponent: &str,
                       opponent_url: &str| {
            FightRecord {
                date: date.clone(),
                fight_url: fight_url.clone(),
                event_url: event_url.to_owned(),
                result,
                last_5_comps_per_event: recent,
                fighter: fighter.to_owned(),
                opponent: opponent.to_owned(),
                division: division.clone(),
                method: method.clone(),
                round: round.clone(),
                time: time.clone(),
                fighter_url: fighter_url.to_owned(),
                opponent_url: opponent_url.to_owned(),
                referee: None,
                time_format: None,
                knockdowns: None,
                sub_attempts: None,
                reversals: None,
                control: None,
                takedowns_landed: None,
                takedowns_attempts: None,
                sig_strikes_landed: None,
                sig_strikes_attempts: None,
                total_strikes_landed: None,
                total_strikes_attempts: None,
                head_strikes_landed: None,
                head_strikes_attempts: None,
                body_strikes_landed: None,
                body_strikes_attempts: None,
                leg_strikes_landed: None,
                leg_strikes_attempts: None,
                distance_strikes_landed: None,
                distance_strikes_attempts: None,
                clinch_strikes_landed: None,
                clinch_strikes_attempts: None,
                ground_strikes_landed: None,
                ground_strikes_attempts: None,
            }
        };

        bouts.push(Bout {
            fight_url: fight_url.clone(),
            rows: [
                row_for(first_result, fighter, fighter_url, opponent, opponent_url),
                row_for(second_result, opponent, opponent_url, fighter, fighter_url),
            ],
        });
    }

    Ok(bouts)
}
