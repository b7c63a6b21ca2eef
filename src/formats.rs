use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExtractError;

/// Column order of `fight_stats.csv`.
pub const FIGHT_COLUMNS: [&str; 37] = [
    "date",
    "fight_url",
    "event_url",
    "result",
    "last_5_comps_per_event",
    "fighter",
    "opponent",
    "division",
    "method",
    "round",
    "time",
    "fighter_url",
    "opponent_url",
    "referee",
    "time_format",
    "knockdowns",
    "sub_attempts",
    "reversals",
    "control",
    "takedowns_landed",
    "takedowns_attempts",
    "sig_strikes_landed",
    "sig_strikes_attempts",
    "total_strikes_landed",
    "total_strikes_attempts",
    "head_strikes_landed",
    "head_strikes_attempts",
    "body_strikes_landed",
    "body_strikes_attempts",
    "leg_strikes_landed",
    "leg_strikes_attempts",
    "distance_strikes_landed",
    "distance_strikes_attempts",
    "clinch_strikes_landed",
    "clinch_strikes_attempts",
    "ground_strikes_landed",
    "ground_strikes_attempts",
];

/// Default column order of `fighter_stats.csv`. The stat-box columns between
/// `url` and `num_fights` follow whatever labels the site publishes.
pub const FIGHTER_COLUMNS: [&str; 15] = [
    "name",
    "height",
    "reach",
    "stance",
    "dob",
    "url",
    "SLpM",
    "Str_Acc",
    "SApM",
    "Str_Def",
    "TD_Avg",
    "TD_Acc",
    "TD_Def",
    "Sub_Avg",
    "num_fights",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FightResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "D")]
    Draw,
}

/// One row per fighter per fight; a fight always yields two mirrored rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightRecord {
    pub date: String,
    pub fight_url: String,
    pub event_url: String,
    pub result: FightResult,
    #[serde(deserialize_with = "flag")]
    pub last_5_comps_per_event: u8,
    pub fighter: String,
    pub opponent: String,
    pub division: String,
    pub method: String,
    pub round: String,
    pub time: String,
    pub fighter_url: String,
    pub opponent_url: String,
    pub referee: Option<String>,
    pub time_format: Option<String>,
    #[serde(deserialize_with = "count")]
    pub knockdowns: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub sub_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub reversals: Option<i64>,
    pub control: Option<String>,
    #[serde(deserialize_with = "count")]
    pub takedowns_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub takedowns_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub sig_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub sig_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub total_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub total_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub head_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub head_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub body_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub body_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub leg_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub leg_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub distance_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub distance_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub clinch_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub clinch_strikes_attempts: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub ground_strikes_landed: Option<i64>,
    #[serde(deserialize_with = "count")]
    pub ground_strikes_attempts: Option<i64>,
}

/// A `"<landed> of <attempted>"` statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attempts {
    pub landed: i64,
    pub attempted: i64,
}

/// Detailed statistics for one fighter in one bout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FightStatLine {
    pub fighter: String,
    pub referee: String,
    pub time_format: String,
    pub knockdowns: i64,
    pub sub_attempts: i64,
    pub reversals: i64,
    pub control: String,
    pub takedowns: Attempts,
    pub sig_strikes: Attempts,
    pub total_strikes: Attempts,
    pub head_strikes: Attempts,
    pub body_strikes: Attempts,
    pub leg_strikes: Attempts,
    pub distance_strikes: Attempts,
    pub clinch_strikes: Attempts,
    pub ground_strikes: Attempts,
}

impl FightRecord {
    pub fn apply_stats(&mut self, stats: &FightStatLine) {
        self.referee = Some(stats.referee.clone());
        self.time_format = Some(stats.time_format.clone());
        self.knockdowns = Some(stats.knockdowns);
        self.sub_attempts = Some(stats.sub_attempts);
        self.reversals = Some(stats.reversals);
        self.control = Some(stats.control.clone());
        (self.takedowns_landed, self.takedowns_attempts) = split(stats.takedowns);
        (self.sig_strikes_landed, self.sig_strikes_attempts) = split(stats.sig_strikes);
        (self.total_strikes_landed, self.total_strikes_attempts) = split(stats.total_strikes);
        (self.head_strikes_landed, self.head_strikes_attempts) = split(stats.head_strikes);
        (self.body_strikes_landed, self.body_strikes_attempts) = split(stats.body_strikes);
        (self.leg_strikes_landed, self.leg_strikes_attempts) = split(stats.leg_strikes);
        (self.distance_strikes_landed, self.distance_strikes_attempts) =
            split(stats.distance_strikes);
        (self.clinch_strikes_landed, self.clinch_strikes_attempts) = split(stats.clinch_strikes);
        (self.ground_strikes_landed, self.ground_strikes_attempts) = split(stats.ground_strikes);
    }
}

fn split(attempts: Attempts) -> (Option<i64>, Option<i64>) {
    (Some(attempts.landed), Some(attempts.attempted))
}

/// Biographical and career attributes of one fighter, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FighterRecord {
    pub name: String,
    pub height: String,
    pub reach: String,
    pub stance: String,
    pub dob: String,
    pub url: String,
    /// Career stat box, in published order. Labels are normalized column
    /// names such as `SLpM` or `Str_Acc`.
    pub stats: Vec<(String, String)>,
    pub num_fights: u32,
}

impl FighterRecord {
    /// Cell value for a column of the fighter table.
    pub fn column(&self, column: &str) -> String {
        match column {
            "name" => self.name.clone(),
            "height" => self.height.clone(),
            "reach" => self.reach.clone(),
            "stance" => self.stance.clone(),
            "dob" => self.dob.clone(),
            "url" => self.url.clone(),
            "num_fights" => self.num_fights.to_string(),
            label => self
                .stats
                .iter()
                .find(|(key, _)| key == label)
                .map(|(_, value)| value.clone())
                .unwrap_or_default(),
        }
    }
}

/// Integer text as written by this tool or by dataframe tools, which print
/// integral columns holding nulls as floats (`"3.0"`).
pub fn parse_count(field: &str, value: &str) -> Result<i64, ExtractError> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(ExtractError::coercion(field, value)),
    }
}

fn count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_count("count", value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn flag<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "True" | "true" => Ok(1),
        "False" | "false" | "" => Ok(0),
        value => match parse_count("last_5_comps_per_event", value) {
            Ok(0) => Ok(0),
            Ok(_) => Ok(1),
            Err(err) => Err(serde::de::Error::custom(err)),
        },
    }
}
