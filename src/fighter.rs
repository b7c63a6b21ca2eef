use scraper::Html;

use crate::error::ExtractError;
use crate::formats::FighterRecord;
use crate::html::{selector, text};

/// Fields read from the first attribute box by position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileAttributes {
    pub height: String,
    pub reach: String,
    pub stance: String,
    pub dob: String,
}

/// Maps the first attribute box onto named fields.
///
/// The box has no usable labels, so this leans on its fixed layout: height,
/// weight (dropped, it only echoes the last division fought in), reach,
/// stance, then date of birth. A layout change on the site only needs an edit
/// here.
pub fn positional_attributes(values: &[String]) -> ProfileAttributes {
    let mut attributes = ProfileAttributes::default();
    let mut dob = Vec::new();
    for (position, value) in values.iter().enumerate() {
        match position {
            0 => attributes.height = value.clone(),
            1 => {}
            2 => attributes.reach = value.clone(),
            3 => attributes.stance = value.clone(),
            _ => dob.push(value.as_str()),
        }
    }
    attributes.dob = dob.join(" ");
    attributes
}

/// `"Str. Acc."` becomes `"Str_Acc"`.
pub fn normalize_stat_label(label: &str) -> String {
    label.trim().replace('.', "").replace(' ', "_")
}

pub fn normalize_stat_value(value: &str) -> String {
    value.trim().replace('%', "")
}

pub fn extract_fighter(document: &Html, url: &str) -> Result<FighterRecord, ExtractError> {
    let name = document
        .select(&selector("span.b-content__title-highlight")?)
        .next()
        .map(text)
        .ok_or_else(|| ExtractError::missing("fighter name", url))?;

    let li = selector("li")?;

    let attribute_box = document
        .select(&selector(
            "div.b-list__info-box.b-list__info-box_style_small-width",
        )?)
        .next()
        .ok_or_else(|| ExtractError::missing("fighter attribute box", url))?;
    let values = attribute_box
        .select(&li)
        .map(|item| {
            text(item)
                .rsplit(':')
                .next()
                .unwrap_or_default()
                .trim()
                .to_owned()
        })
        .collect::<Vec<_>>();
    let ProfileAttributes {
        height,
        reach,
        stance,
        dob,
    } = positional_attributes(&values);

    let mut stats: Vec<(String, String)> = Vec::new();
    let career_box = document
        .select(&selector(
            "div.b-list__info-box.b-list__info-box_style_middle-width",
        )?)
        .next();
    if let Some(career_box) = career_box {
        for item in career_box.select(&li) {
            let line = text(item);
            let mut parts = line.split(':');
            let (Some(label), Some(value)) = (parts.next(), parts.next()) else {
                // Spacer items carry only line breaks.
                continue;
            };
            let label = normalize_stat_label(label);
            if label.is_empty() || stats.iter().any(|(key, _)| *key == label) {
                continue;
            }
            stats.push((label, normalize_stat_value(value)));
        }
    }

    let num_fights = document
        .select(&selector(r#"a[href*="/event-details/"]"#)?)
        .count();

    Ok(FighterRecord {
        name,
        height,
        reach,
        stance,
        dob,
        url: url.to_owned(),
        stats,
        num_fights: u32::try_from(num_fights).unwrap_or(u32::MAX),
    })
}
