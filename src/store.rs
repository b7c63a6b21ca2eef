use std::io::Write;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::{FIGHT_COLUMNS, FIGHTER_COLUMNS, FightRecord, FighterRecord, parse_count};

pub const FIGHT_STATS_FILE: &str = "fight_stats.csv";
pub const FIGHTER_STATS_FILE: &str = "fighter_stats.csv";

/// The fighter roster together with its column order.
///
/// Stat-box labels are dynamic, so the column list is carried alongside the
/// rows instead of being fixed by a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FighterTable {
    pub columns: Vec<String>,
    pub rows: Vec<FighterRecord>,
}

impl Default for FighterTable {
    fn default() -> Self {
        Self {
            columns: FIGHTER_COLUMNS.iter().map(|c| (*c).to_owned()).collect(),
            rows: Vec::new(),
        }
    }
}

impl FighterTable {
    /// Adds columns for stat labels this table has not seen yet, keeping
    /// `num_fights` last.
    pub fn add_columns_for(&mut self, record: &FighterRecord) {
        for (label, _) in &record.stats {
            if self.columns.iter().any(|column| column == label) {
                continue;
            }
            let at = self
                .columns
                .iter()
                .position(|column| column == "num_fights")
                .unwrap_or(self.columns.len());
            self.columns.insert(at, label.clone());
        }
    }

    /// Puts `new_rows` ahead of the existing rows.
    pub fn prepend(&mut self, new_rows: Vec<FighterRecord>) {
        for row in &new_rows {
            self.add_columns_for(row);
        }
        let old_rows = std::mem::take(&mut self.rows);
        self.rows = new_rows;
        self.rows.extend(old_rows);
    }
}

/// Persisted fight rows, or an empty table when the file does not exist yet.
pub fn load_fights(path: &Path) -> anyhow::Result<Vec<FightRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open fight table: {}", path.display()))?;
    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<FightRecord>().enumerate() {
        let record = record.with_context(|| {
            format!("parse fight table row {}: {}", index + 1, path.display())
        })?;
        rows.push(record);
    }
    Ok(rows)
}

pub fn write_fights(path: &Path, rows: &[FightRecord]) -> anyhow::Result<()> {
    write_atomically(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer
            .write_record(FIGHT_COLUMNS)
            .context("write fight table header")?;
        for row in rows {
            writer.serialize(row).context("write fight table row")?;
        }
        writer.flush().context("flush fight table")?;
        Ok(())
    })
    .with_context(|| format!("write fight table: {}", path.display()))
}

/// Persisted fighter rows, or an empty table with the default columns.
pub fn load_fighters(path: &Path) -> anyhow::Result<FighterTable> {
    if !path.exists() {
        return Ok(FighterTable::default());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open fighter table: {}", path.display()))?;
    let columns = reader
        .headers()
        .with_context(|| format!("read fighter table header: {}", path.display()))?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    if columns.is_empty() {
        return Ok(FighterTable::default());
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("read fighter table row {}: {}", index + 1, path.display())
        })?;
        let mut fighter = FighterRecord::default();
        for (column, value) in columns.iter().zip(record.iter()) {
            match column.as_str() {
                "name" => fighter.name = value.to_owned(),
                "height" => fighter.height = value.to_owned(),
                "reach" => fighter.reach = value.to_owned(),
                "stance" => fighter.stance = value.to_owned(),
                "dob" => fighter.dob = value.to_owned(),
                "url" => fighter.url = value.to_owned(),
                "num_fights" => fighter.num_fights = parse_num_fights(value)?,
                label => fighter.stats.push((label.to_owned(), value.to_owned())),
            }
        }
        rows.push(fighter);
    }

    Ok(FighterTable { columns, rows })
}

fn parse_num_fights(value: &str) -> anyhow::Result<u32> {
    if value.trim().is_empty() {
        return Ok(0);
    }
    let count = parse_count("num_fights", value)?;
    u32::try_from(count).with_context(|| format!("num_fights out of range: {count}"))
}

pub fn write_fighters(path: &Path, table: &FighterTable) -> anyhow::Result<()> {
    write_atomically(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer
            .write_record(&table.columns)
            .context("write fighter table header")?;
        for row in &table.rows {
            writer
                .write_record(table.columns.iter().map(|column| row.column(column)))
                .context("write fighter table row")?;
        }
        writer.flush().context("flush fighter table")?;
        Ok(())
    })
    .with_context(|| format!("write fighter table: {}", path.display()))
}

/// Writes into a sibling temp file and renames it over `path`, so readers
/// never observe a half-written table.
fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut std::fs::File) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create data dir: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut().flush().context("flush temp file")?;
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
