use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::Writer;
use tracing::info;

use crate::records::{MatchColumn, MergedRecord, MergedTable, day_name};

pub const DEFAULT_OUTPUT: &str = "matches_perf_cleaned.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DERIVED_HEADERS: &[&str] = &[
    "Match_Date",
    "Capacity",
    "Day_of_Week",
    "Is_Weekend",
    "Season",
    "Position",
    "Played",
    "Won",
    "Drawn",
    "Lost",
    "Goals_For",
    "Goals_Against",
    "Goal_Difference",
    "Points",
    "Season_End_Year",
    "Capacity_Fill_Rate",
];

pub fn merged_headers(table: &MergedTable) -> Vec<String> {
    table
        .columns
        .iter()
        .map(|c| c.name().to_string())
        .chain(DERIVED_HEADERS.iter().map(|h| h.to_string()))
        .collect()
}

pub fn merged_row(columns: &[MatchColumn], row: &MergedRecord) -> Vec<String> {
    let mut out = Vec::with_capacity(columns.len() + DERIVED_HEADERS.len());
    for column in columns {
        out.push(match column {
            MatchColumn::Date => row.date_raw.clone(),
            MatchColumn::Stadium => row.stadium.clone(),
            MatchColumn::HomeTeam => row.home_team.clone(),
            MatchColumn::Score => row.score.clone(),
            MatchColumn::Attendance => opt_to_string(row.attendance),
            MatchColumn::Extra { index, .. } => row.extra.get(*index).cloned().unwrap_or_default(),
        });
    }

    let perf = row.performance;
    out.extend([
        row.match_date.date().format("%Y-%m-%d").to_string(),
        opt_to_string(row.capacity),
        day_name(row.day_of_week).to_string(),
        if row.is_weekend { "1" } else { "0" }.to_string(),
        row.season.to_string(),
        opt_to_string(perf.map(|p| p.position)),
        opt_to_string(perf.map(|p| p.played)),
        opt_to_string(perf.map(|p| p.won)),
        opt_to_string(perf.map(|p| p.drawn)),
        opt_to_string(perf.map(|p| p.lost)),
        opt_to_string(perf.map(|p| p.goals_for)),
        opt_to_string(perf.map(|p| p.goals_against)),
        opt_to_string(perf.map(|p| p.goal_difference)),
        opt_to_string(perf.map(|p| p.points)),
        opt_to_string(row.season_end_year),
        opt_to_string(row.capacity_fill_rate),
    ]);
    out
}

/// Write the merged table as UTF-8 CSV with a BOM. The file is written next
/// to `path` and swapped in, so a failed run leaves any previous file intact.
pub fn write_merged_csv(path: &Path, table: &MergedTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    write_csv_to(&tmp, table).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap output into {}", path.display()))?;
    info!(path = %path.display(), rows = table.len(), "wrote merged table");
    Ok(())
}

fn write_csv_to(path: &Path, table: &MergedTable) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = Writer::from_writer(file);
    writer.write_record(merged_headers(table))?;
    for row in &table.rows {
        writer.write_record(merged_row(&table.columns, row))?;
    }
    let mut file = writer.into_inner().map_err(|err| err.into_error())?;
    file.flush()?;
    Ok(())
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
