use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::loader::RawTable;
use crate::pipeline::PipelineConfig;
use crate::records::{
    MatchColumn, MatchRecord, MatchTable, PerformanceRecord, PerformanceStats, StadiumRecord,
};
use crate::season::Season;

static NON_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\D+").expect("non-digit pattern is valid"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// Slash dates are read month-first before day-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A %d %B %Y",
    "%a %d %b %Y",
];

/// Canonical join key: lowercase, `&` spelled out, hyphens as spaces, outer
/// whitespace trimmed.
///
/// Trimming runs last so a leading or trailing hyphen cannot leave
/// whitespace behind, which keeps `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    raw.to_lowercase()
        .replace('&', "and")
        .replace('-', " ")
        .trim()
        .to_string()
}

/// Collapse every run of non-digits into a single `:` and strip outer colons.
///
/// Repairs separators mangled by a bad encoding round trip (`"2â€“1"` becomes
/// `"2:1"`). Anything that is not a digit is treated as a separator, so
/// embedded team abbreviations are not recognised.
pub fn repair_score(raw: &str) -> String {
    NON_DIGITS.replace_all(raw, ":").trim_matches(':').to_string()
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parse a headcount-like cell ("52,305", " 41000 ", "41000.0").
pub fn parse_count(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_capacity(raw: &str) -> Option<u32> {
    let value = parse_count(raw)?;
    if value < 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value.round() as u32)
}

fn parse_int(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i32>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return None;
    }
    Some(v as i32)
}

pub fn in_covid_window(dt: NaiveDateTime, cfg: &PipelineConfig) -> bool {
    dt >= cfg.covid_start && dt <= cfg.covid_end
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchNormalizeReport {
    pub rows_in: usize,
    pub unparsed_dates: usize,
    pub covid_window: usize,
    pub missing_attendance: usize,
    pub rows_out: usize,
}

pub fn normalize_matches(
    raw: &RawTable,
    cfg: &PipelineConfig,
) -> Result<(MatchTable, MatchNormalizeReport)> {
    let date_col = raw.require_column("Date")?;
    let stadium_col = raw
        .column("Venue")
        .or_else(|| raw.column("Stadium"))
        .ok_or_else(|| anyhow!("missing required column \"Venue\""))?;
    let home_col = raw.require_column("Home_Team")?;
    let score_col = raw.require_column("Score")?;
    let attendance_col = raw.require_column("Attendance")?;

    let mut columns = Vec::with_capacity(raw.headers.len());
    let mut extra_cols = Vec::new();
    for (idx, name) in raw.headers.iter().enumerate() {
        let column = if idx == date_col {
            MatchColumn::Date
        } else if idx == stadium_col {
            MatchColumn::Stadium
        } else if idx == home_col {
            MatchColumn::HomeTeam
        } else if idx == score_col {
            MatchColumn::Score
        } else if idx == attendance_col {
            MatchColumn::Attendance
        } else {
            let column = MatchColumn::Extra {
                name: name.clone(),
                index: extra_cols.len(),
            };
            extra_cols.push(idx);
            column
        };
        columns.push(column);
    }

    let mut report = MatchNormalizeReport {
        rows_in: raw.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(raw.len());

    for row in &raw.rows {
        let cell = move |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let Some(match_date) = parse_match_date(cell(date_col)) else {
            report.unparsed_dates += 1;
            continue;
        };
        if in_covid_window(match_date, cfg) {
            report.covid_window += 1;
            continue;
        }

        let attendance = parse_count(cell(attendance_col));
        if attendance.is_none() {
            report.missing_attendance += 1;
        }

        rows.push(MatchRecord {
            date_raw: cell(date_col).to_string(),
            match_date,
            home_team: cfg.aliases.resolve_team(&clean_text(cell(home_col))),
            stadium: clean_text(cell(stadium_col)),
            score: repair_score(cell(score_col)),
            attendance,
            extra: extra_cols.iter().map(|idx| cell(*idx).to_string()).collect(),
        });
    }

    report.rows_out = rows.len();
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        unparsed_dates = report.unparsed_dates,
        covid_window = report.covid_window,
        missing_attendance = report.missing_attendance,
        "normalized matches"
    );
    Ok((MatchTable { columns, rows }, report))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StadiumNormalizeReport {
    pub rows_in: usize,
    pub outside_country: usize,
    pub renamed: usize,
    pub missing_capacity: usize,
    pub rows_out: usize,
}

/// Stadiums located in the configured country, keyed by canonical name.
/// Duplicates are kept here; the merge collapses them.
pub fn normalize_stadiums(
    raw: &RawTable,
    cfg: &PipelineConfig,
) -> Result<(Vec<StadiumRecord>, StadiumNormalizeReport)> {
    let country_col = raw.require_column("Country")?;
    let stadium_col = raw.require_column("Stadium")?;
    let capacity_col = raw.require_column("Capacity")?;
    let wanted = cfg.country.to_lowercase();

    let mut report = StadiumNormalizeReport {
        rows_in: raw.len(),
        ..Default::default()
    };
    let mut out = Vec::new();

    for row in &raw.rows {
        let cell = move |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let country = cell(country_col);
        if country.is_empty() || !country.to_lowercase().contains(&wanted) {
            report.outside_country += 1;
            continue;
        }

        let raw_name = cell(stadium_col);
        let renamed = cfg.aliases.rename_stadium(raw_name);
        if renamed != raw_name {
            report.renamed += 1;
        }

        let capacity = parse_capacity(cell(capacity_col));
        if capacity.is_none() {
            report.missing_capacity += 1;
        }

        out.push(StadiumRecord {
            stadium: clean_text(renamed),
            country: country.to_string(),
            capacity,
        });
    }

    report.rows_out = out.len();
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        outside_country = report.outside_country,
        renamed = report.renamed,
        "normalized stadiums"
    );
    Ok((out, report))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceNormalizeReport {
    pub rows_in: usize,
    pub unparsed_season: usize,
    pub before_min_season: usize,
    pub rows_out: usize,
}

pub fn normalize_performance(
    raw: &RawTable,
    cfg: &PipelineConfig,
) -> Result<(Vec<PerformanceRecord>, PerformanceNormalizeReport)> {
    let team_col = raw.require_column("team")?;
    let season_col = raw.require_column("season_end_year")?;
    let stat_cols = [
        "position", "played", "won", "drawn", "lost", "gf", "ga", "gd", "points",
    ]
    .iter()
    .map(|name| raw.require_column(name).map(|idx| (*name, idx)))
    .collect::<Result<Vec<_>>>()?;

    let mut report = PerformanceNormalizeReport {
        rows_in: raw.len(),
        ..Default::default()
    };
    let mut out = Vec::new();

    for (row_idx, row) in raw.rows.iter().enumerate() {
        let cell = move |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let Some(season_end_year) = parse_int(cell(season_col)) else {
            report.unparsed_season += 1;
            continue;
        };
        if season_end_year < cfg.min_season_end_year {
            report.before_min_season += 1;
            continue;
        }

        let mut values = [0i32; 9];
        for (slot, (name, idx)) in values.iter_mut().zip(&stat_cols) {
            *slot = parse_int(cell(*idx)).with_context(|| {
                format!(
                    "performance row {}: column {name:?} is not an integer: {:?}",
                    row_idx + 1,
                    cell(*idx)
                )
            })?;
        }
        let [
            position,
            played,
            won,
            drawn,
            lost,
            goals_for,
            goals_against,
            goal_difference,
            points,
        ] = values;

        out.push(PerformanceRecord {
            team: cfg.aliases.resolve_team(&clean_text(cell(team_col))),
            season_end_year,
            season: Season::from_end_year(season_end_year),
            stats: PerformanceStats {
                position,
                played,
                won,
                drawn,
                lost,
                goals_for,
                goals_against,
                goal_difference,
                points,
            },
        });
    }

    report.rows_out = out.len();
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        min_season_end_year = cfg.min_season_end_year,
        "normalized performance"
    );
    Ok((out, report))
}
