use std::collections::{BTreeSet, HashMap};

use chrono::Weekday;
use tracing::{debug, info, warn};

use crate::pipeline::PipelineConfig;
use crate::records::{
    MatchRecord, MatchTable, MergedRecord, MergedTable, PerformanceRecord, PerformanceStats,
    StadiumRecord, is_weekend,
};
use crate::season::Season;

/// A match row between the joins and final rounding. Numeric fields stay
/// fractional until [`finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub record: MatchRecord,
    pub capacity: Option<f64>,
    pub day_of_week: Weekday,
    pub is_weekend: bool,
    pub season: Season,
    pub performance: Option<(i32, PerformanceStats)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MergeReport {
    pub rows: usize,
    pub stadium_misses: usize,
    pub performance_misses: usize,
    pub duplicate_performance_keys: usize,
    pub attendance_group_filled: usize,
    pub attendance_left_null: usize,
    pub capacity_median: Option<f64>,
    pub capacity_median_filled: usize,
}

/// Run both joins and both imputation passes. Never drops a row.
pub fn merge(
    matches: MatchTable,
    stadiums: &[StadiumRecord],
    performance: &[PerformanceRecord],
    cfg: &PipelineConfig,
) -> (MergedTable, MergeReport) {
    let MatchTable { columns, rows } = matches;
    let mut report = MergeReport {
        rows: rows.len(),
        ..Default::default()
    };

    let capacities = dedup_stadiums(stadiums);
    let mut joined = join_stadiums(rows, &capacities, cfg.season_start_month);
    report.stadium_misses = joined.iter().filter(|r| r.capacity.is_none()).count();

    let (index, duplicates) = index_performance(performance);
    report.duplicate_performance_keys = duplicates;
    report.performance_misses = join_performance(&mut joined, &index);

    let attendance = impute_attendance_by_group(&mut joined);
    report.attendance_group_filled = attendance.filled;
    report.attendance_left_null = attendance.left_null;

    let capacity = impute_capacity_with_median(&mut joined);
    report.capacity_median = capacity.median;
    report.capacity_median_filled = capacity.filled;

    let rows = finalize(joined);
    debug_assert_eq!(rows.len(), report.rows);

    info!(
        rows = report.rows,
        stadium_misses = report.stadium_misses,
        performance_misses = report.performance_misses,
        attendance_group_filled = report.attendance_group_filled,
        attendance_left_null = report.attendance_left_null,
        capacity_median_filled = report.capacity_median_filled,
        "merged tables"
    );
    (MergedTable { columns, rows }, report)
}

/// Canonical stadium name to capacity; the first row for a name wins.
pub fn dedup_stadiums(stadiums: &[StadiumRecord]) -> HashMap<String, Option<u32>> {
    let mut out = HashMap::with_capacity(stadiums.len());
    for s in stadiums {
        out.entry(s.stadium.clone()).or_insert(s.capacity);
    }
    out
}

/// Left join on canonical stadium name, deriving the calendar fields on the
/// way. Unmatched rows keep a null capacity.
pub fn join_stadiums(
    rows: Vec<MatchRecord>,
    capacities: &HashMap<String, Option<u32>>,
    season_start_month: u32,
) -> Vec<JoinedRecord> {
    let mut unmatched = BTreeSet::new();
    let out: Vec<JoinedRecord> = rows
        .into_iter()
        .map(|record| {
            let capacity = match capacities.get(&record.stadium) {
                Some(capacity) => capacity.map(f64::from),
                None => {
                    unmatched.insert(record.stadium.clone());
                    None
                }
            };
            let day_of_week = record.day_of_week();
            let season = Season::from_match_date_with_start(record.date(), season_start_month);
            JoinedRecord {
                capacity,
                day_of_week,
                is_weekend: is_weekend(day_of_week),
                season,
                performance: None,
                record,
            }
        })
        .collect();
    for name in &unmatched {
        debug!(stadium = %name, "no stadium row for venue");
    }
    out
}

pub type PerformanceIndex<'a> = HashMap<(String, Season), &'a PerformanceRecord>;

/// Index league rows by (team, season). Returns the index and how many
/// duplicate keys were ignored.
pub fn index_performance(performance: &[PerformanceRecord]) -> (PerformanceIndex<'_>, usize) {
    let mut index: PerformanceIndex<'_> = HashMap::with_capacity(performance.len());
    let mut duplicates = 0usize;
    for row in performance {
        let key = (row.team.clone(), row.season);
        if index.contains_key(&key) {
            duplicates += 1;
            warn!(team = %row.team, season = %row.season, "duplicate performance row ignored");
            continue;
        }
        index.insert(key, row);
    }
    (index, duplicates)
}

/// Left join on (home team, season). Returns the number of rows without a
/// matching league row.
pub fn join_performance(rows: &mut [JoinedRecord], index: &PerformanceIndex<'_>) -> usize {
    let mut unmatched = BTreeSet::new();
    for row in rows.iter_mut() {
        let key = (row.record.home_team.clone(), row.season);
        match index.get(&key) {
            Some(perf) => row.performance = Some((perf.season_end_year, perf.stats)),
            None => {
                row.performance = None;
                unmatched.insert(key);
            }
        }
    }
    for (team, season) in &unmatched {
        debug!(team = %team, season = %season, "no performance row for home team");
    }
    rows.iter().filter(|r| r.performance.is_none()).count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceFill {
    pub filled: usize,
    pub left_null: usize,
}

/// Replace missing attendance with the mean of the same home side's other
/// matches that season. A group with no figures at all stays null.
pub fn impute_attendance_by_group(rows: &mut [JoinedRecord]) -> AttendanceFill {
    let mut groups: HashMap<(String, Season), (f64, usize)> = HashMap::new();
    for row in rows.iter() {
        if let Some(att) = row.record.attendance {
            let entry = groups
                .entry((row.record.home_team.clone(), row.season))
                .or_insert((0.0, 0));
            entry.0 += att;
            entry.1 += 1;
        }
    }

    let mut fill = AttendanceFill::default();
    for row in rows.iter_mut() {
        if row.record.attendance.is_some() {
            continue;
        }
        let key = (row.record.home_team.clone(), row.season);
        match groups.get(&key) {
            Some((sum, count)) if *count > 0 => {
                row.record.attendance = Some(sum / *count as f64);
                fill.filled += 1;
            }
            _ => fill.left_null += 1,
        }
    }
    if fill.left_null > 0 {
        warn!(
            rows = fill.left_null,
            "attendance left null: no figures for home side in that season"
        );
    }
    fill
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapacityFill {
    pub median: Option<f64>,
    pub filled: usize,
}

/// Replace missing capacity with the median over every row that has one.
pub fn impute_capacity_with_median(rows: &mut [JoinedRecord]) -> CapacityFill {
    let known = rows.iter().filter_map(|r| r.capacity).collect::<Vec<_>>();
    let median = median(known);
    let mut fill = CapacityFill {
        median,
        filled: 0,
    };
    let Some(value) = median else {
        if !rows.is_empty() {
            warn!("no match joined to a stadium; capacity left null");
        }
        return fill;
    };
    for row in rows.iter_mut().filter(|r| r.capacity.is_none()) {
        row.capacity = Some(value);
        fill.filled += 1;
    }
    fill
}

pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Nearest whole number, ties to even.
pub fn round_count(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// `attendance / capacity`, capped at 1.0. Undefined (0/0) is null.
pub fn capacity_fill_rate(attendance: Option<i64>, capacity: Option<i64>) -> Option<f64> {
    let (attendance, capacity) = (attendance?, capacity?);
    let ratio = attendance as f64 / capacity as f64;
    if ratio.is_nan() {
        return None;
    }
    Some(ratio.min(1.0))
}

/// Round the imputed counts and attach the fill rate.
pub fn finalize(rows: Vec<JoinedRecord>) -> Vec<MergedRecord> {
    rows.into_iter()
        .map(|row| {
            let attendance = row.record.attendance.map(round_count);
            let capacity = row.capacity.map(round_count);
            let (season_end_year, performance) = match row.performance {
                Some((year, stats)) => (Some(year), Some(stats)),
                None => (None, None),
            };
            MergedRecord {
                date_raw: row.record.date_raw,
                match_date: row.record.match_date,
                home_team: row.record.home_team,
                stadium: row.record.stadium,
                score: row.record.score,
                attendance,
                capacity,
                day_of_week: row.day_of_week,
                is_weekend: row.is_weekend,
                season: row.season,
                season_end_year,
                performance,
                capacity_fill_rate: capacity_fill_rate(attendance, capacity),
                extra: row.record.extra,
            }
        })
        .collect()
}
