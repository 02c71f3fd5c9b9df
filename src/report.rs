use std::cmp::Ordering;
use std::collections::HashMap;

use crate::merge::round_count;
use crate::records::{MergedRecord, MergedTable};

pub const DEFAULT_TOP_TEAMS: usize = 10;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
pub const HEAD_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    Attendance,
    Capacity,
    IsWeekend,
    Position,
    Played,
    Won,
    Drawn,
    Lost,
    GoalsFor,
    GoalsAgainst,
    GoalDifference,
    Points,
    SeasonEndYear,
    CapacityFillRate,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 14] = [
        NumericColumn::Attendance,
        NumericColumn::Capacity,
        NumericColumn::IsWeekend,
        NumericColumn::Position,
        NumericColumn::Played,
        NumericColumn::Won,
        NumericColumn::Drawn,
        NumericColumn::Lost,
        NumericColumn::GoalsFor,
        NumericColumn::GoalsAgainst,
        NumericColumn::GoalDifference,
        NumericColumn::Points,
        NumericColumn::SeasonEndYear,
        NumericColumn::CapacityFillRate,
    ];

    /// Columns the attendance correlation is computed over.
    pub const CORRELATED: [NumericColumn; 4] = [
        NumericColumn::Attendance,
        NumericColumn::Capacity,
        NumericColumn::Points,
        NumericColumn::IsWeekend,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NumericColumn::Attendance => "Attendance",
            NumericColumn::Capacity => "Capacity",
            NumericColumn::IsWeekend => "Is_Weekend",
            NumericColumn::Position => "Position",
            NumericColumn::Played => "Played",
            NumericColumn::Won => "Won",
            NumericColumn::Drawn => "Drawn",
            NumericColumn::Lost => "Lost",
            NumericColumn::GoalsFor => "Goals_For",
            NumericColumn::GoalsAgainst => "Goals_Against",
            NumericColumn::GoalDifference => "Goal_Difference",
            NumericColumn::Points => "Points",
            NumericColumn::SeasonEndYear => "Season_End_Year",
            NumericColumn::CapacityFillRate => "Capacity_Fill_Rate",
        }
    }

    pub fn value(&self, row: &MergedRecord) -> Option<f64> {
        let perf = row.performance;
        match self {
            NumericColumn::Attendance => row.attendance.map(|v| v as f64),
            NumericColumn::Capacity => row.capacity.map(|v| v as f64),
            NumericColumn::IsWeekend => Some(if row.is_weekend { 1.0 } else { 0.0 }),
            NumericColumn::Position => perf.map(|p| f64::from(p.position)),
            NumericColumn::Played => perf.map(|p| f64::from(p.played)),
            NumericColumn::Won => perf.map(|p| f64::from(p.won)),
            NumericColumn::Drawn => perf.map(|p| f64::from(p.drawn)),
            NumericColumn::Lost => perf.map(|p| f64::from(p.lost)),
            NumericColumn::GoalsFor => perf.map(|p| f64::from(p.goals_for)),
            NumericColumn::GoalsAgainst => perf.map(|p| f64::from(p.goals_against)),
            NumericColumn::GoalDifference => perf.map(|p| f64::from(p.goal_difference)),
            NumericColumn::Points => perf.map(|p| f64::from(p.points)),
            NumericColumn::SeasonEndYear => row.season_end_year.map(f64::from),
            NumericColumn::CapacityFillRate => row.capacity_fill_rate,
        }
    }

    pub fn present(&self, rows: &[MergedRecord]) -> Vec<f64> {
        rows.iter().filter_map(|r| self.value(r)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined below two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (ss / (n - 1) as f64).sqrt()
    });
    Some(Describe {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty
/// and ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTypeAttendance {
    pub weekday: Option<i64>,
    pub weekend: Option<i64>,
}

pub fn attendance_by_day_type(rows: &[MergedRecord]) -> DayTypeAttendance {
    let mean_for = |weekend: bool| {
        let values = rows
            .iter()
            .filter(|r| r.is_weekend == weekend)
            .filter_map(|r| r.attendance)
            .collect::<Vec<_>>();
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
        Some(round_count(mean))
    };
    DayTypeAttendance {
        weekday: mean_for(false),
        weekend: mean_for(true),
    }
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

pub fn paired(rows: &[MergedRecord], x: NumericColumn, y: NumericColumn) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|r| Some((x.value(r)?, y.value(r)?)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericColumn, b: NumericColumn) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(rows: &[MergedRecord], columns: &[NumericColumn]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|a| {
            columns
                .iter()
                .map(|b| pearson(&paired(rows, *a, *b)))
                .collect()
        })
        .collect();
    CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamFillRate {
    pub team: String,
    pub mean_fill_rate: f64,
    pub matches: usize,
}

/// Home sides ranked by mean capacity fill rate, highest first.
pub fn top_teams_by_fill_rate(rows: &[MergedRecord], n: usize) -> Vec<TeamFillRate> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows {
        let Some(rate) = row.capacity_fill_rate else {
            continue;
        };
        let entry = totals.entry(row.home_team.as_str()).or_insert((0.0, 0));
        entry.0 += rate;
        entry.1 += 1;
    }
    let mut ranked = totals
        .into_iter()
        .map(|(team, (sum, count))| TeamFillRate {
            team: team.to_string(),
            mean_fill_rate: sum / count as f64,
            matches: count,
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.mean_fill_rate
            .partial_cmp(&a.mean_fill_rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut out = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect::<Vec<_>>();
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub label: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

/// Five-number summary with whiskers at the furthest points within 1.5 IQR.
pub fn box_summary(label: &str, values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;
    let inside = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect::<Vec<_>>();
    let lower_whisker = inside.first().copied().unwrap_or(q1);
    let upper_whisker = inside.last().copied().unwrap_or(q3);
    Some(BoxSummary {
        label: label.to_string(),
        count: sorted.len(),
        min: sorted[0],
        q1,
        median: quantile_sorted(&sorted, 0.5),
        q3,
        max: sorted[sorted.len() - 1],
        lower_whisker,
        upper_whisker,
        outliers: sorted.len() - inside.len(),
    })
}

pub fn attendance_boxes(rows: &[MergedRecord]) -> Vec<BoxSummary> {
    let pick = |weekend: bool| {
        rows.iter()
            .filter(|r| r.is_weekend == weekend)
            .filter_map(|r| r.attendance.map(|v| v as f64))
            .collect::<Vec<_>>()
    };
    [("Weekday", false), ("Weekend", true)]
        .into_iter()
        .filter_map(|(label, weekend)| box_summary(label, &pick(weekend)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub x: NumericColumn,
    pub y: NumericColumn,
    pub points: Vec<(f64, f64)>,
}

/// Everything the console and workbook renderers show.
#[derive(Debug, Clone)]
pub struct EdaReport {
    pub rows: usize,
    pub columns: usize,
    pub describe: Vec<(NumericColumn, Option<Describe>)>,
    pub day_type: DayTypeAttendance,
    pub correlation: CorrelationMatrix,
    pub fill_rate: Option<Describe>,
    pub top_teams: Vec<TeamFillRate>,
    pub histogram: Vec<HistogramBin>,
    pub boxes: Vec<BoxSummary>,
    pub capacity_scatter: ScatterSeries,
    pub points_scatter: ScatterSeries,
}

pub fn build_report(table: &MergedTable, top_n: usize, bins: usize) -> EdaReport {
    let rows = &table.rows;
    let described = NumericColumn::ALL
        .iter()
        .map(|c| (*c, describe(&c.present(rows))))
        .collect();
    EdaReport {
        rows: rows.len(),
        columns: crate::export::merged_headers(table).len(),
        describe: described,
        day_type: attendance_by_day_type(rows),
        correlation: correlation_matrix(rows, &NumericColumn::CORRELATED),
        fill_rate: describe(&NumericColumn::CapacityFillRate.present(rows)),
        top_teams: top_teams_by_fill_rate(rows, top_n),
        histogram: histogram(&NumericColumn::Attendance.present(rows), bins),
        boxes: attendance_boxes(rows),
        capacity_scatter: ScatterSeries {
            x: NumericColumn::Capacity,
            y: NumericColumn::Attendance,
            points: paired(rows, NumericColumn::Capacity, NumericColumn::Attendance),
        },
        points_scatter: ScatterSeries {
            x: NumericColumn::Points,
            y: NumericColumn::Attendance,
            points: paired(rows, NumericColumn::Points, NumericColumn::Attendance),
        },
    }
}

pub fn print_report(report: &EdaReport, table: &MergedTable) {
    println!("Merged matches: {} rows x {} columns", report.rows, report.columns);
    println!();

    println!("Head:");
    let headers = crate::export::merged_headers(table);
    println!("  {}", headers.join(" | "));
    for row in table.rows.iter().take(HEAD_ROWS) {
        println!("  {}", crate::export::merged_row(&table.columns, row).join(" | "));
    }
    println!();

    println!(
        "{:<20} {:>7} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for (column, stats) in &report.describe {
        match stats {
            Some(d) => println!(
                "{:<20} {:>7} {:>12.3} {:>12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
                column.label(),
                d.count,
                d.mean,
                d.std.map(|s| format!("{s:.3}")).unwrap_or_else(|| "-".to_string()),
                d.min,
                d.q25,
                d.median,
                d.q75,
                d.max
            ),
            None => println!("{:<20} {:>7}", column.label(), 0),
        }
    }
    println!();

    println!("Average Attendance by Match Day Type:");
    println!("  Weekday  {}", fmt_opt(report.day_type.weekday));
    println!("  Weekend  {}", fmt_opt(report.day_type.weekend));
    println!();

    println!("Attendance spread by day type:");
    for b in &report.boxes {
        println!(
            "  {:<8} n={:<6} min={:.0} q1={:.0} median={:.0} q3={:.0} max={:.0} outliers={}",
            b.label, b.count, b.min, b.q1, b.median, b.q3, b.max, b.outliers
        );
    }
    println!();

    println!("Correlation:");
    let cols = &report.correlation.columns;
    print!("  {:<12}", "");
    for c in cols {
        print!(" {:>12}", c.label());
    }
    println!();
    for (i, a) in cols.iter().enumerate() {
        print!("  {:<12}", a.label());
        for value in &report.correlation.values[i] {
            match value {
                Some(v) => print!(" {v:>12.4}"),
                None => print!(" {:>12}", "-"),
            }
        }
        println!();
    }
    println!();

    if let Some(d) = report.fill_rate {
        println!(
            "Capacity fill rate: n={} mean={:.4} min={:.4} median={:.4} max={:.4}",
            d.count, d.mean, d.min, d.median, d.max
        );
        println!();
    }

    println!("Top {} teams by average capacity fill rate:", report.top_teams.len());
    for (idx, t) in report.top_teams.iter().enumerate() {
        println!(
            "  {:>2}. {:<28} {:.4} ({} matches)",
            idx + 1,
            t.team,
            t.mean_fill_rate,
            t.matches
        );
    }
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
