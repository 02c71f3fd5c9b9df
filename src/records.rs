use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

use crate::season::Season;

/// One column of the normalised match table, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchColumn {
    Date,
    Stadium,
    HomeTeam,
    Score,
    Attendance,
    /// Any other source column, carried through verbatim. The index points
    /// into [`MatchRecord::extra`].
    Extra { name: String, index: usize },
}

impl MatchColumn {
    pub fn name(&self) -> &str {
        match self {
            MatchColumn::Date => "Date",
            MatchColumn::Stadium => "Stadium",
            MatchColumn::HomeTeam => "Home_Team",
            MatchColumn::Score => "Score",
            MatchColumn::Attendance => "Attendance",
            MatchColumn::Extra { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Date cell as it appeared in the source.
    pub date_raw: String,
    pub match_date: NaiveDateTime,
    pub home_team: String,
    pub stadium: String,
    pub score: String,
    pub attendance: Option<f64>,
    pub extra: Vec<String>,
}

impl MatchRecord {
    pub fn date(&self) -> NaiveDate {
        self.match_date.date()
    }

    pub fn day_of_week(&self) -> Weekday {
        self.match_date.weekday()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchTable {
    pub columns: Vec<MatchColumn>,
    pub rows: Vec<MatchRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StadiumRecord {
    pub stadium: String,
    pub country: String,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceStats {
    pub position: i32,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub team: String,
    pub season_end_year: i32,
    pub season: Season,
    pub stats: PerformanceStats,
}

/// One match enriched with stadium capacity and the home side's league
/// record for that season.
///
/// `attendance` is only `None` when every match of the home side in that
/// season lacked an attendance figure. `capacity` is only `None` when no
/// match joined to a stadium at all.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub date_raw: String,
    pub match_date: NaiveDateTime,
    pub home_team: String,
    pub stadium: String,
    pub score: String,
    pub attendance: Option<i64>,
    pub capacity: Option<i64>,
    pub day_of_week: Weekday,
    pub is_weekend: bool,
    pub season: Season,
    pub season_end_year: Option<i32>,
    pub performance: Option<PerformanceStats>,
    pub capacity_fill_rate: Option<f64>,
    pub extra: Vec<String>,
}

impl MergedRecord {
    pub fn points(&self) -> Option<i32> {
        self.performance.map(|p| p.points)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    pub columns: Vec<MatchColumn>,
    pub rows: Vec<MergedRecord>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
