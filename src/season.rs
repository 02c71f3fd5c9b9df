use std::fmt;

use chrono::{Datelike, NaiveDate};

/// English seasons kick off in August.
pub const SEASON_START_MONTH: u32 = 8;

/// A football season spanning August of `start_year` to May of
/// `start_year + 1`, labelled `"YYYY/YYYY"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Season {
    pub start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Season a match played on `date` belongs to.
    pub fn from_match_date(date: NaiveDate) -> Self {
        Self::from_match_date_with_start(date, SEASON_START_MONTH)
    }

    pub fn from_match_date_with_start(date: NaiveDate, start_month: u32) -> Self {
        if date.month() >= start_month {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    /// Season a league table row belongs to, given the year the season ended.
    pub fn from_end_year(end_year: i32) -> Self {
        Self::new(end_year - 1)
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_year, self.end_year())
    }
}
