use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use encoding_rs::Encoding;
use tracing::info;

use crate::aliases::AliasTable;
use crate::loader::{self, RawTable};
use crate::merge::{self, MergeReport};
use crate::normalize::{
    self, MatchNormalizeReport, PerformanceNormalizeReport, StadiumNormalizeReport,
};
use crate::records::MergedTable;
use crate::season::SEASON_START_MONTH;

pub const DEFAULT_MIN_SEASON_END_YEAR: i32 = 2017;
pub const DEFAULT_COUNTRY: &str = "England";

/// Knobs for the cleaning and merge stages. `Default` gives the fixed
/// Premier League settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Matches from this instant to `covid_end` inclusive are dropped.
    pub covid_start: NaiveDateTime,
    pub covid_end: NaiveDateTime,
    pub min_season_end_year: i32,
    /// Case-insensitive substring a stadium's country must contain.
    pub country: String,
    pub season_start_month: u32,
    pub aliases: AliasTable,
}

impl PipelineConfig {
    pub fn with_aliases(aliases: AliasTable) -> Self {
        Self {
            covid_start: midnight(2020, 3, 1),
            covid_end: midnight(2021, 8, 1),
            min_season_end_year: DEFAULT_MIN_SEASON_END_YEAR,
            country: DEFAULT_COUNTRY.to_string(),
            season_start_month: SEASON_START_MONTH,
            aliases,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_aliases(AliasTable::builtin().unwrap_or_default())
    }
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub matches: PathBuf,
    pub stadiums: PathBuf,
    pub performance: PathBuf,
    pub encoding: &'static Encoding,
}

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub matches: MatchNormalizeReport,
    pub stadiums: StadiumNormalizeReport,
    pub performance: PerformanceNormalizeReport,
    pub merge: MergeReport,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: MergedTable,
    pub summary: PipelineSummary,
}

/// Read all three tables and run the in-memory stages. Any load failure
/// aborts before anything is written.
pub fn run(inputs: &PipelineInputs, cfg: &PipelineConfig) -> Result<PipelineOutput> {
    let matches = loader::load_table(&inputs.matches, inputs.encoding)
        .context("load matches table")?;
    let stadiums = loader::load_table(&inputs.stadiums, inputs.encoding)
        .context("load stadiums table")?;
    let performance = loader::load_table(&inputs.performance, inputs.encoding)
        .context("load team performance table")?;
    run_tables(&matches, &stadiums, &performance, cfg)
}

/// Same as [`run`] over tables already in memory. The raw tables are not
/// modified.
pub fn run_tables(
    matches: &RawTable,
    stadiums: &RawTable,
    performance: &RawTable,
    cfg: &PipelineConfig,
) -> Result<PipelineOutput> {
    let (match_table, match_report) =
        normalize::normalize_matches(matches, cfg).context("normalize matches")?;
    let (stadium_rows, stadium_report) =
        normalize::normalize_stadiums(stadiums, cfg).context("normalize stadiums")?;
    let (perf_rows, perf_report) =
        normalize::normalize_performance(performance, cfg).context("normalize team performance")?;

    let (table, merge_report) = merge::merge(match_table, &stadium_rows, &perf_rows, cfg);
    info!(rows = table.len(), "pipeline complete");

    Ok(PipelineOutput {
        table,
        summary: PipelineSummary {
            matches: match_report,
            stadiums: stadium_report,
            performance: perf_report,
            merge: merge_report,
        },
    })
}
