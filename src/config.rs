use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::aliases::AliasTable;
use crate::export::DEFAULT_OUTPUT;
use crate::loader::{self, DEFAULT_ENCODING};
use crate::pipeline::{DEFAULT_MIN_SEASON_END_YEAR, PipelineConfig, PipelineInputs};
use crate::report::DEFAULT_TOP_TEAMS;

/// Merge Premier League match, stadium and league-table data and summarise
/// attendance.
#[derive(Debug, Clone, Parser)]
#[command(name = "pl_attendance", version)]
pub struct Args {
    /// Matches table (Date, Venue, Home_Team, Score, Attendance, ...)
    #[arg(long, env = "PL_MATCHES_CSV", default_value = "data/matches.csv")]
    pub matches: PathBuf,

    /// Stadiums table (Country, Stadium, Capacity)
    #[arg(long, env = "PL_STADIUMS_CSV", default_value = "data/stadiums.csv")]
    pub stadiums: PathBuf,

    /// League table per season (team, position, ..., season_end_year)
    #[arg(
        long,
        env = "PL_PERFORMANCE_CSV",
        default_value = "data/team_performance.csv"
    )]
    pub performance: PathBuf,

    /// Merged output, overwritten on every run
    #[arg(long, env = "PL_OUTPUT_CSV", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Also render statistics and charts to this .xlsx workbook
    #[arg(long, env = "PL_REPORT_XLSX")]
    pub report: Option<PathBuf>,

    /// JSON alias table replacing the built-in one
    #[arg(long, env = "PL_ALIASES_JSON")]
    pub aliases: Option<PathBuf>,

    /// Text encoding of the three input files
    #[arg(long, env = "PL_INPUT_ENCODING", default_value = DEFAULT_ENCODING)]
    pub encoding: String,

    /// Oldest league season kept, by the year it ended
    #[arg(long, default_value_t = DEFAULT_MIN_SEASON_END_YEAR)]
    pub min_season_end_year: i32,

    /// How many teams the fill-rate ranking shows
    #[arg(long, default_value_t = DEFAULT_TOP_TEAMS)]
    pub top: usize,

    /// Skip printing the statistics
    #[arg(long)]
    pub no_report: bool,
}

impl Args {
    pub fn inputs(&self) -> Result<PipelineInputs> {
        Ok(PipelineInputs {
            matches: self.matches.clone(),
            stadiums: self.stadiums.clone(),
            performance: self.performance.clone(),
            encoding: loader::resolve_encoding(&self.encoding)?,
        })
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let aliases = match &self.aliases {
            Some(path) => AliasTable::load(path)?,
            None => AliasTable::builtin()?,
        };
        let mut cfg = PipelineConfig::with_aliases(aliases);
        cfg.min_season_end_year = self.min_season_end_year;
        Ok(cfg)
    }
}

/// Load `.env.local` then `.env` (first value wins) and parse the command
/// line. Exits on `--help` or bad arguments.
pub fn load() -> Args {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    Args::parse()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn defaults_point_at_data_dir() {
        let args = Args::try_parse_from(["pl_attendance"]).unwrap();
        assert_eq!(args.output.to_str(), Some("matches_perf_cleaned.csv"));
        assert_eq!(args.min_season_end_year, 2017);
        assert_eq!(args.top, 10);
        assert!(args.report.is_none());
        let cfg = args.pipeline_config().unwrap();
        assert_eq!(cfg.aliases.team_aliases.len(), 3);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "pl_attendance",
            "--output",
            "out/merged.csv",
            "--min-season-end-year",
            "2019",
            "--encoding",
            "utf-8",
        ])
        .unwrap();
        assert_eq!(args.pipeline_config().unwrap().min_season_end_year, 2019);
        assert_eq!(args.inputs().unwrap().encoding, encoding_rs::UTF_8);
    }
}
