use std::path::PathBuf;

use pl_attendance::loader::{self, RawTable};
use pl_attendance::normalize::{
    clean_text, normalize_matches, normalize_performance, normalize_stadiums, repair_score,
};
use pl_attendance::pipeline::PipelineConfig;
use pl_attendance::records::MatchColumn;
use pl_attendance::season::Season;

fn read_fixture(name: &str) -> RawTable {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let encoding = loader::resolve_encoding(loader::DEFAULT_ENCODING).unwrap();
    loader::load_table(&path, encoding).expect("fixture file should load")
}

fn matches_table(rows: &[[&str; 5]]) -> RawTable {
    RawTable::new(
        ["Date", "Home_Team", "Venue", "Score", "Attendance"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

#[test]
fn clean_text_is_idempotent() {
    for raw in [
        "Brighton & Hove Albion",
        "  Wolverhampton-Wanderers ",
        "-Leading",
        "Trailing-",
        "AFC  Bournemouth",
        "Nott'ham Forest",
        "",
    ] {
        let once = clean_text(raw);
        assert_eq!(clean_text(&once), once, "input {raw:?}");
    }
}

#[test]
fn forest_variants_resolve_in_both_tables() {
    let cfg = PipelineConfig::default();
    let (matches, _) = normalize_matches(&read_fixture("matches.csv"), &cfg).unwrap();
    let (perf, _) = normalize_performance(&read_fixture("team_performance.csv"), &cfg).unwrap();

    assert!(
        matches
            .rows
            .iter()
            .any(|r| r.home_team == "nottingham forest")
    );
    assert!(perf.iter().any(|r| r.team == "nottingham forest"));
    for raw in ["nott'ham forest", "nott'm forest", "nott ham forest"] {
        assert!(matches.rows.iter().all(|r| r.home_team != raw));
        assert!(perf.iter().all(|r| r.team != raw));
    }
}

#[test]
fn mangled_scores_are_repaired() {
    let cfg = PipelineConfig::default();
    let (matches, _) = normalize_matches(&read_fixture("matches.csv"), &cfg).unwrap();
    assert_eq!(matches.rows[0].score, "2:1");
    for row in &matches.rows {
        assert!(
            row.score.chars().all(|c| c.is_ascii_digit() || c == ':'),
            "score {:?}",
            row.score
        );
        assert!(!row.score.starts_with(':') && !row.score.ends_with(':'));
    }
    assert_eq!(repair_score("1 - 1"), "1:1");
}

#[test]
fn match_rows_drop_bad_dates_and_the_covid_window() {
    let cfg = PipelineConfig::default();
    let (matches, report) = normalize_matches(&read_fixture("matches.csv"), &cfg).unwrap();
    assert_eq!(report.rows_in, 10);
    assert_eq!(report.unparsed_dates, 1);
    assert_eq!(report.covid_window, 1);
    assert_eq!(report.missing_attendance, 1);
    assert_eq!(report.rows_out, 8);
    assert_eq!(matches.rows.len(), 8);
    assert_eq!(matches.rows[0].attendance, Some(60214.0));
}

#[test]
fn covid_window_bounds() {
    let raw = matches_table(&[
        ["2020-06-15", "Leeds", "Elland Road", "1-0", "0"],
        ["2020-01-15", "Leeds", "Elland Road", "1-0", "30000"],
        ["2021-09-01", "Leeds", "Elland Road", "1-0", "36000"],
        ["2020-03-01", "Leeds", "Elland Road", "1-0", "0"],
        ["2021-08-01", "Leeds", "Elland Road", "1-0", "0"],
        ["2021-08-02", "Leeds", "Elland Road", "1-0", "35000"],
    ]);
    let (matches, report) = normalize_matches(&raw, &PipelineConfig::default()).unwrap();
    let kept: Vec<&str> = matches.rows.iter().map(|r| r.date_raw.as_str()).collect();
    assert_eq!(kept, vec!["2020-01-15", "2021-09-01", "2021-08-02"]);
    assert_eq!(report.covid_window, 3);
}

#[test]
fn extra_columns_pass_through_in_source_order() {
    let cfg = PipelineConfig::default();
    let (matches, _) = normalize_matches(&read_fixture("matches.csv"), &cfg).unwrap();
    let names: Vec<&str> = matches.columns.iter().map(MatchColumn::name).collect();
    assert_eq!(
        names,
        vec![
            "Date",
            "Home_Team",
            "Away_Team",
            "Stadium",
            "Score",
            "Attendance",
            "Referee"
        ]
    );
    assert_eq!(matches.rows[0].extra, vec!["Burnley", "M Dean"]);
}

#[test]
fn stadiums_filter_country_and_apply_renames() {
    let cfg = PipelineConfig::default();
    let (stadiums, report) = normalize_stadiums(&read_fixture("stadiums.csv"), &cfg).unwrap();
    assert_eq!(report.rows_in, 7);
    assert_eq!(report.outside_country, 2);
    assert_eq!(report.renamed, 1);
    assert_eq!(report.rows_out, 5);

    let names: Vec<&str> = stadiums.iter().map(|s| s.stadium.as_str()).collect();
    assert!(names.contains(&"tottenham hotspur stadium"));
    assert!(!names.contains(&"white hart lane"));
    assert!(!names.contains(&"celtic park"));

    let molineux = stadiums
        .iter()
        .find(|s| s.stadium == "molineux stadium")
        .unwrap();
    assert_eq!(molineux.capacity, Some(32050));
}

#[test]
fn performance_rows_before_min_season_are_dropped() {
    let cfg = PipelineConfig::default();
    let (perf, report) = normalize_performance(&read_fixture("team_performance.csv"), &cfg).unwrap();
    assert_eq!(report.rows_in, 6);
    assert_eq!(report.before_min_season, 1);
    assert_eq!(perf.len(), 5);

    let arsenal = perf.iter().find(|r| r.team == "arsenal").unwrap();
    assert_eq!(arsenal.season_end_year, 2020);
    assert_eq!(arsenal.season, Season::new(2019));
    assert_eq!(arsenal.stats.points, 56);

    let brighton = perf
        .iter()
        .find(|r| r.team == "brighton and hove albion")
        .unwrap();
    assert_eq!(brighton.stats.goal_difference, -15);
}

#[test]
fn non_numeric_stat_is_fatal() {
    let raw = RawTable::new(
        [
            "team",
            "position",
            "played",
            "won",
            "drawn",
            "lost",
            "gf",
            "ga",
            "gd",
            "points",
            "season_end_year",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect(),
        vec![
            ["Arsenal", "8", "38", "14", "14", "10", "56", "48", "8", "lots", "2020"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        ],
    );
    let err = normalize_performance(&raw, &PipelineConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("points"));
}

#[test]
fn missing_required_column_is_fatal() {
    let raw = RawTable::new(
        vec!["Date".to_string(), "Venue".to_string()],
        vec![vec!["2019-08-10".to_string(), "Anfield".to_string()]],
    );
    assert!(normalize_matches(&raw, &PipelineConfig::default()).is_err());
}

#[test]
fn inputs_are_not_modified() {
    let cfg = PipelineConfig::default();
    let matches = read_fixture("matches.csv");
    let stadiums = read_fixture("stadiums.csv");
    let perf = read_fixture("team_performance.csv");
    let (before_m, before_s, before_p) = (matches.clone(), stadiums.clone(), perf.clone());

    normalize_matches(&matches, &cfg).unwrap();
    normalize_stadiums(&stadiums, &cfg).unwrap();
    normalize_performance(&perf, &cfg).unwrap();

    assert_eq!(matches, before_m);
    assert_eq!(stadiums, before_s);
    assert_eq!(perf, before_p);
}
