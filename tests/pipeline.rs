use std::fs;
use std::path::PathBuf;

use chrono::Weekday;

use pl_attendance::export::write_merged_csv;
use pl_attendance::loader;
use pl_attendance::pipeline::{self, PipelineConfig, PipelineInputs, PipelineOutput};
use pl_attendance::report::{self, DEFAULT_HISTOGRAM_BINS, NumericColumn};
use pl_attendance::report_export::export_report_workbook;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn run_fixtures() -> PipelineOutput {
    let inputs = PipelineInputs {
        matches: fixture_path("matches.csv"),
        stadiums: fixture_path("stadiums.csv"),
        performance: fixture_path("team_performance.csv"),
        encoding: loader::resolve_encoding(loader::DEFAULT_ENCODING).unwrap(),
    };
    pipeline::run(&inputs, &PipelineConfig::default()).expect("fixtures should merge")
}

#[test]
fn fixtures_merge_end_to_end() {
    let output = run_fixtures();
    let rows = &output.table.rows;
    assert_eq!(rows.len(), 8);

    let teams: Vec<&str> = rows.iter().map(|r| r.home_team.as_str()).collect();
    assert_eq!(
        teams,
        vec![
            "arsenal",
            "arsenal",
            "arsenal",
            "tottenham hotspur",
            "nottingham forest",
            "brighton and hove albion",
            "wolverhampton wanderers",
            "arsenal",
        ]
    );

    assert_eq!(rows[1].attendance, Some(60107));
    assert_eq!(rows[0].capacity, Some(60704));
    assert_eq!(rows[3].capacity, Some(62062));
    assert_eq!(rows[5].capacity, Some(60704));
    assert_eq!(rows[6].capacity, Some(32050));

    assert_eq!(rows[3].day_of_week, Weekday::Sun);
    assert!(rows[3].is_weekend);
    assert_eq!(rows[5].day_of_week, Weekday::Wed);
    assert!(!rows[5].is_weekend);

    assert_eq!(rows[4].season.label(), "2022/2023");
    assert_eq!(rows[4].points(), Some(38));
    assert_eq!(rows[5].points(), Some(41));
    assert_eq!(rows[7].season.label(), "2015/2016");
    assert_eq!(rows[7].performance, None);

    for row in rows {
        let rate = row.capacity_fill_rate.unwrap();
        assert!((0.0..=1.0).contains(&rate));
    }

    let merge = output.summary.merge;
    assert_eq!(merge.stadium_misses, 1);
    assert_eq!(merge.performance_misses, 1);
    assert_eq!(merge.attendance_group_filled, 1);
    assert_eq!(merge.attendance_left_null, 0);
    assert_eq!(merge.capacity_median, Some(60704.0));
    assert_eq!(merge.capacity_median_filled, 1);
}

#[test]
fn written_csv_has_bom_and_every_row() {
    let output = run_fixtures();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("merged.csv");
    write_merged_csv(&path, &output.table).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    assert!(!dir.path().join("out").join("merged.csv.tmp").exists());

    let mut reader = csv::Reader::from_reader(&bytes[3..]);
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(
        &headers[..7],
        &[
            "Date",
            "Home_Team",
            "Away_Team",
            "Stadium",
            "Score",
            "Attendance",
            "Referee"
        ]
    );
    assert!(headers.iter().all(|h| h != "team"));
    for name in [
        "Match_Date",
        "Capacity",
        "Day_of_Week",
        "Is_Weekend",
        "Season",
        "Points",
        "Season_End_Year",
        "Capacity_Fill_Rate",
    ] {
        assert!(headers.iter().any(|h| h == name), "missing {name}");
    }

    let records = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(records.len(), output.table.len());

    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let first = &records[0];
    assert_eq!(&first[col("Score")], "2:1");
    assert_eq!(&first[col("Attendance")], "60214");
    assert_eq!(&first[col("Match_Date")], "2019-08-10");
    assert_eq!(&first[col("Day_of_Week")], "Saturday");
    assert_eq!(&first[col("Is_Weekend")], "1");
    assert_eq!(&first[col("Season")], "2019/2020");
    assert_eq!(&first[col("Season_End_Year")], "2020");
    assert_eq!(&first[col("Away_Team")], "Burnley");

    let last = &records[records.len() - 1];
    assert_eq!(&last[col("Points")], "");
    assert_eq!(&last[col("Season_End_Year")], "");
}

#[test]
fn rerun_overwrites_previous_output() {
    let output = run_fixtures();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.csv");
    fs::write(&path, "stale").unwrap();
    write_merged_csv(&path, &output.table).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("stale"));
    assert_eq!(text.lines().count(), output.table.len() + 1);
}

#[test]
fn missing_input_is_fatal() {
    let inputs = PipelineInputs {
        matches: fixture_path("no_such_file.csv"),
        stadiums: fixture_path("stadiums.csv"),
        performance: fixture_path("team_performance.csv"),
        encoding: loader::resolve_encoding(loader::DEFAULT_ENCODING).unwrap(),
    };
    let err = pipeline::run(&inputs, &PipelineConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("no_such_file.csv"));
}

#[test]
fn report_over_fixtures() {
    let output = run_fixtures();
    let eda = report::build_report(&output.table, 3, DEFAULT_HISTOGRAM_BINS);
    assert_eq!(eda.rows, 8);
    assert_eq!(eda.columns, 23);
    assert_eq!(eda.top_teams.len(), 3);
    assert_eq!(eda.top_teams[0].team, "arsenal");
    assert_eq!(eda.top_teams[0].matches, 4);
    assert_eq!(eda.histogram.iter().map(|b| b.count).sum::<usize>(), 8);
    assert_eq!(eda.capacity_scatter.points.len(), 8);
    assert_eq!(eda.points_scatter.points.len(), 7);
    assert_eq!(eda.day_type.weekday, Some(30500));
    assert!(
        eda.correlation
            .get(NumericColumn::Attendance, NumericColumn::Capacity)
            .unwrap()
            > 0.0
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xlsx");
    let written = export_report_workbook(&path, &eda).unwrap();
    assert_eq!(written.sheets, 7);
    assert_eq!(written.charts, 4);
    assert!(fs::metadata(&path).unwrap().len() > 0);
}
