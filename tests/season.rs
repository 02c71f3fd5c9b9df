use chrono::NaiveDate;

use pl_attendance::normalize::parse_match_date;
use pl_attendance::season::Season;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn match_dates_map_to_seasons() {
    assert_eq!(Season::from_match_date(date(2019, 9, 1)).label(), "2019/2020");
    assert_eq!(Season::from_match_date(date(2019, 3, 1)).label(), "2018/2019");
    assert_eq!(Season::from_match_date(date(2019, 8, 1)).label(), "2019/2020");
    assert_eq!(Season::from_match_date(date(2019, 7, 31)).label(), "2018/2019");
}

#[test]
fn end_year_maps_to_season() {
    assert_eq!(Season::from_end_year(2018).label(), "2017/2018");
    assert_eq!(Season::from_end_year(2018).end_year(), 2018);
}

#[test]
fn both_derivations_agree_across_a_season() {
    let season = Season::from_end_year(2020);
    let mut day = date(2019, 8, 1);
    while day <= date(2020, 7, 31) {
        assert_eq!(Season::from_match_date(day), season, "{day}");
        day = day.succ_opt().unwrap();
    }
    assert_ne!(Season::from_match_date(day), season);
}

#[test]
fn season_displays_as_label() {
    let season = Season::new(2022);
    assert_eq!(season.to_string(), season.label());
    assert_eq!(season.to_string(), "2022/2023");
}

#[test]
fn parsed_dates_feed_season_derivation() {
    let dt = parse_match_date("13/08/2022").unwrap();
    assert_eq!(Season::from_match_date(dt.date()).label(), "2022/2023");
    let dt = parse_match_date("2019-03-01 15:00").unwrap();
    assert_eq!(Season::from_match_date(dt.date()).label(), "2018/2019");
}
