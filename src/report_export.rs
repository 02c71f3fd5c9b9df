use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Chart, ChartType, Workbook, Worksheet};

use crate::report::{BoxSummary, EdaReport, ScatterSeries};

pub struct WorkbookReport {
    pub sheets: usize,
    pub charts: usize,
}

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl<T: Into<f64>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(|v| Cell::Number(v.into())).unwrap_or(Cell::Empty)
    }
}

/// Render the statistics and their charts into an `.xlsx` workbook.
pub fn export_report_workbook(path: &Path, report: &EdaReport) -> Result<WorkbookReport> {
    let mut workbook = Workbook::new();
    let mut charts = 0usize;

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows(report))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Correlation")?;
        write_rows(sheet, &correlation_rows(report))?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TopTeams")?;
        let mut rows: Vec<Vec<Cell>> = vec![vec![
            "Rank".into(),
            "Home Team".into(),
            "Mean Fill Rate".into(),
            "Matches".into(),
        ]];
        for (idx, t) in report.top_teams.iter().enumerate() {
            rows.push(vec![
                Cell::Number((idx + 1) as f64),
                t.team.as_str().into(),
                t.mean_fill_rate.into(),
                Cell::Number(t.matches as f64),
            ]);
        }
        write_rows(sheet, &rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Histogram")?;
        let mut rows: Vec<Vec<Cell>> = vec![vec![
            "Bin".into(),
            "Lower".into(),
            "Upper".into(),
            "Matches".into(),
        ]];
        for bin in &report.histogram {
            rows.push(vec![
                Cell::Text(format!("{:.0}-{:.0}", bin.lower, bin.upper)),
                bin.lower.into(),
                bin.upper.into(),
                Cell::Number(bin.count as f64),
            ]);
        }
        write_rows(sheet, &rows)?;
        if !report.histogram.is_empty() {
            let last = report.histogram.len() as u32;
            let mut chart = Chart::new(ChartType::Column);
            chart
                .add_series()
                .set_categories(("Histogram", 1, 0, last, 0))
                .set_values(("Histogram", 1, 3, last, 3));
            chart.title().set_name("Distribution of Match Attendance");
            chart.x_axis().set_name("Attendance");
            chart.y_axis().set_name("Number of Matches");
            chart.legend().set_hidden();
            sheet.insert_chart(1, 5, &chart)?;
            charts += 1;
        }
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("DayType")?;
        write_rows(sheet, &box_rows(&report.boxes))?;
        if !report.boxes.is_empty() {
            let mut chart = Chart::new(ChartType::Column);
            for (idx, b) in report.boxes.iter().enumerate() {
                let col = (idx + 1) as u16;
                chart
                    .add_series()
                    .set_name(b.label.as_str())
                    .set_categories(("DayType", 1, 0, 5, 0))
                    .set_values(("DayType", 1, col, 5, col));
            }
            chart.title().set_name("Attendance: Weekday vs Weekend");
            chart.y_axis().set_name("Attendance");
            sheet.insert_chart(1, report.boxes.len() as u16 + 2, &chart)?;
            charts += 1;
        }
    }
    for (name, series, title) in [
        (
            "CapacityScatter",
            &report.capacity_scatter,
            "Attendance vs Stadium Capacity",
        ),
        (
            "PointsScatter",
            &report.points_scatter,
            "Attendance vs Team Performance",
        ),
    ] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_rows(sheet, &scatter_rows(series))?;
        if !series.points.is_empty() {
            let last = series.points.len() as u32;
            let mut chart = Chart::new(ChartType::Scatter);
            chart
                .add_series()
                .set_categories((name, 1, 0, last, 0))
                .set_values((name, 1, 1, last, 1));
            chart.title().set_name(title);
            chart.x_axis().set_name(series.x.label());
            chart.y_axis().set_name(series.y.label());
            chart.legend().set_hidden();
            sheet.insert_chart(1, 3, &chart)?;
            charts += 1;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(WorkbookReport { sheets: 7, charts })
}

fn summary_rows(report: &EdaReport) -> Vec<Vec<Cell>> {
    let mut rows = vec![
        vec!["Rows".into(), Cell::Number(report.rows as f64)],
        vec!["Columns".into(), Cell::Number(report.columns as f64)],
        vec![Cell::Empty],
        vec![
            "Column".into(),
            "Count".into(),
            "Mean".into(),
            "Std".into(),
            "Min".into(),
            "25%".into(),
            "50%".into(),
            "75%".into(),
            "Max".into(),
        ],
    ];
    for (column, stats) in &report.describe {
        let mut row: Vec<Cell> = vec![column.label().into()];
        match stats {
            Some(d) => row.extend([
                Cell::Number(d.count as f64),
                d.mean.into(),
                d.std.into(),
                d.min.into(),
                d.q25.into(),
                d.median.into(),
                d.q75.into(),
                d.max.into(),
            ]),
            None => row.push(Cell::Number(0.0)),
        }
        rows.push(row);
    }
    rows.push(vec![Cell::Empty]);
    rows.push(vec!["Average Attendance".into()]);
    rows.push(vec![
        "Weekday".into(),
        report.day_type.weekday.map(|v| v as f64).into(),
    ]);
    rows.push(vec![
        "Weekend".into(),
        report.day_type.weekend.map(|v| v as f64).into(),
    ]);
    rows
}

fn correlation_rows(report: &EdaReport) -> Vec<Vec<Cell>> {
    let cols = &report.correlation.columns;
    let mut header = vec![Cell::Empty];
    header.extend(cols.iter().map(|c| Cell::from(c.label())));
    let mut rows = vec![header];
    for (i, column) in cols.iter().enumerate() {
        let mut row: Vec<Cell> = vec![column.label().into()];
        row.extend(report.correlation.values[i].iter().map(|v| Cell::from(*v)));
        rows.push(row);
    }
    rows
}

fn box_rows(boxes: &[BoxSummary]) -> Vec<Vec<Cell>> {
    let mut header: Vec<Cell> = vec!["Statistic".into()];
    header.extend(boxes.iter().map(|b| Cell::from(b.label.as_str())));
    let mut rows = vec![header];
    let stats: [(&str, fn(&BoxSummary) -> f64); 8] = [
        ("Lower whisker", |b| b.lower_whisker),
        ("Q1", |b| b.q1),
        ("Median", |b| b.median),
        ("Q3", |b| b.q3),
        ("Upper whisker", |b| b.upper_whisker),
        ("Min", |b| b.min),
        ("Max", |b| b.max),
        ("Outliers", |b| b.outliers as f64),
    ];
    for (label, get) in stats {
        let mut row: Vec<Cell> = vec![label.into()];
        row.extend(boxes.iter().map(|b| Cell::Number(get(b))));
        rows.push(row);
    }
    rows
}

fn scatter_rows(series: &ScatterSeries) -> Vec<Vec<Cell>> {
    let mut rows: Vec<Vec<Cell>> = vec![vec![series.x.label().into(), series.y.label().into()]];
    rows.extend(
        series
            .points
            .iter()
            .map(|(x, y)| vec![Cell::Number(*x), Cell::Number(*y)]),
    );
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match value {
                Cell::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Number(_) | Cell::Empty => {}
            }
        }
    }
    Ok(())
}
