use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pl_attendance::config::{self, Args};
use pl_attendance::report::{self, DEFAULT_HISTOGRAM_BINS};
use pl_attendance::{export, pipeline, report_export};

fn main() -> Result<()> {
    let args = config::load();
    init_tracing();
    run(&args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let inputs = args.inputs()?;
    let cfg = args.pipeline_config()?;

    let output = pipeline::run(&inputs, &cfg)?;
    export::write_merged_csv(&args.output, &output.table)
        .with_context(|| format!("write merged table to {}", args.output.display()))?;

    let summary = &output.summary;
    println!("Premier League attendance merge complete");
    println!("Output: {}", args.output.display());
    println!(
        "Matches: {} read, {} kept ({} bad dates, {} in covid window)",
        summary.matches.rows_in,
        summary.matches.rows_out,
        summary.matches.unparsed_dates,
        summary.matches.covid_window
    );
    println!(
        "Joins: {} without stadium, {} without league row",
        summary.merge.stadium_misses, summary.merge.performance_misses
    );
    println!(
        "Imputed: {} attendance by team/season mean ({} left empty), {} capacity by median",
        summary.merge.attendance_group_filled,
        summary.merge.attendance_left_null,
        summary.merge.capacity_median_filled
    );
    println!();

    let eda = report::build_report(&output.table, args.top, DEFAULT_HISTOGRAM_BINS);
    if !args.no_report {
        report::print_report(&eda, &output.table);
    }

    if let Some(path) = &args.report {
        let written = report_export::export_report_workbook(path, &eda)?;
        info!(
            path = %path.display(),
            sheets = written.sheets,
            charts = written.charts,
            "wrote report workbook"
        );
    }

    Ok(())
}
