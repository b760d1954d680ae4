//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the CSV (or generates demo data)
//! - runs the filter-and-aggregate pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ReportArgs};
use crate::domain::{
    DashConfig, DataSource, FilterCriteria, DEFAULT_PROFIT_MARGIN, HORIZON_RANGE,
};
use crate::error::AppError;

pub mod pipeline;

/// Environment variable seeding the default profit margin.
pub const PROFIT_MARGIN_ENV: &str = "SALES_PROFIT_MARGIN";

/// Width of the inline bar charts and histograms.
const BAR_WIDTH: usize = 40;

/// Histogram bin count for the unit-price distribution.
const PRICE_BINS: usize = 12;

/// Entry point for the `sd` binary.
pub fn run() -> Result<(), AppError> {
    // Load `.env` so SALES_PROFIT_MARGIN / SALES_REPORT_DOC can live next to
    // the data. Absence of the file is fine.
    dotenvy::dotenv().ok();

    // We want `sd` and `sd --csv data.csv` to behave like `sd tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args, ReportMode::Full),
        Command::Summary(args) => handle_report(args, ReportMode::SummaryOnly),
        Command::Forecast(args) => handle_report(args, ReportMode::ForecastOnly),
        Command::Tui(args) => crate::tui::run(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportMode {
    Full,
    SummaryOnly,
    ForecastOnly,
}

fn handle_report(args: ReportArgs, mode: ReportMode) -> Result<(), AppError> {
    let config = dash_config_from_args(&args)?;
    let criteria = criteria_from_args(&args);
    let source = source_from_args(&args);

    let run = pipeline::run_report(&source, &criteria, &config)?;
    let show_plot = args.plot && !args.no_plot;

    match mode {
        ReportMode::Full => {
            println!(
                "{}",
                crate::report::format_overview(&run.ingest, &run.criteria, run.filtered.len(), &config)
            );
            print!("{}", crate::report::format_catalog(&run.catalog, &config));

            if show_plot {
                println!("\nDaily sales (o) and forecast (+):");
                print!(
                    "{}",
                    crate::plot::render_series_plot(
                        &run.catalog.daily_sales,
                        run.catalog.forecast.points(),
                        args.width,
                        args.height,
                    )
                );

                println!("\nTop selling products:");
                let bars: Vec<(String, f64)> = run
                    .catalog
                    .product_sales
                    .iter()
                    .take(config.top_n)
                    .map(|t| (t.key.clone(), t.total))
                    .collect();
                print!("{}", crate::plot::render_bars(&bars, BAR_WIDTH));

                println!("\nUnit price distribution:");
                print!(
                    "{}",
                    crate::plot::render_histogram(&run.catalog.unit_prices, PRICE_BINS, BAR_WIDTH)
                );
            }
        }
        ReportMode::SummaryOnly => {
            println!(
                "{}",
                crate::report::format_overview(&run.ingest, &run.criteria, run.filtered.len(), &config)
            );
            print!("{}", crate::report::format_kpis(&run.catalog.kpis));
            println!();
            print!("{}", crate::report::format_summary(&run.catalog.summary));
        }
        ReportMode::ForecastOnly => {
            print!(
                "{}",
                crate::report::format_forecast(&run.catalog.forecast, config.horizon_days)
            );
            if show_plot && run.catalog.forecast.points().is_some() {
                print!(
                    "{}",
                    crate::plot::render_series_plot(
                        &run.catalog.daily_sales,
                        run.catalog.forecast.points(),
                        args.width,
                        args.height,
                    )
                );
            }
        }
    }

    // Optional exports.
    if let Some(path) = &args.export_daily {
        crate::io::export::write_daily_csv(path, &run.catalog.daily_sales)?;
    }
    if let Some(path) = &args.export_forecast {
        crate::io::export::write_forecast_csv(path, &run.catalog.forecast)?;
    }
    if let Some(path) = &args.export_catalog {
        crate::io::export::write_catalog_json(path, &run.catalog_file(&config))?;
    }

    // Pre-built report document passthrough; absence is visible but non-fatal.
    if let Some(dest) = &args.report_doc {
        match crate::io::artifact::copy_report_doc(dest)? {
            Some(source) => println!(
                "Report document copied: {} -> {}",
                source.display(),
                dest.display()
            ),
            None => eprintln!(
                "Report document not found at '{}'; skipping copy.",
                crate::io::artifact::report_doc_source().display()
            ),
        }
    }

    Ok(())
}

/// Build the run configuration from flags plus environment defaults.
pub fn dash_config_from_args(args: &ReportArgs) -> Result<DashConfig, AppError> {
    let (lo, hi) = HORIZON_RANGE;
    if !(lo..=hi).contains(&args.horizon) {
        return Err(AppError::input(format!(
            "Forecast horizon must be between {lo} and {hi} days (got {}).",
            args.horizon
        )));
    }

    let profit_margin = args
        .margin
        .or_else(margin_from_env)
        .unwrap_or(DEFAULT_PROFIT_MARGIN);
    if !profit_margin.is_finite() || profit_margin < 0.0 {
        return Err(AppError::input(format!(
            "Profit margin must be a finite non-negative number (got {profit_margin})."
        )));
    }

    if args.top == 0 {
        return Err(AppError::input("Top-N table size must be > 0."));
    }

    Ok(DashConfig {
        profit_margin,
        horizon_days: args.horizon,
        split_seed: crate::domain::DEFAULT_SPLIT_SEED,
        top_n: args.top,
    })
}

/// Build filter criteria from CLI flags; no flags means unrestricted.
pub fn criteria_from_args(args: &ReportArgs) -> FilterCriteria {
    let to_set = |values: &[String]| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().map(|s| s.trim().to_string()).collect())
        }
    };

    FilterCriteria {
        start_date: args.from,
        end_date: args.to,
        categories: to_set(&args.categories),
        products: to_set(&args.products),
        regions: to_set(&args.regions),
    }
}

/// Resolve the data source: CSV path or deterministic demo data.
pub fn source_from_args(args: &ReportArgs) -> DataSource {
    match &args.csv {
        Some(path) => DataSource::Csv(path.clone()),
        None => DataSource::Sample {
            count: args.sample_count,
            seed: args.seed,
            end_date: chrono::Local::now().date_naive(),
        },
    }
}

fn margin_from_env() -> Option<f64> {
    std::env::var(PROFIT_MARGIN_ENV)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
}

/// Rewrite argv so `sd` defaults to `sd tui`.
///
/// Rules:
/// - `sd`                      -> `sd tui`
/// - `sd --csv data.csv ...`   -> `sd tui --csv data.csv ...`
/// - `sd --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "summary" | "forecast" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
