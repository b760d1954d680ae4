//! Command-line parsing for the sales dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the aggregation/math code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_HORIZON_DAYS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sd", version, about = "Sales Data Analysis Dashboard (terminal)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the full report: KPIs, summary statistics, every aggregate
    /// table, optional ASCII charts, and the forecast.
    Report(ReportArgs),
    /// Print KPIs and summary statistics only (useful for scripting).
    Summary(ReportArgs),
    /// Print the linear-trend sales forecast only.
    Forecast(ReportArgs),
    /// Launch the interactive TUI dashboard.
    ///
    /// This uses the same underlying pipeline as `sd report`, but renders
    /// results in a terminal UI using Ratatui. Filters are adjusted live and
    /// the catalog is recomputed in full on every change.
    Tui(ReportArgs),
}

/// Common options for loading, filtering, and rendering.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Sales CSV to analyze. When omitted, a deterministic synthetic demo
    /// dataset is generated instead.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Number of synthetic rows to generate in demo mode.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub sample_count: usize,

    /// Random seed for demo-mode data generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Keep records dated on or after this day (YYYY-MM-DD).
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,

    /// Keep records dated on or before this day (YYYY-MM-DD).
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,

    /// Keep only these categories (repeatable; default: all).
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Keep only these products (repeatable; default: all).
    #[arg(long = "product", value_name = "NAME")]
    pub products: Vec<String>,

    /// Keep only these regions (repeatable; default: all).
    #[arg(long = "region", value_name = "NAME")]
    pub regions: Vec<String>,

    /// Profit margin applied to total sales. Defaults to the
    /// SALES_PROFIT_MARGIN environment variable, then 0.2.
    #[arg(long)]
    pub margin: Option<f64>,

    /// Forecast horizon in days (7-60).
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon: u32,

    /// Show top-N rows in ranked tables.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render ASCII charts in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the daily sales series to CSV.
    #[arg(long = "export-daily", value_name = "CSV")]
    pub export_daily: Option<PathBuf>,

    /// Export the forecast series to CSV.
    #[arg(long = "export-forecast", value_name = "CSV")]
    pub export_forecast: Option<PathBuf>,

    /// Export the full aggregate catalog (plus run metadata) to JSON.
    #[arg(long = "export-catalog", value_name = "JSON")]
    pub export_catalog: Option<PathBuf>,

    /// Copy the pre-built report document (if present) to this path.
    #[arg(long = "report-doc", value_name = "DEST")]
    pub report_doc: Option<PathBuf>,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}
