//! Ratatui-based terminal UI.
//!
//! The TUI provides a filter panel (date range, category, product, region,
//! forecast horizon), a KPI header, chart tabs (daily / monthly / forecast),
//! and side tables for top products and region totals.
//!
//! The dataset is loaded once; every filter change recomputes the entire
//! Aggregate Catalog via `app::pipeline::recompute` — the same pure
//! `aggregate(filter(dataset, criteria))` refresh the CLI uses.

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::cli::ReportArgs;
use crate::domain::{AggregateCatalog, DashConfig, FilterCriteria, Forecast, HORIZON_RANGE};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::report::fmt_money;

mod plotters_chart;

use plotters_chart::SalesPlottersChart;

/// Start the TUI.
pub fn run(args: ReportArgs) -> Result<(), AppError> {
    let config = crate::app::dash_config_from_args(&args)?;
    let criteria = crate::app::criteria_from_args(&args);
    let source = crate::app::source_from_args(&args);
    let ingest = crate::app::pipeline::load(&source)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(ingest, criteria, config);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Which series the chart pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartTab {
    Daily,
    Monthly,
    Forecast,
}

impl ChartTab {
    fn next(self) -> Self {
        match self {
            ChartTab::Daily => ChartTab::Monthly,
            ChartTab::Monthly => ChartTab::Forecast,
            ChartTab::Forecast => ChartTab::Daily,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ChartTab::Daily => "Daily sales",
            ChartTab::Monthly => "Monthly sales",
            ChartTab::Forecast => "Daily sales + forecast",
        }
    }
}

/// Filter panel rows, top to bottom.
const FIELD_FROM: usize = 0;
const FIELD_TO: usize = 1;
const FIELD_CATEGORY: usize = 2;
const FIELD_PRODUCT: usize = 3;
const FIELD_REGION: usize = 4;
const FIELD_HORIZON: usize = 5;
const FIELD_COUNT: usize = 6;

struct App {
    ingest: IngestedData,
    criteria: FilterCriteria,
    config: DashConfig,

    // Distinct values for filter cycling, computed once from the dataset.
    categories: Vec<String>,
    products: Vec<String>,
    regions: Vec<String>,

    catalog: AggregateCatalog,
    matched: usize,

    tab: ChartTab,
    selected_field: usize,
    /// When set, keyboard input edits this date field (FROM/TO).
    editing_field: Option<usize>,
    date_input: String,
    status: String,
}

impl App {
    fn new(ingest: IngestedData, criteria: FilterCriteria, config: DashConfig) -> Self {
        let categories = ingest.dataset.distinct_categories();
        let products = ingest.dataset.distinct_products();
        let regions = ingest.dataset.distinct_regions();

        let (matched, catalog) =
            crate::app::pipeline::recompute(&ingest.dataset, &criteria, &config);

        let mut app = Self {
            ingest,
            criteria,
            config,
            categories,
            products,
            regions,
            catalog,
            matched,
            tab: ChartTab::Daily,
            selected_field: 0,
            editing_field: None,
            date_input: String::new(),
            status: String::new(),
        };
        app.status = app.default_status();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_field.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_COUNT - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                if matches!(self.selected_field, FIELD_FROM | FIELD_TO) {
                    self.editing_field = Some(self.selected_field);
                    self.date_input = match self.selected_field {
                        FIELD_FROM => self.criteria.start_date,
                        _ => self.criteria.end_date,
                    }
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                    self.status =
                        "Editing date (YYYY-MM-DD). Enter to apply, empty clears, Esc cancels."
                            .to_string();
                }
            }
            KeyCode::Tab => {
                self.tab = self.tab.next();
                self.status = self.default_status();
            }
            KeyCode::Char('r') => {
                self.criteria = FilterCriteria::default();
                self.refresh();
                self.status = format!("Filters reset. {}", self.default_status());
            }
            _ => {}
        }

        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_field = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let field = self.editing_field.take().unwrap_or(FIELD_FROM);
                self.apply_date_input(field);
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_date_input(&mut self, field: usize) {
        let trimmed = self.date_input.trim();
        let parsed = if trimmed.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(e) => {
                    self.status = format!("Invalid date '{trimmed}': {e}");
                    return;
                }
            }
        };

        match field {
            FIELD_FROM => self.criteria.start_date = parsed,
            _ => self.criteria.end_date = parsed,
        }
        self.refresh();
        self.status = self.default_status();
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            FIELD_FROM | FIELD_TO => {
                // Dates are edited explicitly via Enter.
            }
            FIELD_CATEGORY => {
                self.criteria.categories =
                    cycle_selection(self.criteria.categories.take(), &self.categories, delta);
                self.refresh();
                self.status = self.default_status();
            }
            FIELD_PRODUCT => {
                self.criteria.products =
                    cycle_selection(self.criteria.products.take(), &self.products, delta);
                self.refresh();
                self.status = self.default_status();
            }
            FIELD_REGION => {
                self.criteria.regions =
                    cycle_selection(self.criteria.regions.take(), &self.regions, delta);
                self.refresh();
                self.status = self.default_status();
            }
            FIELD_HORIZON => {
                let (lo, hi) = HORIZON_RANGE;
                let next = if delta >= 0 {
                    self.config.horizon_days.saturating_add(1).min(hi)
                } else {
                    self.config.horizon_days.saturating_sub(1).max(lo)
                };
                if next != self.config.horizon_days {
                    self.config.horizon_days = next;
                    self.refresh();
                }
                self.status = format!("horizon: {}d", self.config.horizon_days);
            }
            _ => {}
        }
    }

    /// Recompute the full catalog for the current criteria/config.
    fn refresh(&mut self) {
        let (matched, catalog) =
            crate::app::pipeline::recompute(&self.ingest.dataset, &self.criteria, &self.config);
        self.matched = matched;
        self.catalog = catalog;
    }

    fn default_status(&self) -> String {
        match &self.catalog.forecast {
            Forecast::Insufficient { dated_records } if self.tab == ChartTab::Forecast => format!(
                "Forecast unavailable: needs at least 2 dated records (have {dated_records})."
            ),
            _ => format!("{} of {} records match", self.matched, self.ingest.dataset.len()),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sd", Style::default().fg(Color::Cyan)),
            Span::raw(" — Sales Data Analysis Dashboard"),
        ]));

        let k = &self.catalog.kpis;
        lines.push(Line::from(Span::styled(
            format!(
                "sales: {} | qty: {} | products: {} | matched: {}/{}",
                fmt_money(k.total_sales),
                k.total_quantity as i64,
                k.unique_products,
                self.matched,
                self.ingest.dataset.len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        lines.push(Line::from(Span::styled(
            format!(
                "source: {} | margin: {:.0}% | {}",
                self.ingest.source,
                self.config.profit_margin * 100.0,
                crate::report::format_criteria(&self.criteria),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(9)])
            .split(area);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(rows[0]);

        self.draw_chart(frame, cols[0]);
        self.draw_side_tables(frame, cols[1]);
        self.draw_settings(frame, rows[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.tab.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((series, forecast, x_bounds, y_bounds)) = self.chart_series() else {
            let msg = Paragraph::new("No data for the current filter.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = SalesPlottersChart {
            series: &series,
            forecast: &forecast,
            x_bounds,
            y_bounds,
            x_label: "date",
            y_label: "sales",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_sales,
        };
        frame.render_widget(widget, inner);
    }

    /// Build the chart series for the active tab.
    ///
    /// Returns `None` when there is nothing to draw.
    #[allow(clippy::type_complexity)]
    fn chart_series(&self) -> Option<(Vec<(f64, f64)>, Vec<(f64, f64)>, [f64; 2], [f64; 2])> {
        let observed: Vec<(f64, f64)> = match self.tab {
            ChartTab::Monthly => &self.catalog.monthly_sales,
            _ => &self.catalog.daily_sales,
        }
        .iter()
        .map(|p| (f64::from(p.date.num_days_from_ce()), p.total_sales))
        .collect();

        let forecast: Vec<(f64, f64)> = if self.tab == ChartTab::Forecast {
            self.catalog
                .forecast
                .points()
                .unwrap_or(&[])
                .iter()
                .map(|p| (f64::from(p.date.num_days_from_ce()), p.predicted_sales))
                .collect()
        } else {
            Vec::new()
        };

        if observed.is_empty() && forecast.is_empty() {
            return None;
        }

        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in observed.iter().chain(forecast.iter()) {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        if !x_min.is_finite() || !x_max.is_finite() {
            return None;
        }
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }
        if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
            y_min -= 1.0;
            y_max = y_min + 2.0;
        }

        let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
        Some((
            observed,
            forecast,
            [x_min, x_max],
            [y_min - pad, y_max + pad],
        ))
    }

    fn draw_side_tables(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let products: Vec<ListItem> = self
            .catalog
            .product_sales
            .iter()
            .take(self.config.top_n)
            .map(|t| ListItem::new(format!("{:<16} {:>12}", clip(&t.key, 16), fmt_money(t.total))))
            .collect();
        let list = List::new(products)
            .block(Block::default().title("Top products").borders(Borders::ALL));
        frame.render_widget(list, rows[0]);

        let regions: Vec<ListItem> = self
            .catalog
            .region_sales
            .iter()
            .map(|t| ListItem::new(format!("{:<12} {:>12}", clip(&t.key, 12), fmt_money(t.total))))
            .collect();
        let list = List::new(regions)
            .block(Block::default().title("Sales by region").borders(Borders::ALL));
        frame.render_widget(list, rows[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let date_label = |d: Option<NaiveDate>| match d {
            Some(d) => d.to_string(),
            None => "any".to_string(),
        };
        let set_label = |s: &Option<BTreeSet<String>>| match s {
            None => "all".to_string(),
            Some(values) => values.iter().cloned().collect::<Vec<_>>().join(","),
        };

        let items = vec![
            ListItem::new(format!("From: {}", date_label(self.criteria.start_date))),
            ListItem::new(format!("To: {}", date_label(self.criteria.end_date))),
            ListItem::new(format!("Category: {}", set_label(&self.criteria.categories))),
            ListItem::new(format!("Product: {}", set_label(&self.criteria.products))),
            ListItem::new(format!("Region: {}", set_label(&self.criteria.regions))),
            ListItem::new(format!("Horizon: {}d", self.config.horizon_days)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Filters").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing_field.is_some() {
            let hint = Paragraph::new(format!("Editing: {}", self.date_input))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ cycle  Enter edit date  Tab chart  r reset  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Cycle a single-value membership filter through `None -> values[0] -> ...
/// -> values[last] -> None`.
///
/// The panel edits one value at a time; multi-value sets (possible via the
/// CLI) collapse to their first member on the first cycle step.
fn cycle_selection(
    current: Option<BTreeSet<String>>,
    values: &[String],
    delta: i32,
) -> Option<BTreeSet<String>> {
    if values.is_empty() {
        return None;
    }

    // Positions: 0 = unrestricted, 1..=len = values[i-1].
    let len = values.len() as i32;
    let current_pos = match &current {
        None => 0,
        Some(set) => set
            .iter()
            .next()
            .and_then(|v| values.iter().position(|x| x == v))
            .map(|i| i as i32 + 1)
            .unwrap_or(0),
    };

    let next = (current_pos + delta).rem_euclid(len + 1);
    if next == 0 {
        None
    } else {
        Some(BTreeSet::from([values[(next - 1) as usize].clone()]))
    }
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "."
    }
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_else(|| format!("{v:.0}"))
}

fn fmt_axis_sales(v: f64) -> String {
    format!("{v:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<String> {
        vec!["East".to_string(), "North".to_string(), "West".to_string()]
    }

    #[test]
    fn cycling_walks_all_values_and_wraps_to_unrestricted() {
        let v = values();
        let mut current = None;

        let expected = ["East", "North", "West"];
        for name in expected {
            current = cycle_selection(current, &v, 1);
            assert_eq!(
                current.as_ref().and_then(|s| s.iter().next().cloned()),
                Some(name.to_string())
            );
        }

        // One more step wraps back to "all".
        current = cycle_selection(current, &v, 1);
        assert!(current.is_none());
    }

    #[test]
    fn cycling_backwards_starts_from_the_last_value() {
        let v = values();
        let current = cycle_selection(None, &v, -1);
        assert_eq!(
            current.and_then(|s| s.iter().next().cloned()),
            Some("West".to_string())
        );
    }

    #[test]
    fn cycling_with_no_values_stays_unrestricted() {
        assert!(cycle_selection(None, &[], 1).is_none());
    }
}
