use std::path::{Path, PathBuf};
use std::rc::Rc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};
use tracing::{debug, info, warn};

use crate::aggregator::{AggregateView, NetBucket, RemarkTotal};
use crate::cache::SessionCache;
use crate::error::Result;
use crate::filter::{PeriodFilter, Selection};
use crate::fmt::{format_k, number, won};
use crate::intake::{self, SourceFile};
use crate::normalizer::CanonicalTable;
use crate::register::{self, RegisterRow};
use crate::settings::{load_settings, Settings};
use crate::tui::{
    run_screen, Screen, ScreenAction, Theme, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
    TITLE_STYLE, WARNING_STYLE,
};

pub const NO_FILE_NOTICE: &str =
    "Please provide a transaction file: tossdash dashboard <FILE.xlsx>";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Overview,
    Trends,
    Rankings,
    Register,
}

impl Page {
    const ALL: [Page; 4] = [Page::Overview, Page::Trends, Page::Rankings, Page::Register];

    fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Trends => "Trends",
            Page::Rankings => "Top Remarks",
            Page::Register => "Register",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PillRow {
    Years,
    Months,
}

/// Initial selection from the command line, falling back to the latest year
/// with all of its months.
fn initial_filter(table: &CanonicalTable, years: &[i32], months: &[u32]) -> PeriodFilter {
    let mut filter = PeriodFilter::dashboard_default(table);
    if !years.is_empty() {
        filter.years = Selection::only(years.iter().copied());
        filter.months = Selection::only(table.available_months(&filter.years));
    }
    if !months.is_empty() {
        filter.months = Selection::only(months.iter().copied());
    }
    filter
}

struct Dashboard {
    path: PathBuf,
    cache: SessionCache,
    table: Rc<CanonicalTable>,
    filter: PeriodFilter,
    view: AggregateView,
    register: Vec<RegisterRow>,
    theme: Theme,
    top_n: usize,
    privacy: bool,
    page: Page,
    pill_row: PillRow,
    pill_cursor: usize,
    register_offset: usize,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(
        path: PathBuf,
        mut cache: SessionCache,
        source: &SourceFile,
        filter_years: &[i32],
        filter_months: &[u32],
        settings: &Settings,
        privacy: bool,
    ) -> Result<Self> {
        let table = cache.load(source)?;
        let filter = initial_filter(&table, filter_years, filter_months);
        let mut dashboard = Self {
            path,
            cache,
            table,
            filter,
            view: AggregateView::default(),
            register: Vec::new(),
            theme: Theme::from_palette(&settings.palette),
            top_n: settings.top_n,
            privacy,
            page: Page::Overview,
            pill_row: PillRow::Years,
            pill_cursor: 0,
            register_offset: 0,
            status_message: None,
        };
        dashboard.refresh();
        Ok(dashboard)
    }

    /// Recompute every aggregate for the current filter.
    fn refresh(&mut self) {
        let set = self.table.filter(&self.filter);
        debug!(rows = set.len(), "recomputing aggregates");
        self.view = AggregateView::compute(&set, self.top_n);
        self.register = register::rows(&set, self.privacy);
        self.register_offset = self.register_offset.min(self.register.len().saturating_sub(1));
    }

    fn reload(&mut self, force: bool) {
        if force {
            self.cache.invalidate();
        }
        let result = SourceFile::read(&self.path).and_then(|source| self.cache.load(&source));
        match result {
            Ok(table) => {
                debug!(
                    key = self.cache.current_key().unwrap_or(""),
                    hits = self.cache.hits(),
                    misses = self.cache.misses(),
                    "reloaded"
                );
                let unchanged = Rc::ptr_eq(&table, &self.table);
                if !unchanged {
                    self.filter = PeriodFilter::dashboard_default(&table);
                    self.pill_cursor = 0;
                }
                self.table = table;
                self.refresh();
                self.status_message = Some(if unchanged {
                    "File unchanged.".to_string()
                } else {
                    format!("Reloaded {} transactions.", number(self.table.len() as f64))
                });
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.status_message = Some(if e.is_normalization() {
                    format!("File rejected, keeping previous data: {e}")
                } else {
                    format!("Reload failed: {e}")
                });
            }
        }
    }

    fn years(&self) -> Vec<i32> {
        self.table.available_years()
    }

    fn months(&self) -> Vec<u32> {
        self.table.available_months(&self.filter.years)
    }

    fn pill_count(&self) -> usize {
        match self.pill_row {
            PillRow::Years => self.years().len(),
            PillRow::Months => self.months().len(),
        }
    }

    fn toggle_pill(&mut self) {
        match self.pill_row {
            PillRow::Years => {
                let years = self.years();
                if let Some(year) = years.get(self.pill_cursor).copied() {
                    self.filter.years.toggle(year, &years);
                    self.filter.months = Selection::only(self.months());
                }
            }
            PillRow::Months => {
                let months = self.months();
                if let Some(month) = months.get(self.pill_cursor).copied() {
                    self.filter.months.toggle(month, &months);
                }
            }
        }
        self.refresh();
    }

    fn select_all(&mut self) {
        match self.pill_row {
            PillRow::Years => {
                self.filter.years = Selection::only(self.years());
                self.filter.months = Selection::only(self.months());
            }
            PillRow::Months => self.filter.months = Selection::only(self.months()),
        }
        self.refresh();
    }

    fn select_none(&mut self) {
        match self.pill_row {
            PillRow::Years => self.filter.years = Selection::none(),
            PillRow::Months => self.filter.months = Selection::none(),
        }
        self.refresh();
    }

    fn warning(&self) -> Option<&'static str> {
        if self.filter.is_empty() {
            Some(if self.filter.years.is_empty() {
                "Select at least one year."
            } else {
                "Select at least one month."
            })
        } else if self.table.is_empty() || self.view.kpi.count == 0 {
            Some("No transactions in the selected period.")
        } else {
            None
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(" Toss Transactions ", HEADER_STYLE)];
        for page in Page::ALL {
            let style = if page == self.page {
                SELECTED_STYLE
            } else {
                FOOTER_STYLE
            };
            spans.push(Span::styled(
                format!(" {} {} ", page.index() + 1, page.title()),
                style,
            ));
        }
        let privacy = if self.privacy { "privacy on" } else { "privacy off" };
        spans.push(Span::styled(format!("  [{privacy}]"), FOOTER_STYLE));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn pill_line(&self, label: &str, row: PillRow, values: Vec<(String, bool)>) -> Line<'static> {
        let mut spans = vec![Span::styled(format!(" {label:<8}"), TITLE_STYLE)];
        for (i, (text, selected)) in values.into_iter().enumerate() {
            let mut style = if selected {
                Style::new().fg(self.theme.deposit).add_modifier(Modifier::BOLD)
            } else {
                FOOTER_STYLE
            };
            if row == self.pill_row && i == self.pill_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let marker = if selected { "●" } else { "○" };
            spans.push(Span::styled(format!(" {marker} {text} "), style));
        }
        Line::from(spans)
    }

    fn draw_pills(&self, frame: &mut Frame, area: Rect) {
        let years = self
            .years()
            .into_iter()
            .map(|y| (y.to_string(), self.filter.years.contains(&y)))
            .collect();
        let months = self
            .months()
            .into_iter()
            .map(|m| {
                let name = MONTH_NAMES[(m as usize).saturating_sub(1) % 12].to_string();
                (name, self.filter.months.contains(&m))
            })
            .collect();
        let lines = vec![
            self.pill_line("Years", PillRow::Years, years),
            self.pill_line("Months", PillRow::Months, months),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_overview(&self, frame: &mut Frame, area: Rect) {
        let [kpi_area, charts_area] =
            Layout::vertical([Constraint::Length(4), Constraint::Fill(1)]).areas(area);

        let kpi = &self.view.kpi;
        let cell = |label: &str, value: Span<'static>| {
            Line::from(vec![Span::raw(format!(" {label:<14}")), value])
        };
        let [k1, k2, k3] = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .areas(kpi_area);
        frame.render_widget(
            Paragraph::new(vec![
                cell("Deposits", self.theme.won_span(kpi.deposit)),
                cell("Transactions", Span::raw(number(kpi.count as f64))),
            ]),
            k1,
        );
        frame.render_widget(
            Paragraph::new(vec![
                cell("Withdrawals", self.theme.won_span(-kpi.withdrawal)),
                cell("Cashback", self.theme.won_span(kpi.cashback)),
            ]),
            k2,
        );
        frame.render_widget(
            Paragraph::new(vec![
                cell("Balance", self.theme.won_span(kpi.balance)),
                cell("Interest", self.theme.won_span(kpi.interest)),
            ]),
            k3,
        );

        let [flow_area, split_area] =
            Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)])
                .areas(charts_area);
        self.draw_monthly_flow(frame, flow_area);
        self.draw_cash_flow_split(frame, split_area);
    }

    fn draw_monthly_flow(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Monthly Income vs Expense")
            .title_style(TITLE_STYLE)
            .borders(Borders::NONE);
        if self.view.monthly.is_empty() {
            frame.render_widget(Paragraph::new(" No data").block(block).style(FOOTER_STYLE), area);
            return;
        }

        let max_val = self
            .view
            .monthly
            .iter()
            .map(|m| m.income.max(m.expense))
            .fold(1.0, f64::max);
        let bar_area = draw_y_axis(frame, area, max_val);

        let income_style = Style::new().fg(self.theme.deposit);
        let expense_style = Style::new().fg(self.theme.withdrawal);
        let groups: Vec<BarGroup> = self
            .view
            .monthly
            .iter()
            .map(|m| {
                let bars = vec![
                    Bar::default()
                        .value(m.income.max(0.0) as u64)
                        .text_value(String::new())
                        .style(income_style),
                    Bar::default()
                        .value(m.expense.max(0.0) as u64)
                        .text_value(String::new())
                        .style(expense_style),
                ];
                BarGroup::default()
                    .label(Line::from(short_month(&m.month)))
                    .bars(&bars)
            })
            .collect();

        let mut chart = BarChart::default()
            .block(block)
            .bar_width(2)
            .bar_gap(0)
            .group_gap(1);
        for group in &groups {
            chart = chart.data(group.clone());
        }
        frame.render_widget(chart, bar_area);
    }

    fn draw_cash_flow_split(&self, frame: &mut Frame, area: Rect) {
        let split = &self.view.cash_flow;
        let share = split.income_share();
        let [title_area, gauge_area, legend_area, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Fill(1),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(" Cash Flow").style(TITLE_STYLE), title_area);

        let label = if split.income + split.expense > 0.0 {
            format!("{:.0}% in / {:.0}% out", share * 100.0, (1.0 - share) * 100.0)
        } else {
            "no flow".to_string()
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_style(FOOTER_STYLE))
            .gauge_style(Style::new().fg(self.theme.deposit).bg(self.theme.withdrawal))
            .ratio(share.clamp(0.0, 1.0))
            .label(label);
        frame.render_widget(gauge, gauge_area);

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(vec![Span::raw(" Income   "), self.theme.won_span(split.income)]),
                Line::from(vec![Span::raw(" Expense  "), self.theme.won_span(-split.expense)]),
            ]),
            legend_area,
        );
    }

    fn draw_trends(&self, frame: &mut Frame, area: Rect) {
        let [net_area, hourly_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

        let positive = Style::new().fg(self.theme.deposit);
        let negative = Style::new().fg(self.theme.withdrawal);
        let bars: Vec<Bar> = self
            .view
            .net_income
            .iter()
            .map(|n| {
                let style = match n.bucket() {
                    NetBucket::Positive => positive,
                    NetBucket::NonPositive => negative,
                };
                Bar::default()
                    .value(n.net.abs() as u64)
                    .text_value(format_k(n.net))
                    .label(Line::from(short_month(&n.month)))
                    .style(style)
                    .value_style(style.add_modifier(Modifier::REVERSED))
            })
            .collect();
        let net_chart = BarChart::default()
            .block(
                Block::default()
                    .title("Net Income by Month (bar height = magnitude)")
                    .title_style(TITLE_STYLE),
            )
            .data(BarGroup::default().bars(&bars))
            .bar_width(6)
            .bar_gap(1);
        frame.render_widget(net_chart, net_area);

        // absent hours render as zero-height bars
        let hourly_style = Style::new().fg(self.theme.hourly);
        let slots = self.view.hourly.zero_filled();
        let hour_bars: Vec<Bar> = slots
            .iter()
            .enumerate()
            .map(|(h, count)| {
                Bar::default()
                    .value(*count as u64)
                    .label(Line::from(format!("{h:02}")))
                    .style(hourly_style)
            })
            .collect();
        let hourly_chart = BarChart::default()
            .block(
                Block::default()
                    .title("Transactions by Hour of Day")
                    .title_style(TITLE_STYLE),
            )
            .data(BarGroup::default().bars(&hour_bars))
            .bar_width(2)
            .bar_gap(1);
        frame.render_widget(hourly_chart, hourly_area);
    }

    fn ranking_lines(&self, title: String, entries: &[RemarkTotal], color: Color) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(format!(" {title}"), TITLE_STYLE))];
        if entries.is_empty() {
            lines.push(Line::from(Span::styled(" No data", FOOTER_STYLE)));
            return lines;
        }
        let max = entries.iter().map(|e| e.total).fold(0.0, f64::max).max(1.0);
        let name_width = entries
            .iter()
            .map(|e| e.remarks.chars().count())
            .max()
            .unwrap_or(10)
            .min(24);
        for (i, entry) in entries.iter().enumerate() {
            let name: String = entry.remarks.chars().take(name_width).collect();
            let bar_len = ((entry.total / max) * 20.0).round() as usize;
            lines.push(Line::from(vec![
                Span::raw(format!(" {:>2}. {:<width$} ", i + 1, name, width = name_width)),
                Span::styled("█".repeat(bar_len.max(1)), Style::new().fg(color)),
                Span::raw(" "),
                Span::styled(won(entry.total), Style::new().fg(color)),
            ]));
        }
        lines
    }

    fn draw_rankings(&self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let withdrawals = self.ranking_lines(
            format!("Top {} Withdrawals", self.top_n),
            &self.view.top_withdrawals,
            self.theme.withdrawal,
        );
        let deposits = self.ranking_lines(
            format!("Top {} Deposits", self.top_n),
            &self.view.top_deposits,
            self.theme.deposit,
        );
        frame.render_widget(Paragraph::new(withdrawals), left);
        frame.render_widget(Paragraph::new(deposits), right);
    }

    fn draw_register(&self, frame: &mut Frame, area: Rect) {
        let [types_area, table_area] =
            Layout::horizontal([Constraint::Length(36), Constraint::Fill(1)]).areas(area);

        let mut type_lines = vec![Line::from(Span::styled(" Totals by Type", TITLE_STYLE))];
        for total in &self.view.type_totals {
            type_lines.push(Line::from(vec![
                Span::styled(" ■ ", Style::new().fg(self.theme.type_color(&total.transaction_type))),
                Span::raw(format!("{:<18}", total.transaction_type.label())),
                self.theme.won_span(total.total),
            ]));
        }
        frame.render_widget(Paragraph::new(type_lines), types_area);

        let visible = table_area.height.saturating_sub(2) as usize;
        let rows: Vec<Row> = self
            .register
            .iter()
            .skip(self.register_offset)
            .take(visible)
            .map(|r| {
                let amount_style = if r.negative {
                    Style::new().fg(self.theme.withdrawal)
                } else {
                    Style::new().fg(self.theme.deposit)
                };
                Row::new(vec![
                    Cell::from(r.timestamp.clone()),
                    Cell::from(r.transaction_type.clone()),
                    Cell::from(r.remarks.clone()),
                    Cell::from(Span::styled(r.amount.clone(), amount_style)),
                    Cell::from(r.balance.clone()),
                    Cell::from(r.bank.clone()),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Fill(1),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(12),
        ];
        let header = ["Time", "Type", "Remarks", "Amount", "Balance", "Bank"];
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1);
        frame.render_widget(table, table_area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some(msg) = &self.status_message {
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(WARNING_STYLE), area);
            return;
        }
        frame.render_widget(
            Paragraph::new(
                " 1-4/Tab=page  y/m=pick row  Left/Right=move  Space=toggle  a/n=all/none  p=privacy  r/R=reload  q=quit",
            )
            .style(FOOTER_STYLE),
            area,
        );
    }
}

impl Screen for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep1, pills_area, sep2, body_area, warn_area, footer_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        self.draw_header(frame, header_area);
        let sep_line = "━".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(FOOTER_STYLE);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget, sep2);
        self.draw_pills(frame, pills_area);

        match self.page {
            Page::Overview => self.draw_overview(frame, body_area),
            Page::Trends => self.draw_trends(frame, body_area),
            Page::Rankings => self.draw_rankings(frame, body_area),
            Page::Register => self.draw_register(frame, body_area),
        }

        if let Some(warning) = self.warning() {
            frame.render_widget(
                Paragraph::new(format!(" ⚠ {warning}")).style(WARNING_STYLE),
                warn_area,
            );
        }
        self.draw_footer(frame, footer_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        self.status_message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Char(c @ '1'..='4') => {
                self.page = Page::ALL[(c as usize) - ('1' as usize)];
            }
            KeyCode::Tab => self.page = self.page.next(),
            KeyCode::BackTab => self.page = self.page.prev(),
            KeyCode::Char('y') => {
                self.pill_row = PillRow::Years;
                self.pill_cursor = 0;
            }
            KeyCode::Char('m') => {
                self.pill_row = PillRow::Months;
                self.pill_cursor = 0;
            }
            KeyCode::Left => self.pill_cursor = self.pill_cursor.saturating_sub(1),
            KeyCode::Right => {
                let count = self.pill_count();
                if count > 0 {
                    self.pill_cursor = (self.pill_cursor + 1).min(count - 1);
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_pill(),
            KeyCode::Char('a') => self.select_all(),
            KeyCode::Char('n') => self.select_none(),
            KeyCode::Char('p') => {
                self.privacy = !self.privacy;
                self.refresh();
            }
            KeyCode::Char('r') => self.reload(false),
            KeyCode::Char('R') => self.reload(true),
            KeyCode::Up => self.register_offset = self.register_offset.saturating_sub(1),
            KeyCode::Down => {
                if self.register_offset + 1 < self.register.len() {
                    self.register_offset += 1;
                }
            }
            KeyCode::PageDown => {
                self.register_offset =
                    (self.register_offset + 20).min(self.register.len().saturating_sub(1));
            }
            KeyCode::PageUp => self.register_offset = self.register_offset.saturating_sub(20),
            _ => {}
        }
        ScreenAction::Continue
    }
}

/// "2024-03" → "Mar 24".
fn short_month(month_key: &str) -> String {
    match month_key.split_once('-') {
        Some((year, month)) => {
            let name = month
                .parse::<usize>()
                .ok()
                .and_then(|m| MONTH_NAMES.get(m.wrapping_sub(1)))
                .copied()
                .unwrap_or(month);
            format!("{name} {}", year.get(2..).unwrap_or(year))
        }
        None => month_key.to_string(),
    }
}

/// Pick round y-axis tick values (top and mid) given a max data value.
/// Steps run 1k, 2.5k, 5k, 10k, 25k, ...
fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let mut base = 1_000.0;
    while base < 1e15 {
        for step in [1.0, 2.5, 5.0] {
            let top = base * step;
            if top >= max_val {
                return (top, top / 2.0);
            }
        }
        base *= 10.0;
    }
    (max_val, max_val / 2.0)
}

/// Render top/mid tick labels on the left of `area`; returns the remaining chart area.
fn draw_y_axis(frame: &mut Frame, area: Rect, max_val: f64) -> Rect {
    let (top_tick, mid_tick) = y_axis_ticks(max_val);
    let top_label = format_k(top_tick);
    let mid_label = format_k(mid_tick);
    let width = top_label.len().max(mid_label.len()) + 1;

    let [y_axis_area, bar_area] =
        Layout::horizontal([Constraint::Length(width as u16), Constraint::Fill(1)]).areas(area);

    // title row + month label row
    let inner_height = bar_area.height.saturating_sub(2);
    let mid_row = inner_height / 2;
    let mut y_lines = vec![Line::from("")];
    for row in 0..inner_height {
        let label = if row == 0 {
            top_label.as_str()
        } else if row == mid_row {
            mid_label.as_str()
        } else {
            ""
        };
        y_lines.push(Line::from(Span::styled(format!("{label:>width$}"), FOOTER_STYLE)));
    }
    frame.render_widget(Paragraph::new(y_lines), y_axis_area);
    bar_area
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(file: Option<&Path>, years: &[i32], months: &[u32], privacy: Option<bool>) -> Result<()> {
    let Some(source) = intake::load(file)? else {
        println!("{NO_FILE_NOTICE}");
        return Ok(());
    };
    let settings = load_settings();
    let path = file.map(Path::to_path_buf).unwrap_or_default();
    let cache = SessionCache::new(settings.skip_rows);
    let privacy = privacy.unwrap_or(settings.privacy_mode);
    let mut dashboard = Dashboard::new(path, cache, &source, years, months, &settings, privacy)?;
    info!(transactions = dashboard.table.len(), "starting dashboard");
    run_screen(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::txn;
    use crate::models::TransactionType;

    fn table() -> CanonicalTable {
        CanonicalTable::new(vec![
            txn("2023-12-31 23:00:00", "a", TransactionType::Deposit, 1.0, 1.0),
            txn("2024-02-01 10:00:00", "b", TransactionType::Deposit, 1.0, 2.0),
            txn("2024-04-01 10:00:00", "c", TransactionType::Withdrawal, -1.0, 1.0),
        ])
    }

    #[test]
    fn test_initial_filter_defaults_to_latest_year() {
        let f = initial_filter(&table(), &[], &[]);
        assert_eq!(f.years, Selection::only([2024]));
        assert_eq!(f.months, Selection::only([2, 4]));
    }

    #[test]
    fn test_initial_filter_from_flags() {
        let f = initial_filter(&table(), &[2023], &[]);
        assert_eq!(f.months, Selection::only([12]));
        let f = initial_filter(&table(), &[2023, 2024], &[4]);
        assert_eq!(f.years, Selection::only([2023, 2024]));
        assert_eq!(f.months, Selection::only([4]));
    }

    #[test]
    fn test_short_month() {
        assert_eq!(short_month("2024-03"), "Mar 24");
        assert_eq!(short_month("2024-13"), "13 24");
        assert_eq!(short_month("bogus"), "bogus");
    }

    #[test]
    fn test_y_axis_ticks() {
        assert_eq!(y_axis_ticks(800.0), (1_000.0, 500.0));
        assert_eq!(y_axis_ticks(2_400.0), (2_500.0, 1_250.0));
        assert_eq!(y_axis_ticks(3_100_000.0), (5_000_000.0, 2_500_000.0));
    }

    fn dashboard_for(content: &str) -> Dashboard {
        let source = SourceFile::from_bytes("export.csv", content.as_bytes().to_vec());
        Dashboard::new(
            PathBuf::from("export.csv"),
            SessionCache::new(0),
            &source,
            &[],
            &[],
            &Settings::default(),
            true,
        )
        .unwrap()
    }

    const HEADER: &str = ",거래 일시,적요,거래 유형,거래 기관,계좌번호,거래 금액,거래 후 잔액\n";

    #[test]
    fn test_header_only_file_warns_no_transactions() {
        let dashboard = dashboard_for(HEADER);
        assert!(!dashboard.filter.is_empty());
        assert_eq!(dashboard.warning(), Some("No transactions in the selected period."));
    }

    #[test]
    fn test_clearing_months_warns_select_month() {
        let content = format!("{HEADER}0,2024.01.10 09:00:00,급여,입금,토스뱅크,,100,100\n");
        let mut dashboard = dashboard_for(&content);
        assert_eq!(dashboard.warning(), None);
        assert!(matches!(dashboard.handle_key(KeyCode::Char('m')), ScreenAction::Continue));
        dashboard.handle_key(KeyCode::Char('n'));
        assert_eq!(dashboard.warning(), Some("Select at least one month."));
        assert_eq!(dashboard.view.kpi.count, 0);
        dashboard.handle_key(KeyCode::Char('a'));
        assert_eq!(dashboard.view.kpi.count, 1);
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Register.next(), Page::Overview);
        assert_eq!(Page::Overview.prev(), Page::Register);
    }
}
