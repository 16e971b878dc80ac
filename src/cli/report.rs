use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use tracing::warn;

use crate::aggregator::{AggregateView, NetBucket, RemarkTotal};
use crate::cli::{load_table, PeriodArgs, ReportFormat};
use crate::error::Result;
use crate::fmt::{number, won};
use crate::settings::load_settings;

fn amount_cell(val: f64) -> Cell {
    Cell::new(won(val)).set_alignment(CellAlignment::Right)
}

fn kpi_table(view: &AggregateView) -> Table {
    let kpi = &view.kpi;
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Deposits".green()), amount_cell(kpi.deposit)]);
    table.add_row(vec![Cell::new("Withdrawals".red()), amount_cell(kpi.withdrawal)]);
    table.add_row(vec![Cell::new("Latest balance".bold()), amount_cell(kpi.balance)]);
    table.add_row(vec![
        Cell::new("Transactions"),
        Cell::new(number(kpi.count as f64)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new("Cashback"), amount_cell(kpi.cashback)]);
    table.add_row(vec![Cell::new("Interest"), amount_cell(kpi.interest)]);
    table.add_row(vec![
        Cell::new("Income share"),
        Cell::new(format!("{:.1}%", view.cash_flow.income_share() * 100.0))
            .set_alignment(CellAlignment::Right),
    ]);
    table
}

fn monthly_table(view: &AggregateView) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expense", "Net"]);
    for (flow, net) in view.monthly.iter().zip(&view.net_income) {
        let net_text = match net.bucket() {
            NetBucket::Positive => won(net.net).green(),
            NetBucket::NonPositive => won(net.net).red(),
        };
        table.add_row(vec![
            Cell::new(&flow.month),
            amount_cell(flow.income),
            amount_cell(flow.expense),
            Cell::new(net_text).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn hourly_table(view: &AggregateView) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Hour", "Transactions"]);
    for (hour, count) in view.hourly.hours() {
        table.add_row(vec![
            Cell::new(format!("{hour:02}:00")),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn ranking_table(entries: &[RemarkTotal]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Remarks", "Total"]);
    for (i, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.remarks),
            amount_cell(entry.total),
        ]);
    }
    table
}

fn type_table(view: &AggregateView) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Type", "Total"]);
    for total in &view.type_totals {
        let label = if total.transaction_type.is_translated() {
            total.transaction_type.label().normal()
        } else {
            total.transaction_type.label().yellow()
        };
        table.add_row(vec![Cell::new(label), amount_cell(total.total)]);
    }
    table
}

pub fn render_text(view: &AggregateView, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n{}\n\n", "Summary".bold(), kpi_table(view)));
    out.push_str(&format!("{}\n{}\n\n", "Monthly Cash Flow".bold(), monthly_table(view)));
    out.push_str(&format!("{}\n{}\n\n", "Transactions by Hour".bold(), hourly_table(view)));
    out.push_str(&format!(
        "{}\n{}\n\n",
        format!("Top {top_n} Withdrawals").bold(),
        ranking_table(&view.top_withdrawals)
    ));
    out.push_str(&format!(
        "{}\n{}\n\n",
        format!("Top {top_n} Deposits").bold(),
        ranking_table(&view.top_deposits)
    ));
    out.push_str(&format!("{}\n{}", "Totals by Type".bold(), type_table(view)));
    out
}

pub fn run(file: &Path, period: &PeriodArgs, format: ReportFormat, top: Option<usize>) -> Result<()> {
    let (_, table) = load_table(file)?;
    let top_n = top.unwrap_or_else(|| load_settings().top_n);
    let filter = period.to_filter();
    let set = table.filter(&filter);
    if set.is_empty() {
        warn!("no transactions match the selected period");
    }
    let view = AggregateView::compute(&set, top_n);

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        ReportFormat::Text => println!("{}", render_text(&view, top_n)),
    }
    Ok(())
}
