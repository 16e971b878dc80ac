use std::io::Write;
use std::path::Path;

use csv::Writer;
use tracing::info;

use crate::cli::load_table;
use crate::error::Result;
use crate::normalizer::CanonicalTable;

pub const EXPORT_HEADER: [&str; 10] = [
    "timestamp",
    "remarks",
    "transaction_type",
    "bank_name",
    "account_number",
    "amount",
    "balance_after",
    "date_only",
    "time_of_day",
    "month_key",
];

/// Write the canonical table as CSV, one row per transaction in source order.
pub fn write_csv<W: Write>(table: &CanonicalTable, out: W) -> Result<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(EXPORT_HEADER)?;
    for t in table.transactions() {
        wtr.write_record([
            t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            t.remarks.clone(),
            t.transaction_type.label().to_string(),
            t.bank_name.clone(),
            t.account_number.to_string(),
            t.amount.to_string(),
            t.balance_after.to_string(),
            t.date_only.to_string(),
            t.time_of_day.format("%H:%M:%S").to_string(),
            t.month_key.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(file: &Path, output: &Path) -> Result<()> {
    let (_, table) = load_table(file)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let out = std::fs::File::create(output)?;
    write_csv(&table, out)?;
    info!(rows = table.len(), path = %output.display(), "exported csv");
    println!("Wrote {} transactions to {}", table.len(), output.display());
    Ok(())
}
