use std::path::Path;

use colored::Colorize;

use crate::aggregator::latest;
use crate::cli::load_table;
use crate::error::Result;
use crate::fmt::{number, won};
use crate::intake::get_for_source;

pub fn run(file: &Path) -> Result<()> {
    let (source, table) = load_table(file)?;
    let format = get_for_source(&source)?;

    println!("File:         {}", file.display());
    println!("Format:       {}", format.key());
    println!("Size:         {} bytes", number(source.bytes.len() as f64));
    println!("Checksum:     {}", source.checksum);
    println!("Transactions: {}", number(table.len() as f64));

    let first = table.transactions().iter().map(|t| t.timestamp).min();
    let last = table.transactions().iter().map(|t| t.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => println!("Date range:   {first} to {last}"),
        _ => println!("Date range:   (no transactions)"),
    }

    let years: Vec<String> = table
        .available_years()
        .iter()
        .map(|y| y.to_string())
        .collect();
    println!(
        "Years:        {}",
        if years.is_empty() { "(none)".to_string() } else { years.join(", ") }
    );

    let rows: Vec<_> = table.transactions().iter().collect();
    if let Some(t) = latest(&rows) {
        println!("Last balance: {}", won(t.balance_after));
    }

    let untranslated = table.untranslated_types();
    println!();
    if untranslated.is_empty() {
        println!("All transaction type labels translated.");
    } else {
        println!("{}", "Untranslated type labels:".yellow().bold());
        for (label, count) in untranslated {
            println!("  {label:<20} {count}");
        }
    }
    Ok(())
}
