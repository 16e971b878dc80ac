pub mod config;
pub mod dashboard;
pub mod export;
pub mod inspect;
pub mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::error::Result;
use crate::filter::{PeriodFilter, Selection};
use crate::intake::SourceFile;
use crate::normalizer::{normalize, CanonicalTable};
use crate::settings::load_settings;

#[derive(Parser)]
#[command(
    name = "tossdash",
    version,
    about = "Terminal dashboard for Toss Bank transaction exports.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Export to open in the dashboard when no subcommand is given
    pub file: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard for a transaction export.
    Dashboard {
        /// Path to the XLSX (or CSV) export
        file: Option<PathBuf>,
        #[command(flatten)]
        period: PeriodArgs,
        /// Mask remarks, amounts, balances and banks in the register
        #[arg(long, value_enum)]
        privacy: Option<Toggle>,
    },
    /// Print the summary aggregates for a period.
    Report {
        file: PathBuf,
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Number of remarks in each ranking (default from settings)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Write the normalized transaction table as CSV.
    Export {
        file: PathBuf,
        /// Output path
        #[arg(long, short, default_value = "transactions.csv")]
        output: PathBuf,
    },
    /// Show checksum, row count, date range and label coverage of a file.
    Inspect { file: PathBuf },
    /// Show or update settings.
    Config {
        #[arg(long, value_enum)]
        privacy: Option<Toggle>,
        /// Default ranking length
        #[arg(long)]
        top: Option<usize>,
        /// Preamble rows above the header in exports
        #[arg(long = "skip-rows")]
        skip_rows: Option<usize>,
    },
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct PeriodArgs {
    /// Restrict to a year (repeatable)
    #[arg(long = "year")]
    pub years: Vec<i32>,
    /// Restrict to a month 1-12 (repeatable)
    #[arg(long = "month", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub months: Vec<u32>,
}

fn selection<T: Ord + Copy>(values: &[T]) -> Selection<T> {
    if values.is_empty() {
        Selection::All
    } else {
        Selection::only(values.iter().copied())
    }
}

impl PeriodArgs {
    /// Unset flags mean "every year" / "every month".
    pub fn to_filter(&self) -> PeriodFilter {
        PeriodFilter {
            years: selection(&self.years),
            months: selection(&self.months),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(t: Toggle) -> bool {
        t == Toggle::On
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Read and normalize a file in one shot, using the configured preamble size.
pub(crate) fn load_table(file: &std::path::Path) -> Result<(SourceFile, CanonicalTable)> {
    let settings = load_settings();
    let source = SourceFile::read(file)?;
    let raw = crate::intake::read_raw_table(&source, settings.skip_rows)?;
    let table = normalize(&raw)?;
    Ok((source, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_period_args_to_filter() {
        let args = PeriodArgs { years: vec![2024], months: vec![] };
        let filter = args.to_filter();
        assert_eq!(filter.years, Selection::only([2024]));
        assert_eq!(filter.months, Selection::All);
        assert_eq!(PeriodArgs::default().to_filter(), PeriodFilter::all());
    }

    #[test]
    fn test_parse_dashboard_flags() {
        let cli = Cli::try_parse_from([
            "tossdash", "dashboard", "x.xlsx", "--year", "2024", "--month", "3", "--month", "4",
            "--privacy", "off",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Dashboard { file, period, privacy }) => {
                assert_eq!(file, Some(PathBuf::from("x.xlsx")));
                assert_eq!(period.months, vec![3, 4]);
                assert_eq!(privacy, Some(Toggle::Off));
            }
            _ => panic!("expected dashboard"),
        }
    }

    #[test]
    fn test_bare_file_means_dashboard() {
        let cli = Cli::try_parse_from(["tossdash", "export.xlsx"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.file, Some(PathBuf::from("export.xlsx")));
    }

    #[test]
    fn test_month_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["tossdash", "report", "x.csv", "--month", "13"]).is_err());
    }
}
