mod aggregator;
mod cache;
mod cli;
mod error;
mod filter;
mod fmt;
mod intake;
mod models;
mod normalizer;
mod register;
mod settings;
mod tui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt as log_fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    // RUST_LOG > --verbose > warn
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            log_fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => cli::dashboard::run(cli.file.as_deref(), &[], &[], None),
        Some(Commands::Dashboard {
            file,
            period,
            privacy,
        }) => cli::dashboard::run(
            file.as_deref(),
            &period.years,
            &period.months,
            privacy.map(bool::from),
        ),
        Some(Commands::Report {
            file,
            period,
            format,
            top,
        }) => cli::report::run(&file, &period, format, top),
        Some(Commands::Export { file, output }) => cli::export::run(&file, &output),
        Some(Commands::Inspect { file }) => cli::inspect::run(&file),
        Some(Commands::Config {
            privacy,
            top,
            skip_rows,
        }) => cli::config::run(privacy, top, skip_rows),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "tossdash", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
