//! sheet-ledger: a products/customers/orders workbook treated as a tiny relational store.

pub mod commands;
pub mod config;
pub mod contacts;
pub mod error;
pub mod excel;
pub mod logging;
pub mod query;
pub mod report;
pub mod shell;
pub mod store;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use commands::{Cli, Command};
use config::LedgerConfig;
use error::LedgerError;
use report::{OutputFormat, Renderer};
use store::LedgerStore;

/// Exit code for "nothing to show" outcomes (not found, no data)
const EXIT_EMPTY_RESULT: u8 = 2;

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let config = LedgerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init_logging(cli.verbose, config.log_filter.as_deref());

    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };
    let renderer = Renderer::new(format, config.date_format.clone());
    let path = commands::clean_path(&cli.file);
    let command = cli.command.unwrap_or(Command::Interactive);

    if cli.dry_run && command.is_mutation() {
        tracing::warn!("dry run: the workbook will not be written");
    }

    let result = match command {
        // Only needs the sheet list, not the fixed layout
        Command::Sheets => commands::sheets(&path, &renderer),
        _ => open_store(&path, &config, cli.dry_run)
            .and_then(|mut store| commands::execute(&mut store, &renderer, &path, &command)),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_empty_result() => {
            println!("{}", renderer.error(&e));
            Ok(ExitCode::from(EXIT_EMPTY_RESULT))
        }
        Err(e) => {
            tracing::debug!(kind = e.kind(), "command failed");
            match format {
                OutputFormat::Json => println!("{}", renderer.error(&e)),
                OutputFormat::Text => eprintln!("{}", renderer.error(&e)),
            }
            Ok(ExitCode::from(1))
        }
    }
}

fn open_store(path: &Path, config: &LedgerConfig, dry_run: bool) -> Result<LedgerStore, LedgerError> {
    if dry_run {
        LedgerStore::open_read_only(path, config)
    } else {
        LedgerStore::open(path, config)
    }
}
