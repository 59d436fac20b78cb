use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::contacts;
use crate::error::LedgerError;
use crate::excel;
use crate::query;
use crate::report::{ChangeKind, Renderer};
use crate::shell::Shell;
use crate::store::LedgerStore;

pub const MIN_YEAR: i32 = 1900;

#[derive(Parser, Debug)]
#[command(
    name = "sheet-ledger",
    version,
    about = "Query and maintain the products/customers/orders workbook"
)]
pub struct Cli {
    /// Workbook with the Products, Customers and Orders sheets
    #[arg(short, long, env = "SHEET_LEDGER_FILE")]
    pub file: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Apply changes in memory only; never write the workbook
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose logging (info to stderr)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Customers who ordered a product (name match ignores case)
    CustomersByProduct {
        /// Product name
        name: String,
    },

    /// Customer with the most orders in a calendar month
    TopCustomer {
        #[arg(short, long, value_parser = parse_year)]
        year: i32,

        #[arg(short, long, value_parser = parse_month)]
        month: u32,
    },

    /// List every organization with its contact person
    Contacts,

    /// Add a new organization with its contact person
    AddContact {
        contact_person: String,
        organization: String,
    },

    /// Remove the customer whose contact person matches
    RemoveContact { contact_person: String },

    /// Rename a contact person
    ChangeContact { current: String, new: String },

    /// List sheets in the workbook
    Sheets,

    /// Check the workbook layout and data
    Check,

    /// Menu-driven session (default)
    Interactive,
}

impl Command {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddContact { .. } | Command::RemoveContact { .. } | Command::ChangeContact { .. }
        )
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Year accepted by the top-customer question: 1900 up to the current year
pub fn validate_year(year: i32) -> Result<i32, String> {
    let max = current_year();
    if (MIN_YEAR..=max).contains(&year) {
        Ok(year)
    } else {
        Err(format!("year must be between {} and {}", MIN_YEAR, max))
    }
}

pub fn validate_month(month: u32) -> Result<u32, String> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err("month must be between 1 and 12".to_string())
    }
}

fn parse_year(value: &str) -> Result<i32, String> {
    let year = value
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("'{}' is not a year", value))?;
    validate_year(year)
}

fn parse_month(value: &str) -> Result<u32, String> {
    let month = value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a month number", value))?;
    validate_month(month)
}

/// Trim whitespace and one pair of surrounding quotes, as pasted paths often carry them
pub fn clean_path(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

pub fn customers_by_product(store: &LedgerStore, renderer: &Renderer, name: &str) -> Result<String, LedgerError> {
    let name = name.trim();
    let rows = query::find_customers_by_product_name(store, name)?;
    Ok(renderer.product_customers(name, &rows))
}

pub fn top_customer(store: &LedgerStore, renderer: &Renderer, year: i32, month: u32) -> Result<String, LedgerError> {
    let top = query::find_top_customer(store, year, month)?;
    Ok(renderer.top_customer(&top))
}

pub fn list_contacts(store: &LedgerStore, renderer: &Renderer) -> Result<String, LedgerError> {
    let entries = query::list_contact_persons(store)?;
    Ok(renderer.contacts(&entries))
}

pub fn add_contact(
    store: &mut LedgerStore,
    renderer: &Renderer,
    contact_person: &str,
    organization: &str,
) -> Result<String, LedgerError> {
    let change = contacts::add_contact(store, contact_person.trim(), organization.trim())?;
    Ok(renderer.contact_change(ChangeKind::Added, &change))
}

pub fn remove_contact(store: &mut LedgerStore, renderer: &Renderer, contact_person: &str) -> Result<String, LedgerError> {
    let change = contacts::remove_contact(store, contact_person.trim())?;
    Ok(renderer.contact_change(ChangeKind::Removed, &change))
}

pub fn change_contact(
    store: &mut LedgerStore,
    renderer: &Renderer,
    current: &str,
    new: &str,
) -> Result<String, LedgerError> {
    let change = contacts::change_contact(store, current.trim(), new.trim())?;
    Ok(renderer.contact_change(ChangeKind::Changed, &change))
}

pub fn check(store: &LedgerStore, renderer: &Renderer) -> String {
    let result = excel::validate_store(store);
    renderer.validation(&result)
}

pub fn sheets(path: &Path, renderer: &Renderer) -> Result<String, LedgerError> {
    let sheets = excel::get_sheets(path)?;
    Ok(renderer.sheets(&sheets))
}

/// Run one command against an open store; `path` is the workbook the store came from
pub fn execute(
    store: &mut LedgerStore,
    renderer: &Renderer,
    path: &Path,
    command: &Command,
) -> Result<String, LedgerError> {
    match command {
        Command::CustomersByProduct { name } => customers_by_product(store, renderer, name),
        Command::TopCustomer { year, month } => top_customer(store, renderer, *year, *month),
        Command::Contacts => list_contacts(store, renderer),
        Command::AddContact {
            contact_person,
            organization,
        } => add_contact(store, renderer, contact_person, organization),
        Command::RemoveContact { contact_person } => remove_contact(store, renderer, contact_person),
        Command::ChangeContact { current, new } => change_contact(store, renderer, current, new),
        Command::Check => Ok(check(store, renderer)),
        Command::Sheets => sheets(path, renderer),
        Command::Interactive => {
            let stdin = std::io::stdin();
            let mut shell = Shell::new(store, renderer.date_format(), stdin.lock(), std::io::stdout());
            shell
                .run()
                .map_err(|e| LedgerError::read_error(format!("Console error: {}", e)))?;
            Ok(String::new())
        }
    }
}
