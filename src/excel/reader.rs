use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::types::*;
use crate::config::SheetNames;
use crate::error::LedgerError;
use crate::store::{Row, Table};

/// The three tables of a workbook as they were on disk when it was opened
#[derive(Debug, Clone)]
pub struct LoadedWorkbook {
    pub products: Table,
    pub customers: Table,
    pub orders: Table,
    pub checksum: String,
}

/// Read the Products, Customers and Orders sheets into memory
pub fn load_workbook(path: &Path, sheets: &SheetNames) -> Result<LoadedWorkbook, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::file_not_found(path));
    }

    // Compute checksum first
    let checksum = compute_checksum(path)?;

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| LedgerError::read_error(format!("Failed to open workbook: {}", e)))?;

    let products = read_table(&mut workbook, &sheets.products)?;
    let customers = read_table(&mut workbook, &sheets.customers)?;
    let orders = read_table(&mut workbook, &sheets.orders)?;

    tracing::info!(
        path = %path.display(),
        products = products.len(),
        customers = customers.len(),
        orders = orders.len(),
        "workbook loaded"
    );

    Ok(LoadedWorkbook {
        products,
        customers,
        orders,
        checksum,
    })
}

fn read_table<RS>(workbook: &mut Sheets<RS>, name: &str) -> Result<Table, LedgerError>
where
    RS: std::io::Read + std::io::Seek,
{
    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(LedgerError::SheetNotFound(name.to_string()));
    }

    let range = workbook
        .worksheet_range(name)
        .map_err(|e| LedgerError::read_error(format!("Failed to read sheet '{}': {}", name, e)))?;

    Ok(range_to_table(name, &range))
}

/// Keep only used rows; the first of them is the header
fn range_to_table(name: &str, range: &Range<Data>) -> Table {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut used = range.rows().enumerate().filter_map(|(row_idx, cells)| {
        // Cells before the range start are empty on disk
        let mut values = vec![CellValue::Empty; start_col as usize];
        values.extend(cells.iter().map(|cell| convert_cell_value(Some(cell))));

        let row = Row::new(start_row + row_idx as u32 + 1, values);
        (!row.is_blank()).then_some(row)
    });

    let header = used.next().unwrap_or_else(|| Row::new(1, Vec::new()));
    Table::new(name, header, used.collect())
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => match format_excel_datetime(dt.as_f64()) {
                Some(iso) => CellValue::DateTime(iso),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        },
    }
}

/// Excel serial date (days since 1899-12-30, fraction = time of day)
pub(crate) fn excel_serial_to_datetime(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }

    let day_start = value.floor();
    let days = day_start as i64;
    // Time of day counts forward from the floor, also for negative serials
    let total_seconds = ((value - day_start) * 86400.0).round() as u32;

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::try_days(days)?)?;

    // Rounding can push a late time onto the next midnight
    if total_seconds >= 86400 {
        return Some(NaiveDateTime::new(date.succ_opt()?, NaiveTime::MIN));
    }

    let time = NaiveTime::from_num_seconds_from_midnight_opt(total_seconds, 0)?;
    Some(NaiveDateTime::new(date, time))
}

/// Format Excel datetime to ISO 8601
fn format_excel_datetime(value: f64) -> Option<String> {
    excel_serial_to_datetime(value).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Convert column index (0-based) to Excel column letter (A, B, ..., Z, AA, AB, ...)
pub(crate) fn column_index_to_letter(index: u32) -> String {
    let mut result = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        let c = (b'A' + (n % 26) as u8) as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Get list of sheets in a workbook with their used sizes
pub fn get_sheets(path: &Path) -> Result<Vec<SheetInfo>, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::file_not_found(path));
    }

    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| LedgerError::read_error(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::new();

    for (index, name) in sheet_names.iter().enumerate() {
        let (rows, cols) = match workbook.worksheet_range(name) {
            Ok(range) => range.get_size(),
            Err(e) => {
                tracing::warn!(sheet = %name, error = %e, "could not size sheet");
                (0, 0)
            }
        };
        sheets.push(SheetInfo {
            name: name.clone(),
            index: index as u32,
            row_count: rows as u32,
            col_count: cols as u32,
        });
    }

    Ok(sheets)
}

/// Compute SHA-256 checksum of a file
pub fn compute_checksum(path: &Path) -> Result<String, LedgerError> {
    let mut file = File::open(path)
        .map_err(|e| LedgerError::read_error(format!("Failed to open file for checksum: {}", e)))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| LedgerError::read_error(format!("Failed to read file for checksum: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
