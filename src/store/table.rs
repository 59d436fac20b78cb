use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{Entity, LedgerError};
use crate::excel::reader::{column_index_to_letter, excel_serial_to_datetime};
use crate::excel::CellValue;

/// Text layouts accepted for date cells stored as strings
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M:%S"];

static EMPTY_CELL: CellValue = CellValue::Empty;

/// One used row of a sheet, addressed by 1-based column index
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    number: u32,
    cells: Vec<CellValue>,
}

impl Row {
    /// `cells[0]` is column 1
    pub fn new(number: u32, cells: Vec<CellValue>) -> Self {
        Row { number, cells }
    }

    /// 1-based row number in the sheet
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn cell(&self, column: u32) -> &CellValue {
        column
            .checked_sub(1)
            .and_then(|idx| self.cells.get(idx as usize))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }

    /// Missing and blank cells read as an empty string
    pub fn get_string(&self, column: u32) -> String {
        self.cell(column).as_text()
    }

    pub fn get_int(&self, column: u32) -> Result<i64, LedgerError> {
        match self.cell(column) {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(*n as i64),
            CellValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.parse_error(column, "integer")),
            _ => Err(self.parse_error(column, "integer")),
        }
    }

    pub fn get_decimal(&self, column: u32) -> Result<Decimal, LedgerError> {
        match self.cell(column) {
            CellValue::Number(n) => {
                Decimal::try_from(*n).map_err(|_| self.parse_error(column, "decimal"))
            }
            CellValue::String(s) => Decimal::from_str(&s.trim().replace(',', "."))
                .map_err(|_| self.parse_error(column, "decimal")),
            _ => Err(self.parse_error(column, "decimal")),
        }
    }

    pub fn get_date(&self, column: u32) -> Result<NaiveDate, LedgerError> {
        let parsed = match self.cell(column) {
            CellValue::DateTime(iso) => parse_date_text(iso),
            CellValue::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.date()),
            CellValue::String(s) => parse_date_text(s.trim()),
            _ => None,
        };

        parsed.ok_or_else(|| self.parse_error(column, "date"))
    }

    fn parse_error(&self, column: u32, expected: &'static str) -> LedgerError {
        LedgerError::Parse {
            row: self.number,
            column: column_index_to_letter(column.saturating_sub(1)),
            expected,
            value: self.get_string(column),
        }
    }

    fn set(&mut self, column: u32, value: CellValue) {
        let idx = column.saturating_sub(1) as usize;
        if self.cells.len() <= idx {
            self.cells.resize(idx + 1, CellValue::Empty);
        }
        self.cells[idx] = value;
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// In-memory copy of one sheet: a header row followed by data rows in sheet order
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    header: Row,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, header: Row, rows: Vec<Row>) -> Self {
        Table {
            name: name.into(),
            header,
            rows,
        }
    }

    /// Build a table whose header sits in row 1 and whose data rows follow without gaps
    pub fn from_values(name: impl Into<String>, header: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let header = Row::new(1, header.iter().map(|h| CellValue::from(*h)).collect());
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| Row::new(idx as u32 + 2, cells))
            .collect();
        Table::new(name, header, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &Row {
        &self.header
    }

    /// Data rows only; re-iterating always reflects the current in-memory state
    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First-match-wins: the earliest row in sheet order whose cell text equals `value`
    pub fn find_first(&self, column: u32, value: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.get_string(column) == value)
    }

    /// Highest used row number, header included
    pub fn last_row_number(&self) -> u32 {
        self.rows
            .iter()
            .map(Row::number)
            .max()
            .unwrap_or(0)
            .max(self.header.number())
    }

    /// Append after the last used row; gaps left by earlier deletes are not filled
    pub fn append_row(&mut self, fields: Vec<(u32, CellValue)>) -> u32 {
        let number = self.last_row_number() + 1;
        let mut row = Row::new(number, Vec::new());
        for (column, value) in fields {
            row.set(column, value);
        }
        self.rows.push(row);
        number
    }

    pub fn update_cell(&mut self, row_number: u32, column: u32, value: CellValue) -> Result<(), LedgerError> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.number == row_number)
            .ok_or_else(|| LedgerError::not_found(Entity::Row, row_number.to_string()))?;
        row.set(column, value);
        Ok(())
    }

    pub fn delete_row(&mut self, row_number: u32) -> Result<Row, LedgerError> {
        let position = self
            .rows
            .iter()
            .position(|row| row.number == row_number)
            .ok_or_else(|| LedgerError::not_found(Entity::Row, row_number.to_string()))?;
        Ok(self.rows.remove(position))
    }
}
