use std::path::{Path, PathBuf};
use umya_spreadsheet::{reader, writer, Cell, Worksheet};

use super::reader::compute_checksum;
use super::types::CellValue;
use crate::config::PersistOptions;
use crate::error::LedgerError;
use crate::store::{PersistenceGateway, Table};

/// Writes a table back into its sheet of an .xlsx file, leaving other sheets alone
pub struct XlsxGateway {
    path: PathBuf,
    options: PersistOptions,
    last_checksum: String,
    backup: Option<PathBuf>,
}

impl XlsxGateway {
    /// `checksum` is the file's checksum at the time it was loaded
    pub fn new(path: &Path, options: PersistOptions, checksum: String) -> Self {
        XlsxGateway {
            path: path.to_path_buf(),
            options,
            last_checksum: checksum,
            backup: None,
        }
    }

    pub fn last_checksum(&self) -> &str {
        &self.last_checksum
    }

    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }
}

impl PersistenceGateway for XlsxGateway {
    fn flush(&mut self, table: &Table) -> Result<(), LedgerError> {
        if !self.path.exists() {
            return Err(LedgerError::write_error(format!(
                "File not found: {}",
                self.path.display()
            )));
        }

        if self.options.verify_checksum {
            let current_checksum = compute_checksum(&self.path)?;
            if current_checksum != self.last_checksum {
                return Err(LedgerError::write_error(format!(
                    "File has been modified. Expected checksum: {}, current: {}",
                    self.last_checksum, current_checksum
                )));
            }
        }

        if self.options.backup_before_write && self.backup.is_none() {
            let backup = create_backup(&self.path)?;
            tracing::info!(backup = %backup.display(), "backup created");
            self.backup = Some(backup);
        }

        write_table(&self.path, table)?;

        // Compute new checksum
        self.last_checksum = compute_checksum(&self.path)?;
        tracing::info!(
            path = %self.path.display(),
            sheet = %table.name(),
            rows = table.len(),
            "workbook saved"
        );

        Ok(())
    }
}

/// Replace every data row of the table's sheet with the in-memory rows.
///
/// Rows are written contiguously after the header, so rows deleted in memory
/// leave no gaps on disk.
fn write_table(path: &Path, table: &Table) -> Result<(), LedgerError> {
    let mut book = reader::xlsx::read(path)
        .map_err(|e| LedgerError::write_error(format!("Failed to open workbook: {}", e)))?;

    let worksheet = book
        .get_sheet_by_name_mut(table.name())
        .ok_or_else(|| LedgerError::write_error(format!("Sheet not found: {}", table.name())))?;

    let first_data_row = table.header().number() + 1;
    clear_data_rows(worksheet, first_data_row);

    for (offset, row) in table.rows().enumerate() {
        let row_num = first_data_row + offset as u32;

        for (col_idx, value) in row.cells().iter().enumerate() {
            // Excel uses 1-based indexing
            let col_num = (col_idx + 1) as u32;
            if !value.is_empty() {
                write_cell(worksheet.get_cell_mut((col_num, row_num)), value);
            }
        }
    }

    // Whole-file replace: write next to the original, then rename over it
    let temp_path = temp_path_for(path);
    writer::xlsx::write(&book, &temp_path)
        .map_err(|e| LedgerError::write_error(format!("Failed to save workbook: {}", e)))?;

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        LedgerError::write_error(format!("Failed to replace {}: {}", path.display(), e))
    })
}

fn clear_data_rows(worksheet: &mut Worksheet, first_data_row: u32) {
    let highest = worksheet.get_highest_row();
    if highest >= first_data_row {
        worksheet.remove_row(&first_data_row, &(highest - first_data_row + 1));
    }
}

fn write_cell(cell: &mut Cell, value: &CellValue) {
    match value {
        CellValue::Empty => {}
        CellValue::String(s) => {
            cell.set_value_string(s);
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Boolean(b) => {
            cell.set_value_bool(*b);
        }
        CellValue::DateTime(dt) => {
            cell.set_value_string(dt);
        }
        CellValue::Error(e) => {
            // Can't really set an error value, so set as string
            cell.set_value_string(format!("#{}", e));
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    path.with_file_name(format!(".{}.tmp.xlsx", file_name))
}

/// Create a backup of the file before editing
pub fn create_backup(path: &Path) -> Result<PathBuf, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::file_not_found(path));
    }

    let backup_name = PathBuf::from(format!(
        "{}.backup.{}",
        path.display(),
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));

    std::fs::copy(path, &backup_name)
        .map_err(|e| LedgerError::write_error(format!("Failed to create backup: {}", e)))?;

    Ok(backup_name)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{LedgerConfig, SheetNames};
    use crate::contacts::{add_contact, change_contact, remove_contact};
    use crate::excel::load_workbook;
    use crate::query::{find_customers_by_product_name, list_contact_persons};
    use crate::store::LedgerStore;

    fn fill_sheet(book: &mut umya_spreadsheet::Spreadsheet, name: &str, rows: &[&[&str]]) {
        let _ = book.new_sheet(name);
        let sheet = book.get_sheet_by_name_mut(name).expect("sheet was just created");

        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let cell = sheet.get_cell_mut(((col_idx + 1) as u32, (row_idx + 1) as u32));
                match value.parse::<f64>() {
                    Ok(n) => cell.set_value_number(n),
                    Err(_) => cell.set_value_string(*value),
                };
            }
        }
    }

    /// Writes `book.xlsx` with the three sheets under their default names
    pub(crate) fn write_fixture(dir: &Path) -> PathBuf {
        let sheets = SheetNames::default();
        let mut book = umya_spreadsheet::new_file();

        fill_sheet(
            &mut book,
            &sheets.products,
            &[
                &["Код", "Наименование", "Ед. изм.", "Цена"],
                &["P1", "Bolt", "pcs", "1.5"],
                &["P2", "Nut", "pcs", "0.25"],
            ],
        );
        fill_sheet(
            &mut book,
            &sheets.customers,
            &[
                &["Код", "Организация", "Адрес", "Контактное лицо"],
                &["C1", "Acme", "Main st 1", "Ivan"],
                &["C2", "Globex", "Oak ave 5", "Olga"],
            ],
        );
        fill_sheet(
            &mut book,
            &sheets.orders,
            &[
                &["Код", "Код товара", "Код клиента", "Номер заявки", "Количество", "Дата"],
                &["O1", "P1", "C1", "R1", "10", "2023-08-05"],
                &["O2", "P2", "C2", "R2", "4", "2023-08-06"],
                &["O3", "P1", "C2", "R3", "1", "2023-09-01"],
            ],
        );

        let path = dir.join("book.xlsx");
        writer::xlsx::write(&book, &path).expect("fixture should be writable");
        path
    }

    #[test]
    fn test_mutations_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path());
        let config = LedgerConfig::default();

        let mut store = LedgerStore::open(&path, &config).unwrap();
        add_contact(&mut store, "Petr", "Initech").unwrap();
        remove_contact(&mut store, "Ivan").unwrap();
        change_contact(&mut store, "Olga", "Olga K").unwrap();

        let reloaded = LedgerStore::open(&path, &config).unwrap();
        let contacts: Vec<(String, String)> = list_contact_persons(&reloaded)
            .unwrap()
            .into_iter()
            .map(|c| (c.organization_name, c.contact_person))
            .collect();
        assert_eq!(
            contacts,
            vec![
                ("Globex".to_string(), "Olga K".to_string()),
                ("Initech".to_string(), "Petr".to_string()),
            ]
        );

        // Untouched sheets survive the rewrite
        assert_eq!(reloaded.orders().all().count(), 3);
        let rows = find_customers_by_product_name(&reloaded, "nut").unwrap();
        assert_eq!(rows[0].contact_person, "Olga K");
        assert_eq!(rows[0].quantity, 4);
    }

    #[test]
    fn test_external_change_blocks_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path());
        let mut config = LedgerConfig::default();
        config.persistence.verify_checksum = true;

        let mut store = LedgerStore::open(&path, &config).unwrap();
        add_contact(&mut store, "Petr", "Initech").unwrap();

        // Someone else rewrites the file
        std::fs::write(&path, b"not a workbook anymore").unwrap();

        assert!(matches!(
            add_contact(&mut store, "Anna", "Hooli"),
            Err(LedgerError::Persistence(_))
        ));
        // The in-memory table still has the change
        assert!(store.customers().by_contact_person("Anna").is_some());
    }

    #[test]
    fn test_backup_once_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path());
        let original = std::fs::read(&path).unwrap();

        let loaded = load_workbook(&path, &SheetNames::default()).unwrap();
        let options = PersistOptions {
            backup_before_write: true,
            verify_checksum: false,
        };
        let mut gateway = XlsxGateway::new(&path, options, loaded.checksum.clone());

        gateway.flush(&loaded.customers).unwrap();
        let backup = gateway.backup_path().unwrap().to_path_buf();
        assert_eq!(std::fs::read(&backup).unwrap(), original);

        gateway.flush(&loaded.customers).unwrap();
        assert_eq!(gateway.backup_path(), Some(backup.as_path()));
        assert_eq!(gateway.last_checksum(), compute_checksum(&path).unwrap());
    }

    #[test]
    fn test_flush_to_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path());
        let loaded = load_workbook(&path, &SheetNames::default()).unwrap();

        let mut gateway = XlsxGateway::new(&path, PersistOptions::default(), loaded.checksum);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            gateway.flush(&loaded.customers),
            Err(LedgerError::Persistence(_))
        ));
    }
}
