//! Session-owned relational store over the workbook's three sheets.
//!
//! The store is the only owner of the in-memory tables. Reads borrow it,
//! mutations take `&mut` and end with a synchronous flush of the Customers
//! table through a [`PersistenceGateway`].

pub mod schema;
pub mod table;

use std::path::Path;

pub use schema::{CustomerRow, Customers, OrderRow, Orders, ProductRow, Products};
pub use table::{Row, Table};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::excel::{load_workbook, XlsxGateway};

/// Durably writes a table back to wherever it came from.
///
/// A failed flush leaves the in-memory table as it is; the caller sees
/// `LedgerError::Persistence` and the file may be behind memory.
pub trait PersistenceGateway {
    fn flush(&mut self, table: &Table) -> Result<(), LedgerError>;
}

/// Accepts every flush and writes nothing
#[derive(Debug, Default)]
pub struct DiscardGateway;

impl PersistenceGateway for DiscardGateway {
    fn flush(&mut self, table: &Table) -> Result<(), LedgerError> {
        tracing::info!(sheet = %table.name(), rows = table.len(), "dry run: changes kept in memory only");
        Ok(())
    }
}

pub struct LedgerStore {
    products: Table,
    customers: Table,
    orders: Table,
    gateway: Box<dyn PersistenceGateway>,
}

impl LedgerStore {
    pub fn new(
        products: Table,
        customers: Table,
        orders: Table,
        gateway: Box<dyn PersistenceGateway>,
    ) -> Self {
        LedgerStore {
            products,
            customers,
            orders,
            gateway,
        }
    }

    /// Load the workbook and attach an XLSX gateway to the same file
    pub fn open(path: &Path, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let loaded = load_workbook(path, &config.sheets)?;
        let gateway = XlsxGateway::new(path, config.persistence.clone(), loaded.checksum);
        Ok(LedgerStore::new(
            loaded.products,
            loaded.customers,
            loaded.orders,
            Box::new(gateway),
        ))
    }

    /// Load the workbook but never write it back
    pub fn open_read_only(path: &Path, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let loaded = load_workbook(path, &config.sheets)?;
        Ok(LedgerStore::new(
            loaded.products,
            loaded.customers,
            loaded.orders,
            Box::new(DiscardGateway),
        ))
    }

    pub fn products(&self) -> Products<'_> {
        Products::new(&self.products)
    }

    pub fn customers(&self) -> Customers<'_> {
        Customers::new(&self.customers)
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders::new(&self.orders)
    }

    pub(crate) fn customers_mut(&mut self) -> &mut Table {
        &mut self.customers
    }

    /// Write the Customers table through the gateway
    pub(crate) fn flush_customers(&mut self) -> Result<(), LedgerError> {
        self.gateway.flush(&self.customers).map_err(|e| {
            tracing::error!(error = %e, "flush failed; file may be behind memory");
            match e {
                LedgerError::Persistence(_) => e,
                other => LedgerError::Persistence(other.to_string()),
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::excel::CellValue;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Records every flushed Customers snapshot; can be told to fail
    #[derive(Clone, Default)]
    pub(crate) struct RecordingGateway {
        pub snapshots: Rc<RefCell<Vec<Vec<Vec<String>>>>>,
        pub fail: Rc<Cell<bool>>,
    }

    impl RecordingGateway {
        pub fn flush_count(&self) -> usize {
            self.snapshots.borrow().len()
        }
    }

    impl PersistenceGateway for RecordingGateway {
        fn flush(&mut self, table: &Table) -> Result<(), LedgerError> {
            if self.fail.get() {
                return Err(LedgerError::write_error("disk is read-only"));
            }
            let snapshot = table
                .rows()
                .map(|row| row.cells().iter().map(CellValue::as_text).collect())
                .collect();
            self.snapshots.borrow_mut().push(snapshot);
            Ok(())
        }
    }

    pub(crate) fn products_table(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_values("Товары", &["Код", "Наименование", "Ед. изм.", "Цена"], rows)
    }

    pub(crate) fn customers_table(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_values(
            "Клиенты",
            &["Код", "Организация", "Адрес", "Контактное лицо"],
            rows,
        )
    }

    pub(crate) fn orders_table(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_values(
            "Заявки",
            &["Код", "Код товара", "Код клиента", "Номер заявки", "Количество", "Дата"],
            rows,
        )
    }

    pub(crate) fn customer(code: &str, org: &str, contact: &str) -> Vec<CellValue> {
        vec![code.into(), org.into(), "".into(), contact.into()]
    }

    pub(crate) fn order(code: &str, product: &str, customer: &str, qty: f64, date: &str) -> Vec<CellValue> {
        vec![
            code.into(),
            product.into(),
            customer.into(),
            "".into(),
            CellValue::Number(qty),
            date.into(),
        ]
    }

    /// Products {P1 Bolt 1.50}, Customers {C1 Acme Ivan}, Orders {O1 P1 C1 10 2023-08-05}
    pub(crate) fn example_store(gateway: RecordingGateway) -> LedgerStore {
        LedgerStore::new(
            products_table(vec![vec!["P1".into(), "Bolt".into(), "pcs".into(), CellValue::Number(1.5)]]),
            customers_table(vec![customer("C1", "Acme", "Ivan")]),
            orders_table(vec![order("O1", "P1", "C1", 10.0, "2023-08-05")]),
            Box::new(gateway),
        )
    }

    #[test]
    fn test_flush_failure_maps_to_persistence() {
        let gateway = RecordingGateway::default();
        gateway.fail.set(true);
        let mut store = example_store(gateway.clone());

        assert!(matches!(store.flush_customers(), Err(LedgerError::Persistence(_))));
        assert_eq!(gateway.flush_count(), 0);
    }

    #[test]
    fn test_discard_gateway_accepts_flush() {
        let mut gateway = DiscardGateway;
        let table = customers_table(vec![customer("C1", "Acme", "Ivan")]);
        assert!(gateway.flush(&table).is_ok());
    }
}
