//! Read-only questions answered by joining the three tables.
//!
//! Ties and duplicate keys follow one rule everywhere: the earliest row in
//! sheet order wins. Orders whose product or customer code does not resolve
//! are skipped. A cell that cannot be parsed aborts the whole operation.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Entity, LedgerError};
use crate::store::{LedgerStore, ProductRow};

/// One order of the requested product, seen from the customer side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCustomer {
    pub contact_person: String,
    pub quantity: i64,
    pub price: Decimal,
    pub order_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomer {
    pub customer_code: String,
    pub contact_person: String,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactEntry {
    pub organization_name: String,
    pub contact_person: String,
}

/// First product whose lower-cased name equals the lower-cased query
pub fn find_product_by_name<'a>(store: &'a LedgerStore, name: &str) -> Option<ProductRow<'a>> {
    let wanted = name.to_lowercase();
    store
        .products()
        .all()
        .find(|product| product.name().to_lowercase() == wanted)
}

/// Customers who ordered the named product, one entry per order in Orders sheet order.
///
/// `NotFound` means no such product; an empty vector means nobody ordered it.
pub fn find_customers_by_product_name(
    store: &LedgerStore,
    name: &str,
) -> Result<Vec<ProductCustomer>, LedgerError> {
    let product = find_product_by_name(store, name)
        .ok_or_else(|| LedgerError::not_found(Entity::Product, name))?;
    let product_code = product.code();

    let customers = store.customers();
    let mut result = Vec::new();

    for order in store.orders().all() {
        if order.product_code() != product_code {
            continue;
        }

        let customer_code = order.customer_code();
        let Some(customer) = customers.by_code(&customer_code) else {
            tracing::debug!(order = %order.code(), customer = %customer_code, "unresolved customer, skipped");
            continue;
        };

        result.push(ProductCustomer {
            contact_person: customer.contact_person(),
            quantity: order.quantity()?,
            price: product.price()?,
            order_date: order.order_date()?,
        });
    }

    Ok(result)
}

/// Order counts per customer code for a calendar month, in first-seen order
pub fn count_orders_by_customer(
    store: &LedgerStore,
    year: i32,
    month: u32,
) -> Result<Vec<(String, usize)>, LedgerError> {
    let mut groups: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for order in store.orders().all() {
        let date = order.order_date()?;
        if date.year() != year || date.month() != month {
            continue;
        }

        let code = order.customer_code();
        match index.get(&code) {
            Some(&slot) => groups[slot].1 += 1,
            None => {
                index.insert(code.clone(), groups.len());
                groups.push((code, 1));
            }
        }
    }

    Ok(groups)
}

/// The customer with the most orders in the given month.
///
/// Ties go to the customer whose first order in the period comes first in
/// the sheet. `year`/`month` are assumed valid; callers check the range.
pub fn find_top_customer(store: &LedgerStore, year: i32, month: u32) -> Result<TopCustomer, LedgerError> {
    let groups = count_orders_by_customer(store, year, month)?;

    let mut best: Option<(String, usize)> = None;
    for (code, count) in groups {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((code, count));
        }
    }

    let period = format!("{:04}-{:02}", year, month);
    let (customer_code, order_count) =
        best.ok_or_else(|| LedgerError::not_found(Entity::OrdersInPeriod, period))?;

    let customer = store
        .customers()
        .by_code(&customer_code)
        .ok_or_else(|| LedgerError::not_found(Entity::Customer, customer_code.clone()))?;

    Ok(TopCustomer {
        contact_person: customer.contact_person(),
        customer_code,
        order_count,
    })
}

/// Every customer's organization and contact, sheet order; `NoData` when there are none
pub fn list_contact_persons(store: &LedgerStore) -> Result<Vec<ContactEntry>, LedgerError> {
    let entries: Vec<ContactEntry> = store
        .customers()
        .all()
        .map(|customer| ContactEntry {
            organization_name: customer.organization_name(),
            contact_person: customer.contact_person(),
        })
        .collect();

    if entries.is_empty() {
        return Err(LedgerError::NoData);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::CellValue;
    use crate::store::tests::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn busy_store() -> LedgerStore {
        LedgerStore::new(
            products_table(vec![
                vec!["P1".into(), "Bolt".into(), "pcs".into(), CellValue::Number(1.5)],
                vec!["P2".into(), "Nut".into(), "pcs".into(), "0,25".into()],
                vec!["P3".into(), "bolt".into(), "box".into(), CellValue::Number(99.0)],
            ]),
            customers_table(vec![
                customer("C1", "Acme", "Ivan"),
                customer("C2", "Globex", "Olga"),
                customer("C3", "Initech", "Petr"),
            ]),
            orders_table(vec![
                order("O1", "P1", "C2", 5.0, "2023-08-01"),
                order("O2", "P2", "C1", 1.0, "2023-08-02"),
                order("O3", "P1", "C9", 4.0, "2023-08-03"),
                order("O4", "P1", "C1", 2.0, "2023-08-04"),
                order("O5", "P2", "C1", 3.0, "2023-08-20"),
                order("O6", "P2", "C2", 3.0, "2023-08-21"),
                order("O7", "P1", "C3", 8.0, "2023-07-31"),
            ]),
            Box::new(RecordingGateway::default()),
        )
    }

    #[test]
    fn test_example_scenario() {
        let store = example_store(RecordingGateway::default());

        let rows = find_customers_by_product_name(&store, "bolt").unwrap();
        assert_eq!(
            rows,
            vec![ProductCustomer {
                contact_person: "Ivan".to_string(),
                quantity: 10,
                price: Decimal::from_str("1.50").unwrap(),
                order_date: date(2023, 8, 5),
            }]
        );

        let top = find_top_customer(&store, 2023, 8).unwrap();
        assert_eq!(top.contact_person, "Ivan");
        assert_eq!(top.order_count, 1);

        assert!(matches!(
            find_top_customer(&store, 2023, 9),
            Err(LedgerError::NotFound { entity: Entity::OrdersInPeriod, .. })
        ));
    }

    #[test]
    fn test_customers_by_product_follows_order_sheet() {
        let store = busy_store();

        // "BOLT" matches P1 first; P3 ("bolt") is shadowed
        let rows = find_customers_by_product_name(&store, "BOLT").unwrap();
        let contacts: Vec<&str> = rows.iter().map(|r| r.contact_person.as_str()).collect();

        // O3 references unknown customer C9 and is skipped
        assert_eq!(contacts, vec!["Olga", "Ivan", "Petr"]);
        assert!(rows.iter().all(|r| r.price == Decimal::from_str("1.5").unwrap()));
        assert_eq!(rows[1].quantity, 2);
    }

    #[test]
    fn test_customers_only_from_matching_orders() {
        let store = busy_store();
        let rows = find_customers_by_product_name(&store, "nut").unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.contact_person == "Ivan" || r.contact_person == "Olga"));
        assert_eq!(rows[0].price, Decimal::from_str("0.25").unwrap());
    }

    #[test]
    fn test_unknown_product_vs_no_orders() {
        let store = LedgerStore::new(
            products_table(vec![vec!["P1".into(), "Washer".into(), "pcs".into(), CellValue::Number(0.1)]]),
            customers_table(vec![customer("C1", "Acme", "Ivan")]),
            orders_table(Vec::new()),
            Box::new(RecordingGateway::default()),
        );

        assert!(find_customers_by_product_name(&store, "washer").unwrap().is_empty());
        assert!(matches!(
            find_customers_by_product_name(&store, "gear"),
            Err(LedgerError::NotFound { entity: Entity::Product, .. })
        ));
    }

    #[test]
    fn test_case_insensitive_cyrillic() {
        let store = LedgerStore::new(
            products_table(vec![vec!["P1".into(), "Болт".into(), "шт".into(), CellValue::Number(2.0)]]),
            customers_table(vec![customer("C1", "Рога и копыта", "Иван")]),
            orders_table(vec![order("O1", "P1", "C1", 1.0, "05.08.2023")]),
            Box::new(RecordingGateway::default()),
        );

        let rows = find_customers_by_product_name(&store, "БОЛТ").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contact_person, "Иван");
        assert_eq!(rows[0].order_date, date(2023, 8, 5));
    }

    #[test]
    fn test_top_customer_counts_exactly() {
        let store = busy_store();

        // August 2023: C2 has O1 and O6, C1 has O2, O4 and O5, C9 has O3
        let groups = count_orders_by_customer(&store, 2023, 8).unwrap();
        assert_eq!(
            groups,
            vec![("C2".to_string(), 2), ("C1".to_string(), 3), ("C9".to_string(), 1)]
        );

        let top = find_top_customer(&store, 2023, 8).unwrap();
        assert_eq!(top.customer_code, "C1");
        assert_eq!(top.contact_person, "Ivan");
        assert_eq!(top.order_count, 3);

        let july = find_top_customer(&store, 2023, 7).unwrap();
        assert_eq!(july.contact_person, "Petr");
        assert_eq!(july.order_count, 1);
    }

    #[test]
    fn test_top_customer_tie_goes_to_first_seen() {
        let store = LedgerStore::new(
            products_table(Vec::new()),
            customers_table(vec![customer("C1", "Acme", "Ivan"), customer("C2", "Globex", "Olga")]),
            orders_table(vec![
                order("O1", "P1", "C2", 1.0, "2024-02-01"),
                order("O2", "P1", "C1", 1.0, "2024-02-02"),
                order("O3", "P1", "C1", 1.0, "2024-02-03"),
                order("O4", "P1", "C2", 1.0, "2024-02-04"),
            ]),
            Box::new(RecordingGateway::default()),
        );

        let top = find_top_customer(&store, 2024, 2).unwrap();
        assert_eq!(top.contact_person, "Olga");
        assert_eq!(top.order_count, 2);
    }

    #[test]
    fn test_top_customer_unresolved_code() {
        let store = LedgerStore::new(
            products_table(Vec::new()),
            customers_table(vec![customer("C1", "Acme", "Ivan")]),
            orders_table(vec![order("O1", "P1", "C7", 1.0, "2024-02-01")]),
            Box::new(RecordingGateway::default()),
        );

        assert!(matches!(
            find_top_customer(&store, 2024, 2),
            Err(LedgerError::NotFound { entity: Entity::Customer, key }) if key == "C7"
        ));
    }

    #[test]
    fn test_malformed_date_aborts_grouping() {
        let store = LedgerStore::new(
            products_table(Vec::new()),
            customers_table(vec![customer("C1", "Acme", "Ivan")]),
            orders_table(vec![
                order("O1", "P1", "C1", 1.0, "2024-02-01"),
                order("O2", "P1", "C1", 1.0, "someday"),
            ]),
            Box::new(RecordingGateway::default()),
        );

        assert!(matches!(
            find_top_customer(&store, 2024, 2),
            Err(LedgerError::Parse { row: 3, expected: "date", .. })
        ));
    }

    #[test]
    fn test_malformed_quantity_aborts_join() {
        let mut bad = order("O1", "P1", "C1", 0.0, "2024-02-01");
        bad[4] = "lots".into();
        let store = LedgerStore::new(
            products_table(vec![vec!["P1".into(), "Bolt".into(), "pcs".into(), CellValue::Number(1.0)]]),
            customers_table(vec![customer("C1", "Acme", "Ivan")]),
            orders_table(vec![bad]),
            Box::new(RecordingGateway::default()),
        );

        assert!(matches!(
            find_customers_by_product_name(&store, "bolt"),
            Err(LedgerError::Parse { expected: "integer", .. })
        ));
    }

    #[test]
    fn test_list_contacts() {
        let store = busy_store();
        let contacts = list_contact_persons(&store).unwrap();
        assert_eq!(contacts.len(), 3);
        assert_eq!(
            contacts[1],
            ContactEntry {
                organization_name: "Globex".to_string(),
                contact_person: "Olga".to_string(),
            }
        );

        let empty = LedgerStore::new(
            products_table(Vec::new()),
            customers_table(Vec::new()),
            orders_table(Vec::new()),
            Box::new(RecordingGateway::default()),
        );
        assert!(matches!(list_contact_persons(&empty), Err(LedgerError::NoData)));
    }
}
