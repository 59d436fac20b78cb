use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use super::reader::column_index_to_letter;
use super::types::*;
use crate::error::LedgerError;
use crate::store::schema::{customer_columns, order_columns, product_columns};
use crate::store::{LedgerStore, Row, Table};

/// Check the loaded sheets against the fixed layout without changing anything.
///
/// Unparseable typed cells are errors; unresolved references, duplicates and
/// negative amounts are warnings, since queries tolerate them.
pub fn validate_store(store: &LedgerStore) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let products = store.products().table();
    let customers = store.customers().table();
    let orders = store.orders().table();

    check_header(products, product_columns::COUNT, &mut errors);
    check_header(customers, customer_columns::COUNT, &mut errors);
    check_header(orders, order_columns::COUNT, &mut errors);

    // Products: price must be a decimal; codes should be unique
    let mut product_codes: HashSet<String> = HashSet::new();
    for product in store.products().all() {
        let row = product.row();
        match product.price() {
            Ok(price) if price < Decimal::ZERO => {
                warnings.push(warning(products, row, format!("Negative price {}", price)));
            }
            Ok(_) => {}
            Err(e) => errors.push(type_mismatch(products, row, product_columns::PRICE, &e)),
        }

        let code = product.code();
        if !product_codes.insert(code.clone()) {
            warnings.push(warning(
                products,
                row,
                format!("Duplicate product code '{}'; the first row wins", code),
            ));
        }
    }

    // Customers: contact persons should be unique once assigned
    let mut contacts: HashMap<String, u32> = HashMap::new();
    let mut customer_codes: HashSet<String> = HashSet::new();
    for customer in store.customers().all() {
        let row = customer.row();
        customer_codes.insert(customer.code());

        let contact = customer.contact_person();
        if contact.is_empty() {
            continue;
        }
        if let Some(first) = contacts.get(&contact) {
            warnings.push(warning(
                customers,
                row,
                format!("Contact person '{}' also appears in row {}", contact, first),
            ));
        } else {
            contacts.insert(contact, row.number());
        }
    }

    // Orders: typed columns must parse; references should resolve
    for order in store.orders().all() {
        let row = order.row();

        match order.quantity() {
            Ok(quantity) if quantity < 0 => {
                warnings.push(warning(orders, row, format!("Negative quantity {}", quantity)));
            }
            Ok(_) => {}
            Err(e) => errors.push(type_mismatch(orders, row, order_columns::QUANTITY, &e)),
        }

        if let Err(e) = order.order_date() {
            errors.push(type_mismatch(orders, row, order_columns::ORDER_DATE, &e));
        }

        let product_code = order.product_code();
        if !product_codes.contains(&product_code) {
            warnings.push(warning(
                orders,
                row,
                format!("Product code '{}' does not resolve; the order is skipped by queries", product_code),
            ));
        }

        let customer_code = order.customer_code();
        if !customer_codes.contains(&customer_code) {
            warnings.push(warning(
                orders,
                row,
                format!("Customer code '{}' does not resolve; the order is skipped by queries", customer_code),
            ));
        }
    }

    let rows_checked = (products.len() + customers.len() + orders.len()) as u32;

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        rows_checked,
    }
}

/// The header must exist and cover every fixed column
fn check_header(table: &Table, expected_columns: u32, errors: &mut Vec<ValidationError>) {
    let header = table.header();

    if header.is_blank() {
        errors.push(ValidationError {
            sheet: table.name().to_string(),
            row: header.number(),
            column: String::new(),
            message: "Header row is missing".to_string(),
            error_type: ValidationErrorType::MissingHeader,
        });
        return;
    }

    for column in 1..=expected_columns {
        if header.cell(column).is_empty() {
            errors.push(ValidationError {
                sheet: table.name().to_string(),
                row: header.number(),
                column: column_index_to_letter(column - 1),
                message: format!("Header for column {} is empty", column_index_to_letter(column - 1)),
                error_type: ValidationErrorType::MissingColumn,
            });
        }
    }
}

fn type_mismatch(table: &Table, row: &Row, column: u32, error: &LedgerError) -> ValidationError {
    ValidationError {
        sheet: table.name().to_string(),
        row: row.number(),
        column: column_index_to_letter(column - 1),
        message: error.to_string(),
        error_type: ValidationErrorType::TypeMismatch,
    }
}

fn warning(table: &Table, row: &Row, message: String) -> ValidationWarning {
    ValidationWarning {
        sheet: table.name().to_string(),
        row: row.number(),
        message,
    }
}
