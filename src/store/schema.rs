//! Fixed column layout of the three sheets and typed views over their rows.
//!
//! Column positions are 1-based and are the contract with the file; the
//! header occupies the first used row and is never returned as data.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::table::{Row, Table};
use crate::error::LedgerError;

pub mod product_columns {
    pub const CODE: u32 = 1;
    pub const NAME: u32 = 2;
    pub const UNIT: u32 = 3;
    pub const PRICE: u32 = 4;
    pub const COUNT: u32 = 4;
}

pub mod customer_columns {
    pub const CODE: u32 = 1;
    pub const ORGANIZATION_NAME: u32 = 2;
    pub const ADDRESS: u32 = 3;
    pub const CONTACT_PERSON: u32 = 4;
    pub const COUNT: u32 = 4;
}

pub mod order_columns {
    pub const CODE: u32 = 1;
    pub const PRODUCT_CODE: u32 = 2;
    pub const CUSTOMER_CODE: u32 = 3;
    pub const REQUEST_NUMBER: u32 = 4;
    pub const QUANTITY: u32 = 5;
    pub const ORDER_DATE: u32 = 6;
    pub const COUNT: u32 = 6;
}

#[derive(Debug, Clone, Copy)]
pub struct ProductRow<'a>(&'a Row);

impl<'a> ProductRow<'a> {
    pub fn row(&self) -> &'a Row {
        self.0
    }

    pub fn code(&self) -> String {
        self.0.get_string(product_columns::CODE)
    }

    pub fn name(&self) -> String {
        self.0.get_string(product_columns::NAME)
    }

    pub fn unit(&self) -> String {
        self.0.get_string(product_columns::UNIT)
    }

    pub fn price(&self) -> Result<Decimal, LedgerError> {
        self.0.get_decimal(product_columns::PRICE)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CustomerRow<'a>(&'a Row);

impl<'a> CustomerRow<'a> {
    pub fn row(&self) -> &'a Row {
        self.0
    }

    pub fn code(&self) -> String {
        self.0.get_string(customer_columns::CODE)
    }

    pub fn organization_name(&self) -> String {
        self.0.get_string(customer_columns::ORGANIZATION_NAME)
    }

    pub fn address(&self) -> String {
        self.0.get_string(customer_columns::ADDRESS)
    }

    /// Empty when no contact is assigned
    pub fn contact_person(&self) -> String {
        self.0.get_string(customer_columns::CONTACT_PERSON)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderRow<'a>(&'a Row);

impl<'a> OrderRow<'a> {
    pub fn row(&self) -> &'a Row {
        self.0
    }

    pub fn code(&self) -> String {
        self.0.get_string(order_columns::CODE)
    }

    pub fn product_code(&self) -> String {
        self.0.get_string(order_columns::PRODUCT_CODE)
    }

    pub fn customer_code(&self) -> String {
        self.0.get_string(order_columns::CUSTOMER_CODE)
    }

    pub fn request_number(&self) -> String {
        self.0.get_string(order_columns::REQUEST_NUMBER)
    }

    pub fn quantity(&self) -> Result<i64, LedgerError> {
        self.0.get_int(order_columns::QUANTITY)
    }

    pub fn order_date(&self) -> Result<NaiveDate, LedgerError> {
        self.0.get_date(order_columns::ORDER_DATE)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Products<'a>(&'a Table);

impl<'a> Products<'a> {
    pub fn new(table: &'a Table) -> Self {
        Products(table)
    }

    pub fn table(&self) -> &'a Table {
        self.0
    }

    pub fn all(&self) -> impl Iterator<Item = ProductRow<'a>> + 'a {
        self.0.rows().map(ProductRow)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Customers<'a>(&'a Table);

impl<'a> Customers<'a> {
    pub fn new(table: &'a Table) -> Self {
        Customers(table)
    }

    pub fn table(&self) -> &'a Table {
        self.0
    }

    pub fn all(&self) -> impl Iterator<Item = CustomerRow<'a>> + 'a {
        self.0.rows().map(CustomerRow)
    }

    pub fn by_code(&self, code: &str) -> Option<CustomerRow<'a>> {
        self.0.find_first(customer_columns::CODE, code).map(CustomerRow)
    }

    pub fn by_contact_person(&self, contact_person: &str) -> Option<CustomerRow<'a>> {
        self.0
            .find_first(customer_columns::CONTACT_PERSON, contact_person)
            .map(CustomerRow)
    }

    pub fn by_organization_name(&self, organization_name: &str) -> Option<CustomerRow<'a>> {
        self.0
            .find_first(customer_columns::ORGANIZATION_NAME, organization_name)
            .map(CustomerRow)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Orders<'a>(&'a Table);

impl<'a> Orders<'a> {
    pub fn new(table: &'a Table) -> Self {
        Orders(table)
    }

    pub fn table(&self) -> &'a Table {
        self.0
    }

    pub fn all(&self) -> impl Iterator<Item = OrderRow<'a>> + 'a {
        self.0.rows().map(OrderRow)
    }
}
