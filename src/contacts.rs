//! Contact person maintenance on the Customers sheet.
//!
//! Each operation is one step: check, mutate memory, flush. There is no
//! rollback; when the flush fails the mutation stays in memory and the
//! caller gets `Persistence`.
//!
//! Removing a contact deletes the whole customer row (code, organization and
//! address go with it).

use serde::Serialize;

use crate::error::{Entity, LedgerError};
use crate::excel::CellValue;
use crate::store::schema::customer_columns;
use crate::store::LedgerStore;

/// What a mutation touched in the Customers sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactChange {
    /// Row number in this session; saving compacts rows, so the file may differ
    pub row: u32,
    pub organization_name: String,
    pub contact_person: String,
}

/// Add a new organization with its contact person.
///
/// Contact names are unique across customers (exact, case-sensitive match).
/// An organization that already exists is refused rather than given a
/// second contact. Code and address of the new row stay empty.
pub fn add_contact(
    store: &mut LedgerStore,
    new_contact_person: &str,
    organization_name: &str,
) -> Result<ContactChange, LedgerError> {
    let customers = store.customers();

    if customers.by_contact_person(new_contact_person).is_some() {
        tracing::warn!(contact = %new_contact_person, "contact person already exists");
        return Err(LedgerError::DuplicateContact(new_contact_person.to_string()));
    }

    if customers.by_organization_name(organization_name).is_some() {
        tracing::warn!(organization = %organization_name, "organization already exists");
        return Err(LedgerError::OrganizationExists(organization_name.to_string()));
    }

    let row = store.customers_mut().append_row(vec![
        (customer_columns::ORGANIZATION_NAME, CellValue::from(organization_name)),
        (customer_columns::CONTACT_PERSON, CellValue::from(new_contact_person)),
    ]);
    tracing::info!(row, contact = %new_contact_person, organization = %organization_name, "contact added");

    store.flush_customers()?;

    Ok(ContactChange {
        row,
        organization_name: organization_name.to_string(),
        contact_person: new_contact_person.to_string(),
    })
}

/// Delete the first customer row whose contact person matches exactly
pub fn remove_contact(store: &mut LedgerStore, contact_person: &str) -> Result<ContactChange, LedgerError> {
    let row = store
        .customers()
        .by_contact_person(contact_person)
        .map(|customer| customer.row().number())
        .ok_or_else(|| LedgerError::not_found(Entity::Contact, contact_person))?;

    let removed = store.customers_mut().delete_row(row)?;
    let organization_name = removed.get_string(customer_columns::ORGANIZATION_NAME);
    tracing::info!(row, contact = %contact_person, organization = %organization_name, "customer row removed");

    store.flush_customers()?;

    Ok(ContactChange {
        row,
        organization_name,
        contact_person: contact_person.to_string(),
    })
}

/// Rename the first matching contact person; other rows are not checked for the new name
pub fn change_contact(
    store: &mut LedgerStore,
    current_contact_person: &str,
    new_contact_person: &str,
) -> Result<ContactChange, LedgerError> {
    let (row, organization_name) = store
        .customers()
        .by_contact_person(current_contact_person)
        .map(|customer| (customer.row().number(), customer.organization_name()))
        .ok_or_else(|| LedgerError::not_found(Entity::Contact, current_contact_person))?;

    store.customers_mut().update_cell(
        row,
        customer_columns::CONTACT_PERSON,
        CellValue::from(new_contact_person),
    )?;
    tracing::info!(row, from = %current_contact_person, to = %new_contact_person, "contact changed");

    store.flush_customers()?;

    Ok(ContactChange {
        row,
        organization_name,
        contact_person: new_contact_person.to_string(),
    })
}
