use std::fmt;
use std::path::Path;

use serde::Serialize;

/// What a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Product,
    Customer,
    Contact,
    Row,
    OrdersInPeriod,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Product => "Product",
            Entity::Customer => "Customer",
            Entity::Contact => "Contact person",
            Entity::Row => "Row",
            Entity::OrdersInPeriod => "Orders for period",
        };
        f.write_str(name)
    }
}

/// Every failure the ledger can hand back to its caller
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    /// The collection is legitimately empty; callers show a message, not a failure.
    #[error("No data to display")]
    NoData,

    #[error("Contact person '{0}' already exists")]
    DuplicateContact(String),

    #[error("Organization '{0}' already exists; a second contact cannot be attached to it")]
    OrganizationExists(String),

    #[error("Row {row}, column {column}: expected {expected}, found '{value}'")]
    Parse {
        row: u32,
        column: String,
        expected: &'static str,
        value: String,
    },

    #[error("Failed to save workbook: {0}")]
    Persistence(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("{0}")]
    Read(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LedgerError {
    pub fn not_found(entity: Entity, key: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn file_not_found(path: &Path) -> Self {
        LedgerError::FileNotFound(path.display().to_string())
    }

    pub fn read_error(message: impl Into<String>) -> Self {
        LedgerError::Read(message.into())
    }

    pub fn write_error(message: impl Into<String>) -> Self {
        LedgerError::Persistence(message.into())
    }

    /// True for outcomes that mean "nothing to show" rather than a broken file or request
    pub fn is_empty_result(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. } | LedgerError::NoData)
    }

    /// Short machine-readable tag used by the JSON renderer
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::NoData => "no_data",
            LedgerError::DuplicateContact(_) => "duplicate_contact",
            LedgerError::OrganizationExists(_) => "organization_exists",
            LedgerError::Parse { .. } => "parse_error",
            LedgerError::Persistence(_) => "persistence_error",
            LedgerError::FileNotFound(_) => "file_not_found",
            LedgerError::SheetNotFound(_) => "sheet_not_found",
            LedgerError::Read(_) => "read_error",
            LedgerError::Config(_) => "config_error",
        }
    }
}
