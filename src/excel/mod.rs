//! Excel module for loading, checking and saving the ledger workbook.
//!
//! This module provides:
//! - Reading the three sheets into in-memory tables
//! - Layout and data checks for the fixed column contract
//! - Writing the Customers sheet back while preserving the rest of the file
//! - File checksums for change detection

pub mod types;
pub mod reader;
pub mod validator;
pub mod writer;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::{compute_checksum, get_sheets, load_workbook, LoadedWorkbook};
pub use validator::validate_store;
pub use writer::{create_backup, XlsxGateway};
