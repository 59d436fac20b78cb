//! Text and JSON rendering of query results, mutations and errors.

use serde::Serialize;
use serde_json::json;

use crate::contacts::ContactChange;
use crate::error::LedgerError;
use crate::excel::{SheetInfo, ValidationResult};
use crate::query::{ContactEntry, ProductCustomer, TopCustomer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// What a contact mutation did, for messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

pub struct Renderer {
    format: OutputFormat,
    date_format: String,
}

impl Renderer {
    pub fn new(format: OutputFormat, date_format: impl Into<String>) -> Self {
        Renderer {
            format,
            date_format: date_format.into(),
        }
    }

    pub fn text(date_format: impl Into<String>) -> Self {
        Renderer::new(OutputFormat::Text, date_format)
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn product_customers(&self, product_name: &str, rows: &[ProductCustomer]) -> String {
        if self.format == OutputFormat::Json {
            let rows: Vec<_> = rows
                .iter()
                .map(|r| {
                    json!({
                        "contact_person": r.contact_person,
                        "quantity": r.quantity,
                        "price": r.price,
                        "order_date": r.order_date.format(&self.date_format).to_string(),
                    })
                })
                .collect();
            return to_json(&json!({ "product": product_name, "customers": rows }));
        }

        if rows.is_empty() {
            return format!("Nobody has ordered '{}' yet.", product_name);
        }

        let mut output = format!("Customers who ordered '{}':\n\n", product_name);
        output.push_str("| Contact person | Quantity | Price | Order date |\n");
        output.push_str("|---|---|---|---|\n");
        for row in rows {
            output.push_str(&format!(
                "| {} | {} | {:.2} | {} |\n",
                row.contact_person,
                row.quantity,
                row.price,
                row.order_date.format(&self.date_format)
            ));
        }
        output
    }

    pub fn top_customer(&self, top: &TopCustomer) -> String {
        match self.format {
            OutputFormat::Json => to_json(top),
            OutputFormat::Text => format!(
                "Top customer: {}, orders: {}",
                top.contact_person, top.order_count
            ),
        }
    }

    pub fn contacts(&self, entries: &[ContactEntry]) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&entries);
        }

        let mut output = String::from("| Organization | Contact person |\n|---|---|\n");
        for entry in entries {
            output.push_str(&format!("| {} | {} |\n", entry.organization_name, entry.contact_person));
        }
        output
    }

    pub fn contact_change(&self, kind: ChangeKind, change: &ContactChange) -> String {
        if self.format == OutputFormat::Json {
            let action = match kind {
                ChangeKind::Added => "added",
                ChangeKind::Removed => "removed",
                ChangeKind::Changed => "changed",
            };
            return to_json(&json!({ "action": action, "change": change }));
        }

        match kind {
            ChangeKind::Added => format!(
                "Contact {} added for {}.",
                change.contact_person, change.organization_name
            ),
            ChangeKind::Removed => format!(
                "Contact {} removed together with customer {}.",
                change.contact_person, change.organization_name
            ),
            ChangeKind::Changed => format!(
                "Contact person of {} is now {}.",
                change.organization_name, change.contact_person
            ),
        }
    }

    pub fn validation(&self, result: &ValidationResult) -> String {
        if self.format == OutputFormat::Json {
            return to_json(result);
        }

        let mut output = format!(
            "Checked {} rows: {} error(s), {} warning(s)\n",
            result.rows_checked,
            result.errors.len(),
            result.warnings.len()
        );
        for error in &result.errors {
            output.push_str(&format!(
                "ERROR   {}!{}{}: {}\n",
                error.sheet, error.column, error.row, error.message
            ));
        }
        for warning in &result.warnings {
            output.push_str(&format!("WARNING {} row {}: {}\n", warning.sheet, warning.row, warning.message));
        }
        output
    }

    pub fn sheets(&self, sheets: &[SheetInfo]) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&sheets);
        }

        let mut output = String::from("| # | Sheet | Rows | Columns |\n|---|---|---|---|\n");
        for sheet in sheets {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                sheet.index + 1,
                sheet.name,
                sheet.row_count,
                sheet.col_count
            ));
        }
        output
    }

    pub fn error(&self, error: &LedgerError) -> String {
        match self.format {
            OutputFormat::Json => to_json(&json!({
                "error": error.kind(),
                "message": error.to_string(),
            })),
            OutputFormat::Text if error.is_empty_result() => error.to_string(),
            OutputFormat::Text => format!("Error: {}", error),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
