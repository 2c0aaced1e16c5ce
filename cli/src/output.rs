//! Console rendering: tables, detail views and JSON.

use billingo_core::{Record, ResourceKind};
use comfy_table::{presets::NOTHING, Attribute, Cell, Color, ContentArrangement, Table};
use crossterm::style::Stylize;
use serde_json::Value;

/// Longest cell value shown in tables.
const MAX_CELL: usize = 40;

/// A table column: record key, header label, optional custom formatter.
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub format: Option<fn(&Record) -> String>,
}

const fn col(key: &'static str, label: &'static str) -> Column {
    Column {
        key,
        label,
        format: None,
    }
}

fn partner_name(record: &Record) -> String {
    record
        .pointer("/partner/name")
        .and_then(Value::as_str)
        .unwrap_or("N/A")
        .to_string()
}

pub fn columns(kind: ResourceKind) -> Vec<Column> {
    match kind {
        ResourceKind::Documents => vec![
            col("id", "ID"),
            col("invoice_number", "Number"),
            col("type", "Type"),
            Column {
                key: "partner",
                label: "Partner",
                format: Some(partner_name),
            },
            col("gross_total", "Total"),
            col("currency", "Currency"),
            col("fulfillment_date", "Date"),
        ],
        ResourceKind::Partners => vec![
            col("id", "ID"),
            col("name", "Name"),
            col("email", "Email"),
            col("taxcode", "Tax Code"),
            col("iban", "IBAN"),
        ],
        ResourceKind::Products => vec![
            col("id", "ID"),
            col("name", "Name"),
            col("net_unit_price", "Net Price"),
            col("gross_unit_price", "Gross Price"),
            col("currency", "Currency"),
            col("vat", "VAT"),
        ],
        ResourceKind::BankAccounts => vec![
            col("id", "ID"),
            col("name", "Name"),
            col("account_number", "Account Number"),
            col("iban", "IBAN"),
            col("swift", "SWIFT"),
            col("currency", "Currency"),
        ],
        ResourceKind::DocumentBlocks => vec![
            col("id", "ID"),
            col("name", "Name"),
            col("prefix", "Prefix"),
            col("type", "Type"),
        ],
    }
}

/// Fields shown by `get`, in order.
pub fn detail_fields(kind: ResourceKind) -> Vec<Column> {
    match kind {
        ResourceKind::Documents => vec![
            col("id", "ID"),
            col("invoice_number", "Number"),
            col("type", "Type"),
            Column {
                key: "partner",
                label: "Partner",
                format: Some(partner_name),
            },
            col("currency", "Currency"),
            col("net_total", "Net Total"),
            col("gross_total", "Gross Total"),
            col("fulfillment_date", "Date"),
        ],
        other => columns(other),
    }
}

/// Scalar rendering of a JSON value; missing and null are empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn column_text(record: &Record, column: &Column) -> String {
    match column.format {
        Some(format) => format(record),
        None => cell_text(record.get(column.key)),
    }
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_CELL {
        return text;
    }
    text.chars().take(MAX_CELL).collect()
}

/// Render records as a table with a trailing result count.
pub fn render_table(records: &[Record], columns: &[Column]) -> String {
    if records.is_empty() {
        return format!("{}", "No results found.".yellow());
    }

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|c| {
            Cell::new(c.label)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        }));
    for record in records {
        table.add_row(columns.iter().map(|c| truncate(column_text(record, c))));
    }

    format!(
        "{table}\n\n{}",
        format!("{} result(s)", records.len()).dim()
    )
}

/// Render one record as aligned `Label: value` lines.
pub fn render_details(title: &str, record: &Record, fields: &[Column]) -> String {
    let width = fields.iter().map(|f| f.label.len()).max().unwrap_or(0) + 1;
    let mut out = format!("{}\n\n", title.bold());
    for field in fields {
        let mut value = column_text(record, field);
        if value.is_empty() {
            value = "N/A".to_string();
        }
        let label = format!("{}:", field.label);
        out.push_str(&format!("{label:<width$} {value}\n", width = width));
    }
    out
}

pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn success(message: &str) -> String {
    format!("{} {message}", "✓".green())
}

pub fn failure(message: &str) -> String {
    format!("{} {message}", "✗".red())
}
