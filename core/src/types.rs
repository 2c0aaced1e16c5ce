//! Envelope and record types for the Billingo API.
//!
//! # Design
//! Resource bodies are not typed. Documents, partners, products and the
//! rest are passed through as `serde_json::Value`, since their schema is
//! owned by the remote service. Only the envelope shape is interpreted:
//! `data` (absent means empty) and optional pagination metadata.

use serde_json::Value;

/// A single resource body, passed through untouched.
pub type Record = Value;

/// Billingo pagination metadata. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    pub total: Option<u64>,
    pub per_page: Option<u64>,
    pub current_page: Option<u64>,
    pub last_page: Option<u64>,
    pub prev_page_url: Option<String>,
    pub next_page_url: Option<String>,
}

/// The response wrapper: `data` plus optional pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub data: Option<Value>,
    pub pagination: Pagination,
}

impl Envelope {
    /// Interpret a decoded response body. Never fails: a body that is not an
    /// object, or an object without `data`, is an envelope without data.
    /// Pagination fields with unexpected types are ignored individually.
    pub fn from_value(body: Value) -> Self {
        let Value::Object(mut map) = body else {
            return Self::default();
        };
        let data = map.remove("data").filter(|v| !v.is_null());
        let pagination = Pagination {
            total: map.get("total").and_then(Value::as_u64),
            per_page: map.get("per_page").and_then(Value::as_u64),
            current_page: map.get("current_page").and_then(Value::as_u64),
            last_page: map.get("last_page").and_then(Value::as_u64),
            prev_page_url: map.get("prev_page_url").and_then(Value::as_str).map(str::to_string),
            next_page_url: map.get("next_page_url").and_then(Value::as_str).map(str::to_string),
        };
        Self { data, pagination }
    }

    /// `data` as a single record, or `None` if absent.
    pub fn into_record(self) -> Option<Record> {
        self.data
    }

    /// `data` as a sequence. Absent is empty; a lone object is a one-item
    /// sequence.
    pub fn into_records(self) -> Vec<Record> {
        match self.data {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        }
    }
}

/// One page of a list call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub pagination: Pagination,
}

/// An opaque document download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }
}
