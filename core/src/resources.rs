//! Per-resource operations over the request client.
//!
//! # Design
//! Every resource type shares one `Resource` handle that knows only its
//! collection path. Operations shape their arguments into a request,
//! delegate to `RequestClient::send`, and unwrap the envelope. Errors pass
//! through untouched: a 404 stays `BillingoError::NotFound`, while a 200
//! with no `data` is `Ok(None)` for the caller to interpret.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::client::RequestClient;
use crate::error::BillingoError;
use crate::http::{HttpMethod, Query};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Download, Envelope, Page, Record};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 25;

/// The resource types exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Documents,
    Partners,
    Products,
    BankAccounts,
    DocumentBlocks,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Documents,
        ResourceKind::Partners,
        ResourceKind::Products,
        ResourceKind::BankAccounts,
        ResourceKind::DocumentBlocks,
    ];

    /// Collection path relative to the base URL.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Documents => "/documents",
            ResourceKind::Partners => "/partners",
            ResourceKind::Products => "/products",
            ResourceKind::BankAccounts => "/bank-accounts",
            ResourceKind::DocumentBlocks => "/document-blocks",
        }
    }

    /// Singular, capitalized name for messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Documents => "Document",
            ResourceKind::Partners => "Partner",
            ResourceKind::Products => "Product",
            ResourceKind::BankAccounts => "Bank account",
            ResourceKind::DocumentBlocks => "Document block",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection().trim_start_matches('/'))
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    /// Parses the collection name, e.g. `bank-accounts`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim_start_matches('/');
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == name)
            .ok_or_else(|| format!("unknown resource type: {s}"))
    }
}

/// Pagination plus resource-specific filters for a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
    pub filters: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            filters: Vec::new(),
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Add a filter; `None` and empty values are skipped.
    pub fn filter<V: AsRef<str>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            let value = value.as_ref();
            if !value.is_empty() {
                self.filters.push((key.to_string(), value.to_string()));
            }
        }
        self
    }

    /// Documents: filter by document type (invoice, proforma, ...).
    pub fn document_type<V: AsRef<str>>(self, value: Option<V>) -> Self {
        self.filter("type", value)
    }

    /// Documents: filter by payment status.
    pub fn status<V: AsRef<str>>(self, value: Option<V>) -> Self {
        self.filter("status", value)
    }

    /// Partners: free-text search.
    pub fn search<V: AsRef<str>>(self, value: Option<V>) -> Self {
        self.filter("query", value)
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new()
            .with("page", self.page)
            .with("per_page", self.per_page);
        for (key, value) in &self.filters {
            query.push(key.as_str(), value);
        }
        query
    }
}

/// Entry point: one request client, handles per resource type.
#[derive(Debug, Clone)]
pub struct Billingo<T = UreqTransport> {
    client: RequestClient<T>,
}

impl<T: Transport> Billingo<T> {
    pub fn new(client: RequestClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RequestClient<T> {
        &self.client
    }

    pub fn resource(&self, kind: ResourceKind) -> Resource<'_, T> {
        Resource {
            client: &self.client,
            kind,
        }
    }

    pub fn documents(&self) -> Documents<'_, T> {
        Documents {
            inner: self.resource(ResourceKind::Documents),
        }
    }

    pub fn partners(&self) -> Resource<'_, T> {
        self.resource(ResourceKind::Partners)
    }

    pub fn products(&self) -> Resource<'_, T> {
        self.resource(ResourceKind::Products)
    }

    pub fn bank_accounts(&self) -> Resource<'_, T> {
        self.resource(ResourceKind::BankAccounts)
    }

    pub fn document_blocks(&self) -> Resource<'_, T> {
        self.resource(ResourceKind::DocumentBlocks)
    }

    /// Exchange rate lookup. The body is returned as decoded, not unwrapped.
    pub fn convert_currency(&self, from: &str, to: &str) -> Result<Value, BillingoError> {
        let query = Query::new().with("from", from).with("to", to);
        self.client
            .send(HttpMethod::Get, "/currencies", None, Some(&query))
    }
}

/// Generic list/get/create/update/delete over one collection.
#[derive(Debug)]
pub struct Resource<'a, T> {
    client: &'a RequestClient<T>,
    kind: ResourceKind,
}

impl<T> Clone for Resource<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Resource<'_, T> {}

impl<'a, T: Transport> Resource<'a, T> {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn item_path(&self, id: &dyn fmt::Display) -> String {
        format!("{}/{id}", self.kind.collection())
    }

    /// Records on the requested page; empty when the envelope has no data.
    pub fn list(&self, params: &ListParams) -> Result<Vec<Record>, BillingoError> {
        Ok(self.list_page(params)?.records)
    }

    /// Like `list`, keeping the pagination metadata.
    pub fn list_page(&self, params: &ListParams) -> Result<Page, BillingoError> {
        let query = params.to_query();
        let body = self
            .client
            .send(HttpMethod::Get, self.kind.collection(), None, Some(&query))?;
        let envelope = Envelope::from_value(body);
        let pagination = envelope.pagination.clone();
        Ok(Page {
            records: envelope.into_records(),
            pagination,
        })
    }

    pub fn get(&self, id: impl fmt::Display) -> Result<Option<Record>, BillingoError> {
        let body = self
            .client
            .send(HttpMethod::Get, &self.item_path(&id), None, None)?;
        Ok(Envelope::from_value(body).into_record())
    }

    pub fn create(&self, payload: &Value) -> Result<Option<Record>, BillingoError> {
        let body = self
            .client
            .send(HttpMethod::Post, self.kind.collection(), Some(payload), None)?;
        Ok(Envelope::from_value(body).into_record())
    }

    pub fn update(&self, id: impl fmt::Display, payload: &Value) -> Result<Option<Record>, BillingoError> {
        let body = self
            .client
            .send(HttpMethod::Put, &self.item_path(&id), Some(payload), None)?;
        Ok(Envelope::from_value(body).into_record())
    }

    /// `true` on any 2xx. The response body is not decoded.
    pub fn delete(&self, id: impl fmt::Display) -> Result<bool, BillingoError> {
        self.client
            .execute(HttpMethod::Delete, &self.item_path(&id), None, None)?;
        Ok(true)
    }
}

/// Documents support the generic operations plus download and send.
#[derive(Debug)]
pub struct Documents<'a, T> {
    inner: Resource<'a, T>,
}

impl<'a, T> std::ops::Deref for Documents<'a, T> {
    type Target = Resource<'a, T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: Transport> Documents<'_, T> {
    /// Fetch the rendered document. The payload is returned unparsed.
    pub fn download(&self, id: impl fmt::Display) -> Result<Download, BillingoError> {
        let path = format!("{}/{id}/download", ResourceKind::Documents.collection());
        let response = self.inner.client.execute(HttpMethod::Get, &path, None, None)?;
        Ok(Download {
            content_type: response.header("content-type").map(str::to_string),
            bytes: response.body,
        })
    }

    /// E-mail the document to `emails`. Returns the decoded body as-is.
    pub fn send(&self, id: impl fmt::Display, emails: &[String]) -> Result<Value, BillingoError> {
        let path = format!("{}/{id}/send", ResourceKind::Documents.collection());
        let body = json!({ "emails": emails });
        self.inner
            .client
            .send(HttpMethod::Post, &path, Some(&body), None)
    }
}
