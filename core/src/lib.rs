//! Client core for the Billingo v3 invoicing API.
//!
//! # Overview
//! Two layers. `RequestClient` performs one authenticated request and
//! normalizes failures into `BillingoError`. `Billingo` and its `Resource`
//! handles shape list/get/create/update/delete calls per resource type and
//! unwrap the `{"data": ...}` envelope.
//!
//! # Design
//! - Credentials are injected at construction; nothing is read from the
//!   environment at call time.
//! - The network sits behind the `Transport` trait. `UreqTransport` is the
//!   production implementation; tests substitute recording fakes.
//! - Resource bodies stay `serde_json::Value`. Only the envelope is
//!   interpreted.
//! - The core never prints and never exits the process.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod transport;
pub mod types;

pub use client::{classify, decode_json, RequestClient, API_KEY_HEADER};
pub use config::{Credentials, DEFAULT_BASE_URL};
pub use error::BillingoError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Query};
pub use resources::{Billingo, Documents, ListParams, Resource, ResourceKind, DEFAULT_PAGE, DEFAULT_PER_PAGE};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{Download, Envelope, Page, Pagination, Record};
