//! The seam between request building and the network.

use std::fmt;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Failure to obtain any HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request was sent (or attempted) but no response arrived: DNS
    /// failure, refused connection, timeout, reset.
    Network(String),
    /// Anything else, e.g. a URL or header the HTTP library rejected.
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) | TransportError::Other(msg) => f.write_str(msg),
        }
    }
}

/// Executes exactly one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok`; status
/// interpretation belongs to the request client.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a ureq agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => prepare(self.agent.get(&request.url), request).call(),
            (HttpMethod::Delete, _) => prepare(self.agent.delete(&request.url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                prepare(self.agent.post(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => prepare(self.agent.post(&request.url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                prepare(self.agent.put(&request.url), request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => prepare(self.agent.put(&request.url), request).send_empty(),
        };

        let mut response = result.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn prepare<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    builder
}

fn transport_error(err: ureq::Error) -> TransportError {
    match &err {
        ureq::Error::Io(_)
        | ureq::Error::Timeout(_)
        | ureq::Error::HostNotFound
        | ureq::Error::ConnectionFailed => TransportError::Network(err.to_string()),
        _ => TransportError::Other(err.to_string()),
    }
}
