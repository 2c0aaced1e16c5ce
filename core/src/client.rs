//! Authenticated request client for the Billingo v3 API.
//!
//! # Design
//! `RequestClient` holds read-only `Credentials` and a `Transport`. Every
//! call is split into three steps that are individually testable:
//! `build` produces an `HttpRequest` (and enforces the API-key
//! precondition), the transport performs the round-trip, and `classify`
//! maps the status code onto `BillingoError`. No retries, no caching; one
//! call is one request.

use serde_json::Value;
use tracing::debug;

use crate::config::Credentials;
use crate::error::BillingoError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Query};
use crate::transport::{Transport, TransportError, UreqTransport};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Debug, Clone)]
pub struct RequestClient<T = UreqTransport> {
    credentials: Credentials,
    transport: T,
}

impl RequestClient<UreqTransport> {
    /// Client backed by the default ureq transport.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self::new(credentials, UreqTransport::new())
    }
}

impl<T: Transport> RequestClient<T> {
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Describe one request without sending it.
    ///
    /// `path` is relative to the base URL and must start with `/`.
    pub fn build(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<HttpRequest, BillingoError> {
        let api_key = self
            .credentials
            .api_key()
            .ok_or_else(BillingoError::missing_api_key)?;

        let mut headers = vec![
            (API_KEY_HEADER.to_string(), api_key.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        let body = match body {
            Some(value) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(
                    serde_json::to_string(value)
                        .map_err(|e| BillingoError::Unknown(format!("failed to encode request body: {e}")))?,
                )
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.credentials.base_url()),
            query: query.map(|q| q.pairs().to_vec()).unwrap_or_default(),
            headers,
            body,
        })
    }

    /// Send one request and return the raw 2xx response.
    pub fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<HttpResponse, BillingoError> {
        let request = self.build(method, path, body, query)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(&request).map_err(|err| match err {
            TransportError::Network(msg) => BillingoError::Network(msg),
            TransportError::Other(msg) => BillingoError::Unknown(msg),
        })?;
        debug!(status = response.status, bytes = response.body.len(), "received response");

        classify(response)
    }

    /// Send one request and decode the response body as JSON.
    ///
    /// The body is returned as-is; envelope unwrapping happens in the
    /// resource facade. An empty 2xx body decodes to `Value::Null`.
    pub fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: Option<&Query>,
    ) -> Result<Value, BillingoError> {
        let response = self.execute(method, path, body, query)?;
        decode_json(&response)
    }
}

/// Map non-success status codes to the appropriate `BillingoError` variant.
pub fn classify(response: HttpResponse) -> Result<HttpResponse, BillingoError> {
    if response.is_success() {
        return Ok(response);
    }
    match response.status {
        401 => Err(BillingoError::Authentication),
        403 => Err(BillingoError::Authorization),
        404 => Err(BillingoError::NotFound),
        429 => Err(BillingoError::RateLimited),
        status => Err(BillingoError::Api {
            status,
            message: error_message(&response),
        }),
    }
}

/// Decode a response body as JSON; an empty body is `Value::Null`.
pub fn decode_json(response: &HttpResponse) -> Result<Value, BillingoError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|e| BillingoError::InvalidResponse(e.to_string()))
}

/// The server's `message` (or `error.message`), else the body as compact
/// JSON, else the body text.
fn error_message(response: &HttpResponse) -> String {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| value.pointer("/error/message").and_then(Value::as_str));
            match message {
                Some(message) => message.to_string(),
                None => value.to_string(),
            }
        }
        Err(_) => response.text().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    /// Records every request and replies with a scripted response.
    struct Scripted {
        reply: Result<HttpResponse, TransportError>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(reply: Result<HttpResponse, TransportError>) -> Self {
            Self {
                reply,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone()
        }
    }

    fn client(reply: Result<HttpResponse, TransportError>) -> RequestClient<Scripted> {
        RequestClient::new(
            Credentials::new("secret").with_base_url("http://localhost:3000"),
            Scripted::new(reply),
        )
    }

    #[test]
    fn build_attaches_api_key_header() {
        let c = client(Ok(HttpResponse::json(200, "{}")));
        let req = c.build(HttpMethod::Get, "/partners", None, None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/partners");
        assert_eq!(req.header("x-api-key"), Some("secret"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
        assert!(req.header("content-type").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_serializes_body_as_json() {
        let c = client(Ok(HttpResponse::json(200, "{}")));
        let payload = json!({"name": "ACME Kft."});
        let req = c
            .build(HttpMethod::Post, "/partners", Some(&payload), None)
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, payload);
    }

    #[test]
    fn build_uses_default_base_url() {
        let c = RequestClient::new(Credentials::new("k"), Scripted::new(Ok(HttpResponse::json(200, "{}"))));
        let req = c.build(HttpMethod::Get, "/currencies", None, None).unwrap();
        assert_eq!(req.url, "https://api.billingo.hu/v3/currencies");
    }

    #[test]
    fn missing_api_key_never_reaches_transport() {
        let c = RequestClient::new(
            Credentials::anonymous(),
            Scripted::new(Ok(HttpResponse::json(200, "{}"))),
        );
        let err = c.send(HttpMethod::Get, "/documents", None, None).unwrap_err();
        assert!(matches!(err, BillingoError::Configuration(_)));
        assert!(c.transport().seen.borrow().is_empty());
    }

    #[test]
    fn send_returns_raw_envelope() {
        let c = client(Ok(HttpResponse::json(200, r#"{"data":[{"id":1}],"total":1}"#)));
        let body = c.send(HttpMethod::Get, "/products", None, None).unwrap();
        assert_eq!(body, json!({"data": [{"id": 1}], "total": 1}));
    }

    #[test]
    fn empty_body_decodes_to_null() {
        let c = client(Ok(HttpResponse::json(204, "")));
        let body = c.send(HttpMethod::Delete, "/products/1", None, None).unwrap();
        assert_eq!(body, Value::Null);
    }

    #[test]
    fn non_json_success_body_is_invalid_response() {
        let c = client(Ok(HttpResponse::json(200, "<html>")));
        let err = c.send(HttpMethod::Get, "/products", None, None).unwrap_err();
        assert!(matches!(err, BillingoError::InvalidResponse(_)));
    }

    #[test]
    fn dedicated_statuses_map_to_dedicated_variants() {
        for (status, method) in [
            (401, HttpMethod::Get),
            (403, HttpMethod::Post),
            (404, HttpMethod::Put),
            (429, HttpMethod::Delete),
        ] {
            let c = client(Ok(HttpResponse::json(status, "{}")));
            let err = c.send(method, "/partners/1", None, None).unwrap_err();
            let ok = match status {
                401 => matches!(err, BillingoError::Authentication),
                403 => matches!(err, BillingoError::Authorization),
                404 => matches!(err, BillingoError::NotFound),
                _ => matches!(err, BillingoError::RateLimited),
            };
            assert!(ok, "{status} mapped to {err:?}");
        }
    }

    #[test]
    fn other_status_uses_server_message() {
        let c = client(Ok(HttpResponse::json(422, r#"{"message":"Invalid tax code"}"#)));
        let err = c.send(HttpMethod::Post, "/partners", None, None).unwrap_err();
        match err {
            BillingoError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid tax code");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nested_error_message_is_used() {
        let c = client(Ok(HttpResponse::json(400, r#"{"error":{"message":"Bad filter"}}"#)));
        let err = c.send(HttpMethod::Get, "/documents", None, None).unwrap_err();
        assert_eq!(err.to_string(), "API Error (400): Bad filter");
    }

    #[test]
    fn unstructured_error_body_is_dumped_as_json() {
        let c = client(Ok(HttpResponse::json(500, r#"{"errors":["x"]}"#)));
        let err = c.send(HttpMethod::Get, "/documents", None, None).unwrap_err();
        assert_eq!(err.to_string(), r#"API Error (500): {"errors":["x"]}"#);
    }

    #[test]
    fn transport_failures_are_classified() {
        let c = client(Err(TransportError::Network("connection refused".to_string())));
        let err = c.send(HttpMethod::Get, "/documents", None, None).unwrap_err();
        assert!(matches!(err, BillingoError::Network(_)));

        let c = client(Err(TransportError::Other("bad uri".to_string())));
        let err = c.send(HttpMethod::Get, "/documents", None, None).unwrap_err();
        assert!(matches!(err, BillingoError::Unknown(msg) if msg == "bad uri"));
    }

    #[test]
    fn query_is_forwarded_in_order() {
        let c = client(Ok(HttpResponse::json(200, "{}")));
        let query = Query::new().with("page", 1).with("per_page", 25);
        c.send(HttpMethod::Get, "/documents", None, Some(&query)).unwrap();
        let seen = c.transport().seen.borrow();
        assert_eq!(seen[0].query, query.pairs());
    }
}
