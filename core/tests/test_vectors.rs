//! Verify status classification and request shaping against the JSON test
//! vectors stored in `test-vectors/`.
//!
//! Each request vector pins the method, the full URL, the query pairs in
//! the order they are sent, and the JSON body when there is one.

use std::cell::RefCell;

use billingo_core::{
    Billingo, BillingoError, Credentials, HttpMethod, HttpRequest, HttpResponse, ListParams,
    RequestClient, ResourceKind, Transport, TransportError,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

/// Replies with one fixed response and remembers the last request.
struct Canned {
    response: HttpResponse,
    last: RefCell<Option<HttpRequest>>,
}

impl Canned {
    fn new(response: HttpResponse) -> Self {
        Self {
            response,
            last: RefCell::new(None),
        }
    }
}

impl Transport for Canned {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        *self.last.borrow_mut() = Some(request.clone());
        Ok(self.response.clone())
    }
}

fn api(response: HttpResponse) -> Billingo<Canned> {
    let creds = Credentials::new("vector-key").with_base_url(BASE_URL);
    Billingo::new(RequestClient::new(creds, Canned::new(response)))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn error_kind(err: &BillingoError) -> &'static str {
    match err {
        BillingoError::Configuration(_) => "configuration",
        BillingoError::Authentication => "authentication",
        BillingoError::Authorization => "authorization",
        BillingoError::NotFound => "not_found",
        BillingoError::RateLimited => "rate_limited",
        BillingoError::Api { .. } => "api",
        BillingoError::Network(_) => "network",
        BillingoError::InvalidResponse(_) => "invalid_response",
        BillingoError::Unknown(_) => "unknown",
    }
}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

#[test]
fn status_test_vectors() {
    let raw = include_str!("../../test-vectors/status.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let body = case["body"].as_str().unwrap();
        let expected = &case["expected"];

        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
            let api = api(HttpResponse::json(status, body));
            let result = api.client().send(method, "/partners/1", None, None);

            match expected.get("ok") {
                Some(ok) => {
                    let value = result.unwrap_or_else(|e| panic!("{name} {method}: {e}"));
                    assert_eq!(&value, ok, "{name} {method}: body");
                }
                None => {
                    let err = result.expect_err(name);
                    assert_eq!(error_kind(&err), expected["error"], "{name} {method}: kind");
                    if let BillingoError::Api { status, message } = &err {
                        assert_eq!(*status as u64, expected["status"].as_u64().unwrap(), "{name}: status");
                        assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request shaping
// ---------------------------------------------------------------------------

fn list_params(params: &Value) -> ListParams {
    let mut list = ListParams::new()
        .page(params["page"].as_u64().unwrap() as u32)
        .per_page(params["per_page"].as_u64().unwrap() as u32);
    for key in ["type", "status", "query"] {
        list = list.filter(key, params[key].as_str());
    }
    list
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let kind: ResourceKind = case["resource"].as_str().unwrap().parse().unwrap();
        let id = case["id"].as_str().unwrap_or_default();
        let expected = &case["expected_request"];

        let api = api(HttpResponse::json(200, r#"{"data":{}}"#));
        let resource = api.resource(kind);
        match case["op"].as_str().unwrap() {
            "list" => drop(resource.list(&list_params(&case["params"])).unwrap()),
            "get" => drop(resource.get(id).unwrap()),
            "create" => drop(resource.create(&case["payload"]).unwrap()),
            "update" => drop(resource.update(id, &case["payload"]).unwrap()),
            "delete" => assert!(resource.delete(id).unwrap()),
            other => panic!("unknown op: {other}"),
        }

        let req = api.client().transport().last.borrow().clone().unwrap();
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.header("x-api-key"), Some("vector-key"), "{name}: auth");

        let expected_query: Vec<(String, String)> = expected["query"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let pair = pair.as_array().unwrap();
                (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.query, expected_query, "{name}: query");

        let body = req
            .body
            .as_deref()
            .map(|b| serde_json::from_str::<Value>(b).unwrap())
            .unwrap_or(Value::Null);
        assert_eq!(body, expected["body"], "{name}: body");
    }
}
