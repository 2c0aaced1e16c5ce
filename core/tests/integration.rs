//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in a background thread
//! with its own tokio runtime, then drives the blocking facade over real
//! HTTP with `UreqTransport`.

use std::net::SocketAddr;

use billingo_core::{Billingo, BillingoError, Credentials, ListParams, RequestClient, UreqTransport};
use mock_server::Settings;
use serde_json::json;

const KEY: &str = "integration-key";

fn start(settings: Settings) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, settings).await
        })
        .unwrap();
    });

    addr
}

fn api(addr: SocketAddr, key: &str) -> Billingo<UreqTransport> {
    let creds = Credentials::new(key).with_base_url(format!("http://{addr}"));
    Billingo::new(RequestClient::with_credentials(creds))
}

#[test]
fn partner_crud_lifecycle() {
    let addr = start(Settings::new(KEY));
    let api = api(addr, KEY);
    let partners = api.partners();

    // Step 1: list is empty.
    let list = partners.list(&ListParams::default()).unwrap();
    assert!(list.is_empty(), "expected empty list");

    // Step 2: create.
    let payload = json!({"name": "ACME Kft.", "emails": ["billing@acme.hu"], "taxcode": "12345678-1-42"});
    let created = partners.create(&payload).unwrap().expect("created record");
    let id = created["id"].as_u64().unwrap();
    assert_eq!(created["name"], "ACME Kft.");
    assert_eq!(created["taxcode"], "12345678-1-42");

    // Step 3: get.
    let fetched = partners.get(id).unwrap();
    assert_eq!(fetched, Some(created.clone()));

    // Step 4: update.
    let updated = partners
        .update(id, &json!({"name": "ACME Zrt."}))
        .unwrap()
        .unwrap();
    assert_eq!(updated["name"], "ACME Zrt.");
    assert_eq!(updated["taxcode"], "12345678-1-42");

    // Step 5: search.
    let hits = partners
        .list(&ListParams::new().search(Some("zrt")))
        .unwrap();
    assert_eq!(hits.len(), 1);
    let misses = partners
        .list(&ListParams::new().search(Some("globex")))
        .unwrap();
    assert!(misses.is_empty());

    // Step 6: delete.
    assert!(partners.delete(id).unwrap());

    // Step 7: get after delete. 404 is an error, not `None`.
    let err = partners.get(id).unwrap_err();
    assert!(matches!(err, BillingoError::NotFound));

    // Step 8: delete again.
    let err = partners.delete(id).unwrap_err();
    assert!(matches!(err, BillingoError::NotFound));
}

#[test]
fn pagination_over_http() {
    let addr = start(Settings::new(KEY));
    let api = api(addr, KEY);
    for n in 0..5 {
        api.products()
            .create(&json!({"name": format!("Item {n}"), "vat": "27%"}))
            .unwrap();
    }

    let page = api
        .products()
        .list_page(&ListParams::new().page(2).per_page(2))
        .unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0]["name"], "Item 2");
    assert_eq!(page.pagination.total, Some(5));
    assert_eq!(page.pagination.last_page, Some(3));
}

#[test]
fn document_download_and_send() {
    let addr = start(Settings::new(KEY));
    let api = api(addr, KEY);
    let docs = api.documents();

    let doc = docs
        .create(&json!({"type": "invoice", "currency": "HUF", "partner_id": 1}))
        .unwrap()
        .unwrap();
    let id = doc["id"].as_u64().unwrap();

    let filtered = docs
        .list(&ListParams::new().document_type(Some("invoice")))
        .unwrap();
    assert_eq!(filtered.len(), 1);

    let download = docs.download(id).unwrap();
    assert!(!download.is_json());
    assert!(download.bytes.starts_with(b"%PDF"));

    let sent = docs.send(id, &["a@example.com".to_string()]).unwrap();
    assert_eq!(sent["emails"], json!(["a@example.com"]));

    let err = docs.send(id, &[]).unwrap_err();
    assert!(matches!(err, BillingoError::Api { status: 422, .. }));
}

#[test]
fn currency_conversion_over_http() {
    let addr = start(Settings::new(KEY));
    let api = api(addr, KEY);
    let body = api.convert_currency("EUR", "HUF").unwrap();
    assert_eq!(body["from"], "EUR");
    assert_eq!(body["conversation_rate"], 395.0);

    let err = api.convert_currency("EUR", "XYZ").unwrap_err();
    assert_eq!(err.to_string(), "API Error (422): Unsupported currency.");
}

#[test]
fn wrong_key_is_authentication_error() {
    let addr = start(Settings::new(KEY));
    let err = api(addr, "wrong").bank_accounts().list(&ListParams::default()).unwrap_err();
    assert!(matches!(err, BillingoError::Authentication));
}

#[test]
fn read_only_key_is_authorization_error_on_write() {
    let mut settings = Settings::new(KEY);
    settings.read_only_key = Some("viewer".to_string());
    let addr = start(settings);
    let viewer = api(addr, "viewer");

    assert!(viewer.document_blocks().list(&ListParams::default()).is_ok());
    let err = viewer
        .document_blocks()
        .create(&json!({"name": "Main"}))
        .unwrap_err();
    assert!(matches!(err, BillingoError::Authorization));
}

#[test]
fn exhausted_budget_is_rate_limit_error() {
    let mut settings = Settings::new(KEY);
    settings.request_limit = Some(2);
    let addr = start(settings);
    let api = api(addr, KEY);

    api.products().list(&ListParams::default()).unwrap();
    api.products().list(&ListParams::default()).unwrap();
    let err = api.products().get(1).unwrap_err();
    assert!(matches!(err, BillingoError::RateLimited));
}

#[test]
fn closed_port_is_network_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = api(addr, KEY).partners().list(&ListParams::default()).unwrap_err();
    assert!(matches!(err, BillingoError::Network(_)), "{err:?}");
}
