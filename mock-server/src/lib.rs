//! In-memory stand-in for the subset of the Billingo v3 API the client uses.
//!
//! Records are untyped JSON objects with server-assigned integer ids.
//! Responses use the `{"data": ...}` envelope. Authentication is a single
//! `X-API-KEY` value; an optional read-only key gets 403 on writes and an
//! optional request budget produces 429 once spent.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const COLLECTIONS: [&str; 5] = [
    "documents",
    "partners",
    "products",
    "bank-accounts",
    "document-blocks",
];

/// Exchange rates expressed in HUF.
const RATES: [(&str, f64); 4] = [("HUF", 1.0), ("EUR", 395.0), ("USD", 360.0), ("GBP", 460.0)];

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    /// Accepted for GET only; writes return 403.
    pub read_only_key: Option<String>,
    /// Requests served before every further request returns 429.
    pub request_limit: Option<usize>,
}

impl Settings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            read_only_key: None,
            request_limit: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    collections: HashMap<String, BTreeMap<u64, Value>>,
    next_id: u64,
}

impl Store {
    fn insert(&mut self, collection: &str, payload: Map<String, Value>) -> Value {
        self.next_id += 1;
        let id = self.next_id;
        let mut record = Map::new();
        record.insert("id".to_string(), json!(id));
        for (key, value) in payload {
            if key != "id" {
                record.insert(key, value);
            }
        }
        let record = Value::Object(record);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, record.clone());
        record
    }

    fn collection(&self, name: &str) -> impl Iterator<Item = &Value> {
        self.collections.get(name).into_iter().flat_map(|c| c.values())
    }

    fn get(&self, collection: &str, id: u64) -> Option<&Value> {
        self.collections.get(collection)?.get(&id)
    }

    fn get_mut(&mut self, collection: &str, id: u64) -> Option<&mut Value> {
        self.collections.get_mut(collection)?.get_mut(&id)
    }

    fn remove(&mut self, collection: &str, id: u64) -> Option<Value> {
        self.collections.get_mut(collection)?.remove(&id)
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    db: Db,
    served: Arc<AtomicUsize>,
}

pub fn app(settings: Settings) -> Router {
    let state = AppState {
        settings: Arc::new(settings),
        db: Db::default(),
        served: Arc::new(AtomicUsize::new(0)),
    };
    Router::new()
        .route("/currencies", get(convert_currency))
        .route("/{collection}", get(list_records).post(create_record))
        .route(
            "/{collection}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/{collection}/{id}/download", get(download_document))
        .route("/{collection}/{id}/send", post(send_document))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

pub async fn run(listener: TcpListener, settings: Settings) -> Result<(), std::io::Error> {
    axum::serve(listener, app(settings)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Resource not found.")
}

async fn authenticate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    debug!(method = %request.method(), uri = %request.uri(), "mock request");
    let key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let read_only = state.settings.read_only_key.as_deref() == Some(key);
    if key != state.settings.api_key && !read_only {
        return error(StatusCode::UNAUTHORIZED, "Unauthenticated.");
    }
    if read_only && request.method() != Method::GET {
        return error(StatusCode::FORBIDDEN, "This action is unauthorized.");
    }
    if let Some(limit) = state.settings.request_limit {
        if state.served.fetch_add(1, Ordering::SeqCst) >= limit {
            return error(StatusCode::TOO_MANY_REQUESTS, "Too Many Attempts.");
        }
    }
    next.run(request).await
}

fn known(collection: &str) -> bool {
    COLLECTIONS.contains(&collection)
}

fn parse_number(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn matches_filters(record: &Value, filters: &[(&String, &String)]) -> bool {
    filters.iter().all(|(key, wanted)| {
        if key.as_str() == "query" {
            let wanted = wanted.to_lowercase();
            return record
                .as_object()
                .into_iter()
                .flat_map(|o| o.values())
                .filter_map(Value::as_str)
                .any(|v| v.to_lowercase().contains(&wanted));
        }
        match record.get(key.as_str()) {
            Some(Value::String(s)) => s == *wanted,
            Some(other) => other.to_string() == **wanted,
            None => false,
        }
    })
}

async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !known(&collection) {
        return not_found();
    }
    let page = parse_number(&params, "page", 1);
    let per_page = parse_number(&params, "per_page", 25);
    let filters: Vec<(&String, &String)> = params
        .iter()
        .filter(|(k, _)| k.as_str() != "page" && k.as_str() != "per_page")
        .collect();

    let db = state.db.read().await;
    let matching: Vec<Value> = db
        .collection(&collection)
        .filter(|r| matches_filters(r, &filters))
        .cloned()
        .collect();
    let total = matching.len();
    let last_page = total.div_ceil(per_page).max(1);
    let data: Vec<Value> = matching
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Json(json!({
        "data": data,
        "total": total,
        "per_page": per_page,
        "current_page": page,
        "last_page": last_page,
        "prev_page_url": Value::Null,
        "next_page_url": Value::Null,
    }))
    .into_response()
}

async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    if !known(&collection) {
        return not_found();
    }
    let Value::Object(payload) = payload else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The given data was invalid.");
    };
    let record = state.db.write().await.insert(&collection, payload);
    (StatusCode::CREATED, Json(json!({ "data": record }))).into_response()
}

async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Response {
    let db = state.db.read().await;
    match db.get(&collection, id) {
        Some(record) => Json(json!({ "data": record })).into_response(),
        None => not_found(),
    }
}

async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
    Json(payload): Json<Value>,
) -> Response {
    let Value::Object(payload) = payload else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The given data was invalid.");
    };
    let mut db = state.db.write().await;
    let Some(Value::Object(record)) = db.get_mut(&collection, id) else {
        return not_found();
    };
    for (key, value) in payload {
        if key != "id" {
            record.insert(key, value);
        }
    }
    Json(json!({ "data": record })).into_response()
}

async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Response {
    match state.db.write().await.remove(&collection, id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

async fn download_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
) -> Response {
    if collection != "documents" || state.db.read().await.get(&collection, id).is_none() {
        return not_found();
    }
    let body = format!("%PDF-1.4\n% mock document {id}\n%%EOF\n");
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/pdf")], body).into_response()
}

async fn send_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, u64)>,
    Json(payload): Json<Value>,
) -> Response {
    if collection != "documents" || state.db.read().await.get(&collection, id).is_none() {
        return not_found();
    }
    let emails: Vec<&str> = payload
        .get("emails")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if emails.is_empty() || emails.iter().any(|e| !e.contains('@')) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The emails field is invalid.");
    }
    Json(json!({ "emails": emails })).into_response()
}

fn rate(code: &str) -> Option<f64> {
    RATES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, r)| *r)
}

async fn convert_currency(Query(params): Query<HashMap<String, String>>) -> Response {
    let from = params.get("from").map(String::as_str).unwrap_or_default();
    let to = params.get("to").map(String::as_str).unwrap_or_default();
    match (rate(from), rate(to)) {
        (Some(f), Some(t)) => Json(json!({
            "from": from.to_uppercase(),
            "to": to.to_uppercase(),
            "conversation_rate": f / t,
        }))
        .into_response(),
        _ => error(StatusCode::UNPROCESSABLE_ENTITY, "Unsupported currency."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_increasing_ids() {
        let mut store = Store::default();
        let a = store.insert("partners", Map::new());
        let b = store.insert("partners", Map::new());
        assert_eq!(a["id"], 1);
        assert_eq!(b["id"], 2);
    }

    #[test]
    fn insert_ignores_client_supplied_id() {
        let mut store = Store::default();
        let payload = json!({"id": 99, "name": "ACME"});
        let record = store.insert("partners", payload.as_object().unwrap().clone());
        assert_eq!(record["id"], 1);
        assert_eq!(record["name"], "ACME");
    }

    #[test]
    fn query_filter_matches_any_string_field() {
        let record = json!({"id": 1, "name": "ACME Kft.", "email": "billing@acme.hu"});
        let key = "query".to_string();
        let hit = "acme".to_string();
        let miss = "globex".to_string();
        assert!(matches_filters(&record, &[(&key, &hit)]));
        assert!(!matches_filters(&record, &[(&key, &miss)]));
    }

    #[test]
    fn field_filter_is_exact() {
        let record = json!({"type": "invoice", "status": "paid"});
        let key = "type".to_string();
        let value = "proforma".to_string();
        assert!(!matches_filters(&record, &[(&key, &value)]));
    }

    #[test]
    fn rates_are_case_insensitive() {
        assert_eq!(rate("eur"), Some(395.0));
        assert_eq!(rate("XYZ"), None);
    }
}
