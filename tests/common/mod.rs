//! In-process fake Sesame server for integration tests
//!
//! Serves the Sesame REST layout under `/sesame` on an ephemeral port.
//! Three repositories exist: `SYSTEM`, `test`, and `legacy`. `legacy`
//! answers unknown namespace prefixes with `200 Undefined prefix: ...`
//! instead of a 404, like some older servers. Statements are stored as
//! N-Triples lines.

#![allow(dead_code)]

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const PROTOCOL_VERSION: u32 = 6;

/// Binary results table returned for `application/x-binary-rdf-results-table`.
/// Not valid UTF-8.
pub const BINARY_TABLE: &[u8] = b"BRTR\0\0\0\x02\xFF\x9C\x80";

const BINARY_MIME: &str = "application/x-binary-rdf-results-table";

type Fields = Vec<(String, String)>;

#[derive(Default)]
pub struct RepoState {
    pub statements: Vec<String>,
    pub contexts: Vec<String>,
    pub namespaces: IndexMap<String, String>,
}

pub struct FakeSesame {
    pub base_url: String,
    pub repos: Mutex<HashMap<String, RepoState>>,
    /// `METHOD path` of every request received
    pub log: Mutex<Vec<String>>,
}

impl FakeSesame {
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

type Shared = Arc<FakeSesame>;

/// Start the fake server; returns its state and the base URL (no trailing slash)
pub async fn start() -> (Shared, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}/sesame", addr);

    let mut repos = HashMap::new();
    let mut system = RepoState::default();
    system
        .namespaces
        .insert("sys".into(), "http://www.openrdf.org/config/repository#".into());
    system
        .namespaces
        .insert("rdf".into(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#".into());
    repos.insert("SYSTEM".to_string(), system);
    repos.insert("test".to_string(), RepoState::default());
    repos.insert("legacy".to_string(), RepoState::default());

    let state = Arc::new(FakeSesame {
        base_url: base_url.clone(),
        repos: Mutex::new(repos),
        log: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/sesame/protocol", get(protocol))
        .route("/sesame/repositories", get(list_repositories))
        .route("/sesame/repositories/:id", get(query_get).post(query_post))
        .route(
            "/sesame/repositories/:id/statements",
            get(get_statements)
                .post(add_statements)
                .put(replace_statements)
                .delete(delete_statements),
        )
        .route("/sesame/repositories/:id/size", get(size))
        .route("/sesame/repositories/:id/contexts", get(contexts))
        .route(
            "/sesame/repositories/:id/namespaces",
            get(namespaces).delete(clear_namespaces),
        )
        .route(
            "/sesame/repositories/:id/namespaces/:prefix",
            get(get_namespace).put(put_namespace).delete(delete_namespace),
        )
        .with_state(Arc::clone(&state));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (state, base_url)
}

fn unknown_repository(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Unknown repository: {}", id)).into_response()
}

fn accept(headers: &HeaderMap) -> String {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn bindings(rows: Vec<Value>) -> Json<Value> {
    Json(json!({ "head": { "vars": [] }, "results": { "bindings": rows } }))
}

/// (subject, predicate, object) of an N-Triples line
fn split_statement(line: &str) -> (&str, &str, &str) {
    let mut parts = line.splitn(3, ' ');
    let subj = parts.next().unwrap_or_default();
    let pred = parts.next().unwrap_or_default();
    let obj = parts
        .next()
        .unwrap_or_default()
        .trim_end()
        .trim_end_matches('.')
        .trim_end();
    (subj, pred, obj)
}

fn matches(line: &str, filter: &Fields) -> bool {
    let (subj, pred, obj) = split_statement(line);
    filter.iter().all(|(k, v)| match k.as_str() {
        "subj" => subj == v,
        "pred" => pred == v,
        "obj" => obj == v,
        _ => true,
    })
}

fn parse_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

async fn protocol(State(state): State<Shared>) -> String {
    state.record("GET /protocol".into());
    PROTOCOL_VERSION.to_string()
}

async fn list_repositories(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.record("GET /repositories".into());
    if accept(&headers) != "application/sparql-results+json" {
        return (StatusCode::NOT_ACCEPTABLE, "JSON only").into_response();
    }

    let repo = |id: &str, title: &str, writable: bool| {
        json!({
            "uri": { "type": "uri", "value": format!("{}/repositories/{}", state.base_url, id) },
            "id": { "type": "literal", "value": id },
            "title": { "type": "literal", "value": title },
            "readable": { "type": "typed-literal", "value": "true" },
            "writable": { "type": "typed-literal", "value": writable.to_string() },
        })
    };

    bindings(vec![
        repo("SYSTEM", "System configuration repository", false),
        repo("test", "Test repository", true),
        repo("legacy", "Legacy server quirks", true),
    ])
    .into_response()
}

fn echo_query(state: &FakeSesame, method: &str, id: &str, headers: &HeaderMap, fields: Fields) -> Response {
    state.record(format!("{} /repositories/{}", method, id));
    if !state.repos.lock().unwrap().contains_key(id) {
        return unknown_repository(id);
    }
    if !fields.iter().any(|(k, _)| k == "query") {
        return (StatusCode::BAD_REQUEST, "MALFORMED QUERY: missing query").into_response();
    }
    if accept(headers) == BINARY_MIME {
        return (
            [(header::CONTENT_TYPE, "application/x-binary-rdf-results-table; charset=UTF-8")],
            BINARY_TABLE,
        )
            .into_response();
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Json(json!({
        "method": method,
        "accept": accept(headers),
        "content_type": content_type,
        "fields": fields,
    }))
    .into_response()
}

async fn query_get(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(fields): Query<Fields>,
) -> Response {
    echo_query(&state, "GET", &id, &headers, fields)
}

async fn query_post(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(fields): Form<Fields>,
) -> Response {
    echo_query(&state, "POST", &id, &headers, fields)
}

async fn get_statements(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(filter): Query<Fields>,
) -> Response {
    state.record(format!("GET /repositories/{}/statements", id));
    let repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get(&id) else {
        return unknown_repository(&id);
    };
    let lines: Vec<&str> = repo
        .statements
        .iter()
        .filter(|l| matches(l, &filter))
        .map(String::as_str)
        .collect();
    lines.join("\n").into_response()
}

async fn add_statements(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(fields): Query<Fields>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.record(format!("POST /repositories/{}/statements", id));
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != "text/plain" && content_type != "application/x-turtle" {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported MIME type").into_response();
    }

    let mut repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get_mut(&id) else {
        return unknown_repository(&id);
    };
    repo.statements.extend(parse_lines(&body));
    for (key, value) in fields {
        if key == "context" && value != "null" {
            let context = value.trim_matches(|c| c == '<' || c == '>').to_string();
            if !repo.contexts.contains(&context) {
                repo.contexts.push(context);
            }
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn replace_statements(
    State(state): State<Shared>,
    Path(id): Path<String>,
    body: String,
) -> Response {
    state.record(format!("PUT /repositories/{}/statements", id));
    let mut repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get_mut(&id) else {
        return unknown_repository(&id);
    };
    repo.statements = parse_lines(&body);
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_statements(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(filter): Query<Fields>,
) -> Response {
    state.record(format!("DELETE /repositories/{}/statements", id));
    let mut repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get_mut(&id) else {
        return unknown_repository(&id);
    };
    repo.statements.retain(|l| !matches(l, &filter));
    StatusCode::NO_CONTENT.into_response()
}

async fn size(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.record(format!("GET /repositories/{}/size", id));
    let repos = state.repos.lock().unwrap();
    match repos.get(&id) {
        Some(repo) => repo.statements.len().to_string().into_response(),
        None => unknown_repository(&id),
    }
}

async fn contexts(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.record(format!("GET /repositories/{}/contexts", id));
    let repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get(&id) else {
        return unknown_repository(&id);
    };
    let rows = repo
        .contexts
        .iter()
        .map(|c| json!({ "contextID": { "type": "uri", "value": c } }))
        .collect();
    bindings(rows).into_response()
}

async fn namespaces(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.record(format!("GET /repositories/{}/namespaces", id));
    let repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get(&id) else {
        return unknown_repository(&id);
    };
    let rows = repo
        .namespaces
        .iter()
        .map(|(prefix, ns)| {
            json!({
                "prefix": { "type": "literal", "value": prefix },
                "namespace": { "type": "literal", "value": ns },
            })
        })
        .collect();
    bindings(rows).into_response()
}

async fn clear_namespaces(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.record(format!("DELETE /repositories/{}/namespaces", id));
    let mut repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get_mut(&id) else {
        return unknown_repository(&id);
    };
    repo.namespaces.clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn get_namespace(
    State(state): State<Shared>,
    Path((id, prefix)): Path<(String, String)>,
) -> Response {
    state.record(format!("GET /repositories/{}/namespaces/{}", id, prefix));
    let repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get(&id) else {
        return unknown_repository(&id);
    };
    match repo.namespaces.get(&prefix) {
        Some(ns) => ns.clone().into_response(),
        None if id == "legacy" => format!("Undefined prefix: {}", prefix).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Undefined prefix: {}", prefix)).into_response(),
    }
}

async fn put_namespace(
    State(state): State<Shared>,
    Path((id, prefix)): Path<(String, String)>,
    body: String,
) -> Response {
    state.record(format!("PUT /repositories/{}/namespaces/{}", id, prefix));
    let mut repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get_mut(&id) else {
        return unknown_repository(&id);
    };
    if body.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "No namespace name found").into_response();
    }
    repo.namespaces.insert(prefix, body.trim().to_string());
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_namespace(
    State(state): State<Shared>,
    Path((id, prefix)): Path<(String, String)>,
) -> Response {
    state.record(format!("DELETE /repositories/{}/namespaces/{}", id, prefix));
    let mut repos = state.repos.lock().unwrap();
    let Some(repo) = repos.get_mut(&id) else {
        return unknown_repository(&id);
    };
    repo.namespaces.shift_remove(&prefix);
    StatusCode::NO_CONTENT.into_response()
}
